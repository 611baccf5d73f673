//! Config loading and default locations.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Config;
use crate::error::ControllerError;

/// Load configuration from the given path, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ControllerError> {
    let config_path = path.map_or_else(default_config_path, Path::to_path_buf);

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ControllerError::Config(format!("failed to read config: {e}")))?;
        let config = parse_config(&content)?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        info!(path = %config_path.display(), "no config file found, using defaults");
        Ok(Config::default())
    }
}

pub fn parse_config(content: &str) -> Result<Config, ControllerError> {
    toml::from_str(content)
        .map_err(|e| ControllerError::Config(format!("failed to parse config: {e}")))
}

/// Render the default configuration as TOML.
pub fn default_config_toml() -> Result<String, ControllerError> {
    toml::to_string_pretty(&Config::default())
        .map_err(|e| ControllerError::Config(format!("failed to render config: {e}")))
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("pongcast")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
