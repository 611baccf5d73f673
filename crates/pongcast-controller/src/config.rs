//! Controller configuration loaded from TOML.

use std::time::Duration;

use pongcast_types::PaddleSide;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub strings: Strings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            receiver: ReceiverConfig::default(),
            session: SessionConfig::default(),
            controls: ControlsConfig::default(),
            strings: Strings::default(),
            log_level: default_log_level(),
        }
    }
}

/// Which remote application to launch and where to talk to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            namespace: default_namespace(),
        }
    }
}

/// Session establishment policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Bound on Connecting, Connected and ConnectionSuspended before the
    /// session is torn down.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Extra launch attempts after a failed launch on a fresh connection.
    #[serde(default = "default_launch_retries")]
    pub launch_retries: u8,
}

impl SessionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            launch_retries: default_launch_retries(),
        }
    }
}

/// Paddle hold auto-repeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_repeat_initial_ms")]
    pub repeat_initial_ms: u64,
    #[serde(default = "default_repeat_interval_ms")]
    pub repeat_interval_ms: u64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            repeat_initial_ms: default_repeat_initial_ms(),
            repeat_interval_ms: default_repeat_interval_ms(),
        }
    }
}

/// User-facing text, injected once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Strings {
    pub no_paddle: String,
    /// `{side}` is replaced with `left` or `right`.
    pub got_paddle: String,
    pub game_won: String,
    pub game_lost: String,
    pub send_failed: String,
    pub session_lost: String,
    pub enable_network: String,
    pub no_court: String,
    pub select_court: String,
    pub waiting: String,
    pub preparing: String,
    pub on_court: String,
    pub game_over: String,
}

impl Strings {
    pub fn got_paddle(&self, side: PaddleSide) -> String {
        self.got_paddle.replace("{side}", &side.to_string())
    }
}

impl Default for Strings {
    fn default() -> Self {
        Self {
            no_paddle: "Sorry, no paddle for you!".to_string(),
            got_paddle: "You got {side} paddle".to_string(),
            game_won: "Game won!".to_string(),
            game_lost: "Game lost".to_string(),
            send_failed: "Sending failed".to_string(),
            session_lost: "Lost connection to the court".to_string(),
            enable_network: "Enable WiFi to find a court".to_string(),
            no_court: "No court available".to_string(),
            select_court: "Select a court to play on".to_string(),
            waiting: "Waiting to enter the court".to_string(),
            preparing: "Preparing the court".to_string(),
            on_court: "On court, waiting for a paddle".to_string(),
            game_over: "Game over".to_string(),
        }
    }
}

fn default_app_id() -> String {
    "PONGCAST".to_string()
}

fn default_namespace() -> String {
    "urn:x-cast:pongcast".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    15_000
}

fn default_launch_retries() -> u8 {
    1
}

fn default_repeat_initial_ms() -> u64 {
    300
}

fn default_repeat_interval_ms() -> u64 {
    80
}
