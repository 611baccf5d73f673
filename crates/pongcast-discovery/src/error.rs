//! Discovery subsystem errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery already running")]
    AlreadyRunning,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
