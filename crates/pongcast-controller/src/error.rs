//! Controller errors.

use pongcast_types::{CourtState, SessionState};
use thiserror::Error;

use crate::game::Intent;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] pongcast_protocol::ProtocolError),

    #[error("discovery error: {0}")]
    Discovery(#[from] pongcast_discovery::DiscoveryError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Local, recoverable rejections from the session coordinator.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("channel not open (session is {state})")]
    ChannelNotOpen { state: SessionState },

    #[error("cannot select a route while {state}")]
    IllegalSelection { state: SessionState },

    #[error("transport error: {0}")]
    Transport(#[from] pongcast_protocol::ProtocolError),
}

/// Player intents the game coordinator refused or could not deliver.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("{intent:?} is not allowed while {state}")]
    NotLegal { intent: Intent, state: CourtState },

    #[error(transparent)]
    Session(#[from] SessionError),
}
