//! Protocol and transport errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unrecognized receiver message: {0:?}")]
    UnrecognizedMessage(String),

    #[error(transparent)]
    Token(#[from] pongcast_types::TokenError),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("launch request failed: {0}")]
    Launch(String),

    #[error("channel error: {0}")]
    Channel(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
