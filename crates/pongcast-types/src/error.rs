//! Token parsing errors.

use thiserror::Error;

/// A protocol token did not name any known value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("unknown paddle side: {0:?}")]
    UnknownSide(String),
}
