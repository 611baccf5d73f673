//! Session identity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one connection attempt to a receiver.
///
/// A fresh id is minted for every route selection. Transport callbacks carry
/// the id of the session that issued the request, so a late callback for a
/// torn-down session can be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
