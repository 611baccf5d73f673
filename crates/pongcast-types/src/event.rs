//! Transport callbacks.
//!
//! The cast SDK reports results through listener callbacks that may fire on
//! any thread. Each callback is mapped to one [`TransportEvent`] variant and
//! pushed onto the controller's single inbound queue.

use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// A result or notification delivered by the transport for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportEvent {
    /// The transport session is up.
    Connected {
        session: SessionId,
        /// Hint set on resumption when the receiver application exited while
        /// the connection was suspended.
        app_no_longer_running: bool,
    },

    /// The transport session dropped; the SDK will try to recover silently.
    ConnectionSuspended { session: SessionId, cause: i32 },

    /// The transport could not connect or lost the session for good.
    ConnectionFailed { session: SessionId, reason: String },

    /// The receiver application went away.
    ApplicationDisconnected { session: SessionId, code: i32 },

    /// Outcome of a launch request.
    LaunchResult {
        session: SessionId,
        success: bool,
        was_already_running: bool,
    },

    /// A text message arrived on a channel.
    MessageReceived {
        session: SessionId,
        namespace: String,
        text: String,
    },

    /// Outcome of a send request.
    DeliveryResult {
        session: SessionId,
        text: String,
        success: bool,
    },
}

impl TransportEvent {
    /// The session this event belongs to.
    pub fn session(&self) -> SessionId {
        match self {
            Self::Connected { session, .. }
            | Self::ConnectionSuspended { session, .. }
            | Self::ConnectionFailed { session, .. }
            | Self::ApplicationDisconnected { session, .. }
            | Self::LaunchResult { session, .. }
            | Self::MessageReceived { session, .. }
            | Self::DeliveryResult { session, .. } => *session,
        }
    }
}
