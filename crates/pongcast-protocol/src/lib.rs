//! Text wire protocol and transport abstraction for pongcast.
//!
//! This crate encodes controller commands and decodes receiver messages
//! (plain case-sensitive text lines), and defines the [`Transport`] trait that
//! stands in for the cast SDK: discovery-independent connect/launch/channel
//! requests whose results come back later as
//! [`TransportEvent`](pongcast_types::TransportEvent)s.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod transport;
pub mod wire;

pub use error::ProtocolError;
pub use transport::Transport;
