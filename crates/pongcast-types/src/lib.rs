//! Shared types for pongcast.
//!
//! This crate contains the vocabulary shared across the pongcast workspace:
//! discoverable routes, session identity, session and court states, the
//! controller commands and receiver messages of the text protocol, and the
//! transport callbacks folded by the session coordinator.

pub mod device;
pub mod error;
pub mod event;
pub mod message;
pub mod session;
pub mod state;

pub use device::{DeviceRoute, RouteId};
pub use error::TokenError;
pub use event::TransportEvent;
pub use message::{Command, GameOutcome, ReceiverMessage};
pub use session::SessionId;
pub use state::{CourtState, PaddleSide, SessionState};
