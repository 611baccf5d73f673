//! Core of pongcast.
//!
//! Two cooperating state machines behind one serialized event loop: the
//! [`SessionCoordinator`] tracks network, receiver routes and the session
//! with the receiver; the [`GameCoordinator`] folds session events and
//! receiver messages into the court state and guards player intents.

pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod panel;
pub mod repeat;
pub mod session;
pub mod setup;

pub use config::Config;
pub use controller::{Controller, ControllerEvent, ControllerStatus, PlayerIntent};
pub use error::{ControllerError, GameError, SessionError};
pub use game::{GameCoordinator, Intent, Notification};
pub use panel::ControlPanel;
pub use session::{SessionCoordinator, SessionEvent};
