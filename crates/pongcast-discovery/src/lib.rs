//! Receiver discovery for pongcast.
//!
//! Defines the [`Discovery`] trait for watching network availability and
//! browsing for receiver routes. Each route callback of the cast SDK and the
//! network-change broadcast maps to one [`DiscoveryEvent`].

use async_trait::async_trait;
use pongcast_types::{DeviceRoute, RouteId};
use tokio::sync::mpsc;

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::DiscoveryError;

/// Network discovery of receiver routes.
#[async_trait]
pub trait Discovery: Send + 'static {
    /// Start discovery, sending events to the returned receiver.
    ///
    /// Implementations report the current network availability and every
    /// already-known route first.
    async fn start_discovery(&mut self) -> Result<mpsc::Receiver<DiscoveryEvent>, DiscoveryError>;

    /// Stop discovery. The receiver returned by `start_discovery` closes.
    async fn stop_discovery(&mut self) -> Result<(), DiscoveryError>;
}

/// Events from the discovery subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// Network path to receivers appeared or went away.
    NetworkChanged { available: bool },
    /// A receiver was found.
    RouteAdded(DeviceRoute),
    /// A previously found receiver disappeared.
    RouteRemoved(RouteId),
    /// The user picked a receiver in the SDK's route chooser.
    RouteSelected(RouteId),
    /// The user dismissed the current receiver in the SDK's route chooser.
    RouteUnselected,
}
