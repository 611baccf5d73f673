//! Transport abstraction over the cast SDK.

use async_trait::async_trait;
use pongcast_types::{DeviceRoute, SessionId, TransportEvent};
use tokio::sync::mpsc;

use crate::error::ProtocolError;

/// Connection, launch and messaging primitives of the cast SDK.
///
/// Every request is fire-and-forget: `Ok(())` only means the request was
/// issued. Results arrive later on the sender passed to [`Transport::start`],
/// tagged with the [`SessionId`] that issued the request.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Start delivering transport callbacks to `tx`.
    async fn start(&mut self, tx: mpsc::Sender<TransportEvent>) -> Result<(), ProtocolError>;

    /// Connect to a receiver. Resolves with `Connected` or `ConnectionFailed`.
    async fn connect(&mut self, session: SessionId, route: &DeviceRoute)
        -> Result<(), ProtocolError>;

    /// Tear down the transport session.
    async fn disconnect(&mut self, session: SessionId) -> Result<(), ProtocolError>;

    /// Ask the receiver to launch the remote application. Resolves with
    /// `LaunchResult`.
    async fn launch_application(
        &mut self,
        session: SessionId,
        app_id: &str,
    ) -> Result<(), ProtocolError>;

    /// Register for messages on `namespace`. Takes effect immediately.
    async fn open_channel(&mut self, session: SessionId, namespace: &str)
        -> Result<(), ProtocolError>;

    /// Remove the message registration for `namespace`.
    async fn close_channel(
        &mut self,
        session: SessionId,
        namespace: &str,
    ) -> Result<(), ProtocolError>;

    /// Send a text message. Resolves with `DeliveryResult`.
    async fn send_message(
        &mut self,
        session: SessionId,
        namespace: &str,
        text: &str,
    ) -> Result<(), ProtocolError>;

    /// Shut the transport down and release all resources.
    async fn shutdown(&mut self) -> Result<(), ProtocolError>;
}
