//! Mock transport for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pongcast_types::{DeviceRoute, RouteId, SessionId, TransportEvent};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::ProtocolError;
use crate::Transport;

/// A request the coordinator issued to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect { session: SessionId, route: RouteId },
    Disconnect { session: SessionId },
    Launch { session: SessionId, app_id: String },
    OpenChannel { session: SessionId, namespace: String },
    CloseChannel { session: SessionId, namespace: String },
    Send {
        session: SessionId,
        namespace: String,
        text: String,
    },
    Shutdown,
}

/// Shared state for observing and steering what `MockTransport` does.
#[derive(Debug, Default)]
struct MockTransportState {
    calls: Vec<TransportCall>,
    events: Option<mpsc::Sender<TransportEvent>>,
    observers: Vec<mpsc::UnboundedSender<TransportCall>>,
    fail_connect: bool,
    fail_launch: bool,
    fail_channel: bool,
    fail_send: bool,
}

impl MockTransportState {
    fn record(&mut self, call: TransportCall) {
        trace!(?call, "mock transport call");
        self.observers.retain(|tx| tx.send(call.clone()).is_ok());
        self.calls.push(call);
    }
}

/// Mock transport backend for testing.
///
/// Records every request and never produces callbacks on its own; tests
/// inject [`TransportEvent`]s through a [`MockTransportHandle`].
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockTransportState::default())),
        }
    }

    /// Get a clonable handle for observing and driving the mock.
    pub fn handle(&self) -> MockTransportHandle {
        MockTransportHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable observer handle for `MockTransport`.
#[derive(Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransportHandle {
    /// Get a snapshot of all recorded calls.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Number of launch requests issued so far.
    pub fn launch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, TransportCall::Launch { .. }))
            .count()
    }

    /// Texts passed to `send_message`, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                TransportCall::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Session of the most recent connect request.
    pub fn last_connected_session(&self) -> Option<SessionId> {
        self.calls().iter().rev().find_map(|c| match c {
            TransportCall::Connect { session, .. } => Some(*session),
            _ => None,
        })
    }

    /// Stream every call as it is recorded.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TransportCall> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().unwrap().observers.push(tx);
        rx
    }

    /// Make `connect` requests fail to issue.
    pub fn fail_connect(&self, fail: bool) {
        self.state.lock().unwrap().fail_connect = fail;
    }

    /// Make `launch_application` requests fail to issue.
    pub fn fail_launch(&self, fail: bool) {
        self.state.lock().unwrap().fail_launch = fail;
    }

    /// Make `open_channel` fail.
    pub fn fail_channel(&self, fail: bool) {
        self.state.lock().unwrap().fail_channel = fail;
    }

    /// Make `send_message` requests fail to issue.
    pub fn fail_send(&self, fail: bool) {
        self.state.lock().unwrap().fail_send = fail;
    }

    /// Deliver a transport callback as the SDK would.
    ///
    /// Returns `false` if the transport was never started or the receiver
    /// side is gone.
    pub async fn emit(&self, event: TransportEvent) -> bool {
        let tx = self.state.lock().unwrap().events.clone();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn start(&mut self, tx: mpsc::Sender<TransportEvent>) -> Result<(), ProtocolError> {
        self.state.lock().unwrap().events = Some(tx);
        Ok(())
    }

    async fn connect(
        &mut self,
        session: SessionId,
        route: &DeviceRoute,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.record(TransportCall::Connect {
            session,
            route: route.id.clone(),
        });
        if state.fail_connect {
            return Err(ProtocolError::Connection("mock connect failure".to_string()));
        }
        Ok(())
    }

    async fn disconnect(&mut self, session: SessionId) -> Result<(), ProtocolError> {
        self.state
            .lock()
            .unwrap()
            .record(TransportCall::Disconnect { session });
        Ok(())
    }

    async fn launch_application(
        &mut self,
        session: SessionId,
        app_id: &str,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.record(TransportCall::Launch {
            session,
            app_id: app_id.to_string(),
        });
        if state.fail_launch {
            return Err(ProtocolError::Launch("mock launch failure".to_string()));
        }
        Ok(())
    }

    async fn open_channel(
        &mut self,
        session: SessionId,
        namespace: &str,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.record(TransportCall::OpenChannel {
            session,
            namespace: namespace.to_string(),
        });
        if state.fail_channel {
            return Err(ProtocolError::Channel("mock channel failure".to_string()));
        }
        Ok(())
    }

    async fn close_channel(
        &mut self,
        session: SessionId,
        namespace: &str,
    ) -> Result<(), ProtocolError> {
        self.state
            .lock()
            .unwrap()
            .record(TransportCall::CloseChannel {
                session,
                namespace: namespace.to_string(),
            });
        Ok(())
    }

    async fn send_message(
        &mut self,
        session: SessionId,
        namespace: &str,
        text: &str,
    ) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.record(TransportCall::Send {
            session,
            namespace: namespace.to_string(),
            text: text.to_string(),
        });
        if state.fail_send {
            return Err(ProtocolError::Send("mock send failure".to_string()));
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), ProtocolError> {
        let mut state = self.state.lock().unwrap();
        state.record(TransportCall::Shutdown);
        state.events = None;
        Ok(())
    }
}
