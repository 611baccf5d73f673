//! Session coordinator: network, route, connection and channel lifecycle.
//!
//! Folds transport and discovery callbacks into one [`SessionState`] and owns
//! the single outstanding session. Every callback that refers to a session is
//! checked against the identity of the active one, so results for a session
//! that was already torn down are dropped instead of applied.

use std::time::Duration;

use pongcast_protocol::Transport;
use pongcast_types::{DeviceRoute, RouteId, SessionId, SessionState, TransportEvent};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::error::SessionError;

/// Notifications emitted by the session coordinator, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The session state changed. Never emitted twice in a row for the same state.
    StateChanged(SessionState),
    /// A text message arrived on the open channel.
    Message(String),
    /// A message could not be delivered. Session state is unaffected.
    SendFailed { text: String },
    /// The session was torn down because of a transport fault.
    SessionLost(LossReason),
}

/// Why a session was torn down without being asked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LossReason {
    ConnectRequestFailed(String),
    ConnectionFailed(String),
    ApplicationDisconnected,
    LaunchFailed,
    ChannelFailed(String),
    NetworkLost,
    Timeout,
}

impl std::fmt::Display for LossReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectRequestFailed(e) => write!(f, "connect request failed: {e}"),
            Self::ConnectionFailed(e) => write!(f, "connection failed: {e}"),
            Self::ApplicationDisconnected => write!(f, "receiver application disconnected"),
            Self::LaunchFailed => write!(f, "receiver application failed to launch"),
            Self::ChannelFailed(e) => write!(f, "message channel failed: {e}"),
            Self::NetworkLost => write!(f, "network lost"),
            Self::Timeout => write!(f, "timed out"),
        }
    }
}

/// Session settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub app_id: String,
    pub namespace: String,
    pub connect_timeout: Duration,
    pub launch_retries: u8,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            app_id: config.receiver.app_id.clone(),
            namespace: config.receiver.namespace.clone(),
            connect_timeout: config.session.connect_timeout(),
            launch_retries: config.session.launch_retries,
        }
    }
}

/// The one outstanding session.
struct ActiveSession {
    id: SessionId,
    route: DeviceRoute,
    transport_connected: bool,
    /// Set while a suspended session waits for the transport to recover.
    pending_reconnect: bool,
    /// Retries left for the in-flight launch; `None` when no launch is outstanding.
    launch: Option<u8>,
    /// Messages may be sent; cleared by a suspension.
    channel_open: bool,
    /// The namespace is registered with the transport until closed.
    channel_registered: bool,
    deadline: Option<Instant>,
}

impl ActiveSession {
    fn new(id: SessionId, route: DeviceRoute) -> Self {
        Self {
            id,
            route,
            transport_connected: false,
            pending_reconnect: false,
            launch: None,
            channel_open: false,
            channel_registered: false,
            deadline: None,
        }
    }
}

/// Owns discovery facts and the session with the receiver.
pub struct SessionCoordinator {
    settings: SessionSettings,
    transport: Box<dyn Transport>,
    state: SessionState,
    announced: bool,
    network_available: bool,
    routes: Vec<DeviceRoute>,
    active: Option<ActiveSession>,
    events: Vec<SessionEvent>,
}

impl SessionCoordinator {
    pub fn new(settings: SessionSettings, transport: Box<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
            state: SessionState::NoTransport,
            announced: false,
            network_available: false,
            routes: Vec::new(),
            active: None,
            events: Vec::new(),
        }
    }

    /// Start the transport, delivering its callbacks to `tx`.
    pub async fn start(&mut self, tx: mpsc::Sender<TransportEvent>) -> Result<(), SessionError> {
        self.transport.start(tx).await?;
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn network_available(&self) -> bool {
        self.network_available
    }

    /// Routes known from discovery.
    pub fn routes(&self) -> &[DeviceRoute] {
        &self.routes
    }

    pub fn route(&self, id: &RouteId) -> Option<&DeviceRoute> {
        self.routes.iter().find(|r| &r.id == id)
    }

    pub fn selected_route(&self) -> Option<&DeviceRoute> {
        self.active.as_ref().map(|a| &a.route)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn pending_reconnect(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.pending_reconnect)
    }

    /// When the current pending state times out, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.active.as_ref().and_then(|a| a.deadline)
    }

    /// Take the events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Re-evaluate whether any network path exists. Callable at any time.
    pub async fn on_network_availability_changed(&mut self, available: bool) {
        if self.network_available != available {
            info!(available, "network availability changed");
        }
        self.network_available = available;

        if !available && self.active.is_some() {
            self.lose_session(LossReason::NetworkLost).await;
            return;
        }
        self.evaluate_routes();
    }

    /// Replace the set of discovered routes.
    ///
    /// An active session is not interrupted; the new facts apply once it ends.
    pub fn on_routes_changed(&mut self, routes: Vec<DeviceRoute>) {
        debug!(count = routes.len(), "routes changed");
        self.routes = routes;
        self.evaluate_routes();
    }

    pub fn on_route_added(&mut self, route: DeviceRoute) {
        let mut routes = self.routes.clone();
        match routes.iter_mut().find(|r| r.id == route.id) {
            Some(existing) => *existing = route,
            None => routes.push(route),
        }
        self.on_routes_changed(routes);
    }

    pub fn on_route_removed(&mut self, id: &RouteId) {
        let mut routes = self.routes.clone();
        routes.retain(|r| &r.id != id);
        self.on_routes_changed(routes);
    }

    /// Connect to `route`.
    ///
    /// Legal from `NoRouteAvailable`, `RouteAvailable` and `ChannelReady`; the
    /// last disconnects the current session first. The connect itself is
    /// asynchronous and resolves through [`Self::on_connected`].
    pub async fn select_route(&mut self, route: DeviceRoute) -> Result<SessionId, SessionError> {
        if !self.state.can_select_route() {
            return Err(SessionError::IllegalSelection { state: self.state });
        }
        if self.state == SessionState::ChannelReady {
            info!(route = %route.name, "switching route, disconnecting current session");
            self.disconnect().await;
            if !self.state.can_select_route() {
                return Err(SessionError::IllegalSelection { state: self.state });
            }
        }

        let id = SessionId::new();
        info!(session = %id, route = %route.name, "connecting");
        self.active = Some(ActiveSession::new(id, route.clone()));
        self.set_state(SessionState::Connecting);

        if let Err(e) = self.transport.connect(id, &route).await {
            warn!(session = %id, error = %e, "connect request failed");
            self.lose_session(LossReason::ConnectRequestFailed(e.to_string()))
                .await;
            return Err(e.into());
        }
        Ok(id)
    }

    /// The transport session came up, either for the first time or after a
    /// suspension.
    pub async fn on_connected(&mut self, session: SessionId, remote_app_still_running: bool) {
        if !self.is_current(session, "connected") {
            return;
        }
        if !matches!(
            self.state,
            SessionState::Connecting | SessionState::ConnectionSuspended
        ) {
            debug!(session = %session, state = %self.state, "duplicate connected callback dropped");
            return;
        }

        let mut was_resuming = false;
        if let Some(active) = self.active.as_mut() {
            active.transport_connected = true;
            was_resuming = std::mem::take(&mut active.pending_reconnect);
        }
        self.connected(was_resuming, remote_app_still_running).await;
    }

    async fn connected(&mut self, was_resuming: bool, remote_app_still_running: bool) {
        if !was_resuming {
            info!("connected, launching receiver application");
            self.set_state(SessionState::Connected);
            self.request_launch(self.settings.launch_retries).await;
        } else if remote_app_still_running {
            info!("reconnected, receiver application still running");
            self.set_state(SessionState::Connecting);
            self.open_channel().await;
        } else {
            // A single relaunch; if it fails the session is surfaced as lost.
            info!("reconnected, receiver application gone, relaunching");
            self.set_state(SessionState::Connecting);
            self.request_launch(0).await;
        }
    }

    /// The transport dropped the session and will try to recover it.
    pub fn on_connection_suspended(&mut self, session: SessionId, cause: i32) {
        if !self.is_current(session, "suspended") {
            return;
        }
        let connected = self.active.as_ref().is_some_and(|a| a.transport_connected);
        if !connected || self.state == SessionState::ConnectionSuspended {
            debug!(session = %session, state = %self.state, "suspension callback dropped");
            return;
        }

        if let Some(active) = self.active.as_mut() {
            active.pending_reconnect = true;
            active.channel_open = false;
            active.launch = None;
        }
        warn!(session = %session, cause, "connection suspended, waiting for recovery");
        self.set_state(SessionState::ConnectionSuspended);
    }

    pub async fn on_connection_failed(&mut self, session: SessionId, reason: String) {
        if self.is_current(session, "connection failed") {
            self.lose_session(LossReason::ConnectionFailed(reason)).await;
        }
    }

    pub async fn on_application_disconnected(&mut self, session: SessionId, code: i32) {
        if self.is_current(session, "application disconnected") {
            debug!(session = %session, code, "receiver application disconnected");
            self.lose_session(LossReason::ApplicationDisconnected).await;
        }
    }

    /// Result of a launch request.
    ///
    /// A failure is retried while the launch budget lasts; then the session is
    /// torn down and reported lost. The coordinator stays usable.
    pub async fn on_launch_result(&mut self, session: SessionId, success: bool) {
        if !self.is_current(session, "launch result") {
            return;
        }
        let Some(retries_left) = self.active.as_mut().and_then(|a| a.launch.take()) else {
            debug!(session = %session, "launch result without outstanding launch dropped");
            return;
        };

        if success {
            info!(session = %session, "receiver application launched");
            self.open_channel().await;
        } else if retries_left > 0 {
            warn!(session = %session, retries_left, "launch failed, retrying");
            self.request_launch(retries_left - 1).await;
        } else {
            warn!(session = %session, "launch failed, giving up");
            self.lose_session(LossReason::LaunchFailed).await;
        }
    }

    pub fn on_message_received(&mut self, session: SessionId, namespace: &str, text: String) {
        if !self.is_current(session, "message") {
            return;
        }
        if self.state != SessionState::ChannelReady || namespace != self.settings.namespace {
            debug!(session = %session, namespace, state = %self.state, "message outside open channel dropped");
            return;
        }
        trace!(session = %session, text = %text, "message received");
        self.events.push(SessionEvent::Message(text));
    }

    pub fn on_delivery_result(&mut self, session: SessionId, text: String, success: bool) {
        if success {
            trace!(session = %session, text = %text, "message delivered");
        } else if self.is_current(session, "delivery result") {
            warn!(session = %session, text = %text, "sending message failed");
            self.events.push(SessionEvent::SendFailed { text });
        }
    }

    /// Map one transport callback onto the coordinator.
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected {
                session,
                app_no_longer_running,
            } => self.on_connected(session, !app_no_longer_running).await,
            TransportEvent::ConnectionSuspended { session, cause } => {
                self.on_connection_suspended(session, cause);
            }
            TransportEvent::ConnectionFailed { session, reason } => {
                self.on_connection_failed(session, reason).await;
            }
            TransportEvent::ApplicationDisconnected { session, code } => {
                self.on_application_disconnected(session, code).await;
            }
            TransportEvent::LaunchResult {
                session,
                success,
                was_already_running,
            } => {
                debug!(session = %session, success, was_already_running, "launch result");
                self.on_launch_result(session, success).await;
            }
            TransportEvent::MessageReceived {
                session,
                namespace,
                text,
            } => self.on_message_received(session, &namespace, text),
            TransportEvent::DeliveryResult {
                session,
                text,
                success,
            } => self.on_delivery_result(session, text, success),
        }
    }

    /// Send a text message on the open channel.
    ///
    /// Rejected locally unless the state is `ChannelReady`. Delivery is
    /// asynchronous; a failed delivery shows up as [`SessionEvent::SendFailed`].
    pub async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        let id = match (&self.active, self.state) {
            (Some(active), SessionState::ChannelReady) if active.channel_open => active.id,
            _ => return Err(SessionError::ChannelNotOpen { state: self.state }),
        };

        if let Err(e) = self
            .transport
            .send_message(id, &self.settings.namespace, text)
            .await
        {
            warn!(session = %id, text, error = %e, "send request failed");
            self.events.push(SessionEvent::SendFailed {
                text: text.to_string(),
            });
            return Err(e.into());
        }
        trace!(session = %id, text, "sent message");
        Ok(())
    }

    /// Tear down the session, if any, and fall back to what the network and
    /// route facts imply. Idempotent.
    pub async fn disconnect(&mut self) {
        if let Some(active) = self.active.take() {
            if active.channel_registered {
                if let Err(e) = self
                    .transport
                    .close_channel(active.id, &self.settings.namespace)
                    .await
                {
                    debug!(session = %active.id, error = %e, "closing channel failed");
                }
            }
            if let Err(e) = self.transport.disconnect(active.id).await {
                debug!(session = %active.id, error = %e, "transport disconnect failed");
            }
            info!(session = %active.id, route = %active.route.name, "disconnected");
        }
        self.evaluate_routes();
    }

    /// Tear the session down if its pending state outlived the connect timeout.
    pub async fn on_deadline(&mut self) {
        let expired = self
            .deadline()
            .is_some_and(|deadline| deadline <= Instant::now());
        if expired {
            warn!(state = %self.state, "session did not resolve in time");
            self.lose_session(LossReason::Timeout).await;
        }
    }

    /// Disconnect and shut the transport down.
    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        self.disconnect().await;
        self.transport.shutdown().await?;
        Ok(())
    }

    async fn request_launch(&mut self, mut retries_left: u8) {
        let Some(id) = self.session_id() else {
            return;
        };
        loop {
            if let Some(active) = self.active.as_mut() {
                active.launch = Some(retries_left);
            }
            match self
                .transport
                .launch_application(id, &self.settings.app_id)
                .await
            {
                Ok(()) => {
                    debug!(session = %id, app_id = %self.settings.app_id, "launch requested");
                    return;
                }
                Err(e) if retries_left > 0 => {
                    warn!(session = %id, error = %e, "launch request failed, retrying");
                    retries_left -= 1;
                }
                Err(e) => {
                    warn!(session = %id, error = %e, "launch request failed");
                    self.lose_session(LossReason::LaunchFailed).await;
                    return;
                }
            }
        }
    }

    async fn open_channel(&mut self) {
        let Some(id) = self.session_id() else {
            return;
        };
        // A channel that outlived a suspension is still registered.
        if self.active.as_ref().is_some_and(|a| a.channel_registered) {
            if let Err(e) = self
                .transport
                .close_channel(id, &self.settings.namespace)
                .await
            {
                debug!(session = %id, error = %e, "closing stale channel failed");
            }
            if let Some(active) = self.active.as_mut() {
                active.channel_registered = false;
            }
        }
        match self
            .transport
            .open_channel(id, &self.settings.namespace)
            .await
        {
            Ok(()) => {
                if let Some(active) = self.active.as_mut() {
                    active.channel_open = true;
                    active.channel_registered = true;
                }
                info!(session = %id, namespace = %self.settings.namespace, "message channel open");
                self.set_state(SessionState::ChannelReady);
            }
            Err(e) => {
                warn!(session = %id, error = %e, "opening message channel failed");
                self.lose_session(LossReason::ChannelFailed(e.to_string()))
                    .await;
            }
        }
    }

    async fn lose_session(&mut self, reason: LossReason) {
        warn!(%reason, "session lost");
        self.disconnect().await;
        self.events.push(SessionEvent::SessionLost(reason));
    }

    fn evaluate_routes(&mut self) {
        if self.active.is_some() {
            return;
        }
        let next = if !self.network_available {
            SessionState::NoTransport
        } else if self.routes.is_empty() {
            SessionState::NoRouteAvailable
        } else {
            SessionState::RouteAvailable
        };
        self.set_state(next);
    }

    fn set_state(&mut self, next: SessionState) {
        if self.announced && next == self.state {
            return;
        }
        let previous = self.state;
        self.state = next;
        self.announced = true;

        let timeout = self.settings.connect_timeout;
        if let Some(active) = self.active.as_mut() {
            active.deadline = next.is_pending().then(|| Instant::now() + timeout);
        }

        info!(from = %previous, to = %next, "session state changed");
        self.events.push(SessionEvent::StateChanged(next));
    }

    fn is_current(&self, session: SessionId, callback: &str) -> bool {
        let current = self.active.as_ref().is_some_and(|a| a.id == session);
        if !current {
            debug!(session = %session, callback, "callback for stale session dropped");
        }
        current
    }
}
