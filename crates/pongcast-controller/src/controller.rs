//! The serialized controller loop.
//!
//! Every input (transport callbacks, discovery callbacks, player intents,
//! timers) is funnelled through one queue and handled one at a time, so the
//! coordinators never see interleaved mutation.

use pongcast_discovery::{Discovery, DiscoveryEvent};
use pongcast_protocol::Transport;
use pongcast_types::{
    CourtState, DeviceRoute, PaddleSide, RouteId, SessionState, TransportEvent,
};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ControllerError;
use crate::game::{GameCoordinator, Intent, Notification};
use crate::panel::ControlPanel;
use crate::repeat::PaddleRepeat;
use crate::session::{SessionCoordinator, SessionSettings};

/// Events processed by the controller's main loop.
#[derive(Debug)]
pub enum ControllerEvent {
    /// A callback from the transport.
    Transport(TransportEvent),
    /// A callback from discovery.
    Discovery(DiscoveryEvent),
    /// The player picked a receiver.
    SelectRoute(RouteId),
    /// The player left the court.
    Disconnect,
    /// Input from the player.
    Intent(PlayerIntent),
    /// The host came to the foreground.
    StartDiscovery,
    /// The host went to the background. An active session is kept.
    StopDiscovery,
    /// Shutdown signal.
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerIntent {
    /// A single tap.
    Request(Intent),
    /// A paddle control was pressed and is being held.
    HoldPaddle(Intent),
    /// The held paddle control was let go.
    ReleasePaddle,
}

/// Snapshot published after every handled event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerStatus {
    pub network_available: bool,
    pub discovering: bool,
    pub session: SessionState,
    pub court: CourtState,
    pub paddle: Option<PaddleSide>,
    pub routes: Vec<DeviceRoute>,
    pub selected: Option<RouteId>,
    pub panel: ControlPanel,
}

/// The controller: both coordinators behind one event queue.
pub struct Controller {
    session: SessionCoordinator,
    game: GameCoordinator,
    discovery: Box<dyn Discovery>,
    discovery_task: Option<JoinHandle<()>>,
    repeat: PaddleRepeat,
    event_tx: mpsc::Sender<ControllerEvent>,
    event_rx: mpsc::Receiver<ControllerEvent>,
    status_tx: watch::Sender<ControllerStatus>,
    notify_tx: mpsc::Sender<Notification>,
    notify_rx: Option<mpsc::Receiver<Notification>>,
}

impl Controller {
    /// Create a new controller instance.
    pub fn new(
        config: &Config,
        transport: Box<dyn Transport>,
        discovery: Box<dyn Discovery>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1024);
        let (notify_tx, notify_rx) = mpsc::channel(256);

        let session = SessionCoordinator::new(SessionSettings::from_config(config), transport);
        let game = GameCoordinator::new(config.strings.clone());
        let (status_tx, _) = watch::channel(snapshot(&session, &game, false));

        Self {
            session,
            game,
            discovery,
            discovery_task: None,
            repeat: PaddleRepeat::from_config(&config.controls),
            event_tx,
            event_rx,
            status_tx,
            notify_tx,
            notify_rx: Some(notify_rx),
        }
    }

    /// Get a clone of the event sender for feeding events into the controller.
    pub fn event_sender(&self) -> mpsc::Sender<ControllerEvent> {
        self.event_tx.clone()
    }

    /// Get a receiver for controller status snapshots.
    pub fn status_receiver(&self) -> watch::Receiver<ControllerStatus> {
        self.status_tx.subscribe()
    }

    /// Take the notification stream for the presentation layer. Only the
    /// first call returns it.
    pub fn take_notifications(&mut self) -> Option<mpsc::Receiver<Notification>> {
        self.notify_rx.take()
    }

    /// Run the controller event loop until shutdown.
    pub async fn run(&mut self) -> Result<(), ControllerError> {
        let (transport_tx, mut transport_rx) = mpsc::channel::<TransportEvent>(256);
        self.session.start(transport_tx).await?;

        // Forward transport callbacks to controller events
        let event_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(event) = transport_rx.recv().await {
                if event_tx
                    .send(ControllerEvent::Transport(event))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        });

        self.start_discovery().await;
        self.flush();
        info!("controller running");

        loop {
            let wake = self.next_deadline();
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(ControllerEvent::Shutdown) | None => {
                            info!("shutting down");
                            break;
                        }
                        Some(event) => self.handle_event(event).await,
                    }
                }
                () = sleep_until(wake) => self.on_timer().await,
            }
            self.flush();
        }

        self.shutdown().await
    }

    async fn handle_event(&mut self, event: ControllerEvent) {
        match event {
            ControllerEvent::Transport(event) => self.session.handle_transport_event(event).await,
            ControllerEvent::Discovery(event) => self.handle_discovery_event(event).await,
            ControllerEvent::SelectRoute(id) => self.select_route(&id).await,
            ControllerEvent::Disconnect => {
                self.repeat.release();
                self.session.disconnect().await;
            }
            ControllerEvent::Intent(intent) => self.handle_intent(intent).await,
            ControllerEvent::StartDiscovery => self.start_discovery().await,
            ControllerEvent::StopDiscovery => self.stop_discovery().await,
            ControllerEvent::Shutdown => {}
        }
    }

    async fn handle_discovery_event(&mut self, event: DiscoveryEvent) {
        match event {
            DiscoveryEvent::NetworkChanged { available } => {
                self.session.on_network_availability_changed(available).await;
            }
            DiscoveryEvent::RouteAdded(route) => self.session.on_route_added(route),
            DiscoveryEvent::RouteRemoved(id) => self.session.on_route_removed(&id),
            DiscoveryEvent::RouteSelected(id) => self.select_route(&id).await,
            DiscoveryEvent::RouteUnselected => self.session.disconnect().await,
        }
    }

    async fn select_route(&mut self, id: &RouteId) {
        let Some(route) = self.session.route(id).cloned() else {
            warn!(route = %id, "selected route is not known");
            return;
        };
        if let Err(e) = self.session.select_route(route).await {
            warn!(route = %id, error = %e, "route selection failed");
        }
    }

    async fn handle_intent(&mut self, intent: PlayerIntent) {
        match intent {
            PlayerIntent::Request(intent) => {
                self.request(intent).await;
            }
            PlayerIntent::HoldPaddle(intent) => {
                if !intent.is_paddle_move() {
                    debug!(%intent, "only paddle moves can be held");
                    return;
                }
                if self.request(intent).await {
                    self.repeat.press(intent, Instant::now());
                }
            }
            PlayerIntent::ReleasePaddle => {
                self.repeat.release();
            }
        }
    }

    async fn request(&mut self, intent: Intent) -> bool {
        match self.game.request(intent, &mut self.session).await {
            Ok(_) => true,
            Err(e) => {
                debug!(%intent, error = %e, "intent not sent");
                false
            }
        }
    }

    async fn on_timer(&mut self) {
        self.session.on_deadline().await;
        self.flush();

        if let Some(intent) = self.repeat.fire(Instant::now()) {
            if !self.request(intent).await {
                self.repeat.release();
            }
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [self.session.deadline(), self.repeat.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Deliver session events to the game, forward notifications and publish
    /// a fresh status.
    fn flush(&mut self) {
        for event in self.session.drain_events() {
            self.game.on_session_event(event);
        }

        if let Some(intent) = self.repeat.held() {
            if !intent.is_legal_in(self.game.court()) {
                debug!(court = %self.game.court(), "paddle repeat stopped");
                self.repeat.release();
            }
        }

        for notification in self.game.drain_notifications() {
            if let Err(e) = self.notify_tx.try_send(notification) {
                debug!(error = %e, "notification dropped");
            }
        }

        let discovering = self.discovery_task.is_some();
        self.status_tx
            .send_replace(snapshot(&self.session, &self.game, discovering));
    }

    async fn start_discovery(&mut self) {
        if self.discovery_task.is_some() {
            return;
        }
        match self.discovery.start_discovery().await {
            Ok(mut rx) => {
                let event_tx = self.event_tx.clone();
                self.discovery_task = Some(tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if event_tx
                            .send(ControllerEvent::Discovery(event))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }));
                info!("discovery started");
            }
            Err(e) => warn!(error = %e, "failed to start discovery"),
        }
    }

    async fn stop_discovery(&mut self) {
        let Some(task) = self.discovery_task.take() else {
            return;
        };
        task.abort();
        if let Err(e) = self.discovery.stop_discovery().await {
            warn!(error = %e, "failed to stop discovery");
        }
        info!("discovery stopped");
    }

    async fn shutdown(&mut self) -> Result<(), ControllerError> {
        self.repeat.release();
        self.stop_discovery().await;
        let result = self.session.shutdown().await;
        self.flush();
        self.game.reset();
        self.flush();
        info!("controller stopped");
        result.map_err(Into::into)
    }
}

fn snapshot(
    session: &SessionCoordinator,
    game: &GameCoordinator,
    discovering: bool,
) -> ControllerStatus {
    ControllerStatus {
        network_available: session.network_available(),
        discovering,
        session: session.state(),
        court: game.court(),
        paddle: game.paddle(),
        routes: session.routes().to_vec(),
        selected: session.selected_route().map(|r| r.id.clone()),
        panel: ControlPanel::for_court(game.court(), game.strings()),
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
