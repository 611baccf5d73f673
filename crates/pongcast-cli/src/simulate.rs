//! A whole game against an in-process receiver.
//!
//! The controller runs on the mock transport; a scripted receiver watches
//! the requests it issues and answers them the way the real receiver
//! application would.

use std::time::Duration;

use anyhow::{bail, Context};
use pongcast_controller::config::Config;
use pongcast_controller::{
    Controller, ControllerEvent, ControllerStatus, Intent, Notification, PlayerIntent,
};
use pongcast_discovery::mock::MockDiscovery;
use pongcast_discovery::DiscoveryEvent;
use pongcast_protocol::mock::{MockTransport, MockTransportHandle, TransportCall};
use pongcast_protocol::wire;
use pongcast_types::{Command, CourtState, DeviceRoute, SessionId, SessionState, TransportEvent};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

const STEP_TIMEOUT: Duration = Duration::from_secs(10);

/// Answers controller requests like the receiver application.
struct ScriptedReceiver {
    transport: MockTransportHandle,
    rallies: u32,
    moves: u32,
    namespace: String,
}

impl ScriptedReceiver {
    async fn run(mut self, mut calls: mpsc::UnboundedReceiver<TransportCall>) {
        while let Some(call) = calls.recv().await {
            if let Some(event) = self.answer(call) {
                if !self.transport.emit(event).await {
                    break;
                }
            }
        }
    }

    fn answer(&mut self, call: TransportCall) -> Option<TransportEvent> {
        match call {
            TransportCall::Connect { session, .. } => Some(TransportEvent::Connected {
                session,
                app_no_longer_running: false,
            }),
            TransportCall::Launch { session, .. } => Some(TransportEvent::LaunchResult {
                session,
                success: true,
                was_already_running: false,
            }),
            TransportCall::OpenChannel { session, namespace } => {
                self.namespace = namespace;
                Some(self.say(session, "PADDLE YES LEFT".to_string()))
            }
            TransportCall::Send { session, text, .. } => self.on_command(session, &text),
            TransportCall::Disconnect { .. }
            | TransportCall::CloseChannel { .. }
            | TransportCall::Shutdown => None,
        }
    }

    fn on_command(&mut self, session: SessionId, text: &str) -> Option<TransportEvent> {
        let command = match wire::decode_command(text) {
            Ok(command) => command,
            Err(e) => {
                warn!(error = %e, "receiver ignored command");
                return None;
            }
        };
        let reply = match command {
            Command::StartPlay => wire::GAME_STARTED.to_string(),
            Command::PausePlay => wire::GAME_PAUSED.to_string(),
            Command::MoveUp | Command::MoveDown => {
                self.moves += 1;
                if self.moves < self.rallies {
                    return None;
                }
                format!("{}: Left paddle wins after {} moves", wire::GAME_WON, self.moves)
            }
        };
        Some(self.say(session, reply))
    }

    fn say(&self, session: SessionId, text: String) -> TransportEvent {
        debug!(text = %text, "receiver says");
        TransportEvent::MessageReceived {
            session,
            namespace: self.namespace.clone(),
            text,
        }
    }
}

/// Run one simulated game to completion.
pub async fn run(config: &Config, rallies: u32) -> anyhow::Result<()> {
    let transport_backend = MockTransport::new();
    let transport = transport_backend.handle();
    let (discovery_backend, discovery_feed) = MockDiscovery::new();

    let mut controller = Controller::new(
        config,
        Box::new(transport_backend),
        Box::new(discovery_backend),
    );
    let mut status = controller.status_receiver();
    let events = controller.event_sender();
    let notifications = controller
        .take_notifications()
        .context("notification stream already taken")?;

    let receiver = ScriptedReceiver {
        transport: transport.clone(),
        rallies: rallies.max(1),
        moves: 0,
        namespace: config.receiver.namespace.clone(),
    };
    tokio::spawn(receiver.run(transport.subscribe()));
    let printer = tokio::spawn(print_notifications(notifications));
    let handle = tokio::spawn(async move { controller.run().await });

    let route = DeviceRoute::new("simulated", "Simulated receiver");
    discovery_feed
        .send(DiscoveryEvent::NetworkChanged { available: true })
        .await?;
    discovery_feed
        .send(DiscoveryEvent::RouteAdded(route.clone()))
        .await?;
    wait_for(&mut status, "a receiver", |s| {
        s.session == SessionState::RouteAvailable
    })
    .await?;

    events.send(ControllerEvent::SelectRoute(route.id)).await?;
    wait_for(&mut status, "a paddle", |s| s.court == CourtState::ReadyForGame).await?;

    let request = |intent| ControllerEvent::Intent(PlayerIntent::Request(intent));
    events.send(request(Intent::Start)).await?;
    wait_for(&mut status, "the game to start", |s| s.court == CourtState::InPlay).await?;

    // Pause halfway through and resume.
    let halfway = rallies / 2;
    for n in 0..rallies.saturating_mul(4) {
        if status.borrow().court != CourtState::InPlay {
            break;
        }
        if n == halfway {
            events.send(request(Intent::Pause)).await?;
            wait_for(&mut status, "the pause", |s| s.court == CourtState::Paused).await?;
            events.send(request(Intent::Start)).await?;
            wait_for(&mut status, "the game to resume", |s| {
                s.court == CourtState::InPlay
            })
            .await?;
        }
        let intent = if n % 2 == 0 {
            Intent::PaddleUp
        } else {
            Intent::PaddleDown
        };
        events.send(request(intent)).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    wait_for(&mut status, "the game to end", |s| s.court == CourtState::Over).await?;

    events.send(ControllerEvent::Disconnect).await?;
    wait_for(&mut status, "the disconnect", |s| {
        s.session == SessionState::RouteAvailable
    })
    .await?;
    events.send(ControllerEvent::Shutdown).await?;

    handle.await??;
    printer.await?;
    Ok(())
}

async fn wait_for(
    status: &mut watch::Receiver<ControllerStatus>,
    what: &str,
    pred: impl Fn(&ControllerStatus) -> bool,
) -> anyhow::Result<()> {
    let waited = tokio::time::timeout(STEP_TIMEOUT, async {
        loop {
            let ready = pred(&*status.borrow_and_update());
            if ready {
                return true;
            }
            if status.changed().await.is_err() {
                return false;
            }
        }
    })
    .await;
    match waited {
        Ok(true) => Ok(()),
        Ok(false) => bail!("controller stopped while waiting for {what}"),
        Err(_) => bail!("timed out waiting for {what}"),
    }
}

async fn print_notifications(mut notifications: mpsc::Receiver<Notification>) {
    while let Some(notification) = notifications.recv().await {
        match notification {
            Notification::CourtStateChanged(court) => println!("court: {court}"),
            Notification::PaddleChanged(Some(side)) => println!("paddle: {side}"),
            Notification::PaddleChanged(None) => println!("paddle: none"),
            Notification::UserMessage(text) => println!(">> {text}"),
            Notification::Discarded(discard) => debug!(?discard, "discarded"),
        }
    }
}
