//! Game coordinator: court state, paddle assignment and player intents.
//!
//! The court state is a refinement of the session state. Session events
//! drive it up to `OnCourt`; past that, only receiver messages move it. Any
//! session regression below `ChannelReady` snaps it back to the matching
//! pre-game bucket in the same step.

use pongcast_protocol::wire;
use pongcast_types::{Command, CourtState, GameOutcome, PaddleSide, ReceiverMessage, SessionState};
use tracing::{debug, info};

use crate::config::Strings;
use crate::error::GameError;
use crate::session::{SessionCoordinator, SessionEvent};

/// Something the player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Start,
    PaddleUp,
    PaddleDown,
    Pause,
}

impl Intent {
    pub fn command(self) -> Command {
        match self {
            Self::Start => Command::StartPlay,
            Self::PaddleUp => Command::MoveUp,
            Self::PaddleDown => Command::MoveDown,
            Self::Pause => Command::PausePlay,
        }
    }

    /// Client-side guard. The receiver stays authoritative.
    ///
    /// Start is also how a paused game is resumed.
    pub fn is_legal_in(self, court: CourtState) -> bool {
        match self {
            Self::Start => matches!(court, CourtState::ReadyForGame | CourtState::Paused),
            Self::PaddleUp | Self::PaddleDown | Self::Pause => court == CourtState::InPlay,
        }
    }

    pub fn is_paddle_move(self) -> bool {
        matches!(self, Self::PaddleUp | Self::PaddleDown)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::PaddleUp => write!(f, "paddle up"),
            Self::PaddleDown => write!(f, "paddle down"),
            Self::Pause => write!(f, "pause"),
        }
    }
}

/// What the presentation layer is told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    CourtStateChanged(CourtState),
    PaddleChanged(Option<PaddleSide>),
    /// Transient toast-style text.
    UserMessage(String),
    /// Diagnostic: an input was dropped without effect.
    Discarded(Discard),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discard {
    Unrecognized(String),
    IllegalForState {
        message: ReceiverMessage,
        court: CourtState,
    },
    IntentRejected {
        intent: Intent,
        court: CourtState,
    },
}

pub struct GameCoordinator {
    strings: Strings,
    court: CourtState,
    paddle: Option<PaddleSide>,
    notifications: Vec<Notification>,
}

impl GameCoordinator {
    pub fn new(strings: Strings) -> Self {
        Self {
            strings,
            court: CourtState::Initial,
            paddle: None,
            notifications: Vec::new(),
        }
    }

    pub fn court(&self) -> CourtState {
        self.court
    }

    pub fn paddle(&self) -> Option<PaddleSide> {
        self.paddle
    }

    pub fn strings(&self) -> &Strings {
        &self.strings
    }

    /// Take the notifications emitted since the last call.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Fold one session event into the court state.
    pub fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StateChanged(SessionState::ChannelReady) => {
                if self.court < CourtState::OnCourt {
                    self.set_court(CourtState::OnCourt);
                }
            }
            SessionEvent::StateChanged(state) => {
                // Unconditional: whatever the game was doing, it is gone.
                self.set_court(CourtState::for_session(state));
                self.set_paddle(None);
            }
            SessionEvent::Message(text) => self.on_message(&text),
            SessionEvent::SendFailed { text } => {
                debug!(text = %text, "delivery failed");
                self.user_message(self.strings.send_failed.clone());
            }
            SessionEvent::SessionLost(reason) => {
                debug!(%reason, "session lost");
                self.user_message(self.strings.session_lost.clone());
            }
        }
    }

    /// Interpret one raw receiver message.
    ///
    /// Unrecognized text and messages that are not legal for the current
    /// court state are dropped and reported as [`Notification::Discarded`].
    pub fn on_message(&mut self, raw: &str) {
        match wire::decode_message(raw) {
            Ok(message) => self.on_receiver_message(message),
            Err(e) => {
                debug!(error = %e, "ignoring receiver message");
                self.notifications
                    .push(Notification::Discarded(Discard::Unrecognized(raw.to_string())));
            }
        }
    }

    fn on_receiver_message(&mut self, message: ReceiverMessage) {
        match (self.court, message) {
            (CourtState::OnCourt, ReceiverMessage::NoPaddle) => {
                info!("no paddle available");
                self.user_message(self.strings.no_paddle.clone());
            }
            (CourtState::OnCourt, ReceiverMessage::GotPaddle(side)) => {
                info!(%side, "paddle assigned");
                self.set_court(CourtState::ReadyForGame);
                self.set_paddle(Some(side));
                self.user_message(self.strings.got_paddle(side));
            }
            (
                CourtState::ReadyForGame | CourtState::Paused,
                ReceiverMessage::GameStarted,
            ) => self.set_court(CourtState::InPlay),
            (CourtState::InPlay, ReceiverMessage::GamePaused) => self.set_court(CourtState::Paused),
            (CourtState::InPlay, ReceiverMessage::GameOver { outcome, detail }) => {
                let text = detail.unwrap_or_else(|| match outcome {
                    GameOutcome::Won => self.strings.game_won.clone(),
                    GameOutcome::Lost => self.strings.game_lost.clone(),
                });
                info!(?outcome, "game over");
                self.set_court(CourtState::Over);
                self.user_message(text);
            }
            (court, message) => {
                debug!(%court, ?message, "message not legal for court state");
                self.notifications
                    .push(Notification::Discarded(Discard::IllegalForState { message, court }));
            }
        }
    }

    pub async fn request_start(
        &mut self,
        session: &mut SessionCoordinator,
    ) -> Result<Command, GameError> {
        self.request(Intent::Start, session).await
    }

    pub async fn request_paddle_up(
        &mut self,
        session: &mut SessionCoordinator,
    ) -> Result<Command, GameError> {
        self.request(Intent::PaddleUp, session).await
    }

    pub async fn request_paddle_down(
        &mut self,
        session: &mut SessionCoordinator,
    ) -> Result<Command, GameError> {
        self.request(Intent::PaddleDown, session).await
    }

    pub async fn request_pause(
        &mut self,
        session: &mut SessionCoordinator,
    ) -> Result<Command, GameError> {
        self.request(Intent::Pause, session).await
    }

    /// Send the command for `intent` if the court state allows it.
    ///
    /// Returns the command that was handed to the session. Delivery failures
    /// come back later as session events.
    pub async fn request(
        &mut self,
        intent: Intent,
        session: &mut SessionCoordinator,
    ) -> Result<Command, GameError> {
        if !intent.is_legal_in(self.court) {
            debug!(%intent, court = %self.court, "intent not legal, not sent");
            self.notifications
                .push(Notification::Discarded(Discard::IntentRejected {
                    intent,
                    court: self.court,
                }));
            return Err(GameError::NotLegal {
                intent,
                state: self.court,
            });
        }

        let command = intent.command();
        session.send(wire::encode_command(command)).await?;
        debug!(%intent, %command, "command sent");
        Ok(command)
    }

    /// Back to `Initial`, as on full teardown.
    pub fn reset(&mut self) {
        self.set_court(CourtState::Initial);
        self.set_paddle(None);
    }

    fn set_court(&mut self, next: CourtState) {
        if next == self.court {
            return;
        }
        info!(from = %self.court, to = %next, "court state changed");
        self.court = next;
        self.notifications.push(Notification::CourtStateChanged(next));
        if !next.may_hold_paddle() {
            self.set_paddle(None);
        }
    }

    fn set_paddle(&mut self, paddle: Option<PaddleSide>) {
        if paddle != self.paddle {
            self.paddle = paddle;
            self.notifications.push(Notification::PaddleChanged(paddle));
        }
    }

    fn user_message(&mut self, text: String) {
        self.notifications.push(Notification::UserMessage(text));
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::{LossReason, SessionSettings};
    use pongcast_protocol::mock::{MockTransport, MockTransportHandle};
    use pongcast_types::DeviceRoute;

    const NAMESPACE: &str = "urn:x-cast:pongcast";

    struct Rig {
        session: SessionCoordinator,
        game: GameCoordinator,
        transport: MockTransportHandle,
    }

    impl Rig {
        fn new() -> Self {
            let transport = MockTransport::new();
            let handle = transport.handle();
            let settings = SessionSettings {
                app_id: "APP".to_string(),
                namespace: NAMESPACE.to_string(),
                connect_timeout: Duration::from_secs(10),
                launch_retries: 1,
            };
            Self {
                session: SessionCoordinator::new(settings, Box::new(transport)),
                game: GameCoordinator::new(Strings::default()),
                transport: handle,
            }
        }

        /// Deliver pending session events to the game, checking the safety
        /// invariant after each fold.
        fn pump(&mut self) {
            for event in self.session.drain_events() {
                self.game.on_session_event(event);
                if self.session.state() < SessionState::ChannelReady {
                    assert!(
                        self.game.court() <= CourtState::OnCourt,
                        "court {} with session {}",
                        self.game.court(),
                        self.session.state()
                    );
                }
            }
        }

        async fn on_court(&mut self) {
            self.session.on_network_availability_changed(true).await;
            self.session.on_route_added(DeviceRoute::new("tv", "Living room"));
            let id = self
                .session
                .select_route(DeviceRoute::new("tv", "Living room"))
                .await
                .unwrap();
            self.session.on_connected(id, true).await;
            self.session.on_launch_result(id, true).await;
            self.pump();
            assert_eq!(self.game.court(), CourtState::OnCourt);
            self.game.drain_notifications();
        }

        async fn in_play(&mut self) {
            self.on_court().await;
            self.game.on_message("PADDLE YES LEFT");
            self.game.on_message("GAME STARTED");
            assert_eq!(self.game.court(), CourtState::InPlay);
            self.game.drain_notifications();
        }
    }

    fn user_messages(notifications: &[Notification]) -> Vec<String> {
        notifications
            .iter()
            .filter_map(|n| match n {
                Notification::UserMessage(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn session_states_walk_the_pre_game_buckets() {
        let mut rig = Rig::new();
        rig.session.on_network_availability_changed(false).await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::NoTransport);

        rig.session.on_network_availability_changed(true).await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::NoCourtAvailable);

        rig.session.on_route_added(DeviceRoute::new("tv", "Living room"));
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::CourtAvailable);

        let id = rig
            .session
            .select_route(DeviceRoute::new("tv", "Living room"))
            .await
            .unwrap();
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::WaitingToEnter);

        rig.session.on_connected(id, true).await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::Entering);

        rig.session.on_launch_result(id, true).await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::OnCourt);
    }

    #[tokio::test]
    async fn paddle_assignment_readies_the_game() {
        let mut rig = Rig::new();
        rig.on_court().await;

        rig.game.on_message("PADDLE YES LEFT");
        assert_eq!(rig.game.court(), CourtState::ReadyForGame);
        assert_eq!(rig.game.paddle(), Some(PaddleSide::Left));
        assert_eq!(
            rig.game.drain_notifications(),
            vec![
                Notification::CourtStateChanged(CourtState::ReadyForGame),
                Notification::PaddleChanged(Some(PaddleSide::Left)),
                Notification::UserMessage("You got left paddle".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn no_paddle_stays_on_court() {
        let mut rig = Rig::new();
        rig.on_court().await;

        rig.game.on_message("PADDLE NONE");
        assert_eq!(rig.game.court(), CourtState::OnCourt);
        assert_eq!(rig.game.paddle(), None);
        assert_eq!(
            user_messages(&rig.game.drain_notifications()),
            vec!["Sorry, no paddle for you!".to_string()]
        );
    }

    #[test]
    fn paddle_assignment_off_court_is_dropped() {
        let mut game = GameCoordinator::new(Strings::default());
        game.on_session_event(SessionEvent::StateChanged(SessionState::NoRouteAvailable));
        game.drain_notifications();

        game.on_message("PADDLE YES LEFT");
        assert_eq!(game.court(), CourtState::NoCourtAvailable);
        assert_eq!(game.paddle(), None);
        assert_eq!(
            game.drain_notifications(),
            vec![Notification::Discarded(Discard::IllegalForState {
                message: ReceiverMessage::GotPaddle(PaddleSide::Left),
                court: CourtState::NoCourtAvailable,
            })]
        );
    }

    #[tokio::test]
    async fn game_won_with_detail_surfaces_it_verbatim() {
        let mut rig = Rig::new();
        rig.in_play().await;

        rig.game.on_message("GAME WON: Player A");
        assert_eq!(rig.game.court(), CourtState::Over);
        assert_eq!(rig.game.paddle(), None);
        assert_eq!(
            user_messages(&rig.game.drain_notifications()),
            vec!["Player A".to_string()]
        );
    }

    #[tokio::test]
    async fn game_lost_without_detail_uses_default_text() {
        let mut rig = Rig::new();
        rig.in_play().await;

        rig.game.on_message("GAME LOST");
        assert_eq!(rig.game.court(), CourtState::Over);
        assert_eq!(
            user_messages(&rig.game.drain_notifications()),
            vec!["Game lost".to_string()]
        );
    }

    #[tokio::test]
    async fn game_over_before_play_is_dropped() {
        let mut rig = Rig::new();
        rig.on_court().await;
        rig.game.on_message("PADDLE YES RIGHT");
        rig.game.drain_notifications();

        rig.game.on_message("GAME WON: Player A");
        assert_eq!(rig.game.court(), CourtState::ReadyForGame);
        let notifications = rig.game.drain_notifications();
        assert!(user_messages(&notifications).is_empty());
        assert!(matches!(
            notifications.as_slice(),
            [Notification::Discarded(Discard::IllegalForState { .. })]
        ));
    }

    #[tokio::test]
    async fn pause_and_resume() {
        let mut rig = Rig::new();
        rig.in_play().await;

        rig.game.on_message("GAME PAUSED");
        assert_eq!(rig.game.court(), CourtState::Paused);
        assert_eq!(rig.game.paddle(), Some(PaddleSide::Left));

        // Start resumes a paused game.
        assert_eq!(
            rig.game.request_start(&mut rig.session).await.unwrap(),
            Command::StartPlay
        );
        rig.game.on_message("GAME STARTED");
        assert_eq!(rig.game.court(), CourtState::InPlay);

        // Duplicate delivery is harmless.
        rig.game.on_message("GAME STARTED");
        assert_eq!(rig.game.court(), CourtState::InPlay);
    }

    #[tokio::test]
    async fn unrecognized_messages_are_ignored() {
        let mut rig = Rig::new();
        rig.in_play().await;

        for raw in ["game started", "PADDLE YES UP", "HELLO", ""] {
            rig.game.on_message(raw);
        }
        assert_eq!(rig.game.court(), CourtState::InPlay);
        assert!(rig
            .game
            .drain_notifications()
            .iter()
            .all(|n| matches!(n, Notification::Discarded(Discard::Unrecognized(_)))));
    }

    #[tokio::test]
    async fn suspension_regresses_court_and_clears_paddle() {
        let mut rig = Rig::new();
        rig.in_play().await;
        let id = rig.session.session_id().unwrap();

        rig.session.on_connection_suspended(id, 7);
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::WaitingToEnter);
        assert_eq!(rig.game.paddle(), None);

        rig.session.on_connected(id, true).await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::OnCourt);
    }

    #[tokio::test]
    async fn session_loss_regresses_and_notifies() {
        let mut rig = Rig::new();
        rig.in_play().await;
        let id = rig.session.session_id().unwrap();

        rig.session
            .on_connection_failed(id, "gone".to_string())
            .await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::CourtAvailable);
        assert_eq!(rig.game.paddle(), None);
        assert_eq!(
            user_messages(&rig.game.drain_notifications()),
            vec!["Lost connection to the court".to_string()]
        );

        rig.game
            .on_session_event(SessionEvent::SessionLost(LossReason::Timeout));
        assert_eq!(rig.game.court(), CourtState::CourtAvailable);
    }

    #[tokio::test]
    async fn intents_are_guarded_by_court_state() {
        let mut rig = Rig::new();
        rig.on_court().await;

        assert!(matches!(
            rig.game.request_start(&mut rig.session).await,
            Err(GameError::NotLegal {
                intent: Intent::Start,
                state: CourtState::OnCourt
            })
        ));
        assert!(rig.game.request_paddle_up(&mut rig.session).await.is_err());
        assert!(rig.transport.sent_texts().is_empty());

        rig.game.on_message("PADDLE YES RIGHT");
        rig.game.request_start(&mut rig.session).await.unwrap();
        assert!(rig.game.request_pause(&mut rig.session).await.is_err());
        rig.game.on_message("GAME STARTED");
        rig.game.request_paddle_up(&mut rig.session).await.unwrap();
        rig.game.request_paddle_down(&mut rig.session).await.unwrap();
        rig.game.request_pause(&mut rig.session).await.unwrap();

        assert_eq!(
            rig.transport.sent_texts(),
            vec!["StartPlay", "MoveUp", "MoveDown", "PausePlay"]
        );
    }

    #[tokio::test]
    async fn over_is_a_dead_end_until_the_session_moves() {
        let mut rig = Rig::new();
        rig.in_play().await;
        rig.game.on_message("GAME LOST");

        for intent in [Intent::Start, Intent::PaddleUp, Intent::PaddleDown, Intent::Pause] {
            assert!(rig.game.request(intent, &mut rig.session).await.is_err());
        }
        rig.game.on_message("GAME STARTED");
        assert_eq!(rig.game.court(), CourtState::Over);

        rig.session.disconnect().await;
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::CourtAvailable);
    }

    #[tokio::test]
    async fn send_failure_becomes_user_message() {
        let mut rig = Rig::new();
        rig.in_play().await;
        rig.transport.fail_send(true);

        assert!(matches!(
            rig.game.request_paddle_up(&mut rig.session).await,
            Err(GameError::Session(_))
        ));
        rig.pump();
        assert_eq!(rig.game.court(), CourtState::InPlay);
        assert_eq!(
            user_messages(&rig.game.drain_notifications()),
            vec!["Sending failed".to_string()]
        );
    }

    #[test]
    fn reset_returns_to_initial() {
        let mut game = GameCoordinator::new(Strings::default());
        game.on_session_event(SessionEvent::StateChanged(SessionState::ChannelReady));
        game.on_message("PADDLE YES LEFT");
        game.reset();
        assert_eq!(game.court(), CourtState::Initial);
        assert_eq!(game.paddle(), None);
    }

    #[test]
    fn intent_legality_table() {
        use CourtState as C;
        let legal = |intent: Intent| -> Vec<CourtState> {
            [
                C::Initial,
                C::NoTransport,
                C::NoCourtAvailable,
                C::CourtAvailable,
                C::WaitingToEnter,
                C::Entering,
                C::OnCourt,
                C::ReadyForGame,
                C::InPlay,
                C::Paused,
                C::Over,
            ]
            .into_iter()
            .filter(|c| intent.is_legal_in(*c))
            .collect()
        };
        assert_eq!(legal(Intent::Start), vec![C::ReadyForGame, C::Paused]);
        assert_eq!(legal(Intent::PaddleUp), vec![C::InPlay]);
        assert_eq!(legal(Intent::PaddleDown), vec![C::InPlay]);
        assert_eq!(legal(Intent::Pause), vec![C::InPlay]);
    }
}
