//! What the presentation layer should render for a court state.

use pongcast_types::CourtState;
use serde::Serialize;

use crate::config::Strings;
use crate::game::Intent;

/// Enabled controls and status line for one court state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlPanel {
    pub start_enabled: bool,
    pub paddle_enabled: bool,
    pub pause_enabled: bool,
    /// `None` while a paddle is held and the game is running or about to.
    pub status: Option<String>,
}

impl ControlPanel {
    pub fn for_court(court: CourtState, strings: &Strings) -> Self {
        let status = match court {
            CourtState::Initial
            | CourtState::ReadyForGame
            | CourtState::InPlay
            | CourtState::Paused => None,
            CourtState::NoTransport => Some(&strings.enable_network),
            CourtState::NoCourtAvailable => Some(&strings.no_court),
            CourtState::CourtAvailable => Some(&strings.select_court),
            CourtState::WaitingToEnter => Some(&strings.waiting),
            CourtState::Entering => Some(&strings.preparing),
            CourtState::OnCourt => Some(&strings.on_court),
            CourtState::Over => Some(&strings.game_over),
        };

        Self {
            start_enabled: Intent::Start.is_legal_in(court),
            paddle_enabled: Intent::PaddleUp.is_legal_in(court),
            pause_enabled: Intent::Pause.is_legal_in(court),
            status: status.cloned(),
        }
    }
}
