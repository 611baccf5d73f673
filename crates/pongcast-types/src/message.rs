//! Application message types.
//!
//! Controller and receiver exchange short case-sensitive UTF-8 text lines over
//! the session channel. Commands flow controller -> receiver; receiver
//! messages flow the other way. Encoding and parsing live in
//! `pongcast-protocol`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::state::PaddleSide;

/// Commands the controller may send to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    StartPlay,
    PausePlay,
    MoveUp,
    MoveDown,
}

impl Command {
    pub const ALL: [Self; 4] = [Self::StartPlay, Self::PausePlay, Self::MoveUp, Self::MoveDown];

    /// The exact wire literal.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartPlay => "StartPlay",
            Self::PausePlay => "PausePlay",
            Self::MoveUp => "MoveUp",
            Self::MoveDown => "MoveDown",
        }
    }
}

impl FromStr for Command {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == s)
            .ok_or_else(|| TokenError::UnknownCommand(s.to_string()))
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished game ended for this controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Won,
    Lost,
}

/// Messages the receiver sends to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiverMessage {
    /// `PADDLE NONE`: both paddles are taken.
    NoPaddle,
    /// `PADDLE YES <side>`: we control this side.
    GotPaddle(PaddleSide),
    /// `GAME STARTED`
    GameStarted,
    /// `GAME PAUSED`
    GamePaused,
    /// `GAME WON` / `GAME LOST`, optionally followed by free text for the player.
    GameOver {
        outcome: GameOutcome,
        detail: Option<String>,
    },
}
