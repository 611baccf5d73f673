//! Wire format: bare UTF-8 text lines.
//!
//! Commands are sent exactly as their literal (`StartPlay`, `PausePlay`,
//! `MoveUp`, `MoveDown`). Receiver messages are matched case-sensitively:
//!
//!   `PADDLE NONE`
//!   `PADDLE YES LEFT` | `PADDLE YES RIGHT`
//!   `GAME STARTED` | `GAME PAUSED`
//!   `GAME WON[: text]` | `GAME LOST[: text]`
//!
//! Anything else is unrecognized.

use pongcast_types::{Command, GameOutcome, ReceiverMessage};

use crate::error::ProtocolError;

pub const PADDLE_NONE: &str = "PADDLE NONE";
pub const PADDLE_YES_PREFIX: &str = "PADDLE YES";
pub const GAME_STARTED: &str = "GAME STARTED";
pub const GAME_PAUSED: &str = "GAME PAUSED";
pub const GAME_WON: &str = "GAME WON";
pub const GAME_LOST: &str = "GAME LOST";

/// Encode a command for the session channel.
pub fn encode_command(command: Command) -> &'static str {
    command.as_str()
}

/// Decode a command literal, as the receiver would.
pub fn decode_command(text: &str) -> Result<Command, ProtocolError> {
    Ok(text.parse()?)
}

/// Decode one receiver message.
pub fn decode_message(text: &str) -> Result<ReceiverMessage, ProtocolError> {
    let unrecognized = || ProtocolError::UnrecognizedMessage(text.to_string());

    match text {
        PADDLE_NONE => return Ok(ReceiverMessage::NoPaddle),
        GAME_STARTED => return Ok(ReceiverMessage::GameStarted),
        GAME_PAUSED => return Ok(ReceiverMessage::GamePaused),
        _ => {}
    }

    if let Some(rest) = text.strip_prefix(PADDLE_YES_PREFIX) {
        let side = rest
            .strip_prefix(' ')
            .and_then(|token| token.parse().ok())
            .ok_or_else(unrecognized)?;
        return Ok(ReceiverMessage::GotPaddle(side));
    }

    for (prefix, outcome) in [(GAME_WON, GameOutcome::Won), (GAME_LOST, GameOutcome::Lost)] {
        if let Some(rest) = text.strip_prefix(prefix) {
            let detail = trailing_detail(rest).ok_or_else(unrecognized)?;
            return Ok(ReceiverMessage::GameOver { outcome, detail });
        }
    }

    Err(unrecognized())
}

/// Encode a receiver message, as the receiver would.
pub fn encode_message(message: &ReceiverMessage) -> String {
    match message {
        ReceiverMessage::NoPaddle => PADDLE_NONE.to_string(),
        ReceiverMessage::GotPaddle(side) => format!("{PADDLE_YES_PREFIX} {}", side.token()),
        ReceiverMessage::GameStarted => GAME_STARTED.to_string(),
        ReceiverMessage::GamePaused => GAME_PAUSED.to_string(),
        ReceiverMessage::GameOver { outcome, detail } => {
            let head = match outcome {
                GameOutcome::Won => GAME_WON,
                GameOutcome::Lost => GAME_LOST,
            };
            match detail {
                Some(text) => format!("{head}: {text}"),
                None => head.to_string(),
            }
        }
    }
}

/// Split the optional free text after `GAME WON` / `GAME LOST`.
///
/// Returns `None` when the prefix is glued to more letters (`GAME WONDER`),
/// `Some(None)` when nothing follows.
#[allow(clippy::option_option)]
fn trailing_detail(rest: &str) -> Option<Option<String>> {
    if rest.is_empty() {
        return Some(None);
    }
    if !rest.starts_with(':') && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let detail = rest.strip_prefix(':').unwrap_or(rest).trim();
    if detail.is_empty() {
        Some(None)
    } else {
        Some(Some(detail.to_string()))
    }
}
