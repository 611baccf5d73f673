//! Session, court and paddle states.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Connectivity to the receiver, as tracked by the session coordinator.
///
/// Variants are declared in canonical order; comparisons follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No network path to any device.
    NoTransport,
    /// Network present, no receiver discovered.
    NoRouteAvailable,
    /// At least one receiver can be selected.
    RouteAvailable,
    /// A route was selected and the transport is connecting (or resuming).
    Connecting,
    /// The transport session dropped and is recovering silently.
    ConnectionSuspended,
    /// Transport session up, remote application not confirmed ready.
    Connected,
    /// Message channel open.
    ChannelReady,
}

impl SessionState {
    /// Whether a session is waiting on the transport to resolve.
    ///
    /// These states are bounded by the connect timeout.
    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::Connecting | Self::ConnectionSuspended | Self::Connected
        )
    }

    /// Whether a route may be selected from this state.
    pub fn can_select_route(self) -> bool {
        matches!(
            self,
            Self::NoRouteAvailable | Self::RouteAvailable | Self::ChannelReady
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTransport => write!(f, "NoTransport"),
            Self::NoRouteAvailable => write!(f, "NoRouteAvailable"),
            Self::RouteAvailable => write!(f, "RouteAvailable"),
            Self::Connecting => write!(f, "Connecting"),
            Self::ConnectionSuspended => write!(f, "ConnectionSuspended"),
            Self::Connected => write!(f, "Connected"),
            Self::ChannelReady => write!(f, "ChannelReady"),
        }
    }
}

/// Game-level view of the receiver: whether we are on the court and what the
/// game is doing.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CourtState {
    #[default]
    Initial,
    NoTransport,
    NoCourtAvailable,
    CourtAvailable,
    WaitingToEnter,
    Entering,
    OnCourt,
    ReadyForGame,
    InPlay,
    Paused,
    Over,
}

impl CourtState {
    /// The court bucket implied by a session state alone.
    ///
    /// `ChannelReady` maps to `OnCourt`; everything past that needs game
    /// messages from the receiver.
    pub fn for_session(state: SessionState) -> Self {
        match state {
            SessionState::NoTransport => Self::NoTransport,
            SessionState::NoRouteAvailable => Self::NoCourtAvailable,
            SessionState::RouteAvailable => Self::CourtAvailable,
            SessionState::Connecting | SessionState::ConnectionSuspended => Self::WaitingToEnter,
            SessionState::Connected => Self::Entering,
            SessionState::ChannelReady => Self::OnCourt,
        }
    }

    /// Whether the receiver's game logic has accepted us.
    pub fn is_on_court(self) -> bool {
        self >= Self::OnCourt
    }

    /// Whether a paddle assignment may be held in this state.
    pub fn may_hold_paddle(self) -> bool {
        matches!(
            self,
            Self::OnCourt | Self::ReadyForGame | Self::InPlay | Self::Paused
        )
    }
}

impl std::fmt::Display for CourtState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Initial => "Initial",
            Self::NoTransport => "NoTransport",
            Self::NoCourtAvailable => "NoCourtAvailable",
            Self::CourtAvailable => "CourtAvailable",
            Self::WaitingToEnter => "WaitingToEnter",
            Self::Entering => "Entering",
            Self::OnCourt => "OnCourt",
            Self::ReadyForGame => "ReadyForGame",
            Self::InPlay => "InPlay",
            Self::Paused => "Paused",
            Self::Over => "Over",
        };
        f.write_str(name)
    }
}

/// Which side of the court the receiver granted us.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaddleSide {
    Left,
    Right,
}

impl PaddleSide {
    /// Token used on the wire (`PADDLE YES LEFT`).
    pub fn token(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
        }
    }
}

impl FromStr for PaddleSide {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            other => Err(TokenError::UnknownSide(other.to_string())),
        }
    }
}

impl std::fmt::Display for PaddleSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}
