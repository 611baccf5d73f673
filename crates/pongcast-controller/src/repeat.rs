//! Auto-repeat for a held paddle control.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::ControlsConfig;
use crate::game::Intent;

/// Tracks one held paddle control and when it fires next.
///
/// The first move is sent on press by the caller; the repeat fires after
/// `initial`, then every `interval`.
#[derive(Debug, Clone)]
pub struct PaddleRepeat {
    initial: Duration,
    interval: Duration,
    held: Option<Held>,
}

#[derive(Debug, Clone, Copy)]
struct Held {
    intent: Intent,
    next: Instant,
}

impl PaddleRepeat {
    pub fn new(initial: Duration, interval: Duration) -> Self {
        Self {
            initial,
            interval,
            held: None,
        }
    }

    pub fn from_config(controls: &ControlsConfig) -> Self {
        Self::new(
            Duration::from_millis(controls.repeat_initial_ms),
            Duration::from_millis(controls.repeat_interval_ms),
        )
    }

    /// Start holding `intent`. Replaces any previous hold.
    pub fn press(&mut self, intent: Intent, now: Instant) {
        self.held = Some(Held {
            intent,
            next: now + self.initial,
        });
    }

    /// Stop holding. Returns what was held.
    pub fn release(&mut self) -> Option<Intent> {
        self.held.take().map(|h| h.intent)
    }

    pub fn held(&self) -> Option<Intent> {
        self.held.map(|h| h.intent)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.held.map(|h| h.next)
    }

    /// The intent to repeat if its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<Intent> {
        let held = self.held.as_mut()?;
        if held.next > now {
            return None;
        }
        held.next = now + self.interval;
        Some(held.intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat() -> PaddleRepeat {
        PaddleRepeat::new(Duration::from_millis(300), Duration::from_millis(80))
    }

    #[test]
    fn fires_after_initial_delay_then_every_interval() {
        let mut r = repeat();
        let t0 = Instant::now();
        r.press(Intent::PaddleUp, t0);

        assert_eq!(r.fire(t0 + Duration::from_millis(299)), None);
        assert_eq!(r.fire(t0 + Duration::from_millis(300)), Some(Intent::PaddleUp));
        assert_eq!(r.deadline(), Some(t0 + Duration::from_millis(380)));
        assert_eq!(r.fire(t0 + Duration::from_millis(350)), None);
        assert_eq!(r.fire(t0 + Duration::from_millis(380)), Some(Intent::PaddleUp));
    }

    #[test]
    fn release_stops_repeating() {
        let mut r = repeat();
        let t0 = Instant::now();
        r.press(Intent::PaddleDown, t0);
        assert_eq!(r.release(), Some(Intent::PaddleDown));
        assert_eq!(r.deadline(), None);
        assert_eq!(r.fire(t0 + Duration::from_secs(1)), None);
        assert_eq!(r.release(), None);
    }

    #[test]
    fn new_press_replaces_hold() {
        let mut r = repeat();
        let t0 = Instant::now();
        r.press(Intent::PaddleUp, t0);
        r.press(Intent::PaddleDown, t0 + Duration::from_millis(100));
        assert_eq!(r.held(), Some(Intent::PaddleDown));
        assert_eq!(r.deadline(), Some(t0 + Duration::from_millis(400)));
    }
}
