use blockytry_common::ticks_in;
use std::time::{Duration, Instant};

/// One press-to-release interval of a single physical key.
///
/// Created open on key-down; completed exactly once on key-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pressed_at: Instant,
    released_at: Option<Instant>,
    /// Set once a prune boundary has passed with this event still stored.
    observed: bool,
}

impl KeyEvent {
    pub(crate) fn pressed(at: Instant) -> Self {
        Self {
            pressed_at: at,
            released_at: None,
            observed: false,
        }
    }

    pub(crate) fn complete(&mut self, at: Instant) {
        debug_assert!(self.released_at.is_none());
        self.released_at = Some(at);
    }

    pub(crate) fn observe(&mut self) {
        self.observed = true;
    }

    pub fn pressed_at(&self) -> Instant {
        self.pressed_at
    }

    pub fn released_at(&self) -> Option<Instant> {
        self.released_at
    }

    pub fn is_complete(&self) -> bool {
        self.released_at.is_some()
    }

    /// Whether this press was already stored at the last tick boundary.
    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// Time since the press, measured at `now`.
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.pressed_at)
    }

    /// Whole ticks since the press, measured at `now`.
    pub fn ticks_elapsed(&self, now: Instant) -> u64 {
        ticks_in(self.elapsed(now))
    }

    /// How long the key was held. `None` while the key is still down.
    pub fn held_duration(&self) -> Option<Duration> {
        self.released_at
            .map(|released| released.saturating_duration_since(self.pressed_at))
    }

    /// Whole ticks the key was held. `None` while the key is still down.
    pub fn ticks_held(&self) -> Option<u64> {
        self.held_duration().map(ticks_in)
    }
}
