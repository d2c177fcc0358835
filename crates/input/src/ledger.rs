use crate::event::KeyEvent;
use blockytry_common::Scancode;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::{Duration, Instant};

/// Broken input-delivery contract from the window system.
///
/// These are not user-facing conditions. Callers are expected to treat them
/// as fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("key {scancode} pressed again without an intervening release")]
    DoublePress { scancode: Scancode },
    #[error("key {scancode} released without a matching press")]
    ReleaseWithoutPress { scancode: Scancode },
    #[error("key {scancode} released before it was pressed")]
    ReleaseBeforePress { scancode: Scancode },
}

/// Ordered press/release history per scancode.
///
/// Queries answer "what happened to this key since the last tick boundary";
/// [`KeyLedger::prune`] marks that boundary and must run once per tick after
/// the tick's logic has read the ledger.
///
/// Uses BTreeMap so iteration (and therefore pruning and logging) is ordered.
#[derive(Debug, Clone, Default)]
pub struct KeyLedger {
    keys: BTreeMap<Scancode, VecDeque<KeyEvent>>,
    /// Scancodes with a press or release since the last prune.
    touched: BTreeSet<Scancode>,
}

impl KeyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new open event for `scancode`.
    pub fn record_press(&mut self, scancode: Scancode, at: Instant) -> Result<(), LedgerError> {
        let events = self.keys.entry(scancode).or_default();
        if events.back().is_some_and(|e| !e.is_complete()) {
            return Err(LedgerError::DoublePress { scancode });
        }
        events.push_back(KeyEvent::pressed(at));
        self.touched.insert(scancode);
        tracing::trace!(%scancode, "key pressed");
        Ok(())
    }

    /// Complete the open event for `scancode`.
    pub fn record_release(&mut self, scancode: Scancode, at: Instant) -> Result<(), LedgerError> {
        let open = self
            .keys
            .get_mut(&scancode)
            .and_then(|events| events.back_mut())
            .filter(|e| !e.is_complete())
            .ok_or(LedgerError::ReleaseWithoutPress { scancode })?;
        if at < open.pressed_at() {
            return Err(LedgerError::ReleaseBeforePress { scancode });
        }
        open.complete(at);
        self.touched.insert(scancode);
        tracing::trace!(%scancode, "key released");
        Ok(())
    }

    /// Complete every open event at `at`. Returns how many were closed.
    ///
    /// Used when the window loses focus and release callbacks will not arrive.
    pub fn release_all(&mut self, at: Instant) -> usize {
        let mut closed = 0;
        for (scancode, events) in &mut self.keys {
            if let Some(open) = events.back_mut().filter(|e| !e.is_complete()) {
                let released = at.max(open.pressed_at());
                open.complete(released);
                self.touched.insert(*scancode);
                closed += 1;
            }
        }
        if closed > 0 {
            tracing::debug!(closed, "released all open keys");
        }
        closed
    }

    /// Full stored history for `scancode`, oldest first.
    pub fn events(&self, scancode: Scancode) -> impl Iterator<Item = &KeyEvent> {
        self.keys.get(&scancode).into_iter().flatten()
    }

    /// Stored events for `scancode` that have been released.
    pub fn complete(&self, scancode: Scancode) -> impl Iterator<Item = &KeyEvent> {
        self.events(scancode).filter(|e| e.is_complete())
    }

    /// Number of presses of `scancode` recorded since the last prune.
    ///
    /// A key that was already down at the previous tick boundary does not
    /// count, so a toggle bound to this fires once per physical press.
    pub fn is_down(&self, scancode: Scancode) -> usize {
        self.events(scancode).filter(|e| !e.is_observed()).count()
    }

    /// Number of stored events of `scancode` that have been released.
    pub fn is_up(&self, scancode: Scancode) -> usize {
        self.complete(scancode).count()
    }

    /// Whether `scancode` currently has an open press.
    pub fn is_pressed(&self, scancode: Scancode) -> bool {
        self.open(scancode).is_some()
    }

    /// Whole ticks the current press of `scancode` has lasted at `now`.
    ///
    /// Zero when the key is not down. A press younger than one tick also
    /// reads zero.
    pub fn held_ticks(&self, scancode: Scancode, now: Instant) -> u64 {
        self.open(scancode).map_or(0, |e| e.ticks_elapsed(now))
    }

    /// Time the current press of `scancode` has lasted at `now`.
    pub fn held_for(&self, scancode: Scancode, now: Instant) -> Option<Duration> {
        self.open(scancode).map(|e| e.elapsed(now))
    }

    /// Scancodes with an open press, in ascending order.
    pub fn pressed_keys(&self) -> impl Iterator<Item = Scancode> + '_ {
        self.keys
            .iter()
            .filter(|(_, events)| events.back().is_some_and(|e| !e.is_complete()))
            .map(|(scancode, _)| *scancode)
    }

    /// Total number of stored events across all scancodes.
    pub fn len(&self) -> usize {
        self.keys.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the current tick.
    ///
    /// For every scancode touched since the last prune, drops its completed
    /// events and marks the remaining open press as observed. Scancodes with
    /// no activity are left alone, so a second prune with no input in between
    /// changes nothing.
    pub fn prune(&mut self) {
        let mut removed = 0usize;
        for scancode in std::mem::take(&mut self.touched) {
            let Some(events) = self.keys.get_mut(&scancode) else {
                continue;
            };
            let before = events.len();
            events.retain(|e| !e.is_complete());
            removed += before - events.len();
            for event in events.iter_mut() {
                event.observe();
            }
            if events.is_empty() {
                self.keys.remove(&scancode);
            }
        }
        if removed > 0 {
            tracing::trace!(removed, "pruned completed key events");
        }
    }

    fn open(&self, scancode: Scancode) -> Option<&KeyEvent> {
        self.keys
            .get(&scancode)
            .and_then(|events| events.back())
            .filter(|e| !e.is_complete())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: Scancode = Scancode(17);
    const T: Scancode = Scancode(20);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn ledger_starts_empty() {
        let ledger = KeyLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.is_down(W), 0);
        assert_eq!(ledger.is_up(W), 0);
        assert_eq!(ledger.held_ticks(W, Instant::now()), 0);
    }

    #[test]
    fn double_press_is_rejected() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0).unwrap();
        assert_eq!(
            ledger.record_press(W, t0 + ms(10)),
            Err(LedgerError::DoublePress { scancode: W })
        );
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn release_without_press_is_rejected() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        assert_eq!(
            ledger.record_release(W, t0),
            Err(LedgerError::ReleaseWithoutPress { scancode: W })
        );

        ledger.record_press(W, t0).unwrap();
        ledger.record_release(W, t0 + ms(5)).unwrap();
        assert_eq!(
            ledger.record_release(W, t0 + ms(6)),
            Err(LedgerError::ReleaseWithoutPress { scancode: W })
        );
    }

    #[test]
    fn release_before_press_is_rejected() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0 + ms(10)).unwrap();
        assert_eq!(
            ledger.record_release(W, t0),
            Err(LedgerError::ReleaseBeforePress { scancode: W })
        );
        assert!(ledger.is_pressed(W));
    }

    #[test]
    fn only_last_event_may_be_open() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        for i in 0..4u64 {
            ledger.record_press(W, t0 + ms(i * 10)).unwrap();
            ledger.record_release(W, t0 + ms(i * 10 + 5)).unwrap();
        }
        ledger.record_press(W, t0 + ms(40)).unwrap();

        let events: Vec<_> = ledger.events(W).collect();
        assert_eq!(events.len(), 5);
        let (last, earlier) = events.split_last().unwrap();
        assert!(earlier.iter().all(|e| e.is_complete()));
        assert!(!last.is_complete());
    }

    #[test]
    fn rapid_taps_within_a_tick_are_kept_until_prune() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(T, t0).unwrap();
        ledger.record_release(T, t0 + ms(5)).unwrap();
        ledger.record_press(T, t0 + ms(10)).unwrap();
        ledger.record_release(T, t0 + ms(15)).unwrap();

        assert_eq!(ledger.is_down(T), 2);
        assert_eq!(ledger.is_up(T), 2);
        assert_eq!(ledger.complete(T).count(), 2);
        assert_eq!(ledger.held_ticks(T, t0 + ms(20)), 0);

        ledger.prune();
        assert_eq!(ledger.events(T).count(), 0);
        assert_eq!(ledger.is_down(T), 0);
    }

    #[test]
    fn is_down_fires_once_per_press() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(T, t0 + ms(10)).unwrap();

        // Tick 1 sees the new press.
        assert_eq!(ledger.is_down(T), 1);
        ledger.prune();

        // Still held on tick 2 and 3: not newly down.
        assert_eq!(ledger.is_down(T), 0);
        ledger.prune();
        assert_eq!(ledger.is_down(T), 0);
        assert!(ledger.is_pressed(T));
    }

    #[test]
    fn release_and_repress_counts_only_the_new_press() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0).unwrap();
        ledger.prune();

        ledger.record_release(W, t0 + ms(120)).unwrap();
        ledger.record_press(W, t0 + ms(130)).unwrap();
        assert_eq!(ledger.is_down(W), 1);
        assert_eq!(ledger.is_up(W), 1);

        ledger.prune();
        let events: Vec<_> = ledger.events(W).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pressed_at(), t0 + ms(130));
    }

    #[test]
    fn held_ticks_is_zero_after_release() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0).unwrap();
        assert_eq!(ledger.held_ticks(W, t0 + ms(150)), 3);
        ledger.record_release(W, t0 + ms(155)).unwrap();
        assert_eq!(ledger.held_ticks(W, t0 + ms(200)), 0);
        assert_eq!(ledger.held_for(W, t0 + ms(200)), None);
    }

    #[test]
    fn held_ticks_is_monotonic_while_held() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0).unwrap();
        let mut last = 0;
        for step in 0..40u64 {
            let held = ledger.held_ticks(W, t0 + ms(step * 17));
            assert!(held >= last);
            last = held;
            if step % 3 == 0 {
                ledger.prune();
            }
        }
        assert_eq!(last, ticks_at(39 * 17));
    }

    fn ticks_at(millis: u64) -> u64 {
        millis / 50
    }

    #[test]
    fn prune_is_idempotent() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0).unwrap();
        ledger.record_release(W, t0 + ms(20)).unwrap();
        ledger.record_press(W, t0 + ms(30)).unwrap();
        ledger.record_press(T, t0 + ms(35)).unwrap();

        ledger.prune();
        let after_first: Vec<KeyEvent> = ledger.events(W).chain(ledger.events(T)).cloned().collect();
        ledger.prune();
        let after_second: Vec<KeyEvent> =
            ledger.events(W).chain(ledger.events(T)).cloned().collect();
        assert_eq!(after_first, after_second);
        assert_eq!(after_second.len(), 2);
    }

    #[test]
    fn release_all_closes_open_presses() {
        let t0 = Instant::now();
        let mut ledger = KeyLedger::new();
        ledger.record_press(W, t0).unwrap();
        ledger.record_press(T, t0).unwrap();
        assert_eq!(ledger.pressed_keys().collect::<Vec<_>>(), vec![W, T]);

        assert_eq!(ledger.release_all(t0 + ms(60)), 2);
        assert!(!ledger.is_pressed(W));
        assert!(!ledger.is_pressed(T));
        assert_eq!(ledger.release_all(t0 + ms(70)), 0);

        ledger.prune();
        assert!(ledger.is_empty());
        // A fresh press is accepted after a forced release.
        ledger.record_press(W, t0 + ms(80)).unwrap();
    }
}
