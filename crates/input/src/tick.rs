use crate::ledger::KeyLedger;
use blockytry_common::Scancode;
use std::time::Instant;

/// Read-only input view handed to per-tick logic.
///
/// Every query is evaluated at `now`, the instant of the frame that drains
/// the tick, so all consumers within one tick agree.
#[derive(Debug, Clone, Copy)]
pub struct TickInput<'a> {
    pub ledger: &'a KeyLedger,
    pub now: Instant,
    /// Index of the tick being simulated, starting at 1.
    pub tick: u64,
}

impl<'a> TickInput<'a> {
    pub fn new(ledger: &'a KeyLedger, now: Instant, tick: u64) -> Self {
        Self { ledger, now, tick }
    }

    pub fn held_ticks(&self, scancode: Scancode) -> u64 {
        self.ledger.held_ticks(scancode, self.now)
    }

    pub fn is_held(&self, scancode: Scancode) -> bool {
        self.held_ticks(scancode) > 0
    }

    pub fn is_down(&self, scancode: Scancode) -> usize {
        self.ledger.is_down(scancode)
    }

    pub fn is_up(&self, scancode: Scancode) -> usize {
        self.ledger.is_up(scancode)
    }
}
