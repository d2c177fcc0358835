//! Simulation time constants.
//!
//! All discrete simulation time advances in whole multiples of
//! [`TICK_DURATION`]. None of these are configurable at runtime.

use std::time::Duration;

/// Length of one simulation tick: 50 ms.
pub const TICK_DURATION: Duration = Duration::from_millis(50);

/// Ticks per second derived from [`TICK_DURATION`].
pub const TICKS_PER_SECOND: u32 = (1_000 / TICK_DURATION.as_millis()) as u32;

/// Largest frame delta fed into the tick accumulator. Bounds catch-up work
/// after a stall to `MAX_FRAME_DELTA / TICK_DURATION` ticks.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Number of whole ticks contained in `duration` (floor division).
pub fn ticks_in(duration: Duration) -> u64 {
    (duration.as_nanos() / TICK_DURATION.as_nanos()) as u64
}
