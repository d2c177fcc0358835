use blockytry_common::{MAX_FRAME_DELTA, TICK_DURATION};
use std::time::Duration;

/// Largest f32 below 1.0.
const ALPHA_MAX: f32 = 1.0 - f32::EPSILON / 2.0;

/// Fixed-timestep accumulator.
///
/// Frame time goes in, whole ticks come out. After draining,
/// `0 <= accumulator < TICK_DURATION`; the remainder becomes the render
/// interpolation factor.
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: Duration,
    simulation_time: Duration,
    ticks: u64,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame's delta, capped at [`MAX_FRAME_DELTA`]. Returns the amount
    /// actually added.
    pub fn accumulate(&mut self, frame_time: Duration) -> Duration {
        let clamped = frame_time.min(MAX_FRAME_DELTA);
        if clamped < frame_time {
            tracing::warn!(
                frame_ms = frame_time.as_secs_f64() * 1000.0,
                cap_ms = MAX_FRAME_DELTA.as_millis() as u64,
                "frame took too long, capping simulated catch-up"
            );
        }
        self.accumulator += clamped;
        clamped
    }

    /// Whether a whole tick is owed.
    pub fn tick_ready(&self) -> bool {
        self.accumulator >= TICK_DURATION
    }

    /// Account for one simulated tick. Call after the tick's logic ran.
    pub fn complete_tick(&mut self) {
        debug_assert!(self.tick_ready());
        self.accumulator = self.accumulator.saturating_sub(TICK_DURATION);
        self.simulation_time += TICK_DURATION;
        self.ticks += 1;
    }

    /// Fraction of a tick left in the accumulator, in [0, 1).
    pub fn alpha(&self) -> f32 {
        let alpha = self.accumulator.as_nanos() as f64 / TICK_DURATION.as_nanos() as f64;
        // f32 rounding would reach 1.0 within a few ns of a whole tick.
        (alpha as f32).min(ALPHA_MAX)
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Sum of all completed tick durations.
    pub fn simulation_time(&self) -> Duration {
        self.simulation_time
    }

    /// Number of completed ticks.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(step: &mut FixedStep) -> u32 {
        let mut n = 0;
        while step.tick_ready() {
            step.complete_tick();
            n += 1;
        }
        n
    }

    #[test]
    fn whole_ticks_and_remainder() {
        let mut step = FixedStep::new();
        let frames = [16, 17, 16, 33, 8, 61, 12];
        let mut ticks = 0;
        for ms in frames {
            step.accumulate(Duration::from_millis(ms));
            ticks += drain(&mut step);
            assert!(step.accumulator() < TICK_DURATION);
        }
        // 163 ms = 3 ticks + 13 ms
        assert_eq!(ticks, 3);
        assert_eq!(step.ticks(), 3);
        assert_eq!(step.accumulator(), Duration::from_millis(13));
        assert_eq!(step.simulation_time(), Duration::from_millis(150));
    }

    #[test]
    fn long_stall_is_capped_at_five_ticks() {
        let mut step = FixedStep::new();
        let added = step.accumulate(Duration::from_secs(10));
        assert_eq!(added, MAX_FRAME_DELTA);
        assert_eq!(drain(&mut step), 5);
        assert_eq!(step.accumulator(), Duration::ZERO);
    }

    #[test]
    fn alpha_is_zero_after_exact_drain() {
        let mut step = FixedStep::new();
        step.accumulate(Duration::from_millis(100));
        drain(&mut step);
        assert_eq!(step.alpha(), 0.0);
    }

    #[test]
    fn alpha_approaches_one() {
        let mut step = FixedStep::new();
        step.accumulate(Duration::from_micros(49_999));
        assert!(!step.tick_ready());
        assert!(step.alpha() > 0.999 && step.alpha() < 1.0);
    }

    #[test]
    fn alpha_stays_below_one_a_nanosecond_short_of_a_tick() {
        let mut step = FixedStep::new();
        step.accumulate(Duration::from_nanos(49_999_999));
        assert!(!step.tick_ready());
        assert!(step.alpha() < 1.0);
        assert!(step.alpha() > 0.999_999);
    }
}
