use crate::clock::{ClockError, RuntimeClock, SystemTimeSource, TimeSource};
use crate::config::SimulationConfig;
use crate::stepper::FixedStep;
use blockytry_camera::{Eyepoint, TargetRegistry};
use blockytry_common::{Pose, Scancode, TICK_DURATION};
use blockytry_input::{KeyLedger, LedgerError, MouseAxes, TickInput};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Clock(#[from] ClockError),
    #[error(transparent)]
    Input(#[from] LedgerError),
}

/// Application logic run once per tick, before the camera reads the same input.
pub trait TickHook {
    fn on_tick(&mut self, input: &TickInput<'_>);
}

impl<F> TickHook for F
where
    F: FnMut(&TickInput<'_>),
{
    fn on_tick(&mut self, input: &TickInput<'_>) {
        self(input)
    }
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHook;

impl TickHook for NoHook {
    fn on_tick(&mut self, _input: &TickInput<'_>) {}
}

/// Outcome of one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Frame index, starting at 1.
    pub frame: u64,
    /// Measured frame delta.
    pub frame_time: Duration,
    /// Frame delta after the stall cap, as fed to the accumulator.
    pub clamped_frame_time: Duration,
    /// Ticks simulated during this frame.
    pub ticks: u32,
    /// Total ticks simulated so far.
    pub tick: u64,
    pub simulation_time: Duration,
    /// Interpolation factor in [0, 1).
    pub alpha: f32,
    /// Camera pose blended with `alpha`, ready to render.
    pub pose: Pose,
}

/// Owns every piece of simulation state: clock, input, camera, targets and
/// the tick accumulator.
///
/// Single-threaded. Input callbacks and `run_frame` must be serialized on
/// the thread that owns the context.
#[derive(Debug)]
pub struct SimulationContext<S = SystemTimeSource> {
    clock: RuntimeClock<S>,
    ledger: KeyLedger,
    mouse: MouseAxes,
    camera: Eyepoint,
    targets: TargetRegistry,
    stepper: FixedStep,
    last_report: Option<FrameReport>,
}

impl SimulationContext<SystemTimeSource> {
    /// Context on the operating system clock.
    pub fn system(config: &SimulationConfig, previous_beginning: Option<SystemTime>) -> Self {
        Self::new(config, SystemTimeSource, previous_beginning)
    }
}

impl<S: TimeSource> SimulationContext<S> {
    pub fn new(
        config: &SimulationConfig,
        source: S,
        previous_beginning: Option<SystemTime>,
    ) -> Self {
        let mut targets = TargetRegistry::new();
        let mut camera = Eyepoint::new(config.camera.clone(), config.bindings.clone());
        if let Some(point) = config.lock_target {
            let id = targets.insert(point);
            camera.set_lock_candidate(Some(id));
        }
        let clock = RuntimeClock::with_previous_beginning(source, previous_beginning);
        tracing::debug!(
            first_run = clock.is_first_run(),
            tick_ms = TICK_DURATION.as_millis() as u64,
            "simulation context created"
        );
        Self {
            clock,
            ledger: KeyLedger::new(),
            mouse: MouseAxes::new(),
            camera,
            targets,
            stepper: FixedStep::new(),
            last_report: None,
        }
    }

    /// Key-down from the window system, stamped with the current time.
    pub fn record_press(&mut self, scancode: Scancode) -> Result<(), LedgerError> {
        let now = self.clock.now();
        self.ledger.record_press(scancode, now)
    }

    /// Key-up from the window system, stamped with the current time.
    pub fn record_release(&mut self, scancode: Scancode) -> Result<(), LedgerError> {
        let now = self.clock.now();
        self.ledger.record_release(scancode, now)
    }

    /// Close all open presses now, e.g. when the window loses focus.
    pub fn release_all(&mut self) -> usize {
        let now = self.clock.now();
        self.ledger.release_all(now)
    }

    /// Absolute cursor position from the window system.
    pub fn update_mouse(&mut self, x: f64, y: f64) {
        self.mouse.update(x, y);
    }

    /// Run one frame with no per-tick application logic.
    pub fn run_frame(&mut self) -> Result<FrameReport, SimulationError> {
        self.run_frame_with(&mut NoHook)
    }

    /// Run one frame.
    ///
    /// Advances the clock, accumulates the capped frame time, applies mouse
    /// look, drains whole ticks (hook, camera, prune), resets the mouse delta
    /// and blends the camera pose by the leftover fraction of a tick.
    pub fn run_frame_with<H: TickHook>(
        &mut self,
        hook: &mut H,
    ) -> Result<FrameReport, SimulationError> {
        let frame_time = self.clock.cycle()?;
        let _span = tracing::info_span!("frame", frame = self.clock.frame_count()).entered();

        let clamped_frame_time = self.stepper.accumulate(frame_time);
        self.camera.per_frame_update(self.mouse.delta(), frame_time);

        let now = self.clock.frame_instant();
        let mut ticks = 0u32;
        while self.stepper.tick_ready() {
            let input = TickInput::new(&self.ledger, now, self.stepper.ticks() + 1);
            hook.on_tick(&input);
            self.camera.per_tick_update(&input, &self.targets, TICK_DURATION);
            self.ledger.prune();
            self.stepper.complete_tick();
            ticks += 1;
        }
        self.mouse.reset();

        let alpha = self.stepper.alpha();
        let report = FrameReport {
            frame: self.clock.frame_count(),
            frame_time,
            clamped_frame_time,
            ticks,
            tick: self.stepper.ticks(),
            simulation_time: self.stepper.simulation_time(),
            alpha,
            pose: self.camera.interpolated(alpha),
        };
        tracing::trace!(ticks, alpha, "frame complete");
        self.last_report = Some(report);
        Ok(report)
    }

    pub fn clock(&self) -> &RuntimeClock<S> {
        &self.clock
    }

    pub fn ledger(&self) -> &KeyLedger {
        &self.ledger
    }

    pub fn mouse(&self) -> &MouseAxes {
        &self.mouse
    }

    pub fn mouse_mut(&mut self) -> &mut MouseAxes {
        &mut self.mouse
    }

    pub fn camera(&self) -> &Eyepoint {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Eyepoint {
        &mut self.camera
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.targets
    }

    pub fn targets_mut(&mut self) -> &mut TargetRegistry {
        &mut self.targets
    }

    pub fn stepper(&self) -> &FixedStep {
        &self.stepper
    }

    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualTimeSource;
    use blockytry_camera::Facing;
    use blockytry_input::keys;
    use glam::Vec3;

    fn manual() -> (SimulationContext<ManualTimeSource>, ManualTimeSource) {
        let source = ManualTimeSource::new();
        let ctx = SimulationContext::new(&SimulationConfig::default(), source.clone(), None);
        (ctx, source)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn tick_count_matches_accumulated_time() {
        let (mut ctx, source) = manual();
        let mut calls = 0u32;
        let mut total = 0u32;
        // 7 * 23 ms = 161 ms = 3 ticks + 11 ms
        for _ in 0..7 {
            source.advance(ms(23));
            let report = ctx.run_frame_with(&mut |_: &TickInput<'_>| calls += 1).unwrap();
            total += report.ticks;
        }
        assert_eq!(calls, 3);
        assert_eq!(total, 3);
        assert_eq!(ctx.stepper().accumulator(), ms(11));
        assert_eq!(ctx.stepper().simulation_time(), ms(150));
    }

    #[test]
    fn stall_runs_at_most_five_ticks() {
        let (mut ctx, source) = manual();
        source.advance(Duration::from_secs(10));
        let report = ctx.run_frame().unwrap();
        assert_eq!(report.frame_time, Duration::from_secs(10));
        assert_eq!(report.clamped_frame_time, ms(250));
        assert_eq!(report.ticks, 5);
        assert_eq!(report.alpha, 0.0);
    }

    #[test]
    fn stalled_clock_is_an_error() {
        let (mut ctx, source) = manual();
        source.advance(ms(16));
        ctx.run_frame().unwrap();
        assert!(matches!(
            ctx.run_frame(),
            Err(SimulationError::Clock(ClockError::StalledFrame { .. }))
        ));
    }

    #[test]
    fn ledger_errors_surface() {
        let (mut ctx, _source) = manual();
        assert_eq!(
            ctx.record_release(keys::W),
            Err(LedgerError::ReleaseWithoutPress { scancode: keys::W })
        );
        ctx.record_press(keys::W).unwrap();
        assert_eq!(
            ctx.record_press(keys::W),
            Err(LedgerError::DoublePress { scancode: keys::W })
        );
    }

    #[test]
    fn alpha_tracks_leftover_time() {
        let (mut ctx, source) = manual();
        source.advance(ms(50));
        assert_eq!(ctx.run_frame().unwrap().alpha, 0.0);
        source.advance(ms(25));
        let report = ctx.run_frame().unwrap();
        assert_eq!(report.ticks, 0);
        assert!((report.alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hold_forward_for_three_ticks() {
        let (mut ctx, source) = manual();
        ctx.record_press(keys::W).unwrap();
        let start = ctx.camera().position();
        let direction = ctx.camera().direction();

        let mut held_per_tick = Vec::new();
        for frame in 1..=4u64 {
            if frame == 4 {
                source.set(ms(155));
                ctx.record_release(keys::W).unwrap();
            }
            source.set(ms(frame * 50));
            let report = ctx
                .run_frame_with(&mut |input: &TickInput<'_>| {
                    held_per_tick.push(input.held_ticks(keys::W));
                })
                .unwrap();
            assert_eq!(report.ticks, 1);
        }

        assert_eq!(held_per_tick, vec![1, 2, 3, 0]);
        let travelled = ctx.camera().position() - start;
        let expected = 3.0 * 4.317 * 0.05;
        assert!((travelled.length() - expected).abs() < 1e-4);
        assert!((travelled.normalize() - direction).length() < 1e-4);
        // Released and pruned.
        assert!(ctx.ledger().is_empty());
    }

    #[test]
    fn mouse_delta_is_consumed_each_frame() {
        let (mut ctx, source) = manual();
        ctx.update_mouse(100.0, 100.0);
        ctx.update_mouse(150.0, 100.0);
        source.advance(ms(10));
        ctx.run_frame().unwrap();
        let yaw_after_first = ctx.camera().yaw();
        assert!((yaw_after_first - (-85.0)).abs() < 1e-3);
        assert!(ctx.mouse().delta().is_zero());

        source.advance(ms(10));
        ctx.run_frame().unwrap();
        assert_eq!(ctx.camera().yaw(), yaw_after_first);
    }

    #[test]
    fn lock_toggle_targets_configured_point() {
        let (mut ctx, source) = manual();
        ctx.record_press(keys::T).unwrap();
        source.advance(ms(50));
        ctx.run_frame().unwrap();
        assert!(matches!(ctx.camera().facing(), Facing::LockedOn(_)));
        // Default target is the origin; the camera starts at z = 1.
        assert!((ctx.camera().direction() - Vec3::NEG_Z).length() < 1e-5);

        // Held through several more ticks: stays locked.
        source.advance(ms(150));
        ctx.run_frame().unwrap();
        assert!(matches!(ctx.camera().facing(), Facing::LockedOn(_)));
    }

    #[test]
    fn hook_runs_before_camera_each_tick() {
        let (mut ctx, source) = manual();
        ctx.record_press(keys::F1).unwrap();
        let mut toggles = 0;
        for _ in 0..6 {
            source.advance(ms(50));
            ctx.run_frame_with(&mut |input: &TickInput<'_>| {
                if input.is_down(keys::F1) > 0 {
                    toggles += 1;
                }
            })
            .unwrap();
        }
        assert_eq!(toggles, 1);
    }

    #[test]
    fn previous_run_is_not_first_run() {
        let earlier = SystemTime::now() - Duration::from_secs(60);
        let ctx = SimulationContext::new(
            &SimulationConfig::default(),
            ManualTimeSource::new(),
            Some(earlier),
        );
        assert!(!ctx.clock().is_first_run());
    }
}
