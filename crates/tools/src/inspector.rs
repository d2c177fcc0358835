use blockytry_camera::{Facing, Gait};
use blockytry_common::Scancode;
use blockytry_kernel::{SimulationContext, TimeSource};
use glam::Vec3;
use std::fmt;
use std::time::Duration;

/// Simulation inspector for developer tooling.
///
/// Read-only queries against a simulation context for HUDs and debug logs.
pub struct SimulationInspector;

impl SimulationInspector {
    /// Snapshot of the loop, camera and input state.
    pub fn summary<S: TimeSource>(context: &SimulationContext<S>) -> SimulationSummary {
        let clock = context.clock();
        let camera = context.camera();
        let now = clock.frame_instant();
        let ledger = context.ledger();
        SimulationSummary {
            frame: clock.frame_count(),
            tick: context.stepper().ticks(),
            simulation_time: context.stepper().simulation_time(),
            fps: clock.fps(),
            frame_time: clock.frame_time(),
            alpha: context.last_report().map_or(0.0, |r| r.alpha),
            position: camera.position(),
            yaw: camera.yaw(),
            pitch: camera.pitch(),
            facing: camera.facing().into(),
            gait: camera.gait(),
            open_keys: ledger
                .pressed_keys()
                .map(|sc| (sc, ledger.held_ticks(sc, now)))
                .collect(),
            first_run: clock.is_first_run(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    FreeLook,
    LockedOn,
}

impl From<Facing> for FacingMode {
    fn from(facing: Facing) -> Self {
        match facing {
            Facing::FreeLook => FacingMode::FreeLook,
            Facing::LockedOn(_) => FacingMode::LockedOn,
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FacingMode::FreeLook => f.write_str("free-look"),
            FacingMode::LockedOn => f.write_str("locked-on"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    pub frame: u64,
    pub tick: u64,
    pub simulation_time: Duration,
    pub fps: f32,
    pub frame_time: Duration,
    pub alpha: f32,
    pub position: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    pub facing: FacingMode,
    pub gait: Gait,
    /// Keys with an open press and their held ticks at the last frame.
    pub open_keys: Vec<(Scancode, u64)>,
    pub first_run: bool,
}

impl SimulationSummary {
    /// One line per group, for HUD panels.
    pub fn lines(&self) -> Vec<String> {
        let keys = if self.open_keys.is_empty() {
            "-".to_owned()
        } else {
            self.open_keys
                .iter()
                .map(|(sc, held)| format!("{sc}:{held}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        vec![
            format!(
                "frame {} | {:.0} fps | {:.2} ms",
                self.frame,
                self.fps,
                self.frame_time.as_secs_f64() * 1000.0
            ),
            format!(
                "tick {} | sim {:.2}s | alpha {:.2}",
                self.tick,
                self.simulation_time.as_secs_f64(),
                self.alpha
            ),
            format!(
                "pos ({:.2}, {:.2}, {:.2}) | yaw {:.1} pitch {:.1}",
                self.position.x, self.position.y, self.position.z, self.yaw, self.pitch
            ),
            format!("{} | {:?}", self.facing, self.gait),
            format!("keys {keys}"),
            format!("first run: {}", self.first_run),
        ]
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockytry_input::keys;
    use blockytry_kernel::{ManualTimeSource, SimulationConfig};

    fn context() -> (SimulationContext<ManualTimeSource>, ManualTimeSource) {
        let source = ManualTimeSource::new();
        let ctx = SimulationContext::new(&SimulationConfig::default(), source.clone(), None);
        (ctx, source)
    }

    #[test]
    fn summary_before_first_frame() {
        let (ctx, _source) = context();
        let summary = SimulationInspector::summary(&ctx);
        assert_eq!(summary.frame, 0);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.fps, 0.0);
        assert_eq!(summary.alpha, 0.0);
        assert_eq!(summary.facing, FacingMode::FreeLook);
        assert!(summary.open_keys.is_empty());
        assert!(summary.first_run);
    }

    #[test]
    fn summary_tracks_loop_and_keys() {
        let (mut ctx, source) = context();
        ctx.record_press(keys::W).unwrap();
        source.advance(Duration::from_millis(125));
        ctx.run_frame().unwrap();

        let summary = SimulationInspector::summary(&ctx);
        assert_eq!(summary.frame, 1);
        assert_eq!(summary.tick, 2);
        assert_eq!(summary.simulation_time, Duration::from_millis(100));
        assert!((summary.fps - 8.0).abs() < 1e-3);
        assert!((summary.alpha - 0.5).abs() < 1e-6);
        assert_eq!(summary.open_keys, vec![(keys::W, 2)]);
        assert_eq!(summary.gait, Gait::Walk);
    }

    #[test]
    fn summary_reports_lock_on() {
        let (mut ctx, source) = context();
        ctx.record_press(keys::T).unwrap();
        source.advance(Duration::from_millis(50));
        ctx.run_frame().unwrap();
        assert_eq!(
            SimulationInspector::summary(&ctx).facing,
            FacingMode::LockedOn
        );
    }

    #[test]
    fn summary_display() {
        let (mut ctx, source) = context();
        ctx.record_press(keys::W).unwrap();
        source.advance(Duration::from_millis(60));
        ctx.run_frame().unwrap();
        let s = format!("{}", SimulationInspector::summary(&ctx));
        assert!(s.contains("tick 1"));
        assert!(s.contains("free-look | Walk"));
        assert!(s.contains("keys sc17:1"));
        assert_eq!(s.lines().count(), 6);
    }
}
