//! Kernel: runtime clock, fixed-timestep driver and the simulation context
//! that ties input, camera and targets together.
//!
//! # Invariants
//! - Ticks are exactly [`TICK_DURATION`] of simulated time; a frame never runs
//!   more than `MAX_FRAME_DELTA / TICK_DURATION` of them.
//! - The interpolation factor is always in `[0, 1)`.
//! - The key ledger is pruned once after every tick, never between ticks.

pub mod clock;
pub mod config;
pub mod context;
pub mod script;
pub mod stepper;

pub use blockytry_common::{MAX_FRAME_DELTA, TICK_DURATION, TICKS_PER_SECOND};
pub use clock::{ClockError, ManualTimeSource, RuntimeClock, SystemTimeSource, TimeSource};
pub use config::{ConfigError, SimulationConfig};
pub use context::{FrameReport, NoHook, SimulationContext, SimulationError, TickHook};
pub use script::{
    ActionKind, InputScript, MAX_REPLAY_FRAMES, Replay, ScriptError, ScriptedAction, replay,
};
pub use stepper::FixedStep;
