//! Shared types for the blockytry engine: key identifiers, target handles,
//! poses, and the fixed simulation time constants.

pub mod time;
pub mod types;

pub use time::{MAX_FRAME_DELTA, TICK_DURATION, TICKS_PER_SECOND, ticks_in};
pub use types::{Pose, Scancode, TargetId, WORLD_UP};
