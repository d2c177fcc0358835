//! Eyepoint: the camera controller driven by the key ledger and mouse axes.
//!
//! # Invariants
//! - Position changes only inside the per-tick update.
//! - Pitch stays within ±89.9°, yaw within (-180°, 180°].
//! - The camera never owns its lock-on target; it refers to it by id.

mod eyepoint;
mod settings;
mod targets;

pub use eyepoint::{Eyepoint, Facing, Gait, view_matrix};
pub use settings::{EyepointSettings, Lens};
pub use targets::TargetRegistry;
