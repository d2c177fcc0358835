//! Developer Tooling: read-only views of the simulation for HUDs and logs.
//!
//! # Invariants
//! - Tools never mutate the simulation they inspect.

mod inspector;

pub use inspector::{FacingMode, SimulationInspector, SimulationSummary};
