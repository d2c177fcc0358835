//! wgpu render backend.
//!
//! Draws a grid floor and one cube per lock-on target, seen through the
//! interpolated camera pose of a [`blockytry_render::RenderFrame`].
//!
//! # Invariants
//! - The backend only reads the frame; it never feeds back into simulation.
//! - Frame rate is independent of the simulation tick.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::SceneRenderer;
pub use mesh::{GRID_HALF_EXTENT, MAX_MARKERS};
