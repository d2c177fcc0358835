//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read a [`RenderFrame`]; they never touch simulation state.
//! - The frame carries the interpolated pose, so a renderer never blends.

mod frame;
mod renderer;

pub use frame::{Marker, RenderFrame};
pub use renderer::{DebugTextRenderer, Renderer};
