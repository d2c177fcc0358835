use crate::frame::RenderFrame;
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a captured frame and produces output. It never sees
/// the simulation itself.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, frame: &RenderFrame) -> Self::Output;
}

/// Produces a human-readable description of a frame.
///
/// Used by the CLI and for logging; also exercises the render interface in
/// tests without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Include one line per marker.
    pub list_markers: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers() -> Self {
        Self { list_markers: true }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &RenderFrame) -> String {
        let p = frame.pose.position;
        let d = frame.pose.direction;
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "frame={} tick={} sim={:.3}s alpha={:.3}",
            frame.frame,
            frame.tick,
            frame.simulation_time.as_secs_f64(),
            frame.alpha
        );
        let _ = writeln!(
            out,
            "  eye=({:.3}, {:.3}, {:.3}) dir=({:.3}, {:.3}, {:.3}) fov={:.0}",
            p.x, p.y, p.z, d.x, d.y, d.z, frame.lens.fov_degrees
        );
        if self.list_markers {
            for marker in &frame.markers {
                let m = marker.position;
                let _ = writeln!(
                    out,
                    "  [{:.8}] pos=({:.2}, {:.2}, {:.2}){}",
                    &marker.id.0.to_string()[..8],
                    m.x,
                    m.y,
                    m.z,
                    if marker.locked { " locked" } else { "" }
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Marker;
    use blockytry_camera::Lens;
    use blockytry_common::{Pose, TargetId};
    use glam::Vec3;
    use std::time::Duration;

    fn frame() -> RenderFrame {
        RenderFrame {
            frame: 3,
            tick: 2,
            simulation_time: Duration::from_millis(100),
            alpha: 0.25,
            pose: Pose::default(),
            lens: Lens::default(),
            markers: vec![Marker {
                id: TargetId::new(),
                position: Vec3::new(1.0, 2.0, 3.0),
                locked: true,
            }],
        }
    }

    #[test]
    fn header_line() {
        let out = DebugTextRenderer::new().render(&frame());
        assert!(out.starts_with("frame=3 tick=2 sim=0.100s alpha=0.250"));
        assert!(out.contains("eye=(0.000, 0.000, 1.000)"));
        assert!(!out.contains("locked"));
    }

    #[test]
    fn markers_listed_on_request() {
        let out = DebugTextRenderer::with_markers().render(&frame());
        assert!(out.contains("pos=(1.00, 2.00, 3.00) locked"));
        assert_eq!(out.lines().count(), 3);
    }
}
