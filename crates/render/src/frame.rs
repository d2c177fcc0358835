use blockytry_camera::{Facing, Lens, view_matrix};
use blockytry_common::{Pose, TargetId};
use blockytry_kernel::{FrameReport, SimulationContext, TimeSource};
use glam::{Mat4, Vec3};
use std::time::Duration;

/// A lock-on target as the renderer sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub id: TargetId,
    pub position: Vec3,
    /// Whether the camera is currently locked on to this target.
    pub locked: bool,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub frame: u64,
    pub tick: u64,
    pub simulation_time: Duration,
    pub alpha: f32,
    /// Interpolated camera pose.
    pub pose: Pose,
    pub lens: Lens,
    pub markers: Vec<Marker>,
}

impl RenderFrame {
    /// Capture the frame described by `report` from `context`.
    pub fn capture<S: TimeSource>(context: &SimulationContext<S>, report: &FrameReport) -> Self {
        let camera = context.camera();
        let locked = match camera.facing() {
            Facing::LockedOn(id) => Some(id),
            Facing::FreeLook => None,
        };
        let markers: Vec<Marker> = context
            .targets()
            .iter()
            .map(|(id, position)| Marker {
                id,
                position,
                locked: locked == Some(id),
            })
            .collect();
        tracing::trace!(frame = report.frame, markers = markers.len(), "captured render frame");
        Self {
            frame: report.frame,
            tick: report.tick,
            simulation_time: report.simulation_time,
            alpha: report.alpha,
            pose: report.pose,
            lens: camera.lens(),
            markers,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        view_matrix(self.pose.position, self.pose.direction, self.pose.up)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        self.lens.projection(aspect)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }
}
