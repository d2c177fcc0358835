//! CPU-side geometry: vertex layouts, the marker cube, the grid floor, and
//! per-frame marker instances.

use blockytry_render::{Marker, RenderFrame};
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Grid lines in each direction from the origin, one unit apart.
pub const GRID_HALF_EXTENT: i32 = 50;

/// Marker instances that fit in the instance buffer.
pub const MAX_MARKERS: usize = 256;

const MARKER_SIZE: f32 = 0.25;
const LOCKED_MARKER_SIZE: f32 = 0.35;

const GRID_COLOR: [f32; 4] = [0.4, 0.4, 0.4, 1.0];
const X_AXIS_COLOR: [f32; 4] = [0.8, 0.25, 0.25, 1.0];
const Z_AXIS_COLOR: [f32; 4] = [0.25, 0.35, 0.8, 1.0];
const MARKER_COLOR: [f32; 4] = [0.2, 0.6, 1.0, 1.0];
const LOCKED_COLOR: [f32; 4] = [1.0, 0.8, 0.0, 1.0];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct GridVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Unit cube centred on the origin, one quad per face.
pub(crate) fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        // normal, u, v
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);
    for (normal, u, v) in FACES {
        let (n, u, v) = (Vec3::from(normal), Vec3::from(u), Vec3::from(v));
        let base = vertices.len() as u16;
        for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            let p = n * 0.5 + u * su + v * sv;
            vertices.push(Vertex {
                position: p.to_array(),
                normal,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
    }
    (vertices, indices)
}

/// Line-list grid on the y = 0 plane. The lines through the origin are
/// tinted to show the x and z axes.
pub(crate) fn grid_mesh(half_extent: i32, spacing: f32) -> Vec<GridVertex> {
    let extent = half_extent as f32 * spacing;
    let mut verts = Vec::with_capacity((2 * half_extent as usize + 1) * 4);
    for i in -half_extent..=half_extent {
        let offset = i as f32 * spacing;
        let (along_x, along_z) = if i == 0 {
            (X_AXIS_COLOR, Z_AXIS_COLOR)
        } else {
            (GRID_COLOR, GRID_COLOR)
        };
        verts.push(GridVertex {
            position: [-extent, 0.0, offset],
            color: along_x,
        });
        verts.push(GridVertex {
            position: [extent, 0.0, offset],
            color: along_x,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, -extent],
            color: along_z,
        });
        verts.push(GridVertex {
            position: [offset, 0.0, extent],
            color: along_z,
        });
    }
    verts
}

fn marker_instance(marker: &Marker) -> InstanceData {
    let (size, color) = if marker.locked {
        (LOCKED_MARKER_SIZE, LOCKED_COLOR)
    } else {
        (MARKER_SIZE, MARKER_COLOR)
    };
    let model =
        Mat4::from_scale_rotation_translation(Vec3::splat(size), Quat::IDENTITY, marker.position);
    InstanceData {
        model: model.to_cols_array_2d(),
        color,
    }
}

/// One instance per marker in `frame`, at most [`MAX_MARKERS`].
pub(crate) fn marker_instances(frame: &RenderFrame) -> Vec<InstanceData> {
    if frame.markers.len() > MAX_MARKERS {
        tracing::warn!(
            markers = frame.markers.len(),
            max = MAX_MARKERS,
            "too many markers, extra ones are not drawn"
        );
    }
    frame
        .markers
        .iter()
        .take(MAX_MARKERS)
        .map(marker_instance)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockytry_camera::Lens;
    use blockytry_common::{Pose, TargetId};
    use std::time::Duration;

    fn frame_with(markers: Vec<Marker>) -> RenderFrame {
        RenderFrame {
            frame: 1,
            tick: 1,
            simulation_time: Duration::from_millis(50),
            alpha: 0.0,
            pose: Pose::default(),
            lens: Lens::default(),
            markers,
        }
    }

    #[test]
    fn cube_faces_point_outward() {
        let (vertices, indices) = cube_mesh();
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        for v in &vertices {
            let p = Vec3::from(v.position);
            let n = Vec3::from(v.normal);
            assert!((p.dot(n) - 0.5).abs() < 1e-6);
            assert!(p.abs().max_element() <= 0.5 + 1e-6);
        }
    }

    #[test]
    fn cube_triangles_wind_counter_clockwise() {
        let (vertices, indices) = cube_mesh();
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(vertices[i as usize].position));
            let normal = Vec3::from(vertices[tri[0] as usize].normal);
            assert!((b - a).cross(c - a).dot(normal) > 0.0);
        }
    }

    #[test]
    fn grid_line_count_and_axes() {
        let verts = grid_mesh(2, 1.0);
        assert_eq!(verts.len(), 5 * 4);
        let axis_x = verts
            .iter()
            .filter(|v| v.color == X_AXIS_COLOR)
            .count();
        assert_eq!(axis_x, 2);
        assert!(verts.iter().all(|v| v.position[1] == 0.0));
    }

    #[test]
    fn locked_marker_is_larger_and_highlighted() {
        let frame = frame_with(vec![
            Marker {
                id: TargetId::new(),
                position: Vec3::new(1.0, 0.0, 0.0),
                locked: false,
            },
            Marker {
                id: TargetId::new(),
                position: Vec3::new(0.0, 2.0, 0.0),
                locked: true,
            },
        ]);
        let instances = marker_instances(&frame);
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].color, MARKER_COLOR);
        assert_eq!(instances[1].color, LOCKED_COLOR);
        assert_eq!(instances[1].model[0][0], LOCKED_MARKER_SIZE);
        assert_eq!(instances[1].model[3], [0.0, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn marker_instances_are_capped() {
        let markers = (0..MAX_MARKERS + 10)
            .map(|i| Marker {
                id: TargetId::new(),
                position: Vec3::splat(i as f32),
                locked: false,
            })
            .collect();
        assert_eq!(marker_instances(&frame_with(markers)).len(), MAX_MARKERS);
    }

    #[test]
    fn gpu_layouts_are_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(std::mem::size_of::<GridVertex>(), 28);
        assert_eq!(std::mem::size_of::<InstanceData>(), 80);
        assert_eq!(std::mem::size_of::<Uniforms>(), 64);
    }
}
