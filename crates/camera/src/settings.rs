use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Movement and look tuning for the eyepoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyepointSettings {
    /// Units per second while the sneak modifier is held.
    pub sneak_speed: f32,
    /// Units per second with no modifier.
    pub walk_speed: f32,
    /// Units per second while the sprint modifier is held.
    pub sprint_speed: f32,
    /// Degrees of yaw per unit of horizontal mouse movement.
    pub sensitivity_x: f32,
    /// Degrees of pitch per unit of vertical mouse movement.
    pub sensitivity_y: f32,
    pub start_position: Vec3,
    /// Degrees. -90 faces down the negative z axis.
    pub start_yaw: f32,
    /// Degrees.
    pub start_pitch: f32,
    pub lens: Lens,
}

impl Default for EyepointSettings {
    fn default() -> Self {
        Self {
            sneak_speed: 1.31,
            walk_speed: 4.317,
            sprint_speed: 5.612,
            sensitivity_x: 0.1,
            sensitivity_y: 0.1,
            start_position: Vec3::new(0.0, 0.0, 1.0),
            start_yaw: -90.0,
            start_pitch: 0.0,
            lens: Lens::default(),
        }
    }
}

/// Projection parameters. Render-side state, not simulated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lens {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Lens {
    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect, self.near, self.far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projection_is_finite() {
        let p = Lens::default().projection(16.0 / 9.0);
        assert!(p.to_cols_array().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn settings_from_partial_yaml() {
        let s: EyepointSettings =
            serde_yaml::from_str("walk_speed: 2.0\nlens:\n  fov_degrees: 70.0\n").unwrap();
        assert_eq!(s.walk_speed, 2.0);
        assert_eq!(s.sprint_speed, 5.612);
        assert_eq!(s.lens.fov_degrees, 70.0);
        assert_eq!(s.lens.far, 100.0);
    }
}
