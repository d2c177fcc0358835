use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// World up axis. Vertical movement and the camera's right vector derive from it.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Hardware-level identifier of a physical key, stable across keyboard layouts.
///
/// The key space is bounded to 0..=255.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Scancode(pub u8);

impl Scancode {
    pub const fn new(code: u8) -> Self {
        Self(code)
    }

    /// Narrow a window-system scancode. Extended set-1 navigation codes
    /// (Windows reports PageUp as 0xE049) map to their evdev equivalents;
    /// other codes outside the table are rejected.
    pub fn from_raw(raw: u32) -> Option<Self> {
        let code = match raw {
            0xE047 => 102, // Home
            0xE048 => 103, // Up
            0xE049 => 104, // PageUp
            0xE04B => 105, // Left
            0xE04D => 106, // Right
            0xE04F => 107, // End
            0xE050 => 108, // Down
            0xE051 => 109, // PageDown
            0xE052 => 110, // Insert
            0xE053 => 111, // Delete
            other => u8::try_from(other).ok()?,
        };
        Some(Self(code))
    }

    pub const fn code(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Scancode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sc{}", self.0)
    }
}

/// Handle to a point registered in a target registry.
///
/// The camera refers to lock-on targets by id only, so a removed target is
/// detected instead of read through a dangling reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub Uuid);

impl TargetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TargetId {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera pose used for rendering: where it is and where it looks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            direction: Vec3::NEG_Z,
            up: WORLD_UP,
        }
    }
}

impl Pose {
    /// Linear blend between two discrete poses with factor `alpha` in [0, 1].
    ///
    /// The blended direction is renormalized; if the two directions cancel
    /// out, the newer one is used.
    pub fn lerp(previous: &Pose, current: &Pose, alpha: f32) -> Pose {
        let direction = previous
            .direction
            .lerp(current.direction, alpha)
            .try_normalize()
            .unwrap_or(current.direction);
        Pose {
            position: previous.position.lerp(current.position, alpha),
            direction,
            up: current.up,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_id_uniqueness() {
        let a = TargetId::new();
        let b = TargetId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn scancode_from_raw_rejects_out_of_table() {
        assert_eq!(Scancode::from_raw(17), Some(Scancode(17)));
        assert_eq!(Scancode::from_raw(255), Some(Scancode(255)));
        assert_eq!(Scancode::from_raw(256), None);
        assert_eq!(Scancode::from_raw(0xE01D), None);
    }

    #[test]
    fn scancode_from_raw_maps_extended_navigation() {
        assert_eq!(Scancode::from_raw(0xE049), Some(Scancode(104)));
        assert_eq!(Scancode::from_raw(0xE051), Some(Scancode(109)));
        assert_eq!(Scancode::from_raw(104), Some(Scancode(104)));
    }

    #[test]
    fn pose_lerp_endpoints() {
        let a = Pose::default();
        let b = Pose {
            position: Vec3::new(2.0, 0.0, 1.0),
            direction: Vec3::X,
            up: WORLD_UP,
        };
        assert_eq!(Pose::lerp(&a, &b, 0.0).position, a.position);
        assert_eq!(Pose::lerp(&a, &b, 1.0).position, b.position);
        let mid = Pose::lerp(&a, &b, 0.5);
        assert!((mid.position.x - 1.0).abs() < 1e-6);
        assert!((mid.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn pose_lerp_opposite_directions_falls_back() {
        let a = Pose {
            direction: Vec3::X,
            ..Pose::default()
        };
        let b = Pose {
            direction: Vec3::NEG_X,
            ..Pose::default()
        };
        assert_eq!(Pose::lerp(&a, &b, 0.5).direction, Vec3::NEG_X);
    }
}
