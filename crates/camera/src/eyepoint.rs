use crate::settings::{EyepointSettings, Lens};
use crate::targets::TargetRegistry;
use blockytry_common::{Pose, TargetId, WORLD_UP};
use blockytry_input::{KeyBindings, MouseDelta, TickInput};
use glam::{Mat4, Vec3};
use std::time::Duration;

const PITCH_LIMIT: f32 = 89.9;

/// What drives the facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    /// Mouse movement drives yaw/pitch, which drive the direction.
    FreeLook,
    /// The direction points at the target; yaw/pitch are derived from it.
    LockedOn(TargetId),
}

/// Movement pace selected from modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gait {
    Sneak,
    Walk,
    Sprint,
}

impl Gait {
    /// Sneak wins over sprint when both modifiers are held.
    fn select(input: &TickInput<'_>, bindings: &KeyBindings) -> Self {
        if input.is_held(bindings.sneak) {
            Gait::Sneak
        } else if input.is_held(bindings.sprint) {
            Gait::Sprint
        } else {
            Gait::Walk
        }
    }

    pub fn speed(self, settings: &EyepointSettings) -> f32 {
        match self {
            Gait::Sneak => settings.sneak_speed,
            Gait::Walk => settings.walk_speed,
            Gait::Sprint => settings.sprint_speed,
        }
    }
}

/// Look-at transform for a pose. Pure; accepts raw or blended poses.
pub fn view_matrix(position: Vec3, direction: Vec3, up: Vec3) -> Mat4 {
    Mat4::look_at_rh(position, position + direction, up)
}

/// The camera controller.
///
/// Orientation follows the mouse every frame in free-look; position changes
/// once per simulation tick. The previous tick's pose is kept so rendering
/// can blend between the two.
#[derive(Debug, Clone)]
pub struct Eyepoint {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    /// Degrees.
    yaw: f32,
    /// Degrees.
    pitch: f32,
    facing: Facing,
    lock_candidate: Option<TargetId>,
    previous_position: Vec3,
    previous_direction: Vec3,
    gait: Gait,
    settings: EyepointSettings,
    bindings: KeyBindings,
}

impl Default for Eyepoint {
    fn default() -> Self {
        Self::new(EyepointSettings::default(), KeyBindings::default())
    }
}

impl Eyepoint {
    pub fn new(settings: EyepointSettings, bindings: KeyBindings) -> Self {
        let yaw = wrap_yaw(settings.start_yaw);
        let pitch = settings.start_pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        let direction = direction_from_angles(yaw, pitch);
        let position = settings.start_position;
        Self {
            position,
            direction,
            up: WORLD_UP,
            yaw,
            pitch,
            facing: Facing::FreeLook,
            lock_candidate: None,
            previous_position: position,
            previous_direction: direction,
            gait: Gait::Walk,
            settings,
            bindings,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Gait used by the most recent tick.
    pub fn gait(&self) -> Gait {
        self.gait
    }

    pub fn lens(&self) -> Lens {
        self.settings.lens
    }

    pub fn settings(&self) -> &EyepointSettings {
        &self.settings
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Target the lock toggle key will lock on to.
    pub fn set_lock_candidate(&mut self, target: Option<TargetId>) {
        self.lock_candidate = target;
    }

    pub fn lock_candidate(&self) -> Option<TargetId> {
        self.lock_candidate
    }

    pub fn current_pose(&self) -> Pose {
        Pose {
            position: self.position,
            direction: self.direction,
            up: self.up,
        }
    }

    pub fn previous_pose(&self) -> Pose {
        Pose {
            position: self.previous_position,
            direction: self.previous_direction,
            up: self.up,
        }
    }

    /// Pose blended between the previous and current tick.
    pub fn interpolated(&self, alpha: f32) -> Pose {
        Pose::lerp(&self.previous_pose(), &self.current_pose(), alpha)
    }

    /// View matrix of the current, unblended pose.
    pub fn view(&self) -> Mat4 {
        view_matrix(self.position, self.direction, self.up)
    }

    /// Lock on to `target` immediately. Returns false if it is not registered.
    ///
    /// The facing jumps to the target without blending.
    pub fn lock_on(&mut self, target: TargetId, targets: &TargetRegistry) -> bool {
        let Some(point) = targets.get(target) else {
            return false;
        };
        self.facing = Facing::LockedOn(target);
        self.face(point);
        self.previous_direction = self.direction;
        true
    }

    pub fn release_lock(&mut self) {
        self.facing = Facing::FreeLook;
    }

    /// Frame-rate update: mouse look in free-look mode. Never moves the camera.
    pub fn per_frame_update(&mut self, mouse: MouseDelta, _dt: Duration) {
        if self.facing != Facing::FreeLook {
            return;
        }
        self.yaw = wrap_yaw(self.yaw + mouse.x * self.settings.sensitivity_x);
        self.pitch = (self.pitch + mouse.y * self.settings.sensitivity_y)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.direction = direction_from_angles(self.yaw, self.pitch);
        // Orientation is already sampled at frame rate; blending it would only lag.
        self.previous_direction = self.direction;
    }

    /// Tick-rate update: lock toggle, gait, movement, lock-on tracking.
    pub fn per_tick_update(
        &mut self,
        input: &TickInput<'_>,
        targets: &TargetRegistry,
        dt: Duration,
    ) {
        self.previous_position = self.position;
        self.previous_direction = self.direction;

        self.gait = Gait::select(input, &self.bindings);
        let speed = self.gait.speed(&self.settings);

        if input.is_down(self.bindings.lock_toggle) > 0 {
            self.toggle_lock(targets);
        }

        let right = self
            .direction
            .cross(WORLD_UP)
            .try_normalize()
            .unwrap_or(Vec3::X);
        self.up = right.cross(self.direction).try_normalize().unwrap_or(WORLD_UP);

        let step = speed * dt.as_secs_f32();
        let b = &self.bindings;
        let mut displacement = Vec3::ZERO;
        if input.is_held(b.rise) {
            displacement += WORLD_UP;
        }
        if input.is_held(b.sink) {
            displacement -= WORLD_UP;
        }
        if input.is_held(b.forward) {
            displacement += self.direction;
        }
        if input.is_held(b.back) {
            displacement -= self.direction;
        }
        if input.is_held(b.strafe_left) {
            displacement -= right;
        }
        if input.is_held(b.strafe_right) {
            displacement += right;
        }
        self.position += displacement * step;

        // Translating while locked on drifts slightly off the orbit: movement
        // is along straight lines, not around the target. Accepted as is.
        if let Facing::LockedOn(id) = self.facing {
            match targets.get(id) {
                Some(point) => self.face(point),
                None => {
                    tracing::warn!(target_id = ?id.0, "lock-on target vanished, back to free-look");
                    self.facing = Facing::FreeLook;
                }
            }
        }

        tracing::trace!(
            tick = input.tick,
            position = ?self.position,
            yaw = self.yaw,
            pitch = self.pitch,
            "eyepoint ticked"
        );
    }

    fn toggle_lock(&mut self, targets: &TargetRegistry) {
        if let Facing::LockedOn(_) = self.facing {
            self.facing = Facing::FreeLook;
            tracing::info!("stopped following target");
            return;
        }
        let candidate = self.lock_candidate;
        match candidate {
            Some(id) if self.lock_on(id, targets) => {
                tracing::info!(target_id = ?id.0, "following target");
            }
            Some(id) => {
                tracing::warn!(target_id = ?id.0, "lock-on candidate is not registered");
            }
            None => tracing::debug!("lock toggle pressed with no candidate"),
        }
    }

    /// Point at `point` and derive yaw/pitch from the new direction.
    fn face(&mut self, point: Vec3) {
        if let Some(direction) = (point - self.position).try_normalize() {
            self.direction = direction;
            let (yaw, pitch) = angles_from_direction(direction);
            self.yaw = yaw;
            self.pitch = pitch;
        }
    }
}

fn wrap_yaw(yaw: f32) -> f32 {
    let wrapped = (yaw + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 { 180.0 } else { wrapped }
}

/// Unit direction for yaw/pitch in degrees. Yaw 0 faces +x, -90 faces -z.
fn direction_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}

/// Yaw/pitch in degrees for a unit direction, with the quadrant fix-up for
/// negative x.
fn angles_from_direction(direction: Vec3) -> (f32, f32) {
    let pitch = direction.y.clamp(-1.0, 1.0).asin();
    let horizontal = pitch.cos();
    let mut yaw = if horizontal > f32::EPSILON {
        (direction.z / horizontal).clamp(-1.0, 1.0).asin().to_degrees()
    } else {
        0.0
    };
    if direction.x < 0.0 && direction.z < 0.0 {
        yaw = -180.0 - yaw;
    } else if direction.x < 0.0 && direction.z >= 0.0 {
        yaw = 180.0 - yaw;
    }
    (wrap_yaw(yaw), pitch.to_degrees())
}
