//! Camera rig, orbit controls, orbit gating, and the move_camera tween.
//!
//! The rig holds the live pose (position, look-at target, up) plus the
//! projection chosen at session start. Orbit input never touches the rig
//! directly; it goes through `OrbitRig`, which is bound to a fixed up axis
//! and rebuilt from scratch when a tween lands with a different up vector.

use glam::{Mat4, Quat, Vec3};
use serde::Serialize;

use crate::config::CameraOptions;

/// Default camera pose: slightly behind and above the origin, Z up.
pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, -3.0, 5.0);

#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: CameraOptions,
}

impl CameraRig {
    pub fn new(projection: CameraOptions) -> Self {
        Self {
            position: DEFAULT_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Z,
            projection,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        match self.projection {
            CameraOptions::Perspective { fov, near, far } => {
                Mat4::perspective_rh(fov.to_radians(), aspect, near, far)
            }
            CameraOptions::Orthographic { size, near, far } => {
                let half_h = size * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y)
    }
}

/// Live camera pose snapshot, answering `get_camera`.
#[derive(Debug, Clone, Serialize)]
pub struct CameraPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub look_at_x: f32,
    pub look_at_y: f32,
    pub look_at_z: f32,
    pub up_x: f32,
    pub up_y: f32,
    pub up_z: f32,
    #[serde(flatten)]
    pub projection: CameraOptions,
}

impl CameraPose {
    pub fn from_rig(rig: &CameraRig) -> Self {
        Self {
            x: rig.position.x,
            y: rig.position.y,
            z: rig.position.z,
            look_at_x: rig.target.x,
            look_at_y: rig.target.y,
            look_at_z: rig.target.z,
            up_x: rig.up.x,
            up_y: rig.up.y,
            up_z: rig.up.z,
            projection: rig.projection,
        }
    }
}

/// Orbit-control state bound to one up axis and one pivot.
///
/// When a tween finishes with a changed up vector the session replaces
/// this with a fresh instance instead of mutating it, so any interaction
/// state starts over on the new axis.
#[derive(Debug, Clone, Copy)]
pub struct OrbitRig {
    up: Vec3,
    pivot: Vec3,
}

impl OrbitRig {
    pub fn new(up: Vec3, pivot: Vec3) -> Self {
        Self {
            up: up.try_normalize().unwrap_or(Vec3::Z),
            pivot,
        }
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn pivot(&self) -> Vec3 {
        self.pivot
    }

    /// Rotate the camera around the pivot: yaw spins about the up axis,
    /// pitch tilts toward it, stopped short of the poles.
    pub fn orbit(&self, rig: &mut CameraRig, yaw_delta: f32, pitch_delta: f32) {
        let mut offset = rig.position - self.pivot;
        if offset.length() < 1e-6 {
            offset = -Vec3::Y * 0.05;
        }
        offset = Quat::from_axis_angle(self.up, -yaw_delta) * offset;

        if let Some(right) = self.up.cross(offset).try_normalize() {
            let pitched = Quat::from_axis_angle(right, pitch_delta) * offset;
            let alignment = pitched
                .try_normalize()
                .map(|dir| dir.dot(self.up).abs())
                .unwrap_or(1.0);
            if alignment < 0.995 {
                offset = pitched;
            }
        }

        rig.position = self.pivot + offset;
        rig.target = self.pivot;
        rig.up = self.up;
    }

    /// Dolly toward (positive) or away from the pivot.
    pub fn zoom(&self, rig: &mut CameraRig, amount: f32) {
        let offset = rig.position - self.pivot;
        let radius = offset.length().max(0.05);
        let scaled = (radius * (1.0 - amount * 0.1)).clamp(0.05, 1e4);
        let dir = offset.try_normalize().unwrap_or(-Vec3::Y);
        rig.position = self.pivot + dir * scaled;
        rig.target = self.pivot;
    }

    /// Slide pivot and camera together in the view plane.
    pub fn pan(&mut self, rig: &mut CameraRig, dx: f32, dy: f32) {
        let forward = rig.forward();
        let right = forward.cross(self.up).try_normalize().unwrap_or(Vec3::X);
        let true_up = right.cross(forward);
        let delta = right * dx + true_up * dy;
        self.pivot += delta;
        rig.position += delta;
        rig.target = self.pivot;
    }
}

/// Gates camera-orbit input against interactive manipulation.
///
/// The user flag follows `set_orbit_enabled`. Gizmo drags hold a
/// saturating count so overlapping sessions keep orbit off until the last
/// one releases; a free drag saves the user flag on start and restores it
/// exactly on end.
#[derive(Debug, Clone, Copy)]
pub struct OrbitGate {
    user_enabled: bool,
    gizmo_drags: u32,
    free_drag_restore: Option<bool>,
}

impl Default for OrbitGate {
    fn default() -> Self {
        Self::new()
    }
}

impl OrbitGate {
    pub fn new() -> Self {
        Self {
            user_enabled: true,
            gizmo_drags: 0,
            free_drag_restore: None,
        }
    }

    pub fn set_user_enabled(&mut self, enabled: bool) {
        self.user_enabled = enabled;
    }

    pub fn orbit_allowed(&self) -> bool {
        self.user_enabled && self.gizmo_drags == 0
    }

    pub fn gizmo_drags(&self) -> u32 {
        self.gizmo_drags
    }

    pub fn begin_gizmo_drag(&mut self) {
        self.gizmo_drags += 1;
    }

    /// Decrement the drag count, clamping at zero. Disposal paths may
    /// call this without a matching begin having survived.
    pub fn end_gizmo_drag(&mut self) {
        if self.gizmo_drags == 0 {
            log::warn!("gizmo drag count underflow, clamping at zero");
            return;
        }
        self.gizmo_drags -= 1;
    }

    pub fn begin_free_drag(&mut self) {
        if self.free_drag_restore.is_none() {
            self.free_drag_restore = Some(self.user_enabled);
        }
        self.user_enabled = false;
    }

    pub fn end_free_drag(&mut self) {
        if let Some(saved) = self.free_drag_restore.take() {
            self.user_enabled = saved;
        }
    }
}

/// Target of a `move_camera` call. `None` axes hold their current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraGoal {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub z: Option<f32>,
    pub look_at_x: Option<f32>,
    pub look_at_y: Option<f32>,
    pub look_at_z: Option<f32>,
    pub up_x: Option<f32>,
    pub up_y: Option<f32>,
    pub up_z: Option<f32>,
    pub duration: f32,
}

/// One in-flight camera interpolation. Start values are sampled when the
/// tween is created, which is also when `None` goal axes are resolved.
#[derive(Debug, Clone, Copy)]
pub struct CameraTween {
    from_position: Vec3,
    to_position: Vec3,
    from_target: Vec3,
    to_target: Vec3,
    from_up: Vec3,
    to_up: Vec3,
    duration: f32,
    elapsed: f32,
}

impl CameraTween {
    pub fn new(rig: &CameraRig, goal: &CameraGoal) -> Self {
        Self {
            from_position: rig.position,
            to_position: Vec3::new(
                goal.x.unwrap_or(rig.position.x),
                goal.y.unwrap_or(rig.position.y),
                goal.z.unwrap_or(rig.position.z),
            ),
            from_target: rig.target,
            to_target: Vec3::new(
                goal.look_at_x.unwrap_or(rig.target.x),
                goal.look_at_y.unwrap_or(rig.target.y),
                goal.look_at_z.unwrap_or(rig.target.z),
            ),
            from_up: rig.up,
            to_up: Vec3::new(
                goal.up_x.unwrap_or(rig.up.x),
                goal.up_y.unwrap_or(rig.up.y),
                goal.up_z.unwrap_or(rig.up.z),
            ),
            duration: goal.duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Advance by `dt` seconds. Returns true when the tween completed
    /// this tick. The up vector is written before the target so the
    /// derived orientation uses the new up.
    pub fn tick(&mut self, rig: &mut CameraRig, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        let t = if self.duration <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        let eased = ease_in_out(t);

        rig.up = self
            .from_up
            .lerp(self.to_up, eased)
            .try_normalize()
            .unwrap_or(rig.up);
        rig.position = self.from_position.lerp(self.to_position, eased);
        rig.target = self.from_target.lerp(self.to_target, eased);

        t >= 1.0
    }

    pub fn up_changed(&self) -> bool {
        (self.to_up - self.from_up).length() > 1e-6
    }

    pub fn final_target(&self) -> Vec3 {
        self.to_target
    }

    pub fn final_up(&self) -> Vec3 {
        self.to_up
    }
}

/// Quadratic ease in-out on [0, 1].
fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        let back = -2.0 * t + 2.0;
        1.0 - back * back * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_rig() -> CameraRig {
        CameraRig::new(CameraOptions::default())
    }

    #[test]
    fn partial_goal_holds_other_axes() {
        let mut rig = default_rig();
        let goal = CameraGoal {
            x: Some(4.0),
            duration: 0.0,
            ..CameraGoal::default()
        };
        let mut tween = CameraTween::new(&rig, &goal);
        assert!(tween.tick(&mut rig, 0.016));

        assert_eq!(rig.position, Vec3::new(4.0, -3.0, 5.0));
        assert_eq!(rig.target, Vec3::ZERO);
        assert_eq!(rig.up, Vec3::Z);
        assert!(!tween.up_changed());
    }

    #[test]
    fn tween_interpolates_then_lands_exactly() {
        let mut rig = default_rig();
        let goal = CameraGoal {
            x: Some(10.0),
            y: Some(-3.0),
            z: Some(5.0),
            duration: 1.0,
            ..CameraGoal::default()
        };
        let mut tween = CameraTween::new(&rig, &goal);

        assert!(!tween.tick(&mut rig, 0.5));
        assert!(rig.position.x > 0.0 && rig.position.x < 10.0);

        assert!(tween.tick(&mut rig, 0.6));
        assert_eq!(rig.position, Vec3::new(10.0, -3.0, 5.0));
    }

    #[test]
    fn up_change_is_detected_for_orbit_rebuild() {
        let rig = default_rig();
        let goal = CameraGoal {
            up_x: Some(0.0),
            up_y: Some(1.0),
            up_z: Some(0.0),
            duration: 0.2,
            ..CameraGoal::default()
        };
        let tween = CameraTween::new(&rig, &goal);
        assert!(tween.up_changed());
        assert_eq!(tween.final_up(), Vec3::Y);
    }

    #[test]
    fn orbit_preserves_distance_and_recenters() {
        let mut rig = default_rig();
        rig.position = Vec3::new(0.0, -3.0, 0.0);
        let orbit = OrbitRig::new(Vec3::Z, Vec3::ZERO);

        orbit.orbit(&mut rig, 0.3, 0.1);
        assert!((rig.position.length() - 3.0).abs() < 1e-4);
        assert_eq!(rig.target, Vec3::ZERO);
        assert!(rig.position.is_finite());
    }

    #[test]
    fn orbit_stops_short_of_the_poles() {
        let mut rig = default_rig();
        rig.position = Vec3::new(0.0, -3.0, 0.0);
        let orbit = OrbitRig::new(Vec3::Z, Vec3::ZERO);

        for _ in 0..100 {
            orbit.orbit(&mut rig, 0.0, 0.3);
        }
        let alignment = (rig.position - orbit.pivot())
            .normalize()
            .dot(Vec3::Z)
            .abs();
        assert!(alignment < 0.9999);
        assert!(rig.position.is_finite());
    }

    #[test]
    fn gate_requires_all_gizmo_drags_to_release() {
        let mut gate = OrbitGate::new();
        assert!(gate.orbit_allowed());

        gate.begin_gizmo_drag();
        gate.begin_gizmo_drag();
        assert!(!gate.orbit_allowed());

        gate.end_gizmo_drag();
        assert!(!gate.orbit_allowed());

        gate.end_gizmo_drag();
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn gate_clamps_underflow() {
        let mut gate = OrbitGate::new();
        gate.end_gizmo_drag();
        assert_eq!(gate.gizmo_drags(), 0);
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn free_drag_restores_the_exact_user_flag() {
        let mut gate = OrbitGate::new();
        gate.set_user_enabled(false);

        gate.begin_free_drag();
        assert!(!gate.orbit_allowed());
        // A toggle arriving mid-drag is overwritten by the restore.
        gate.set_user_enabled(true);
        gate.end_free_drag();
        assert!(!gate.orbit_allowed());

        gate.set_user_enabled(true);
        gate.begin_free_drag();
        gate.end_free_drag();
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn projection_matrices_stay_finite() {
        let rig = default_rig();
        let vp = rig.view_projection(16.0 / 9.0);
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));

        let ortho = CameraRig::new(CameraOptions::Orthographic {
            size: 10.0,
            near: 0.1,
            far: 1000.0,
        });
        let vp = ortho.view_projection(0.0); // degenerate aspect falls back
        assert!(vp.to_cols_array().iter().all(|v| v.is_finite()));
    }
}
