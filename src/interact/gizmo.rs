//! Transform gizmos: per-object translate/rotate/scale handles driven by
//! the pointer.
//!
//! Each gizmo runs an `idle -> dragging -> idle` machine. Entering
//! `dragging` increments the shared gate count that disables camera
//! orbit; leaving decrements it, saturating at zero, including the
//! disposal path where no release ever fires. Pose events flow through
//! the per-frame pump, which emits only for gizmos actually dragging so
//! an attached-but-idle gizmo stays silent.
//!
//! Handles are picked analytically: translate and scale handles as axis
//! segments from the object's world center, rotate handles as rings in
//! the plane perpendicular to each axis.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::events::TransformEvent;
use crate::interact::{GizmoAxis, GizmoMode, GizmoSpace, PointerSnapshot};
use crate::render::camera::{CameraRig, OrbitGate};
use crate::render::pick::{ray_plane, ray_segment, Ray};
use crate::scene::{ObjectId, SceneGraph, SceneNode};

/// Pick radius around handles, scaled by gizmo size.
const HANDLE_PICK_FACTOR: f32 = 0.15;
const MIN_SCALE_FACTOR: f32 = 0.01;
const MAX_SCALE_FACTOR: f32 = 100.0;

#[derive(Debug, Clone)]
struct GizmoConfig {
    mode: GizmoMode,
    space: GizmoSpace,
    size: f32,
    visible_axes: Vec<GizmoAxis>,
    rotation_snap: Option<f32>,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            mode: GizmoMode::default(),
            space: GizmoSpace::default(),
            size: 1.0,
            visible_axes: GizmoAxis::ALL.to_vec(),
            rotation_snap: None,
        }
    }
}

impl GizmoConfig {
    fn single_visible_axis(&self) -> Option<GizmoAxis> {
        match self.visible_axes.as_slice() {
            [axis] => Some(*axis),
            _ => None,
        }
    }
}

/// Grab references sampled when a drag starts.
#[derive(Debug)]
struct DragSession {
    axis: GizmoAxis,
    /// Object world center at grab time.
    center: Vec3,
    /// World-space direction of the active axis.
    axis_dir: Vec3,
    /// Stable in-plane basis for rotate angle measurement.
    basis_u: Vec3,
    basis_w: Vec3,
    grab_t: f32,
    grab_angle: f32,
    /// False until the first ray sample fixed the grab references.
    grab_set: bool,
    start_position: Vec3,
    start_rotation: Quat,
    start_scale: Vec3,
    start_world_rotation: Quat,
    parent_rotation: Quat,
    parent_inverse: Mat4,
}

#[derive(Debug)]
enum GizmoState {
    Idle,
    Dragging(DragSession),
}

#[derive(Debug)]
struct Gizmo {
    config: GizmoConfig,
    state: GizmoState,
}

impl Gizmo {
    fn dragging(&self) -> bool {
        matches!(self.state, GizmoState::Dragging(_))
    }
}

/// All transform gizmos of one session, keyed by object id.
#[derive(Debug, Default)]
pub struct GizmoManager {
    gizmos: HashMap<ObjectId, Gizmo>,
}

impl GizmoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reconfigure the gizmo for `id`. Returns false when the
    /// object does not exist.
    pub fn enable(
        &mut self,
        graph: &SceneGraph,
        id: &str,
        mode: GizmoMode,
        size: Option<f32>,
        visible_axes: Option<Vec<GizmoAxis>>,
    ) -> bool {
        if !graph.contains(id) {
            log::debug!("transform controls requested for unknown object '{id}'");
            return false;
        }
        let gizmo = self.gizmos.entry(id.to_string()).or_insert_with(|| Gizmo {
            config: GizmoConfig::default(),
            state: GizmoState::Idle,
        });
        gizmo.config.mode = mode;
        if let Some(size) = size {
            gizmo.config.size = size.max(0.1);
        }
        if let Some(axes) = visible_axes {
            gizmo.config.visible_axes = axes;
        }
        true
    }

    /// Remove the gizmo. A gizmo disposed mid-drag still releases its
    /// single gate increment.
    pub fn disable(&mut self, id: &str, gate: &mut OrbitGate) {
        let Some(gizmo) = self.gizmos.remove(id) else {
            return;
        };
        if gizmo.dragging() {
            log::debug!("transform controls for '{id}' disposed mid-drag");
            gate.end_gizmo_drag();
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.gizmos.contains_key(id)
    }

    pub fn dragging_any(&self) -> bool {
        self.gizmos.values().any(Gizmo::dragging)
    }

    /// Active drag axis, for shells that highlight the grabbed handle.
    pub fn active_axis(&self, id: &str) -> Option<GizmoAxis> {
        match &self.gizmos.get(id)?.state {
            GizmoState::Dragging(session) => Some(session.axis),
            GizmoState::Idle => None,
        }
    }

    pub fn set_mode(&mut self, id: &str, mode: GizmoMode) {
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.config.mode = mode;
        }
    }

    pub fn set_size(&mut self, id: &str, size: f32) {
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.config.size = size.max(0.1);
        }
    }

    pub fn set_space(&mut self, id: &str, space: GizmoSpace) {
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.config.space = space;
        }
    }

    /// Snap increment in radians; zero or negative disables snapping.
    pub fn set_rotation_snap(&mut self, id: &str, radians: f32) {
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.config.rotation_snap = (radians > 0.0).then_some(radians);
        }
    }

    /// Dispose gizmos attached to deleted objects.
    pub fn prune(&mut self, removed: &[ObjectId], gate: &mut OrbitGate) {
        for id in removed {
            self.disable(id, gate);
        }
    }

    /// Try to grab a handle under the pointer. Returns the
    /// `transform_start` payload when a drag begins.
    pub fn pointer_pressed(
        &mut self,
        graph: &SceneGraph,
        rig: &CameraRig,
        aspect: f32,
        pointer: &PointerSnapshot,
        gate: &mut OrbitGate,
    ) -> Option<TransformEvent> {
        let ray = Ray::from_ndc(rig, aspect, pointer.ndc_x, pointer.ndc_y)?;

        let mut best: Option<(f32, ObjectId, GizmoAxis)> = None;
        for (id, gizmo) in &self.gizmos {
            if gizmo.dragging() {
                continue;
            }
            let Some(center) = graph.world_position(id) else {
                continue;
            };
            for &axis in &gizmo.config.visible_axes {
                let Some(dir) = axis_direction(graph, id, &gizmo.config, axis) else {
                    continue;
                };
                let Some(t) = pick_handle(&ray, center, dir, &gizmo.config) else {
                    continue;
                };
                if best.as_ref().map_or(true, |(bt, _, _)| t < *bt) {
                    best = Some((t, id.clone(), axis));
                }
            }
        }

        let (_, id, axis) = best?;
        self.begin_drag_with_ray(graph, &id, axis, Some(&ray), gate)
    }

    /// Begin a drag programmatically. Grab references are fixed by the
    /// first pointer sample, so the first move is a no-op delta.
    pub fn begin_drag(
        &mut self,
        graph: &SceneGraph,
        id: &str,
        axis: GizmoAxis,
        gate: &mut OrbitGate,
    ) -> Option<TransformEvent> {
        self.begin_drag_with_ray(graph, id, axis, None, gate)
    }

    fn begin_drag_with_ray(
        &mut self,
        graph: &SceneGraph,
        id: &str,
        axis: GizmoAxis,
        ray: Option<&Ray>,
        gate: &mut OrbitGate,
    ) -> Option<TransformEvent> {
        let gizmo = self.gizmos.get(id)?;
        if gizmo.dragging() {
            return None;
        }
        let config = gizmo.config.clone();
        let session = make_session(graph, id, &config, axis, ray)?;

        gate.begin_gizmo_drag();
        let node = graph.get(id)?;
        let event = pose_event(node, None, config.mode);
        if let Some(gizmo) = self.gizmos.get_mut(id) {
            gizmo.state = GizmoState::Dragging(session);
        }
        Some(event)
    }

    /// Update every dragging gizmo from the current pointer ray.
    pub fn pointer_moved(
        &mut self,
        graph: &mut SceneGraph,
        rig: &CameraRig,
        aspect: f32,
        pointer: &PointerSnapshot,
    ) {
        let Some(ray) = Ray::from_ndc(rig, aspect, pointer.ndc_x, pointer.ndc_y) else {
            return;
        };
        for (id, gizmo) in &mut self.gizmos {
            if let GizmoState::Dragging(session) = &mut gizmo.state {
                apply_drag(graph, id, &gizmo.config, session, &ray);
            }
        }
    }

    /// End the drag on one gizmo, returning its `transform_end` payload.
    pub fn end_drag(
        &mut self,
        graph: &SceneGraph,
        id: &str,
        gate: &mut OrbitGate,
    ) -> Option<TransformEvent> {
        let gizmo = self.gizmos.get_mut(id)?;
        if !gizmo.dragging() {
            return None;
        }
        gizmo.state = GizmoState::Idle;
        gate.end_gizmo_drag();
        let node = graph.get(id)?;
        Some(pose_event(node, None, gizmo.config.mode))
    }

    /// End every live drag (pointer released). Returns the
    /// `transform_end` payloads.
    pub fn pointer_released(
        &mut self,
        graph: &SceneGraph,
        gate: &mut OrbitGate,
    ) -> Vec<TransformEvent> {
        let dragging: Vec<ObjectId> = self
            .gizmos
            .iter()
            .filter(|(_, g)| g.dragging())
            .map(|(id, _)| id.clone())
            .collect();
        dragging
            .iter()
            .filter_map(|id| self.end_drag(graph, id, gate))
            .collect()
    }

    /// Per-frame pose pump. Emits a `transform` event for each gizmo in
    /// the dragging state and stays silent for idle ones. Rotate gizmos
    /// with exactly one visible axis have their active axis re-asserted
    /// here in case handle hit-testing drifted to a neighbor.
    pub fn pump(&mut self, graph: &SceneGraph) -> Vec<TransformEvent> {
        let mut events = Vec::new();
        for (id, gizmo) in &mut self.gizmos {
            let GizmoState::Dragging(session) = &mut gizmo.state else {
                continue;
            };
            if gizmo.config.mode == GizmoMode::Rotate {
                if let Some(locked) = gizmo.config.single_visible_axis() {
                    if session.axis != locked {
                        session.axis = locked;
                        session.grab_set = false;
                    }
                }
            }
            let Some(node) = graph.get(id) else {
                continue;
            };
            let world = graph.world_position(id);
            events.push(pose_event(node, world, gizmo.config.mode));
        }
        events
    }
}

fn axis_direction(
    graph: &SceneGraph,
    id: &str,
    config: &GizmoConfig,
    axis: GizmoAxis,
) -> Option<Vec3> {
    match config.space {
        GizmoSpace::World => Some(axis.unit()),
        GizmoSpace::Local => Some((graph.world_rotation(id)? * axis.unit()).normalize()),
    }
}

/// Ray parameter of the handle under the pointer, if any.
fn pick_handle(ray: &Ray, center: Vec3, axis_dir: Vec3, config: &GizmoConfig) -> Option<f32> {
    let radius = HANDLE_PICK_FACTOR * config.size;
    match config.mode {
        GizmoMode::Translate | GizmoMode::Scale => {
            let tip = center + axis_dir * config.size;
            let (t, distance) = ray_segment(ray.origin, ray.dir, center, tip);
            (distance <= radius).then_some(t)
        }
        GizmoMode::Rotate => {
            let hit = ray_plane(ray, center, axis_dir)?;
            let ring_error = ((hit - center).length() - config.size).abs();
            (ring_error <= radius).then(|| (hit - ray.origin).dot(ray.dir))
        }
    }
}

fn make_session(
    graph: &SceneGraph,
    id: &str,
    config: &GizmoConfig,
    axis: GizmoAxis,
    ray: Option<&Ray>,
) -> Option<DragSession> {
    let node = graph.get(id)?;
    let center = graph.world_position(id)?;
    let axis_dir = axis_direction(graph, id, config, axis)?;
    let (basis_u, basis_w) = plane_basis(axis_dir);
    let start_world_rotation = graph.world_rotation(id)?;
    let parent_rotation = (start_world_rotation * node.rotation.inverse()).normalize();
    let parent_inverse = graph.parent_world_matrix(id)?.inverse();

    let mut session = DragSession {
        axis,
        center,
        axis_dir,
        basis_u,
        basis_w,
        grab_t: 0.0,
        grab_angle: 0.0,
        grab_set: false,
        start_position: node.position,
        start_rotation: node.rotation,
        start_scale: node.scale,
        start_world_rotation,
        parent_rotation,
        parent_inverse,
    };
    if let Some(ray) = ray {
        fix_grab(&mut session, config, ray);
    }
    Some(session)
}

/// Sample the grab references from a pointer ray.
fn fix_grab(session: &mut DragSession, config: &GizmoConfig, ray: &Ray) {
    match config.mode {
        GizmoMode::Translate | GizmoMode::Scale => {
            if let Some(t) = closest_axis_t(ray, session.center, session.axis_dir) {
                session.grab_t = t;
                session.grab_set = true;
            }
        }
        GizmoMode::Rotate => {
            if let Some(hit) = ray_plane(ray, session.center, session.axis_dir) {
                session.grab_angle = in_plane_angle(session, hit);
                session.grab_set = true;
            }
        }
    }
}

fn apply_drag(
    graph: &mut SceneGraph,
    id: &str,
    config: &GizmoConfig,
    session: &mut DragSession,
    ray: &Ray,
) {
    if !session.grab_set {
        // Axis changed since the session started (programmatic begin or
        // the rotate lock); rebuild the axis frame, then sample the grab.
        let world_axis = match config.space {
            GizmoSpace::World => session.axis.unit(),
            GizmoSpace::Local => (session.start_world_rotation * session.axis.unit()).normalize(),
        };
        session.axis_dir = world_axis;
        let (u, w) = plane_basis(world_axis);
        session.basis_u = u;
        session.basis_w = w;
        fix_grab(session, config, ray);
        return;
    }

    match config.mode {
        GizmoMode::Translate => {
            let Some(t) = closest_axis_t(ray, session.center, session.axis_dir) else {
                return;
            };
            let delta_world = session.axis_dir * (t - session.grab_t);
            let delta_local = session.parent_inverse.transform_vector3(delta_world);
            if let Some(node) = graph.get_mut(id) {
                node.position = session.start_position + delta_local;
            }
        }
        GizmoMode::Rotate => {
            let Some(hit) = ray_plane(ray, session.center, session.axis_dir) else {
                return;
            };
            let mut delta = wrap_angle(in_plane_angle(session, hit) - session.grab_angle);
            if let Some(snap) = config.rotation_snap {
                delta = (delta / snap).round() * snap;
            }
            let rotation = match config.space {
                GizmoSpace::Local => {
                    session.start_rotation * Quat::from_axis_angle(session.axis.unit(), delta)
                }
                GizmoSpace::World => {
                    session.parent_rotation.inverse()
                        * Quat::from_axis_angle(session.axis.unit(), delta)
                        * session.start_world_rotation
                }
            };
            if let Some(node) = graph.get_mut(id) {
                node.rotation = rotation.normalize();
            }
        }
        GizmoMode::Scale => {
            let Some(t) = closest_axis_t(ray, session.center, session.axis_dir) else {
                return;
            };
            let factor = if session.grab_t.abs() > 1e-4 {
                (t / session.grab_t).clamp(MIN_SCALE_FACTOR, MAX_SCALE_FACTOR)
            } else {
                1.0
            };
            let mut scale = session.start_scale;
            match session.axis {
                GizmoAxis::X => scale.x = session.start_scale.x * factor,
                GizmoAxis::Y => scale.y = session.start_scale.y * factor,
                GizmoAxis::Z => scale.z = session.start_scale.z * factor,
            }
            if let Some(node) = graph.get_mut(id) {
                node.scale = scale;
            }
        }
    }
}

fn pose_event(node: &SceneNode, world: Option<Vec3>, mode: GizmoMode) -> TransformEvent {
    let (rx, ry, rz) = node.euler_rotation();
    TransformEvent {
        object_id: node.id.clone(),
        object_name: node.name.clone(),
        x: node.position.x,
        y: node.position.y,
        z: node.position.z,
        wx: world.map(|w| w.x),
        wy: world.map(|w| w.y),
        wz: world.map(|w| w.z),
        rx,
        ry,
        rz,
        mode,
    }
}

/// Unclamped parameter of the closest point on the axis line to the ray.
fn closest_axis_t(ray: &Ray, center: Vec3, axis_dir: Vec3) -> Option<f32> {
    let r = ray.origin - center;
    let a = ray.dir.dot(ray.dir);
    let b = ray.dir.dot(axis_dir);
    let c = axis_dir.dot(axis_dir);
    let d = ray.dir.dot(r);
    let e = axis_dir.dot(r);
    let denom = a * c - b * b;
    if denom.abs() < 1e-9 {
        // Ray parallel to the axis, no usable parameter.
        return None;
    }
    Some((a * e - b * d) / denom)
}

fn plane_basis(normal: Vec3) -> (Vec3, Vec3) {
    let candidate = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let u = normal.cross(candidate).normalize();
    let w = normal.cross(u).normalize();
    (u, w)
}

fn in_plane_angle(session: &DragSession, hit: Vec3) -> f32 {
    let v = hit - session.center;
    v.dot(session.basis_w).atan2(v.dot(session.basis_u))
}

fn wrap_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a > PI {
        a -= TAU;
    } else if a < -PI {
        a += TAU;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraOptions;
    use crate::interact::{Modifiers, PointerButton};
    use crate::scene::geometry::NodeKind;
    use crate::scene::ROOT_ID;

    fn ortho_top_down() -> CameraRig {
        let mut rig = CameraRig::new(CameraOptions::Orthographic {
            size: 10.0,
            near: 0.1,
            far: 100.0,
        });
        rig.position = Vec3::new(0.0, 0.0, 10.0);
        rig.target = Vec3::ZERO;
        rig.up = Vec3::Y;
        rig
    }

    fn pointer_at(ndc_x: f32, ndc_y: f32) -> PointerSnapshot {
        PointerSnapshot {
            ndc_x,
            ndc_y,
            button: PointerButton::Left,
            modifiers: Modifiers::default(),
            screen_x: 0.0,
            screen_y: 0.0,
            client_x: 0.0,
            client_y: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    fn graph_with(ids: &[&str]) -> SceneGraph {
        let mut graph = SceneGraph::new();
        for id in ids {
            graph
                .insert(SceneNode::new(*id, NodeKind::Group), ROOT_ID)
                .unwrap();
        }
        graph
    }

    #[test]
    fn enable_is_false_for_unknown_objects() {
        let graph = graph_with(&["a"]);
        let mut manager = GizmoManager::new();
        assert!(!manager.enable(&graph, "ghost", GizmoMode::Translate, None, None));
        assert!(!manager.has("ghost"));
        assert!(manager.enable(&graph, "a", GizmoMode::Translate, None, None));
        assert!(manager.has("a"));
    }

    #[test]
    fn enable_reconfigures_in_place() {
        let graph = graph_with(&["a"]);
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "a", GizmoMode::Translate, Some(2.0), None);
        manager.enable(
            &graph,
            "a",
            GizmoMode::Rotate,
            None,
            Some(vec![GizmoAxis::Z]),
        );
        let gizmo = manager.gizmos.get("a").unwrap();
        assert_eq!(gizmo.config.mode, GizmoMode::Rotate);
        assert_eq!(gizmo.config.size, 2.0);
        assert_eq!(gizmo.config.visible_axes, vec![GizmoAxis::Z]);
    }

    #[test]
    fn concurrent_drags_keep_orbit_disabled_until_both_release() {
        let graph = graph_with(&["a", "b"]);
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "a", GizmoMode::Translate, None, None);
        manager.enable(&graph, "b", GizmoMode::Translate, None, None);

        manager.begin_drag(&graph, "a", GizmoAxis::X, &mut gate);
        manager.begin_drag(&graph, "b", GizmoAxis::Y, &mut gate);
        assert!(!gate.orbit_allowed());
        assert!(manager.dragging_any());

        manager.end_drag(&graph, "a", &mut gate);
        assert!(!gate.orbit_allowed());
        assert!(manager.dragging_any());
        manager.end_drag(&graph, "b", &mut gate);
        assert!(gate.orbit_allowed());
        assert!(!manager.dragging_any());
    }

    #[test]
    fn dispose_mid_drag_releases_exactly_one_increment() {
        let graph = graph_with(&["a"]);
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "a", GizmoMode::Translate, None, None);
        manager.begin_drag(&graph, "a", GizmoAxis::X, &mut gate);
        assert!(!gate.orbit_allowed());

        manager.disable("a", &mut gate);
        assert!(gate.orbit_allowed());
        // A second disable must not decrement again.
        manager.disable("a", &mut gate);
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn pump_emits_only_while_dragging() {
        let mut graph = graph_with(&["parent"]);
        graph
            .insert(SceneNode::new("child", NodeKind::Group), "parent")
            .unwrap();
        graph.get_mut("parent").unwrap().position = Vec3::new(5.0, 0.0, 0.0);
        graph.get_mut("child").unwrap().position = Vec3::new(1.0, 0.0, 0.0);

        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "child", GizmoMode::Translate, None, None);
        assert!(manager.pump(&graph).is_empty());

        manager.begin_drag(&graph, "child", GizmoAxis::X, &mut gate);
        let events = manager.pump(&graph);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.object_id, "child");
        // Local position stays local; world position resolves the chain.
        assert_eq!(event.x, 1.0);
        assert_eq!(event.wx, Some(6.0));

        manager.end_drag(&graph, "child", &mut gate);
        assert!(manager.pump(&graph).is_empty());
    }

    #[test]
    fn pointer_drives_a_translate_drag() {
        let mut graph = graph_with(&["a"]);
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "a", GizmoMode::Translate, None, None);

        // Ortho size 10, aspect 1: NDC 0.1 is half a world unit, on the
        // X handle.
        let start = manager
            .pointer_pressed(&graph, &rig, 1.0, &pointer_at(0.1, 0.0), &mut gate)
            .expect("transform_start");
        assert_eq!(start.object_id, "a");
        assert!(start.wx.is_none());
        assert_eq!(manager.active_axis("a"), Some(GizmoAxis::X));
        assert!(!gate.orbit_allowed());

        manager.pointer_moved(&mut graph, &rig, 1.0, &pointer_at(0.5, 0.0));
        let x = graph.get("a").unwrap().position.x;
        assert!((x - 2.0).abs() < 1e-3, "moved to {x}");

        let ended = manager.pointer_released(&graph, &mut gate);
        assert_eq!(ended.len(), 1);
        assert!((ended[0].x - 2.0).abs() < 1e-3);
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn pointer_misses_return_nothing() {
        let graph = graph_with(&["a"]);
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "a", GizmoMode::Translate, None, None);

        let grabbed = manager.pointer_pressed(&graph, &rig, 1.0, &pointer_at(0.9, 0.9), &mut gate);
        assert!(grabbed.is_none());
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn rotate_drag_spins_about_the_ring_axis() {
        let mut graph = graph_with(&["a"]);
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(
            &graph,
            "a",
            GizmoMode::Rotate,
            None,
            Some(vec![GizmoAxis::Z]),
        );

        // Grab the Z ring where it crosses +X, then sweep to +Y.
        manager
            .pointer_pressed(&graph, &rig, 1.0, &pointer_at(0.2, 0.0), &mut gate)
            .expect("transform_start");
        manager.pointer_moved(&mut graph, &rig, 1.0, &pointer_at(0.0, 0.2));

        let node = graph.get("a").unwrap();
        let (_, _, rz) = node.euler_rotation();
        assert!(
            (rz - std::f32::consts::FRAC_PI_2).abs() < 1e-3,
            "rz was {rz}"
        );
    }

    #[test]
    fn rotation_snap_quantizes_the_delta() {
        let mut graph = graph_with(&["a"]);
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(
            &graph,
            "a",
            GizmoMode::Rotate,
            None,
            Some(vec![GizmoAxis::Z]),
        );
        manager.set_rotation_snap("a", std::f32::consts::FRAC_PI_2);

        manager
            .pointer_pressed(&graph, &rig, 1.0, &pointer_at(0.2, 0.0), &mut gate)
            .expect("transform_start");
        // Sweep about 60 degrees; the snap rounds to 90.
        manager.pointer_moved(&mut graph, &rig, 1.0, &pointer_at(0.1, 0.173));

        let (_, _, rz) = graph.get("a").unwrap().euler_rotation();
        assert!(
            (rz - std::f32::consts::FRAC_PI_2).abs() < 1e-3,
            "rz was {rz}"
        );
    }

    #[test]
    fn scale_drag_multiplies_the_grabbed_axis() {
        let mut graph = graph_with(&["a"]);
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(&graph, "a", GizmoMode::Scale, None, None);

        manager
            .pointer_pressed(&graph, &rig, 1.0, &pointer_at(0.1, 0.0), &mut gate)
            .expect("transform_start");
        manager.pointer_moved(&mut graph, &rig, 1.0, &pointer_at(0.2, 0.0));

        let scale = graph.get("a").unwrap().scale;
        assert!((scale.x - 2.0).abs() < 1e-3, "scale.x was {}", scale.x);
        assert_eq!(scale.y, 1.0);
        assert_eq!(scale.z, 1.0);
    }

    #[test]
    fn single_visible_axis_locks_rotate_drags() {
        let graph = graph_with(&["a"]);
        let mut gate = OrbitGate::new();
        let mut manager = GizmoManager::new();
        manager.enable(
            &graph,
            "a",
            GizmoMode::Rotate,
            None,
            Some(vec![GizmoAxis::Y]),
        );

        // Internal state drifts to X; the pump forces it back.
        manager.begin_drag(&graph, "a", GizmoAxis::X, &mut gate);
        assert_eq!(manager.active_axis("a"), Some(GizmoAxis::X));
        manager.pump(&graph);
        assert_eq!(manager.active_axis("a"), Some(GizmoAxis::Y));
    }

    #[test]
    fn setters_on_unknown_ids_are_silent() {
        let mut manager = GizmoManager::new();
        manager.set_mode("ghost", GizmoMode::Scale);
        manager.set_size("ghost", 3.0);
        manager.set_space("ghost", GizmoSpace::Local);
        manager.set_rotation_snap("ghost", 1.0);
        assert!(!manager.has("ghost"));
    }
}
