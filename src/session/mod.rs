//! The scene session: one live scene graph plus everything that drives
//! it.
//!
//! The session owns the graph, camera, interaction controllers, and the
//! outbound event queue, and is mutated from exactly one execution
//! context: the shell feeds it commands, pointer input, and one
//! `advance` call per frame, then drains `take_events`. Nothing in here
//! locks; concurrent use is a shell bug.
//!
//! Command errors split by contract: mutators aimed at unknown ids are
//! silent no-ops because commands legitimately race deletion, while a
//! `create` naming a missing parent or a reparent cycle is fatal and
//! surfaces as a `CommandError`.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use glam::Vec3;

use crate::assets::{MeshBounds, MeshLoader};
use crate::config::SessionOptions;
use crate::events::{ClickEvent, SceneEvent};
use crate::interact::constraints::ConstraintSet;
use crate::interact::drag::DragController;
use crate::interact::gizmo::GizmoManager;
use crate::interact::{ClickKind, GizmoAxis, GizmoMode, PointerSnapshot};
use crate::render::camera::{
    CameraGoal, CameraPose, CameraRig, CameraTween, OrbitGate, OrbitRig,
};
use crate::render::inset::AxesInset;
use crate::render::pick::hit_test;
use crate::render::{Decor, FrameSnapshot};
use crate::scene::command::{CommandError, ObjectSnapshot, SceneCommand};
use crate::scene::geometry::NodeKind;
use crate::scene::{clip, orientation_from_rows, ObjectId, SceneGraph, SceneNode, ROOT_ID};

pub struct SceneSession {
    options: SessionOptions,
    graph: SceneGraph,
    camera: CameraRig,
    orbit: OrbitRig,
    gate: OrbitGate,
    tween: Option<CameraTween>,
    drag: DragController,
    gizmos: GizmoManager,
    inset: AxesInset,
    decor: Decor,
    loader: Box<dyn MeshLoader>,
    loaded: HashMap<ObjectId, MeshBounds>,
    pending_loads: HashSet<ObjectId>,
    outbox: Vec<SceneEvent>,
    init_sent: bool,
    last_tick: Option<Instant>,
    canvas_width: u32,
    canvas_height: u32,
}

impl SceneSession {
    pub fn new(options: SessionOptions, loader: Box<dyn MeshLoader>) -> Self {
        let camera = CameraRig::new(options.camera);
        let decor = Decor::from_options(&options);
        let drag = DragController::new(ConstraintSet::parse(&options.drag_constraints));
        log::info!(
            "scene session starting: {}x{} at {} fps",
            options.width,
            options.height,
            options.fps
        );
        Self {
            canvas_width: options.width,
            canvas_height: options.height,
            graph: SceneGraph::new(),
            camera,
            orbit: OrbitRig::new(camera.up, camera.target),
            gate: OrbitGate::new(),
            tween: None,
            drag,
            gizmos: GizmoManager::new(),
            inset: AxesInset::new(),
            decor,
            loader,
            loaded: HashMap::new(),
            pending_loads: HashSet::new(),
            outbox: Vec::new(),
            init_sent: false,
            last_tick: None,
            options,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn aspect(&self) -> f32 {
        self.canvas_width.max(1) as f32 / self.canvas_height.max(1) as f32
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.canvas_width = width.max(1);
        self.canvas_height = height.max(1);
    }

    /// Mark the rendering surface live. The first call queues the `init`
    /// event; later calls are no-ops.
    pub fn surface_ready(&mut self) {
        if self.init_sent {
            return;
        }
        self.init_sent = true;
        log::info!("rendering surface ready");
        self.outbox.push(SceneEvent::Init);
    }

    /// Drain the outbound event queue.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.outbox)
    }

    // ---- queries ------------------------------------------------------

    pub fn get_camera(&self) -> CameraPose {
        CameraPose::from_rig(&self.camera)
    }

    pub fn has_transform_controls(&self, id: &str) -> bool {
        self.gizmos.has(id)
    }

    /// Returns false when the object does not exist.
    pub fn enable_transform_controls(
        &mut self,
        id: &str,
        mode: GizmoMode,
        size: Option<f32>,
        visible_axes: Option<Vec<GizmoAxis>>,
    ) -> bool {
        self.gizmos.enable(&self.graph, id, mode, size, visible_axes)
    }

    // ---- command stream -----------------------------------------------

    pub fn apply_json(&mut self, line: &str) -> Result<(), CommandError> {
        self.apply(SceneCommand::from_json(line)?)
    }

    pub fn apply(&mut self, command: SceneCommand) -> Result<(), CommandError> {
        match command {
            SceneCommand::Create { id, parent_id, kind } => {
                self.create_object(id, &parent_id, kind)?;
            }
            SceneCommand::Rename { id, name } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    node.name = name;
                }
            }
            SceneCommand::Material {
                id,
                color,
                opacity,
                side,
            } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    node.material.color = color;
                    node.material.opacity = opacity;
                    node.material.side = side;
                }
            }
            SceneCommand::Move { id, x, y, z } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    node.position = Vec3::new(x, y, z);
                }
            }
            SceneCommand::Scale { id, sx, sy, sz } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    node.scale = Vec3::new(sx, sy, sz);
                }
            }
            SceneCommand::Rotate { id, rows } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    node.rotation = orientation_from_rows(rows);
                }
            }
            SceneCommand::Visible { id, value } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    node.visible = value;
                }
            }
            SceneCommand::Draggable { id, value } => {
                if self.graph.contains(&id) {
                    self.drag.set_draggable(&id, value);
                }
            }
            SceneCommand::Delete { id } => {
                let removed = self.graph.remove_subtree(&id);
                self.cleanup_removed(&removed);
            }
            SceneCommand::Attach {
                id,
                parent_id,
                position,
                rotation,
            } => {
                self.graph.attach(&id, &parent_id)?;
                self.set_local_pose(&id, position, rotation);
            }
            SceneCommand::Detach {
                id,
                position,
                rotation,
            } => {
                self.graph.detach(&id);
                self.set_local_pose(&id, position, rotation);
            }
            SceneCommand::InitObjects { objects } => {
                for snapshot in objects {
                    self.apply_snapshot(snapshot)?;
                }
            }
            SceneCommand::EnableTransformControls {
                id,
                mode,
                size,
                visible_axes,
            } => {
                self.gizmos.enable(&self.graph, &id, mode, size, visible_axes);
            }
            SceneCommand::DisableTransformControls { id } => {
                self.gizmos.disable(&id, &mut self.gate);
            }
            SceneCommand::SetTransformMode { id, mode } => {
                self.gizmos.set_mode(&id, mode);
            }
            SceneCommand::SetTransformSize { id, size } => {
                self.gizmos.set_size(&id, size);
            }
            SceneCommand::SetTransformSpace { id, space } => {
                self.gizmos.set_space(&id, space);
            }
            SceneCommand::SetTransformRotationSnap { id, radians } => {
                self.gizmos.set_rotation_snap(&id, radians);
            }
            SceneCommand::SetClippingPlanes { id, planes } => {
                clip::set_clipping_planes(&mut self.graph, &id, &planes);
            }
            SceneCommand::ClearClippingPlanes { id } => {
                clip::clear_clipping_planes(&mut self.graph, &id);
            }
            SceneCommand::SetAxesInset { opts } => {
                self.inset.set_options(opts);
            }
            SceneCommand::SetAxesLabels { opts } => {
                self.inset.set_labels(opts);
            }
            SceneCommand::MoveCamera {
                x,
                y,
                z,
                look_at_x,
                look_at_y,
                look_at_z,
                up_x,
                up_y,
                up_z,
                duration,
            } => {
                let goal = CameraGoal {
                    x,
                    y,
                    z,
                    look_at_x,
                    look_at_y,
                    look_at_z,
                    up_x,
                    up_y,
                    up_z,
                    duration,
                };
                // Unset axes resolve against the current pose here, at
                // receipt time, and a new tween replaces any in flight.
                self.tween = Some(CameraTween::new(&self.camera, &goal));
            }
            SceneCommand::SetOrbitEnabled { value } => {
                self.gate.set_user_enabled(value);
            }
            SceneCommand::SetDragConstraints { constraints } => {
                self.drag.set_constraints(ConstraintSet::parse(&constraints));
            }
            SceneCommand::SetTextureUrl { id, url } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    if let NodeKind::Texture { url: current, .. } = &mut node.kind {
                        *current = url;
                    } else {
                        log::warn!("set_texture_url on non-texture object '{id}'");
                    }
                }
            }
            SceneCommand::SetTextureCoordinates { id, coordinates } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    if let NodeKind::Texture {
                        coordinates: current,
                        ..
                    } = &mut node.kind
                    {
                        *current = coordinates;
                        node.refresh_shape();
                    } else {
                        log::warn!("set_texture_coordinates on non-texture object '{id}'");
                    }
                }
            }
            SceneCommand::SetPoints { id, points, colors } => {
                if let Some(node) = self.graph.get_mut(&id) {
                    if let NodeKind::PointCloud {
                        points: current_points,
                        colors: current_colors,
                        ..
                    } = &mut node.kind
                    {
                        *current_points = points;
                        *current_colors = colors;
                        node.refresh_shape();
                    } else {
                        log::warn!("set_points on non-point-cloud object '{id}'");
                    }
                }
            }
        }
        Ok(())
    }

    fn create_object(
        &mut self,
        id: ObjectId,
        parent_id: &str,
        kind: NodeKind,
    ) -> Result<(), CommandError> {
        if id == ROOT_ID {
            log::warn!("refusing to recreate the scene root");
            return Ok(());
        }
        if self.graph.contains(&id) {
            let removed = self.graph.remove_subtree(&id);
            self.cleanup_removed(&removed);
        }
        let asset_url = kind.asset_url().map(str::to_string);
        self.graph.insert(SceneNode::new(id.clone(), kind), parent_id)?;
        if let Some(url) = asset_url {
            log::debug!("requesting mesh asset '{url}' for '{id}'");
            self.loader.request(&id, &url);
            self.pending_loads.insert(id);
        }
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: ObjectSnapshot) -> Result<(), CommandError> {
        let ObjectSnapshot {
            id,
            parent_id,
            kind,
            name,
            color,
            opacity,
            side,
            position,
            rotation,
            scale,
            draggable,
            visible,
        } = snapshot;
        self.create_object(id.clone(), &parent_id, kind)?;
        if let Some(node) = self.graph.get_mut(&id) {
            node.name = name;
            node.material.color = color;
            node.material.opacity = opacity;
            node.material.side = side;
            node.position = Vec3::from(position);
            node.rotation = orientation_from_rows(rotation);
            node.scale = Vec3::from(scale);
            node.visible = visible;
        }
        if draggable {
            self.drag.set_draggable(&id, true);
        }
        Ok(())
    }

    fn set_local_pose(&mut self, id: &str, position: [f32; 3], rotation: [[f32; 3]; 3]) {
        if id == ROOT_ID {
            return;
        }
        if let Some(node) = self.graph.get_mut(id) {
            node.position = Vec3::from(position);
            node.rotation = orientation_from_rows(rotation);
        }
    }

    fn cleanup_removed(&mut self, removed: &[ObjectId]) {
        if removed.is_empty() {
            return;
        }
        self.drag.prune(removed, &mut self.gate);
        self.gizmos.prune(removed, &mut self.gate);
        for id in removed {
            self.loaded.remove(id);
            self.pending_loads.remove(id);
        }
        log::debug!("removed {} object(s)", removed.len());
    }

    // ---- pointer input ------------------------------------------------

    pub fn pointer_pressed(&mut self, pointer: &PointerSnapshot) {
        let grabbed_gizmo = self.gizmos.pointer_pressed(
            &self.graph,
            &self.camera,
            self.aspect(),
            pointer,
            &mut self.gate,
        );
        if let Some(event) = grabbed_gizmo {
            self.outbox.push(SceneEvent::TransformStart(event));
        } else if let Some(event) = self.drag.pointer_pressed(
            &self.graph,
            &self.loaded,
            &self.camera,
            self.aspect(),
            pointer,
            &mut self.gate,
        ) {
            self.outbox.push(SceneEvent::DragStart(event));
        }
        if self.options.wants_click_event(ClickKind::MouseDown.as_str()) {
            self.emit_click(ClickKind::MouseDown, pointer);
        }
    }

    pub fn pointer_moved(&mut self, pointer: &PointerSnapshot) {
        let aspect = self.aspect();
        self.gizmos
            .pointer_moved(&mut self.graph, &self.camera, aspect, pointer);
        if let Some(event) = self
            .drag
            .pointer_moved(&mut self.graph, &self.camera, aspect, pointer)
        {
            self.outbox.push(SceneEvent::Drag(event));
        }
    }

    pub fn pointer_released(&mut self, pointer: &PointerSnapshot) {
        for event in self.gizmos.pointer_released(&self.graph, &mut self.gate) {
            self.outbox.push(SceneEvent::TransformEnd(event));
        }
        if let Some(event) = self.drag.pointer_released(&self.graph, &mut self.gate) {
            self.outbox.push(SceneEvent::DragEnd(event));
        }
        if self.options.wants_click_event(ClickKind::MouseUp.as_str()) {
            self.emit_click(ClickKind::MouseUp, pointer);
        }
    }

    /// Report a click or double click synthesized by the shell.
    pub fn pointer_click(&mut self, kind: ClickKind, pointer: &PointerSnapshot) {
        if self.options.wants_click_event(kind.as_str()) {
            self.emit_click(kind, pointer);
        }
    }

    fn emit_click(&mut self, kind: ClickKind, pointer: &PointerSnapshot) {
        let (hits, ground_point) = hit_test(
            &self.graph,
            &self.loaded,
            &self.camera,
            self.aspect(),
            pointer.ndc_x,
            pointer.ndc_y,
        );
        self.outbox.push(SceneEvent::Click3d(ClickEvent {
            hits,
            ground_point,
            click_type: kind.as_str().to_string(),
            button: pointer.button.dom_code(),
            alt_key: pointer.modifiers.alt,
            ctrl_key: pointer.modifiers.ctrl,
            meta_key: pointer.modifiers.meta,
            shift_key: pointer.modifiers.shift,
            screen_x: pointer.screen_x,
            screen_y: pointer.screen_y,
            client_x: pointer.client_x,
            client_y: pointer.client_y,
            offset_x: pointer.offset_x,
            offset_y: pointer.offset_y,
        }));
    }

    // ---- camera input -------------------------------------------------

    pub fn orbit_delta(&mut self, yaw: f32, pitch: f32) {
        if self.gate.orbit_allowed() {
            self.orbit.orbit(&mut self.camera, yaw, pitch);
        }
    }

    pub fn zoom_delta(&mut self, amount: f32) {
        if self.gate.orbit_allowed() {
            self.orbit.zoom(&mut self.camera, amount);
        }
    }

    pub fn pan_delta(&mut self, dx: f32, dy: f32) {
        if self.gate.orbit_allowed() {
            self.orbit.pan(&mut self.camera, dx, dy);
        }
    }

    // ---- frame loop ---------------------------------------------------

    /// Advance per-frame state: camera tween, gizmo pose pump, inset
    /// sync, then asset-load completions.
    pub fn advance(&mut self, now: Instant) {
        let dt = self
            .last_tick
            .map(|prev| now.saturating_duration_since(prev).as_secs_f32())
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        if let Some(mut tween) = self.tween.take() {
            let finished = tween.tick(&mut self.camera, dt);
            if finished {
                if tween.up_changed() {
                    // The orbit rig is bound to one up axis; replace it
                    // rather than mutating in place.
                    log::debug!("rebuilding orbit controls for a new up vector");
                    self.orbit = OrbitRig::new(tween.final_up(), tween.final_target());
                } else {
                    self.orbit = OrbitRig::new(self.orbit.up(), tween.final_target());
                }
            } else {
                self.tween = Some(tween);
            }
        }

        for event in self.gizmos.pump(&self.graph) {
            self.outbox.push(SceneEvent::Transform(event));
        }

        self.inset.sync(&self.camera);
        self.poll_asset_loads();
    }

    fn poll_asset_loads(&mut self) {
        for result in self.loader.poll() {
            let id = result.object_id;
            let was_pending = self.pending_loads.remove(&id);
            if !was_pending || !self.graph.contains(&id) {
                // Resolved after its node was deleted or replaced.
                log::debug!("dropping stale asset load for '{id}'");
                continue;
            }
            match result.outcome {
                Ok(mesh) => {
                    log::info!("mesh asset for '{id}' resolved from '{}'", mesh.url);
                    self.loaded.insert(id, mesh.bounds);
                }
                Err(error) => {
                    // The node stays as an empty container.
                    log::warn!("mesh asset for '{id}' failed to load: {error}");
                }
            }
        }
    }

    /// Borrowed draw state for the engine.
    pub fn frame(&self) -> FrameSnapshot<'_> {
        FrameSnapshot {
            graph: &self.graph,
            camera: &self.camera,
            aspect: self.aspect(),
            decor: &self.decor,
            inset: self
                .inset
                .frame(self.canvas_width as f32, self.canvas_height as f32),
        }
    }
}
