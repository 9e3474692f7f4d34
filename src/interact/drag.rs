//! Free-drag controller: pointer-driven movement of draggable objects on
//! a camera-facing plane.
//!
//! Pointer-down on a draggable object (or a descendant of one) grabs it;
//! every move intersects the pointer ray with the plane through the grab
//! point facing the camera, runs the constraint clauses over the
//! candidate local position, and writes the result back to the node.
//! Orbit input is disabled while a drag is live and restored exactly on
//! release via the gate's saved-flag path.

use std::collections::HashMap;
use std::collections::HashSet;

use glam::Vec3;

use crate::assets::MeshBounds;
use crate::events::DragEvent;
use crate::interact::constraints::ConstraintSet;
use crate::interact::PointerSnapshot;
use crate::render::camera::{CameraRig, OrbitGate};
use crate::render::pick::{hit_test, ray_plane, Ray};
use crate::scene::{ObjectId, SceneGraph};

#[derive(Debug)]
struct ActiveDrag {
    object_id: ObjectId,
    /// Camera-facing plane through the grab point.
    plane_point: Vec3,
    plane_normal: Vec3,
    /// From the plane hit to the object's world position at grab time.
    grab_offset: Vec3,
}

#[derive(Debug, Default)]
pub struct DragController {
    draggable: HashSet<ObjectId>,
    constraints: ConstraintSet,
    active: Option<ActiveDrag>,
}

impl DragController {
    pub fn new(constraints: ConstraintSet) -> Self {
        Self {
            draggable: HashSet::new(),
            constraints,
            active: None,
        }
    }

    pub fn set_constraints(&mut self, constraints: ConstraintSet) {
        self.constraints = constraints;
    }

    pub fn set_draggable(&mut self, id: &str, value: bool) {
        if value {
            self.draggable.insert(id.to_string());
        } else {
            self.draggable.remove(id);
        }
    }

    pub fn is_draggable(&self, id: &str) -> bool {
        self.draggable.contains(id)
    }

    pub fn dragging(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.object_id.as_str())
    }

    /// Drop deleted ids from the draggable set. A live drag on a deleted
    /// object is cancelled without a `dragend`, restoring orbit input.
    pub fn prune(&mut self, removed: &[ObjectId], gate: &mut OrbitGate) {
        for id in removed {
            self.draggable.remove(id);
        }
        if let Some(active) = &self.active {
            if removed.iter().any(|id| *id == active.object_id) {
                log::debug!("dragged object '{}' deleted, cancelling drag", active.object_id);
                self.active = None;
                gate.end_free_drag();
            }
        }
    }

    /// Begin a drag if the pointer is over a draggable object. Returns
    /// the `dragstart` payload when a drag starts.
    pub fn pointer_pressed(
        &mut self,
        graph: &SceneGraph,
        loaded: &HashMap<ObjectId, MeshBounds>,
        rig: &CameraRig,
        aspect: f32,
        pointer: &PointerSnapshot,
        gate: &mut OrbitGate,
    ) -> Option<DragEvent> {
        if self.active.is_some() || self.draggable.is_empty() {
            return None;
        }
        let (hits, _) = hit_test(graph, loaded, rig, aspect, pointer.ndc_x, pointer.ndc_y);
        let target = hits
            .iter()
            .find_map(|hit| self.draggable_ancestor(graph, &hit.object_id))?;

        let world_position = graph.world_position(&target)?;
        let ray = Ray::from_ndc(rig, aspect, pointer.ndc_x, pointer.ndc_y)?;
        let plane_normal = rig.forward();
        let grab = ray_plane(&ray, world_position, plane_normal)?;

        gate.begin_free_drag();
        self.active = Some(ActiveDrag {
            object_id: target.clone(),
            plane_point: world_position,
            plane_normal,
            grab_offset: grab - world_position,
        });
        let node = graph.get(&target)?;
        Some(drag_payload(node.id.clone(), node.name.clone(), node.position))
    }

    /// Move the dragged object along the grab plane. Returns the `drag`
    /// payload when the position was updated.
    pub fn pointer_moved(
        &mut self,
        graph: &mut SceneGraph,
        rig: &CameraRig,
        aspect: f32,
        pointer: &PointerSnapshot,
    ) -> Option<DragEvent> {
        let active = self.active.as_ref()?;
        let ray = Ray::from_ndc(rig, aspect, pointer.ndc_x, pointer.ndc_y)?;
        let hit = ray_plane(&ray, active.plane_point, active.plane_normal)?;
        let world_target = hit - active.grab_offset;

        let parent_world = graph.parent_world_matrix(&active.object_id)?;
        let candidate = parent_world.inverse().transform_point3(world_target);
        let constrained = self.constraints.apply(candidate);

        let id = active.object_id.clone();
        let node = graph.get_mut(&id)?;
        node.position = constrained;
        Some(drag_payload(node.id.clone(), node.name.clone(), constrained))
    }

    /// Finish the drag, restoring orbit input. Returns the `dragend`
    /// payload carrying the final position.
    pub fn pointer_released(
        &mut self,
        graph: &SceneGraph,
        gate: &mut OrbitGate,
    ) -> Option<DragEvent> {
        let active = self.active.take()?;
        gate.end_free_drag();
        let node = graph.get(&active.object_id)?;
        Some(drag_payload(
            node.id.clone(),
            node.name.clone(),
            node.position,
        ))
    }

    /// Nearest ancestor (including the node itself) in the draggable set.
    fn draggable_ancestor(&self, graph: &SceneGraph, id: &str) -> Option<ObjectId> {
        let mut cursor = Some(id.to_string());
        while let Some(current) = cursor {
            if self.draggable.contains(&current) {
                return Some(current);
            }
            cursor = graph.get(&current).and_then(|n| n.parent.clone());
        }
        None
    }
}

fn drag_payload(object_id: ObjectId, object_name: String, position: Vec3) -> DragEvent {
    DragEvent {
        object_id,
        object_name,
        x: position.x,
        y: position.y,
        z: position.z,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraOptions;
    use crate::interact::{Modifiers, PointerButton};
    use crate::scene::geometry::NodeKind;
    use crate::scene::{SceneNode, ROOT_ID};

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

    fn box_node(id: &str) -> SceneNode {
        SceneNode::new(
            id,
            NodeKind::Box {
                width: 2.0,
                height: 2.0,
                depth: 2.0,
                wireframe: false,
            },
        )
    }

    #[test]
    fn drag_moves_object_in_view_plane() {
        let mut graph = SceneGraph::new();
        graph.insert(box_node("b"), ROOT_ID).unwrap();
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut controller = DragController::default();
        controller.set_draggable("b", true);

        let loaded = HashMap::new();
        let start = controller
            .pointer_pressed(&graph, &loaded, &rig, 1.0, &pointer_at(0.0, 0.0), &mut gate)
            .expect("dragstart");
        assert_eq!(start.object_id, "b");
        assert!(!gate.orbit_allowed());

        // Ortho size 10 at aspect 1: NDC 0.4 is 2 world units.
        let moved = controller
            .pointer_moved(&mut graph, &rig, 1.0, &pointer_at(0.4, 0.0))
            .expect("drag");
        assert!((moved.x - 2.0).abs() < 1e-3);
        assert!((graph.get("b").unwrap().position.x - 2.0).abs() < 1e-3);

        let end = controller
            .pointer_released(&graph, &mut gate)
            .expect("dragend");
        assert!((end.x - 2.0).abs() < 1e-3);
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn non_draggable_objects_are_ignored() {
        let mut graph = SceneGraph::new();
        graph.insert(box_node("b"), ROOT_ID).unwrap();
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut controller = DragController::default();

        let started = controller.pointer_pressed(
            &graph,
            &HashMap::new(),
            &rig,
            1.0,
            &pointer_at(0.0, 0.0),
            &mut gate,
        );
        assert!(started.is_none());
        assert!(gate.orbit_allowed());
    }

    #[test]
    fn hitting_a_child_drags_the_draggable_ancestor() {
        let mut graph = SceneGraph::new();
        graph
            .insert(SceneNode::new("group", NodeKind::Group), ROOT_ID)
            .unwrap();
        graph.insert(box_node("child"), "group").unwrap();
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut controller = DragController::default();
        controller.set_draggable("group", true);

        let start = controller
            .pointer_pressed(&graph, &HashMap::new(), &rig, 1.0, &pointer_at(0.0, 0.0), &mut gate)
            .expect("dragstart");
        assert_eq!(start.object_id, "group");
    }

    #[test]
    fn constraints_restrict_the_dragged_position() {
        let mut graph = SceneGraph::new();
        graph.insert(box_node("b"), ROOT_ID).unwrap();
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut controller = DragController::new(ConstraintSet::parse("x = 0"));
        controller.set_draggable("b", true);

        controller
            .pointer_pressed(&graph, &HashMap::new(), &rig, 1.0, &pointer_at(0.0, 0.0), &mut gate)
            .unwrap();
        let moved = controller
            .pointer_moved(&mut graph, &rig, 1.0, &pointer_at(0.4, 0.4))
            .expect("drag");
        assert_eq!(moved.x, 0.0);
        assert!((moved.y - 2.0).abs() < 1e-3);
    }

    #[test]
    fn deleting_the_dragged_object_cancels_and_restores_orbit() {
        let mut graph = SceneGraph::new();
        graph.insert(box_node("b"), ROOT_ID).unwrap();
        let rig = ortho_top_down();
        let mut gate = OrbitGate::new();
        let mut controller = DragController::default();
        controller.set_draggable("b", true);
        controller
            .pointer_pressed(&graph, &HashMap::new(), &rig, 1.0, &pointer_at(0.0, 0.0), &mut gate)
            .unwrap();
        assert!(!gate.orbit_allowed());

        controller.prune(&["b".to_string()], &mut gate);
        assert!(controller.dragging().is_none());
        assert!(gate.orbit_allowed());
        assert!(!controller.is_draggable("b"));
    }
}
