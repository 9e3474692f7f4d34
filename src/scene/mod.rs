//! Scene-graph model: nodes addressed by external string ids, parent/child
//! edges, materials, and world-transform resolution.
//!
//! The graph is owned by a session and mutated only through commands and
//! interaction controllers, so there is no interior locking. The root node
//! (id `"scene"`) is seeded at construction and cannot be deleted or
//! reparented; every other node always has a live parent whose child list
//! contains it.

pub mod clip;
pub mod command;
pub mod geometry;

use std::collections::HashMap;

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

use crate::scene::clip::ClipPlane;
use crate::scene::geometry::{NodeKind, Shape};

pub type ObjectId = String;

/// Id of the implicit root node.
pub const ROOT_ID: &str = "scene";

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown parent object '{0}'")]
    UnknownParent(ObjectId),
    #[error("attaching '{id}' under '{parent}' would create a cycle")]
    WouldCycle { id: ObjectId, parent: ObjectId },
}

/// Which triangle sides a material renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialSide {
    #[default]
    Front,
    Back,
    Double,
}

/// Render-facing material state carried by every node.
///
/// `color: None` selects per-vertex colors where the geometry provides
/// them. Clip planes are live state only; they are not part of object
/// snapshots.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MaterialState {
    pub color: Option<String>,
    pub opacity: f32,
    pub side: MaterialSide,
    #[serde(skip)]
    pub clip_planes: Vec<ClipPlane>,
}

impl Default for MaterialState {
    fn default() -> Self {
        Self {
            color: Some("#ffffff".to_string()),
            opacity: 1.0,
            side: MaterialSide::Front,
            clip_planes: Vec::new(),
        }
    }
}

impl MaterialState {
    /// Resolved RGB color, falling back to white for missing or unparsable
    /// values (per-vertex coloring still applies when `color` is `None`).
    pub fn rgb(&self) -> [f32; 3] {
        self.color
            .as_deref()
            .and_then(parse_hex_color)
            .unwrap_or([1.0, 1.0, 1.0])
    }
}

/// Parse `#rgb` or `#rrggbb` into linear-ish [0, 1] components.
pub fn parse_hex_color(hex: &str) -> Option<[f32; 3]> {
    let digits = hex.strip_prefix('#')?;
    let bytes = match digits.len() {
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in digits.chars().enumerate() {
                let nibble = c.to_digit(16)? as u8;
                out[i] = nibble * 17;
            }
            out
        }
        6 => {
            let mut out = [0u8; 3];
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16).ok()?;
            }
            out
        }
        _ => return None,
    };
    Some(bytes.map(|b| f32::from(b) / 255.0))
}

/// A single node of the scene graph.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub id: ObjectId,
    /// Display name, not unique, defaults to empty.
    pub name: String,
    pub kind: NodeKind,
    /// Realized geometry, rebuilt whenever `kind` changes.
    pub shape: Shape,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub visible: bool,
    pub material: MaterialState,
    pub parent: Option<ObjectId>,
    pub children: Vec<ObjectId>,
}

impl SceneNode {
    pub fn new(id: impl Into<ObjectId>, kind: NodeKind) -> Self {
        let shape = kind.shape();
        Self {
            id: id.into(),
            name: String::new(),
            kind,
            shape,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            visible: true,
            material: MaterialState::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Rebuild the realized geometry after a `kind` mutation.
    pub fn refresh_shape(&mut self) {
        self.shape = self.kind.shape();
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Local rotation as XYZ Euler angles in radians.
    pub fn euler_rotation(&self) -> (f32, f32, f32) {
        self.rotation.to_euler(EulerRot::XYZ)
    }
}

/// Build a node orientation from three row vectors.
///
/// Callers send the basis row-major; glam matrices are column-major, so
/// feeding the rows through `from_cols` yields the transposed basis and
/// the transpose recovers the intended rotation. Skipping that step
/// silently applies the inverse rotation.
pub fn orientation_from_rows(rows: [[f32; 3]; 3]) -> Quat {
    let m = Mat3::from_cols(
        Vec3::from(rows[0]),
        Vec3::from(rows[1]),
        Vec3::from(rows[2]),
    )
    .transpose();
    Quat::from_mat3(&m).normalize()
}

/// Id-addressed scene graph with a fixed root.
#[derive(Debug)]
pub struct SceneGraph {
    nodes: HashMap<ObjectId, SceneNode>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT_ID.to_string(),
            SceneNode::new(ROOT_ID, NodeKind::Group),
        );
        Self { nodes }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// Number of user objects, excluding the root.
    pub fn object_count(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }

    /// Insert a node under `parent_id`. The parent must already exist; a
    /// duplicate id replaces the previous node and its whole subtree.
    pub fn insert(&mut self, mut node: SceneNode, parent_id: &str) -> Result<(), GraphError> {
        if node.id == parent_id {
            return Err(GraphError::WouldCycle {
                id: node.id.clone(),
                parent: parent_id.to_string(),
            });
        }
        if !self.nodes.contains_key(parent_id) {
            return Err(GraphError::UnknownParent(parent_id.to_string()));
        }
        if self.nodes.contains_key(&node.id) {
            log::warn!("object '{}' already exists, replacing it", node.id);
            self.remove_subtree(&node.id);
        }
        node.parent = Some(parent_id.to_string());
        node.children.clear();
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(id);
        }
        Ok(())
    }

    /// Remove `id` and every descendant. Returns the removed ids so the
    /// caller can prune auxiliary state (draggables, gizmos, pending
    /// loads). Unknown ids and the root remove nothing.
    pub fn remove_subtree(&mut self, id: &str) -> Vec<ObjectId> {
        if id == ROOT_ID {
            log::warn!("refusing to delete the scene root");
            return Vec::new();
        }
        if !self.nodes.contains_key(id) {
            return Vec::new();
        }
        let removed = self.subtree_ids(id);
        self.unlink(id);
        for removed_id in &removed {
            self.nodes.remove(removed_id);
        }
        removed
    }

    /// Ids of `id` and all its descendants, preorder. Empty if unknown.
    pub fn subtree_ids(&self, id: &str) -> Vec<ObjectId> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(id) {
            return out;
        }
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(&current) {
                stack.extend(node.children.iter().cloned());
            }
            out.push(current);
        }
        out
    }

    /// Reparent `id` under `new_parent`. Unknown `id` is a no-op; an
    /// unknown parent or a cycle is a caller protocol violation.
    pub fn attach(&mut self, id: &str, new_parent: &str) -> Result<(), GraphError> {
        if id == ROOT_ID {
            log::warn!("refusing to reparent the scene root");
            return Ok(());
        }
        if !self.nodes.contains_key(id) {
            return Ok(());
        }
        if !self.nodes.contains_key(new_parent) {
            return Err(GraphError::UnknownParent(new_parent.to_string()));
        }
        // Walking up from the new parent must not reach the node itself.
        let mut cursor = Some(new_parent.to_string());
        while let Some(current) = cursor {
            if current == id {
                return Err(GraphError::WouldCycle {
                    id: id.to_string(),
                    parent: new_parent.to_string(),
                });
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent.clone());
        }
        self.unlink(id);
        self.link(id, new_parent);
        Ok(())
    }

    /// Move `id` directly under the root. Unknown ids are a no-op.
    pub fn detach(&mut self, id: &str) {
        if id == ROOT_ID {
            log::warn!("refusing to detach the scene root");
            return;
        }
        if !self.nodes.contains_key(id) {
            return;
        }
        self.unlink(id);
        self.link(id, ROOT_ID);
    }

    pub fn world_matrix(&self, id: &str) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        let mut matrix = node.local_matrix();
        let mut cursor = node.parent.clone();
        while let Some(parent_id) = cursor {
            let parent = self.nodes.get(&parent_id)?;
            matrix = parent.local_matrix() * matrix;
            cursor = parent.parent.clone();
        }
        Some(matrix)
    }

    pub fn world_position(&self, id: &str) -> Option<Vec3> {
        self.world_matrix(id)
            .map(|m| m.transform_point3(Vec3::ZERO))
    }

    /// Composed rotation of the ancestor chain including the node itself.
    /// Ancestor scale is ignored, which keeps the result a pure rotation.
    pub fn world_rotation(&self, id: &str) -> Option<Quat> {
        let node = self.nodes.get(id)?;
        let mut rotation = node.rotation;
        let mut cursor = node.parent.clone();
        while let Some(parent_id) = cursor {
            let parent = self.nodes.get(&parent_id)?;
            rotation = parent.rotation * rotation;
            cursor = parent.parent.clone();
        }
        Some(rotation.normalize())
    }

    /// World matrix of the node's parent, identity for children of the
    /// root.
    pub fn parent_world_matrix(&self, id: &str) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        match &node.parent {
            Some(parent_id) => self.world_matrix(parent_id),
            None => Some(Mat4::IDENTITY),
        }
    }

    /// True when the node and all its ancestors are visible.
    pub fn visible_in_world(&self, id: &str) -> bool {
        let mut cursor = Some(id.to_string());
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(node) if node.visible => cursor = node.parent.clone(),
                _ => return false,
            }
        }
        true
    }

    fn unlink(&mut self, id: &str) {
        let parent_id = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(parent_id) = parent_id {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|c| c != id);
            }
        }
    }

    fn link(&mut self, id: &str, parent_id: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = Some(parent_id.to_string());
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(ids: &[(&str, &str)]) -> SceneGraph {
        let mut graph = SceneGraph::new();
        for (id, parent) in ids {
            graph
                .insert(SceneNode::new(*id, NodeKind::Group), parent)
                .unwrap();
        }
        graph
    }

    #[test]
    fn identity_rows_leave_orientation_unchanged() {
        let q = orientation_from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
        let rotated = q * Vec3::new(0.3, -0.7, 0.2);
        assert!((rotated - Vec3::new(0.3, -0.7, 0.2)).length() < 1e-6);
    }

    #[test]
    fn rotation_rows_apply_forward_not_inverse() {
        // Rows of a 90 degree rotation about +Z; applying it must map
        // +X to +Y. The untransposed variant would give -Y.
        let q = orientation_from_rows([[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        let rotated = q * Vec3::X;
        assert!((rotated - Vec3::Y).length() < 1e-5, "got {rotated:?}");
    }

    #[test]
    fn world_transform_resolves_through_ancestors() {
        let mut graph = graph_with(&[("group", ROOT_ID), ("child", "group")]);
        graph.get_mut("group").unwrap().position = Vec3::new(1.0, 0.0, 0.0);
        graph.get_mut("child").unwrap().position = Vec3::new(0.0, 2.0, 0.0);

        let world = graph.world_position("child").unwrap();
        assert!((world - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn removing_a_group_removes_descendants() {
        let mut graph = graph_with(&[
            ("group", ROOT_ID),
            ("a", "group"),
            ("b", "group"),
            ("deep", "a"),
        ]);

        let removed = graph.remove_subtree("group");
        assert_eq!(removed.len(), 4);
        assert_eq!(graph.object_count(), 0);
        assert!(graph.get(ROOT_ID).unwrap().children.is_empty());
    }

    #[test]
    fn unknown_ids_remove_nothing() {
        let mut graph = graph_with(&[("a", ROOT_ID)]);
        assert!(graph.remove_subtree("nope").is_empty());
        assert_eq!(graph.object_count(), 1);
    }

    #[test]
    fn root_cannot_be_deleted_or_detached() {
        let mut graph = graph_with(&[("a", ROOT_ID)]);
        assert!(graph.remove_subtree(ROOT_ID).is_empty());
        graph.detach(ROOT_ID);
        assert!(graph.contains(ROOT_ID));
        assert!(graph.get(ROOT_ID).unwrap().parent.is_none());
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut graph = graph_with(&[("a", ROOT_ID), ("b", "a")]);
        let err = graph.attach("a", "b").unwrap_err();
        assert!(matches!(err, GraphError::WouldCycle { .. }));
    }

    #[test]
    fn detach_reparents_to_root() {
        let mut graph = graph_with(&[("a", ROOT_ID), ("b", "a")]);
        graph.detach("b");
        assert_eq!(graph.get("b").unwrap().parent.as_deref(), Some(ROOT_ID));
        assert!(graph.get(ROOT_ID).unwrap().children.contains(&"b".to_string()));
        assert!(graph.get("a").unwrap().children.is_empty());
    }

    #[test]
    fn insert_requires_existing_parent() {
        let mut graph = SceneGraph::new();
        let err = graph
            .insert(SceneNode::new("x", NodeKind::Group), "missing")
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownParent(_)));
    }

    #[test]
    fn hidden_ancestor_hides_subtree() {
        let mut graph = graph_with(&[("group", ROOT_ID), ("child", "group")]);
        graph.get_mut("group").unwrap().visible = false;
        assert!(!graph.visible_in_world("child"));
        assert!(graph.visible_in_world(ROOT_ID));
    }

    #[test]
    fn hex_colors_parse_in_both_lengths() {
        assert_eq!(parse_hex_color("#fff"), Some([1.0, 1.0, 1.0]));
        assert_eq!(parse_hex_color("#ff0000"), Some([1.0, 0.0, 0.0]));
        assert_eq!(parse_hex_color("#eee"), Some([14.0 * 17.0 / 255.0; 3]));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
    }

    #[test]
    fn material_rgb_falls_back_to_white() {
        let mut material = MaterialState::default();
        assert_eq!(material.rgb(), [1.0, 1.0, 1.0]);
        material.color = Some("#ff0000".to_string());
        assert_eq!(material.rgb(), [1.0, 0.0, 0.0]);
        material.color = Some("chartreuse".to_string());
        assert_eq!(material.rgb(), [1.0, 1.0, 1.0]);
        material.color = None;
        assert_eq!(material.rgb(), [1.0, 1.0, 1.0]);
    }
}
