//! Half-space clipping planes, applied per subtree.
//!
//! Planes use the `normal · p + d` convention: a point is clipped when the
//! signed distance is negative. A clip set applies to the target node and
//! every renderable descendant identically, and each call replaces the
//! previous set wholesale. Across planes the semantics are union: failing
//! any one plane clips the point.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::SceneGraph;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipPlane {
    pub nx: f32,
    pub ny: f32,
    pub nz: f32,
    pub d: f32,
}

impl ClipPlane {
    pub fn new(nx: f32, ny: f32, nz: f32, d: f32) -> Self {
        Self { nx, ny, nz, d }
    }

    pub fn normal(&self) -> Vec3 {
        Vec3::new(self.nx, self.ny, self.nz)
    }

    /// Scale the normal to unit length, adjusting `d` to keep the same
    /// half-space. A zero normal is left untouched.
    pub fn normalized(self) -> Self {
        let len = self.normal().length();
        if len <= f32::EPSILON {
            log::warn!("clip plane with zero normal left unnormalized");
            return self;
        }
        Self {
            nx: self.nx / len,
            ny: self.ny / len,
            nz: self.nz / len,
            d: self.d / len,
        }
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal().dot(point) + self.d
    }

    pub fn clips(&self, point: Vec3) -> bool {
        self.signed_distance(point) < 0.0
    }
}

/// Union clip test: true when any plane clips the point.
pub fn clipped_by_any(planes: &[ClipPlane], point: Vec3) -> bool {
    planes.iter().any(|plane| plane.clips(point))
}

/// Replace the clip set on `id` and every renderable descendant.
/// Unknown ids are a no-op.
pub fn set_clipping_planes(graph: &mut SceneGraph, id: &str, planes: &[ClipPlane]) {
    let normalized: Vec<ClipPlane> = planes.iter().map(|p| p.normalized()).collect();
    for node_id in graph.subtree_ids(id) {
        if let Some(node) = graph.get_mut(&node_id) {
            if node.kind.is_renderable() {
                node.material.clip_planes = normalized.clone();
            }
        }
    }
}

/// Clear the clip set on `id` and every renderable descendant.
pub fn clear_clipping_planes(graph: &mut SceneGraph, id: &str) {
    for node_id in graph.subtree_ids(id) {
        if let Some(node) = graph.get_mut(&node_id) {
            node.material.clip_planes.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::geometry::NodeKind;
    use crate::scene::{SceneNode, ROOT_ID};

    fn textured_pair() -> SceneGraph {
        let mut graph = SceneGraph::new();
        graph
            .insert(SceneNode::new("group", NodeKind::Group), ROOT_ID)
            .unwrap();
        for id in ["tex_a", "tex_b"] {
            graph
                .insert(
                    SceneNode::new(
                        id,
                        NodeKind::Texture {
                            url: "img.png".into(),
                            coordinates: vec![
                                vec![Some([0.0, 0.0, 0.0]), Some([1.0, 0.0, 0.0])],
                                vec![Some([0.0, 1.0, 0.0]), Some([1.0, 1.0, 0.0])],
                            ],
                        },
                    ),
                    "group",
                )
                .unwrap();
        }
        graph
    }

    #[test]
    fn normalization_preserves_half_space() {
        let plane = ClipPlane::new(0.0, 0.0, 2.0, -0.2).normalized();
        assert!((plane.nz - 1.0).abs() < 1e-6);
        assert!((plane.d + 0.1).abs() < 1e-6);
        // Same points stay on the same side.
        assert!(plane.clips(Vec3::new(0.0, 0.0, 0.05)));
        assert!(!plane.clips(Vec3::new(0.0, 0.0, 0.2)));
    }

    #[test]
    fn union_clips_on_any_failing_plane() {
        let planes = [
            ClipPlane::new(0.0, 0.0, 1.0, 0.0),  // keeps z >= 0
            ClipPlane::new(1.0, 0.0, 0.0, -1.0), // keeps x >= 1
        ];
        assert!(!clipped_by_any(&planes, Vec3::new(2.0, 0.0, 1.0)));
        assert!(clipped_by_any(&planes, Vec3::new(0.5, 0.0, 1.0)));
        assert!(clipped_by_any(&planes, Vec3::new(2.0, 0.0, -1.0)));
    }

    #[test]
    fn planes_propagate_to_renderable_descendants() {
        let mut graph = textured_pair();
        set_clipping_planes(
            &mut graph,
            "group",
            &[ClipPlane::new(0.0, 0.0, 1.0, -0.1)],
        );

        for id in ["tex_a", "tex_b"] {
            let planes = &graph.get(id).unwrap().material.clip_planes;
            assert_eq!(planes.len(), 1);
            assert!((planes[0].d + 0.1).abs() < 1e-6);
        }
        // The group itself carries no renderable material.
        assert!(graph.get("group").unwrap().material.clip_planes.is_empty());
    }

    #[test]
    fn clearing_removes_planes_from_the_whole_subtree() {
        let mut graph = textured_pair();
        set_clipping_planes(&mut graph, "group", &[ClipPlane::new(0.0, 1.0, 0.0, 0.0)]);
        clear_clipping_planes(&mut graph, "group");

        for id in ["tex_a", "tex_b"] {
            assert!(graph.get(id).unwrap().material.clip_planes.is_empty());
        }
    }

    #[test]
    fn each_call_replaces_the_previous_set() {
        let mut graph = textured_pair();
        set_clipping_planes(
            &mut graph,
            "tex_a",
            &[
                ClipPlane::new(1.0, 0.0, 0.0, 0.0),
                ClipPlane::new(0.0, 1.0, 0.0, 0.0),
            ],
        );
        set_clipping_planes(&mut graph, "tex_a", &[ClipPlane::new(0.0, 0.0, 1.0, 0.0)]);

        let planes = &graph.get("tex_a").unwrap().material.clip_planes;
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0].nz, 1.0);
    }

    #[test]
    fn unknown_id_is_a_no_op() {
        let mut graph = textured_pair();
        set_clipping_planes(&mut graph, "ghost", &[ClipPlane::new(0.0, 0.0, 1.0, 0.0)]);
        assert!(graph.get("tex_a").unwrap().material.clip_planes.is_empty());
    }
}
