//! Ray-based hit testing against the scene graph.
//!
//! Rays are built from normalized device coordinates through the active
//! camera, for either projection, and cast against each node's realized
//! shape. Mesh tests run in node-local space with an inverse-transformed
//! ray so the returned parameter stays in world units; thin shapes
//! (polylines, point clouds) are tested in world space against distance
//! thresholds. Results are ordered nearest-first. The ground-plane
//! intersection at z = 0 is computed independently so a click on empty
//! space still carries a world position.

use std::collections::HashMap;

use glam::{Mat4, Vec3};

use crate::assets::MeshBounds;
use crate::events::{ClickHit, GroundPoint};
use crate::render::camera::CameraRig;
use crate::scene::geometry::{Shape, TriangleMesh};
use crate::scene::{ObjectId, SceneGraph, ROOT_ID};

/// World-space pick threshold for polylines and wireframe edges.
const LINE_PICK_THRESHOLD: f32 = 0.1;
/// World-space pick threshold for point-cloud points.
const POINT_PICK_THRESHOLD: f32 = 0.15;

// ========================================================================
// Ray construction
// ========================================================================

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Unproject an NDC position through the camera by lifting the near
    /// and far plane points. Handles both projections; depth range is
    /// [0, 1] per glam's right-handed matrices.
    pub fn from_ndc(rig: &CameraRig, aspect: f32, ndc_x: f32, ndc_y: f32) -> Option<Ray> {
        let inverse = rig.view_projection(aspect).inverse();
        let near = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inverse.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        if !near.is_finite() || !far.is_finite() {
            return None;
        }
        let dir = (far - near).try_normalize()?;
        Some(Ray { origin: near, dir })
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }
}

// ========================================================================
// Primitive intersections
// ========================================================================

/// Moller-Trumbore, two-sided. `dir` may be unnormalized; `t` is in units
/// of `dir`.
fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < 1e-9 {
        return None;
    }
    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    (t > 1e-6).then_some(t)
}

fn ray_mesh(origin: Vec3, dir: Vec3, mesh: &TriangleMesh) -> Option<f32> {
    let mut nearest: Option<f32> = None;
    for tri in mesh.indices.chunks_exact(3) {
        let a = Vec3::from(mesh.positions[tri[0] as usize]);
        let b = Vec3::from(mesh.positions[tri[1] as usize]);
        let c = Vec3::from(mesh.positions[tri[2] as usize]);
        if let Some(t) = ray_triangle(origin, dir, a, b, c) {
            nearest = Some(nearest.map_or(t, |n: f32| n.min(t)));
        }
    }
    nearest
}

/// Slab test. Returns the entry parameter, zero when starting inside.
fn ray_aabb(origin: Vec3, dir: Vec3, min: Vec3, max: Vec3) -> Option<f32> {
    let inv = dir.recip();
    let t1 = (min - origin) * inv;
    let t2 = (max - origin) * inv;
    let t_min = t1.min(t2).max_element();
    let t_max = t1.max(t2).min_element();
    if t_max < t_min.max(0.0) {
        return None;
    }
    Some(t_min.max(0.0))
}

/// Closest approach between a ray and a segment: `(t_ray, distance)`.
pub(crate) fn ray_segment(origin: Vec3, dir: Vec3, p0: Vec3, p1: Vec3) -> (f32, f32) {
    let seg = p1 - p0;
    let r = origin - p0;
    let a = dir.dot(dir);
    let e = seg.dot(seg);
    let f = seg.dot(r);
    let b = dir.dot(seg);
    let c = dir.dot(r);
    let denom = a * e - b * b;

    let mut s_seg = if denom.abs() > 1e-9 {
        let t_ray = ((b * f - c * e) / denom).max(0.0);
        ((b * t_ray + f) / e).clamp(0.0, 1.0)
    } else if e > 1e-9 {
        (f / e).clamp(0.0, 1.0)
    } else {
        0.0
    };
    if !s_seg.is_finite() {
        s_seg = 0.0;
    }
    let on_seg = p0 + seg * s_seg;
    let t_ray = ((on_seg - origin).dot(dir) / a).max(0.0);
    let distance = (origin + dir * t_ray - on_seg).length();
    (t_ray, distance)
}

fn ray_point(origin: Vec3, dir: Vec3, point: Vec3) -> (f32, f32) {
    let t = ((point - origin).dot(dir) / dir.dot(dir)).max(0.0);
    let distance = (origin + dir * t - point).length();
    (t, distance)
}

/// Ray/plane intersection in front of the ray origin.
pub(crate) fn ray_plane(ray: &Ray, point: Vec3, normal: Vec3) -> Option<Vec3> {
    let denom = ray.dir.dot(normal);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = (point - ray.origin).dot(normal) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray.point_at(t))
}

// ========================================================================
// Scene-graph hit testing
// ========================================================================

/// Nearest-first hits plus the independent ground-plane point.
pub fn hit_test(
    graph: &SceneGraph,
    loaded: &HashMap<ObjectId, MeshBounds>,
    rig: &CameraRig,
    aspect: f32,
    ndc_x: f32,
    ndc_y: f32,
) -> (Vec<ClickHit>, Option<GroundPoint>) {
    let Some(ray) = Ray::from_ndc(rig, aspect, ndc_x, ndc_y) else {
        return (Vec::new(), None);
    };

    let mut scored: Vec<(f32, ClickHit)> = Vec::new();
    for node in graph.nodes() {
        if node.id == ROOT_ID || !graph.visible_in_world(&node.id) {
            continue;
        }
        let Some(world) = graph.world_matrix(&node.id) else {
            continue;
        };
        let Some(t) = intersect_node(&ray, node.id.as_str(), &node.shape, world, loaded) else {
            continue;
        };
        let point = ray.point_at(t);
        scored.push((
            t,
            ClickHit {
                object_id: node.id.clone(),
                object_name: node.name.clone(),
                x: point.x,
                y: point.y,
                z: point.z,
            },
        ));
    }
    scored.sort_by(|a, b| a.0.total_cmp(&b.0));
    let hits = scored.into_iter().map(|(_, hit)| hit).collect();

    (hits, ground_plane_point(&ray))
}

/// Ray/ground intersection at z = 0, in front of the camera only.
pub fn ground_plane_point(ray: &Ray) -> Option<GroundPoint> {
    if ray.dir.z.abs() < 1e-9 {
        return None;
    }
    let t = -ray.origin.z / ray.dir.z;
    if t < 0.0 {
        return None;
    }
    let p = ray.point_at(t);
    Some(GroundPoint {
        x: p.x,
        y: p.y,
        z: 0.0,
    })
}

fn intersect_node(
    ray: &Ray,
    id: &str,
    shape: &Shape,
    world: Mat4,
    loaded: &HashMap<ObjectId, MeshBounds>,
) -> Option<f32> {
    match shape {
        Shape::Mesh(mesh) => {
            let inverse = world.inverse();
            let origin = inverse.transform_point3(ray.origin);
            // Direction deliberately left unnormalized so `t` keeps the
            // world parameterization under scaled transforms.
            let dir = inverse.transform_vector3(ray.dir);
            ray_mesh(origin, dir, mesh)
        }
        Shape::Empty => {
            let bounds = loaded.get(id)?;
            let inverse = world.inverse();
            let origin = inverse.transform_point3(ray.origin);
            let dir = inverse.transform_vector3(ray.dir);
            let center = Vec3::from(bounds.center);
            let half = Vec3::from(bounds.half_extent);
            ray_aabb(origin, dir, center - half, center + half)
        }
        Shape::Lines {
            positions,
            segments,
        } => {
            let mut nearest: Option<f32> = None;
            for seg in segments {
                let p0 = world.transform_point3(Vec3::from(positions[seg[0] as usize]));
                let p1 = world.transform_point3(Vec3::from(positions[seg[1] as usize]));
                let (t, distance) = ray_segment(ray.origin, ray.dir, p0, p1);
                if distance <= LINE_PICK_THRESHOLD {
                    nearest = Some(nearest.map_or(t, |n: f32| n.min(t)));
                }
            }
            nearest
        }
        Shape::Polyline(points) => {
            let mut nearest: Option<f32> = None;
            for pair in points.windows(2) {
                let p0 = world.transform_point3(Vec3::from(pair[0]));
                let p1 = world.transform_point3(Vec3::from(pair[1]));
                let (t, distance) = ray_segment(ray.origin, ray.dir, p0, p1);
                if distance <= LINE_PICK_THRESHOLD {
                    nearest = Some(nearest.map_or(t, |n: f32| n.min(t)));
                }
            }
            nearest
        }
        Shape::Points { positions, .. } => {
            let mut nearest: Option<f32> = None;
            for p in positions {
                let world_point = world.transform_point3(Vec3::from(*p));
                let (t, distance) = ray_point(ray.origin, ray.dir, world_point);
                if distance <= POINT_PICK_THRESHOLD {
                    nearest = Some(nearest.map_or(t, |n: f32| n.min(t)));
                }
            }
            nearest
        }
        // Text labels live outside the raycast path.
        Shape::Label { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraOptions;
    use crate::scene::geometry::NodeKind;
    use crate::scene::SceneNode;

    fn top_down_rig() -> CameraRig {
        // Straight down the -Z axis from z = 10, Y up on screen.
        let mut rig = CameraRig::new(CameraOptions::default());
        rig.position = Vec3::new(0.0, 0.0, 10.0);
        rig.target = Vec3::ZERO;
        rig.up = Vec3::Y;
        rig
    }

    fn insert_box(graph: &mut SceneGraph, id: &str, center: Vec3, size: f32) {
        let mut node = SceneNode::new(
            id,
            NodeKind::Box {
                width: size,
                height: size,
                depth: size,
                wireframe: false,
            },
        );
        node.position = center;
        graph.insert(node, ROOT_ID).unwrap();
    }

    #[test]
    fn center_ray_hits_box_front_face() {
        let mut graph = SceneGraph::new();
        insert_box(&mut graph, "b", Vec3::ZERO, 2.0);

        let (hits, ground) =
            hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.0, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object_id, "b");
        assert!((hits[0].z - 1.0).abs() < 1e-4);
        // Ray passes through the box and still reaches the plane.
        assert!(ground.is_some());
    }

    #[test]
    fn hits_are_ordered_nearest_first() {
        let mut graph = SceneGraph::new();
        insert_box(&mut graph, "low", Vec3::new(0.0, 0.0, 1.0), 1.0);
        insert_box(&mut graph, "high", Vec3::new(0.0, 0.0, 5.0), 1.0);

        let (hits, _) = hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.0, 0.0);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].object_id, "high");
        assert_eq!(hits[1].object_id, "low");
    }

    #[test]
    fn invisible_subtrees_are_skipped() {
        let mut graph = SceneGraph::new();
        graph
            .insert(SceneNode::new("group", NodeKind::Group), ROOT_ID)
            .unwrap();
        let mut node = SceneNode::new(
            "hidden_child",
            NodeKind::Box {
                width: 2.0,
                height: 2.0,
                depth: 2.0,
                wireframe: false,
            },
        );
        node.position = Vec3::ZERO;
        graph.insert(node, "group").unwrap();
        graph.get_mut("group").unwrap().visible = false;

        let (hits, _) = hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.0, 0.0);
        assert!(hits.is_empty());
    }

    #[test]
    fn empty_space_click_still_reports_ground_point() {
        let graph = SceneGraph::new();
        let (hits, ground) =
            hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.1, 0.1);
        assert!(hits.is_empty());
        let ground = ground.expect("ground point");
        assert_eq!(ground.z, 0.0);
        assert!(ground.x.is_finite() && ground.y.is_finite());
    }

    #[test]
    fn ground_point_is_none_when_looking_away() {
        let mut rig = top_down_rig();
        rig.position = Vec3::new(0.0, 0.0, 1.0);
        rig.target = Vec3::new(0.0, 0.0, 5.0); // straight up
        let ray = Ray::from_ndc(&rig, 1.0, 0.0, 0.0).unwrap();
        assert!(ground_plane_point(&ray).is_none());
    }

    #[test]
    fn scaled_nodes_report_world_space_points() {
        let mut graph = SceneGraph::new();
        insert_box(&mut graph, "b", Vec3::ZERO, 1.0);
        graph.get_mut("b").unwrap().scale = Vec3::splat(4.0);

        let (hits, _) = hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.0, 0.0);
        assert_eq!(hits.len(), 1);
        // Half of the scaled 4-unit cube.
        assert!((hits[0].z - 2.0).abs() < 1e-4);
    }

    #[test]
    fn orthographic_rays_are_parallel() {
        let mut rig = CameraRig::new(CameraOptions::Orthographic {
            size: 10.0,
            near: 0.1,
            far: 100.0,
        });
        rig.position = Vec3::new(0.0, 0.0, 10.0);
        rig.target = Vec3::ZERO;
        rig.up = Vec3::Y;

        let center = Ray::from_ndc(&rig, 1.0, 0.0, 0.0).unwrap();
        let offset = Ray::from_ndc(&rig, 1.0, 0.5, 0.0).unwrap();
        assert!((center.dir - offset.dir).length() < 1e-5);
        // Half of the half-height (size 10 -> half 5) at NDC 0.5.
        assert!((offset.origin.x - 2.5).abs() < 1e-3);
    }

    #[test]
    fn point_cloud_picks_within_threshold() {
        let mut graph = SceneGraph::new();
        let node = SceneNode::new(
            "cloud",
            NodeKind::PointCloud {
                points: vec![[0.0, 0.0, 0.0], [5.0, 0.0, 0.0]],
                colors: vec![],
                point_size: 1.0,
            },
        );
        graph.insert(node, ROOT_ID).unwrap();

        let (hits, _) = hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.0, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object_id, "cloud");
    }

    #[test]
    fn loaded_asset_bounds_are_pickable() {
        let mut graph = SceneGraph::new();
        graph
            .insert(
                SceneNode::new("model", NodeKind::Stl { url: "m.stl".into() }),
                ROOT_ID,
            )
            .unwrap();

        // Unresolved: empty container, no hit.
        let (hits, _) = hit_test(&graph, &HashMap::new(), &top_down_rig(), 1.0, 0.0, 0.0);
        assert!(hits.is_empty());

        let mut loaded = HashMap::new();
        loaded.insert(
            "model".to_string(),
            MeshBounds {
                center: [0.0, 0.0, 0.0],
                half_extent: [1.0, 1.0, 1.0],
            },
        );
        let (hits, _) = hit_test(&graph, &loaded, &top_down_rig(), 1.0, 0.0, 0.0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object_id, "model");
    }

    #[test]
    fn segment_distance_is_exact_for_perpendicular_lines() {
        let (t, distance) = ray_segment(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::X,
            Vec3::new(2.0, -1.0, 0.0),
            Vec3::new(2.0, 1.0, 0.0),
        );
        assert!((t - 2.0).abs() < 1e-5);
        assert!((distance - 1.0).abs() < 1e-5);
    }
}
