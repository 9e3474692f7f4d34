//! Node archetypes and their geometry realization.
//!
//! `NodeKind` is the tagged creation payload carried by `create` commands;
//! `shape()` turns it into concrete geometry for the render engine and the
//! hit-tester. Solids live in a Z-up local frame: cylinders and extrusions
//! grow along +Z, rings lie in the XY plane, sphere poles sit on the Z
//! axis. Asset-backed kinds (`gltf`, `stl`) realize as empty containers
//! and are populated by the loader when the download resolves.

use std::collections::HashSet;
use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// A 2-D grid of optional 3-D points for textured surfaces.
pub type TextureGrid = Vec<Vec<Option<[f32; 3]>>>;

/// What a node is, including its creation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Group,
    Box {
        width: f32,
        height: f32,
        depth: f32,
        #[serde(default)]
        wireframe: bool,
    },
    Sphere {
        radius: f32,
        #[serde(default = "default_width_segments")]
        width_segments: u32,
        #[serde(default = "default_height_segments")]
        height_segments: u32,
        #[serde(default)]
        wireframe: bool,
    },
    Cylinder {
        top_radius: f32,
        bottom_radius: f32,
        height: f32,
        #[serde(default = "default_radial_segments")]
        radial_segments: u32,
        #[serde(default = "default_one_segment")]
        height_segments: u32,
        #[serde(default)]
        wireframe: bool,
    },
    Ring {
        inner_radius: f32,
        outer_radius: f32,
        #[serde(default = "default_radial_segments")]
        theta_segments: u32,
        #[serde(default)]
        wireframe: bool,
    },
    QuadraticBezierTube {
        start: [f32; 3],
        mid: [f32; 3],
        end: [f32; 3],
        #[serde(default = "default_tubular_segments")]
        tubular_segments: u32,
        radius: f32,
        #[serde(default = "default_radial_segments")]
        radial_segments: u32,
        #[serde(default)]
        wireframe: bool,
    },
    Extrusion {
        outline: Vec<[f32; 2]>,
        height: f32,
        #[serde(default)]
        wireframe: bool,
    },
    Line {
        start: [f32; 3],
        end: [f32; 3],
    },
    Curve {
        start: [f32; 3],
        control1: [f32; 3],
        control2: [f32; 3],
        end: [f32; 3],
        #[serde(default = "default_curve_points")]
        num_points: u32,
    },
    Text {
        text: String,
        #[serde(default)]
        style: String,
    },
    Text3d {
        text: String,
        #[serde(default)]
        style: String,
    },
    Texture {
        url: String,
        coordinates: TextureGrid,
    },
    PointCloud {
        points: Vec<[f32; 3]>,
        #[serde(default)]
        colors: Vec<[f32; 3]>,
        #[serde(default = "default_point_size")]
        point_size: f32,
    },
    Gltf {
        url: String,
    },
    Stl {
        url: String,
    },
    SpotLight {
        #[serde(default = "default_light_color")]
        color: String,
        #[serde(default = "default_one")]
        intensity: f32,
        #[serde(default)]
        distance: f32,
        #[serde(default = "default_spot_angle")]
        angle: f32,
        #[serde(default)]
        penumbra: f32,
        #[serde(default = "default_one")]
        decay: f32,
    },
    AxesHelper {
        #[serde(default = "default_one")]
        size: f32,
    },
}

fn default_width_segments() -> u32 {
    32
}

fn default_height_segments() -> u32 {
    16
}

fn default_radial_segments() -> u32 {
    8
}

fn default_one_segment() -> u32 {
    1
}

fn default_tubular_segments() -> u32 {
    64
}

fn default_curve_points() -> u32 {
    20
}

fn default_point_size() -> f32 {
    1.0
}

fn default_one() -> f32 {
    1.0
}

fn default_light_color() -> String {
    "#ffffff".to_string()
}

fn default_spot_angle() -> f32 {
    PI / 3.0
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Box { .. } => "box",
            NodeKind::Sphere { .. } => "sphere",
            NodeKind::Cylinder { .. } => "cylinder",
            NodeKind::Ring { .. } => "ring",
            NodeKind::QuadraticBezierTube { .. } => "quadratic_bezier_tube",
            NodeKind::Extrusion { .. } => "extrusion",
            NodeKind::Line { .. } => "line",
            NodeKind::Curve { .. } => "curve",
            NodeKind::Text { .. } => "text",
            NodeKind::Text3d { .. } => "text3d",
            NodeKind::Texture { .. } => "texture",
            NodeKind::PointCloud { .. } => "point_cloud",
            NodeKind::Gltf { .. } => "gltf",
            NodeKind::Stl { .. } => "stl",
            NodeKind::SpotLight { .. } => "spot_light",
            NodeKind::AxesHelper { .. } => "axes_helper",
        }
    }

    /// Whether the node carries renderable material state. Clip planes
    /// propagate only to renderable descendants.
    pub fn is_renderable(&self) -> bool {
        !matches!(self, NodeKind::Group | NodeKind::SpotLight { .. })
    }

    /// URL of the external mesh asset, for loader kinds only.
    pub fn asset_url(&self) -> Option<&str> {
        match self {
            NodeKind::Gltf { url } | NodeKind::Stl { url } => Some(url),
            _ => None,
        }
    }

    /// Realize the archetype as concrete geometry.
    pub fn shape(&self) -> Shape {
        match self {
            NodeKind::Group | NodeKind::SpotLight { .. } => Shape::Empty,
            NodeKind::Gltf { .. } | NodeKind::Stl { .. } => Shape::Empty,
            NodeKind::Box {
                width,
                height,
                depth,
                wireframe,
            } => solid_or_wireframe(box_mesh(*width, *height, *depth), *wireframe),
            NodeKind::Sphere {
                radius,
                width_segments,
                height_segments,
                wireframe,
            } => solid_or_wireframe(
                sphere_mesh(*radius, *width_segments, *height_segments),
                *wireframe,
            ),
            NodeKind::Cylinder {
                top_radius,
                bottom_radius,
                height,
                radial_segments,
                height_segments,
                wireframe,
            } => solid_or_wireframe(
                cylinder_mesh(
                    *top_radius,
                    *bottom_radius,
                    *height,
                    *radial_segments,
                    *height_segments,
                ),
                *wireframe,
            ),
            NodeKind::Ring {
                inner_radius,
                outer_radius,
                theta_segments,
                wireframe,
            } => solid_or_wireframe(
                ring_mesh(*inner_radius, *outer_radius, *theta_segments),
                *wireframe,
            ),
            NodeKind::QuadraticBezierTube {
                start,
                mid,
                end,
                tubular_segments,
                radius,
                radial_segments,
                wireframe,
            } => solid_or_wireframe(
                tube_mesh(
                    Vec3::from(*start),
                    Vec3::from(*mid),
                    Vec3::from(*end),
                    *tubular_segments,
                    *radius,
                    *radial_segments,
                ),
                *wireframe,
            ),
            NodeKind::Extrusion {
                outline,
                height,
                wireframe,
            } => solid_or_wireframe(extrusion_mesh(outline, *height), *wireframe),
            NodeKind::Line { start, end } => Shape::Polyline(vec![*start, *end]),
            NodeKind::Curve {
                start,
                control1,
                control2,
                end,
                num_points,
            } => Shape::Polyline(cubic_bezier_points(
                Vec3::from(*start),
                Vec3::from(*control1),
                Vec3::from(*control2),
                Vec3::from(*end),
                *num_points,
            )),
            NodeKind::Text { text, style } => Shape::Label {
                text: text.clone(),
                style: style.clone(),
                billboard: true,
            },
            NodeKind::Text3d { text, style } => Shape::Label {
                text: text.clone(),
                style: style.clone(),
                billboard: false,
            },
            NodeKind::Texture { coordinates, .. } => Shape::Mesh(texture_grid_mesh(coordinates)),
            NodeKind::PointCloud {
                points,
                colors,
                point_size,
            } => Shape::Points {
                positions: points.clone(),
                colors: colors.clone(),
                size: *point_size,
            },
            NodeKind::AxesHelper { size } => Shape::Lines {
                positions: vec![
                    [0.0, 0.0, 0.0],
                    [*size, 0.0, 0.0],
                    [0.0, *size, 0.0],
                    [0.0, 0.0, *size],
                ],
                segments: vec![[0, 1], [0, 2], [0, 3]],
            },
        }
    }
}

/// Triangle mesh ready for upload or ray casting. UVs are empty unless the
/// archetype defines a parameterization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Concrete geometry of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Nothing to draw or pick (groups, lights, unresolved assets).
    Empty,
    Mesh(TriangleMesh),
    /// Disconnected line segments (wireframe solids, axes helper).
    Lines {
        positions: Vec<[f32; 3]>,
        segments: Vec<[u32; 2]>,
    },
    /// Connected line strip.
    Polyline(Vec<[f32; 3]>),
    Points {
        positions: Vec<[f32; 3]>,
        colors: Vec<[f32; 3]>,
        size: f32,
    },
    /// Text realized by the engine's font pipeline.
    Label {
        text: String,
        style: String,
        billboard: bool,
    },
}

fn solid_or_wireframe(mesh: TriangleMesh, wireframe: bool) -> Shape {
    if wireframe {
        let segments = edge_segments(&mesh.indices);
        Shape::Lines {
            positions: mesh.positions,
            segments,
        }
    } else {
        Shape::Mesh(mesh)
    }
}

/// Unique undirected edges of a triangle list, every triangle edge kept.
fn edge_segments(indices: &[u32]) -> Vec<[u32; 2]> {
    let mut seen = HashSet::new();
    let mut segments = Vec::new();
    for tri in indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (a.min(b), a.max(b));
            if seen.insert(key) {
                segments.push([key.0, key.1]);
            }
        }
    }
    segments
}

fn box_mesh(width: f32, height: f32, depth: f32) -> TriangleMesh {
    let sx = width * 0.5;
    let sy = height * 0.5;
    let sz = depth * 0.5;
    let positions = vec![
        [-sx, -sy, -sz],
        [sx, -sy, -sz],
        [sx, sy, -sz],
        [-sx, sy, -sz],
        [-sx, -sy, sz],
        [sx, -sy, sz],
        [sx, sy, sz],
        [-sx, sy, sz],
    ];
    let indices = vec![
        0, 2, 1, 0, 3, 2, // bottom
        4, 5, 6, 4, 6, 7, // top
        0, 1, 5, 0, 5, 4,
        1, 2, 6, 1, 6, 5,
        2, 3, 7, 2, 7, 6,
        3, 0, 4, 3, 4, 7,
    ];
    TriangleMesh {
        positions,
        uvs: Vec::new(),
        indices,
    }
}

fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> TriangleMesh {
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);
    let mut positions = Vec::with_capacity(((ws + 1) * (hs + 1)) as usize);
    let mut indices = Vec::with_capacity((ws * hs * 6) as usize);

    for row in 0..=hs {
        let v = row as f32 / hs as f32;
        let polar = v * PI;
        let z = radius * polar.cos();
        let ring_radius = radius * polar.sin();
        for col in 0..=ws {
            let u = col as f32 / ws as f32;
            let azimuth = u * TAU;
            positions.push([
                ring_radius * azimuth.cos(),
                ring_radius * azimuth.sin(),
                z,
            ]);
        }
    }

    let stride = ws + 1;
    for row in 0..hs {
        for col in 0..ws {
            let a = row * stride + col;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            if row > 0 {
                indices.extend_from_slice(&[a, b, c]);
            }
            if row + 1 < hs {
                indices.extend_from_slice(&[b, d, c]);
            }
        }
    }

    TriangleMesh {
        positions,
        uvs: Vec::new(),
        indices,
    }
}

fn cylinder_mesh(
    top_radius: f32,
    bottom_radius: f32,
    height: f32,
    radial_segments: u32,
    height_segments: u32,
) -> TriangleMesh {
    let rs = radial_segments.max(3);
    let hs = height_segments.max(1);
    let mut positions = Vec::new();
    let mut indices = Vec::new();

    for row in 0..=hs {
        let v = row as f32 / hs as f32;
        let z = -height * 0.5 + v * height;
        let radius = bottom_radius + (top_radius - bottom_radius) * v;
        for col in 0..rs {
            let t = col as f32 / rs as f32 * TAU;
            positions.push([radius * t.cos(), radius * t.sin(), z]);
        }
    }

    for row in 0..hs {
        for col in 0..rs {
            let a = row * rs + col;
            let b = row * rs + (col + 1) % rs;
            let c = a + rs;
            let d = b + rs;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    // Cap fans, skipped for a zero radius (cone apex).
    if bottom_radius > 0.0 {
        let center = positions.len() as u32;
        positions.push([0.0, 0.0, -height * 0.5]);
        for col in 0..rs {
            indices.extend_from_slice(&[center, (col + 1) % rs, col]);
        }
    }
    if top_radius > 0.0 {
        let center = positions.len() as u32;
        positions.push([0.0, 0.0, height * 0.5]);
        let top_ring = hs * rs;
        for col in 0..rs {
            indices.extend_from_slice(&[center, top_ring + col, top_ring + (col + 1) % rs]);
        }
    }

    TriangleMesh {
        positions,
        uvs: Vec::new(),
        indices,
    }
}

fn ring_mesh(inner_radius: f32, outer_radius: f32, theta_segments: u32) -> TriangleMesh {
    let n = theta_segments.max(3);
    let mut positions = Vec::with_capacity((n * 2) as usize);
    let mut indices = Vec::with_capacity((n * 6) as usize);

    for i in 0..n {
        let t = i as f32 / n as f32 * TAU;
        let dir = Vec2::new(t.cos(), t.sin());
        positions.push([dir.x * outer_radius, dir.y * outer_radius, 0.0]);
        positions.push([dir.x * inner_radius, dir.y * inner_radius, 0.0]);
    }
    for i in 0..n {
        let i0 = i * 2;
        let i1 = i * 2 + 1;
        let j0 = (i + 1) % n * 2;
        let j1 = (i + 1) % n * 2 + 1;
        indices.extend_from_slice(&[i0, j0, j1, i0, j1, i1]);
    }

    TriangleMesh {
        positions,
        uvs: Vec::new(),
        indices,
    }
}

fn quadratic_bezier(start: Vec3, mid: Vec3, end: Vec3, t: f32) -> Vec3 {
    let s = 1.0 - t;
    start * (s * s) + mid * (2.0 * s * t) + end * (t * t)
}

fn tube_mesh(
    start: Vec3,
    mid: Vec3,
    end: Vec3,
    tubular_segments: u32,
    radius: f32,
    radial_segments: u32,
) -> TriangleMesh {
    let ts = tubular_segments.max(1);
    let rs = radial_segments.max(3);
    let mut positions = Vec::with_capacity(((ts + 1) * rs) as usize);
    let mut indices = Vec::with_capacity((ts * rs * 6) as usize);

    // Parallel-transported frame along the curve keeps the tube from
    // twisting at inflection points.
    let mut normal = perpendicular_to(quadratic_bezier_tangent(start, mid, end, 0.0));
    for i in 0..=ts {
        let t = i as f32 / ts as f32;
        let center = quadratic_bezier(start, mid, end, t);
        let tangent = quadratic_bezier_tangent(start, mid, end, t);
        normal = (normal - tangent * normal.dot(tangent)).normalize_or_zero();
        if normal == Vec3::ZERO {
            normal = perpendicular_to(tangent);
        }
        let binormal = tangent.cross(normal);
        for j in 0..rs {
            let a = j as f32 / rs as f32 * TAU;
            let offset = normal * a.cos() + binormal * a.sin();
            positions.push((center + offset * radius).to_array());
        }
    }

    for i in 0..ts {
        for j in 0..rs {
            let a = i * rs + j;
            let b = i * rs + (j + 1) % rs;
            let c = a + rs;
            let d = b + rs;
            indices.extend_from_slice(&[a, b, d, a, d, c]);
        }
    }

    TriangleMesh {
        positions,
        uvs: Vec::new(),
        indices,
    }
}

fn quadratic_bezier_tangent(start: Vec3, mid: Vec3, end: Vec3, t: f32) -> Vec3 {
    let d = (mid - start) * (2.0 * (1.0 - t)) + (end - mid) * (2.0 * t);
    d.normalize_or_zero()
}

fn perpendicular_to(v: Vec3) -> Vec3 {
    let candidate = if v.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    v.cross(candidate).normalize_or_zero()
}

fn cubic_bezier_points(
    start: Vec3,
    control1: Vec3,
    control2: Vec3,
    end: Vec3,
    num_points: u32,
) -> Vec<[f32; 3]> {
    let n = num_points.max(1);
    let mut points = Vec::with_capacity((n + 1) as usize);
    for i in 0..=n {
        let t = i as f32 / n as f32;
        let s = 1.0 - t;
        let p = start * (s * s * s)
            + control1 * (3.0 * s * s * t)
            + control2 * (3.0 * s * t * t)
            + end * (t * t * t);
        points.push(p.to_array());
    }
    points
}

fn extrusion_mesh(outline: &[[f32; 2]], height: f32) -> TriangleMesh {
    let n = outline.len();
    if n < 3 {
        log::warn!("extrusion outline needs at least 3 points, got {n}");
        return TriangleMesh::default();
    }

    let mut points: Vec<Vec2> = outline.iter().map(|p| Vec2::new(p[0], p[1])).collect();
    // Triangulation assumes counter-clockwise winding.
    if signed_area(&points) < 0.0 {
        points.reverse();
    }
    let cap = triangulate_polygon(&points);

    let count = points.len() as u32;
    let mut positions = Vec::with_capacity(points.len() * 2);
    for p in &points {
        positions.push([p.x, p.y, 0.0]);
    }
    for p in &points {
        positions.push([p.x, p.y, height]);
    }

    let mut indices = Vec::new();
    for i in 0..count {
        let a = i;
        let b = (i + 1) % count;
        let c = a + count;
        let d = b + count;
        indices.extend_from_slice(&[a, b, d, a, d, c]);
    }
    for tri in &cap {
        indices.extend_from_slice(&[tri[0], tri[2], tri[1]]); // bottom, flipped
        indices.extend_from_slice(&[tri[0] + count, tri[1] + count, tri[2] + count]);
    }

    TriangleMesh {
        positions,
        uvs: Vec::new(),
        indices,
    }
}

fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Ear-clipping triangulation of a simple polygon (CCW winding).
fn triangulate_polygon(points: &[Vec2]) -> Vec<[u32; 3]> {
    let mut remaining: Vec<u32> = (0..points.len() as u32).collect();
    let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));

    'outer: while remaining.len() > 3 {
        for i in 0..remaining.len() {
            let prev = points[remaining[(i + remaining.len() - 1) % remaining.len()] as usize];
            let here = points[remaining[i] as usize];
            let next = points[remaining[(i + 1) % remaining.len()] as usize];
            if cross2(here - prev, next - here) <= 0.0 {
                continue; // reflex corner
            }
            let contains_other = remaining.iter().any(|&other| {
                let p = points[other as usize];
                p != prev && p != here && p != next && point_in_triangle(p, prev, here, next)
            });
            if contains_other {
                continue;
            }
            triangles.push([
                remaining[(i + remaining.len() - 1) % remaining.len()],
                remaining[i],
                remaining[(i + 1) % remaining.len()],
            ]);
            remaining.remove(i);
            continue 'outer;
        }
        // No ear found: degenerate outline. Fall back to a fan so the
        // caller still gets something drawable.
        log::warn!("ear clipping failed on a degenerate outline, falling back to a fan");
        for i in 1..remaining.len() - 1 {
            triangles.push([remaining[0], remaining[i], remaining[i + 1]]);
        }
        return triangles;
    }
    if remaining.len() == 3 {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }
    triangles
}

fn cross2(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = cross2(b - a, p - a);
    let d2 = cross2(c - b, p - b);
    let d3 = cross2(a - c, p - c);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Build the textured surface from a grid of optional points.
///
/// Cells with any missing corner contribute no triangles; UVs come from
/// the normalized grid position of each point.
fn texture_grid_mesh(grid: &TextureGrid) -> TriangleMesh {
    let rows = grid.len();
    let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
    if rows < 2 || cols < 2 {
        return TriangleMesh::default();
    }

    let mut positions = Vec::new();
    let mut uvs = Vec::new();
    let mut index_of: Vec<Vec<Option<u32>>> = vec![vec![None; cols]; rows];
    for (r, row) in grid.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if let Some(point) = cell {
                index_of[r][c] = Some(positions.len() as u32);
                positions.push(*point);
                uvs.push([
                    c as f32 / (cols - 1) as f32,
                    r as f32 / (rows - 1) as f32,
                ]);
            }
        }
    }

    let mut indices = Vec::new();
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let corners = [
                index_of[r][c],
                index_of[r][c + 1],
                index_of[r + 1][c],
                index_of[r + 1][c + 1],
            ];
            if let [Some(a), Some(b), Some(c_), Some(d)] = corners {
                indices.extend_from_slice(&[a, b, d, a, d, c_]);
            }
        }
    }

    TriangleMesh {
        positions,
        uvs,
        indices,
    }
}

/// Square reference grid in the z = 0 plane.
pub fn grid_segments(size: f32, divisions: u32) -> Shape {
    let divisions = divisions.max(1);
    let half = size * 0.5;
    let step = size / divisions as f32;

    let mut positions = Vec::with_capacity(((divisions + 1) * 4) as usize);
    let mut segments = Vec::with_capacity(((divisions + 1) * 2) as usize);
    for i in 0..=divisions {
        let offset = -half + step * i as f32;
        let base = positions.len() as u32;
        positions.push([offset, -half, 0.0]);
        positions.push([offset, half, 0.0]);
        positions.push([-half, offset, 0.0]);
        positions.push([half, offset, 0.0]);
        segments.push([base, base + 1]);
        segments.push([base + 2, base + 3]);
    }
    Shape::Lines {
        positions,
        segments,
    }
}

/// Polar reference grid in the z = 0 plane: radial spokes plus evenly
/// spaced circles out to `radius`.
pub fn polar_grid_segments(radius: f32, sectors: u32, rings: u32) -> Shape {
    const CIRCLE_SEGMENTS: u32 = 64;
    let rings = rings.max(1);

    let mut positions = Vec::new();
    let mut segments = Vec::new();
    if sectors > 1 {
        for i in 0..sectors {
            let angle = std::f32::consts::TAU * i as f32 / sectors as f32;
            let base = positions.len() as u32;
            positions.push([0.0, 0.0, 0.0]);
            positions.push([radius * angle.cos(), radius * angle.sin(), 0.0]);
            segments.push([base, base + 1]);
        }
    }
    for ring in 1..=rings {
        let r = radius * ring as f32 / rings as f32;
        let base = positions.len() as u32;
        for i in 0..CIRCLE_SEGMENTS {
            let angle = std::f32::consts::TAU * i as f32 / CIRCLE_SEGMENTS as f32;
            positions.push([r * angle.cos(), r * angle.sin(), 0.0]);
            segments.push([base + i, base + (i + 1) % CIRCLE_SEGMENTS]);
        }
    }
    Shape::Lines {
        positions,
        segments,
    }
}
