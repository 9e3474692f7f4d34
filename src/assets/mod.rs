//! Mesh-asset loading seam.
//!
//! `gltf`/`stl` nodes reference external files that resolve after the
//! create command returns. The session hands each request to a
//! [`MeshLoader`] and polls once per frame; a resolved load reports the
//! mesh bounds used for picking. Loads that finish after their node was
//! deleted are dropped by the session's liveness check, and a failed
//! load is logged and leaves the node empty rather than surfacing an
//! error to the controller.
//!
//! [`FileLoader`] resolves urls as local file paths on a worker thread,
//! extracting bounds from binary/ASCII STL and from the accessor
//! min/max declarations of glTF and GLB. [`NullLoader`] is for hosts
//! with no asset pipeline at all.

use std::fs;
use std::sync::mpsc;
use std::thread;

use crate::scene::ObjectId;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read asset at {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported asset format: {url}")]
    UnsupportedFormat { url: String },
    #[error("failed to parse mesh data at {url}")]
    Parse { url: String },
}

/// Local-space bounding box of a resolved mesh asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshBounds {
    pub center: [f32; 3],
    pub half_extent: [f32; 3],
}

#[derive(Debug, Clone)]
pub struct LoadedMesh {
    pub url: String,
    pub bounds: MeshBounds,
}

/// One finished load, successful or not, tagged with the requesting node.
#[derive(Debug)]
pub struct LoadResult {
    pub object_id: ObjectId,
    pub outcome: Result<LoadedMesh, AssetError>,
}

/// Asynchronous mesh loader collaborator.
///
/// `request` must not block; completions surface later through `poll`,
/// in any order.
pub trait MeshLoader {
    fn request(&mut self, object_id: &str, url: &str);
    /// Drain every load that has finished since the last poll.
    fn poll(&mut self) -> Vec<LoadResult>;
}

/// Loader for shells without an asset pipeline: accepts every request
/// and never completes any.
#[derive(Debug, Default)]
pub struct NullLoader {
    requested: u64,
}

impl NullLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeshLoader for NullLoader {
    fn request(&mut self, object_id: &str, url: &str) {
        self.requested += 1;
        log::debug!("no asset pipeline attached, '{url}' for '{object_id}' stays pending");
    }

    fn poll(&mut self) -> Vec<LoadResult> {
        Vec::new()
    }
}

/// Reads mesh files off a worker thread so `request` never blocks the
/// frame loop. Dropping the loader drops the request channel, which
/// ends the worker.
pub struct FileLoader {
    requests: mpsc::Sender<(ObjectId, String)>,
    completions: mpsc::Receiver<LoadResult>,
}

impl FileLoader {
    pub fn new() -> Self {
        let (requests, work) = mpsc::channel::<(ObjectId, String)>();
        let (done, completions) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("mesh-loader".to_string())
            .spawn(move || {
                while let Ok((object_id, url)) = work.recv() {
                    let outcome = load_mesh(&url);
                    if done.send(LoadResult { object_id, outcome }).is_err() {
                        return;
                    }
                }
            });
        if let Err(err) = spawned {
            log::warn!("could not start mesh loader worker: {err}");
        }
        Self {
            requests,
            completions,
        }
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshLoader for FileLoader {
    fn request(&mut self, object_id: &str, url: &str) {
        if self
            .requests
            .send((object_id.to_string(), url.to_string()))
            .is_err()
        {
            log::warn!("mesh loader worker is gone, '{url}' will never resolve");
        }
    }

    fn poll(&mut self) -> Vec<LoadResult> {
        self.completions.try_iter().collect()
    }
}

fn load_mesh(url: &str) -> Result<LoadedMesh, AssetError> {
    let extension = std::path::Path::new(url)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let parse: fn(&[u8]) -> Option<MeshBounds> = match extension.as_deref() {
        Some("stl") => stl_bounds,
        Some("gltf") => gltf_bounds,
        Some("glb") => glb_bounds,
        _ => {
            return Err(AssetError::UnsupportedFormat {
                url: url.to_string(),
            })
        }
    };
    let bytes = fs::read(url).map_err(|source| AssetError::Read {
        url: url.to_string(),
        source,
    })?;
    parse(&bytes)
        .map(|bounds| LoadedMesh {
            url: url.to_string(),
            bounds,
        })
        .ok_or_else(|| AssetError::Parse {
            url: url.to_string(),
        })
}

struct BoundsAccumulator {
    min: [f32; 3],
    max: [f32; 3],
    any: bool,
}

impl BoundsAccumulator {
    fn new() -> Self {
        Self {
            min: [f32::MAX; 3],
            max: [f32::MIN; 3],
            any: false,
        }
    }

    fn push(&mut self, point: [f32; 3]) {
        if !point.iter().all(|c| c.is_finite()) {
            return;
        }
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
        self.any = true;
    }

    fn finish(self) -> Option<MeshBounds> {
        if !self.any {
            return None;
        }
        let mut center = [0.0; 3];
        let mut half_extent = [0.0; 3];
        for axis in 0..3 {
            center[axis] = (self.min[axis] + self.max[axis]) * 0.5;
            half_extent[axis] = (self.max[axis] - self.min[axis]) * 0.5;
        }
        Some(MeshBounds {
            center,
            half_extent,
        })
    }
}

fn stl_bounds(bytes: &[u8]) -> Option<MeshBounds> {
    binary_stl_bounds(bytes).or_else(|| ascii_stl_bounds(bytes))
}

/// Binary STL: 80-byte header, u32 triangle count, then 50 bytes per
/// triangle (normal, three vertices, attribute word). Telling binary
/// from ASCII by the length equation is more reliable than the header,
/// which is free text and frequently begins with "solid".
fn binary_stl_bounds(bytes: &[u8]) -> Option<MeshBounds> {
    if bytes.len() < 84 {
        return None;
    }
    let count = u32::from_le_bytes(bytes[80..84].try_into().ok()?) as usize;
    if count == 0 || bytes.len() != 84 + count * 50 {
        return None;
    }
    let mut acc = BoundsAccumulator::new();
    for triangle in bytes[84..].chunks_exact(50) {
        for vertex in 0..3 {
            let off = 12 + vertex * 12;
            acc.push([
                f32::from_le_bytes(triangle[off..off + 4].try_into().ok()?),
                f32::from_le_bytes(triangle[off + 4..off + 8].try_into().ok()?),
                f32::from_le_bytes(triangle[off + 8..off + 12].try_into().ok()?),
            ]);
        }
    }
    acc.finish()
}

fn ascii_stl_bounds(bytes: &[u8]) -> Option<MeshBounds> {
    let text = std::str::from_utf8(bytes).ok()?;
    let mut acc = BoundsAccumulator::new();
    for line in text.lines() {
        let Some(rest) = line.trim_start().strip_prefix("vertex") else {
            continue;
        };
        let mut parts = rest.split_whitespace();
        let x: f32 = parts.next()?.parse().ok()?;
        let y: f32 = parts.next()?.parse().ok()?;
        let z: f32 = parts.next()?.parse().ok()?;
        acc.push([x, y, z]);
    }
    acc.finish()
}

/// glTF requires min/max on position accessors, so the union of every
/// VEC3 accessor that declares them bounds the mesh. Buffers are never
/// touched.
fn gltf_bounds(bytes: &[u8]) -> Option<MeshBounds> {
    let doc: serde_json::Value = serde_json::from_slice(bytes).ok()?;
    let accessors = doc.get("accessors")?.as_array()?;
    let mut acc = BoundsAccumulator::new();
    for accessor in accessors {
        if accessor.get("type").and_then(serde_json::Value::as_str) != Some("VEC3") {
            continue;
        }
        let (Some(min), Some(max)) = (
            vec3_value(accessor.get("min")),
            vec3_value(accessor.get("max")),
        ) else {
            continue;
        };
        acc.push(min);
        acc.push(max);
    }
    acc.finish()
}

/// GLB container: 12-byte header with a "glTF" magic, then a JSON chunk
/// holding the same document as a .gltf file.
fn glb_bounds(bytes: &[u8]) -> Option<MeshBounds> {
    if bytes.len() < 20 || &bytes[0..4] != b"glTF" {
        return None;
    }
    let chunk_len = u32::from_le_bytes(bytes[12..16].try_into().ok()?) as usize;
    if &bytes[16..20] != b"JSON" || bytes.len() < 20 + chunk_len {
        return None;
    }
    gltf_bounds(&bytes[20..20 + chunk_len])
}

fn vec3_value(value: Option<&serde_json::Value>) -> Option<[f32; 3]> {
    let array = value?.as_array()?;
    if array.len() != 3 {
        return None;
    }
    let mut out = [0.0f32; 3];
    for (slot, item) in out.iter_mut().zip(array) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

/// Scripted loader for tests: completions are queued by hand and drained
/// by the next poll.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StubLoader {
    pub requests: Vec<(ObjectId, String)>,
    queued: Vec<LoadResult>,
}

#[cfg(test)]
impl StubLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&mut self, object_id: &str, bounds: MeshBounds) {
        self.queued.push(LoadResult {
            object_id: object_id.to_string(),
            outcome: Ok(LoadedMesh {
                url: String::new(),
                bounds,
            }),
        });
    }

    pub fn fail(&mut self, object_id: &str, url: &str) {
        self.queued.push(LoadResult {
            object_id: object_id.to_string(),
            outcome: Err(AssetError::Parse { url: url.into() }),
        });
    }
}

#[cfg(test)]
impl MeshLoader for StubLoader {
    fn request(&mut self, object_id: &str, url: &str) {
        self.requests.push((object_id.to_string(), url.to_string()));
    }

    fn poll(&mut self) -> Vec<LoadResult> {
        std::mem::take(&mut self.queued)
    }
}
