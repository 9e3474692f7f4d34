//! Outbound events sent to the session controller.
//!
//! Every payload is serialized as JSON with a `type` tag so the controller
//! can dispatch without peeking at the rest of the message. Field names
//! follow the wire protocol, not Rust conventions, where the two differ
//! (`click3d`, `dragstart`, `dragend`).

use serde::Serialize;

use crate::interact::GizmoMode;

/// A single ray/object intersection, nearest hits first in the event list.
#[derive(Debug, Clone, Serialize)]
pub struct ClickHit {
    pub object_id: String,
    pub object_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Intersection of the pointer ray with the ground plane (z = 0).
///
/// Reported independently of object hits so a click on empty space still
/// carries a usable world position. `None` only when the ray is parallel
/// to the plane.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GroundPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Payload for `click3d`.
#[derive(Debug, Clone, Serialize)]
pub struct ClickEvent {
    pub hits: Vec<ClickHit>,
    pub ground_point: Option<GroundPoint>,
    pub click_type: String,
    pub button: i32,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub screen_x: f32,
    pub screen_y: f32,
    pub client_x: f32,
    pub client_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Payload shared by `dragstart`, `drag` and `dragend`.
///
/// `x`/`y`/`z` is the object's local position after constraints.
#[derive(Debug, Clone, Serialize)]
pub struct DragEvent {
    pub object_id: String,
    pub object_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Payload shared by the transform-gizmo event family.
///
/// `x`/`y`/`z` and `rx`/`ry`/`rz` are the node's local position and Euler
/// rotation. World position (`wx`/`wy`/`wz`) is resolved through the full
/// ancestor chain and only present on continuous `transform` events.
#[derive(Debug, Clone, Serialize)]
pub struct TransformEvent {
    pub object_id: String,
    pub object_name: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wx: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wy: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wz: Option<f32>,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub mode: GizmoMode,
}

/// Everything the session reports back to its controller.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEvent {
    /// Fired once, when the rendering surface is ready.
    Init,
    #[serde(rename = "click3d")]
    Click3d(ClickEvent),
    #[serde(rename = "dragstart")]
    DragStart(DragEvent),
    Drag(DragEvent),
    #[serde(rename = "dragend")]
    DragEnd(DragEvent),
    TransformStart(TransformEvent),
    Transform(TransformEvent),
    TransformEnd(TransformEvent),
}

impl SceneEvent {
    /// Wire name of the event, mirroring the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            SceneEvent::Init => "init",
            SceneEvent::Click3d(_) => "click3d",
            SceneEvent::DragStart(_) => "dragstart",
            SceneEvent::Drag(_) => "drag",
            SceneEvent::DragEnd(_) => "dragend",
            SceneEvent::TransformStart(_) => "transform_start",
            SceneEvent::Transform(_) => "transform",
            SceneEvent::TransformEnd(_) => "transform_end",
        }
    }
}
