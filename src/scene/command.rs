//! Inbound command vocabulary.
//!
//! Commands arrive as JSON objects tagged with `op` and are applied by the
//! session in receipt order. Mutators aimed at unknown ids are silent
//! no-ops; structural violations (unknown create parent, reparent cycles)
//! are `CommandError`s because they mean the controller and session have
//! desynchronized.

use serde::{Deserialize, Serialize};

use crate::interact::{GizmoAxis, GizmoMode, GizmoSpace};
use crate::render::inset::{InsetOptions, LabelOptions};
use crate::scene::clip::ClipPlane;
use crate::scene::geometry::{NodeKind, TextureGrid};
use crate::scene::{GraphError, MaterialSide, ObjectId};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("failed to decode command: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneCommand {
    Create {
        id: ObjectId,
        parent_id: ObjectId,
        #[serde(flatten)]
        kind: NodeKind,
    },
    Rename {
        id: ObjectId,
        name: String,
    },
    Material {
        id: ObjectId,
        /// `None` selects per-vertex colors.
        color: Option<String>,
        #[serde(default = "default_opacity")]
        opacity: f32,
        #[serde(default)]
        side: MaterialSide,
    },
    Move {
        id: ObjectId,
        x: f32,
        y: f32,
        z: f32,
    },
    Scale {
        id: ObjectId,
        sx: f32,
        sy: f32,
        sz: f32,
    },
    /// Orientation as three row vectors of a 3x3 basis.
    Rotate {
        id: ObjectId,
        rows: [[f32; 3]; 3],
    },
    Visible {
        id: ObjectId,
        value: bool,
    },
    Draggable {
        id: ObjectId,
        value: bool,
    },
    Delete {
        id: ObjectId,
    },
    /// Reparent, with the caller-computed local pose under the new parent.
    Attach {
        id: ObjectId,
        parent_id: ObjectId,
        position: [f32; 3],
        rotation: [[f32; 3]; 3],
    },
    /// Move to the root, with the caller-computed world-equal local pose.
    Detach {
        id: ObjectId,
        position: [f32; 3],
        rotation: [[f32; 3]; 3],
    },
    InitObjects {
        objects: Vec<ObjectSnapshot>,
    },
    EnableTransformControls {
        id: ObjectId,
        #[serde(default)]
        mode: GizmoMode,
        size: Option<f32>,
        visible_axes: Option<Vec<GizmoAxis>>,
    },
    DisableTransformControls {
        id: ObjectId,
    },
    SetTransformMode {
        id: ObjectId,
        mode: GizmoMode,
    },
    SetTransformSize {
        id: ObjectId,
        size: f32,
    },
    SetTransformSpace {
        id: ObjectId,
        space: GizmoSpace,
    },
    SetTransformRotationSnap {
        id: ObjectId,
        radians: f32,
    },
    SetClippingPlanes {
        id: ObjectId,
        planes: Vec<ClipPlane>,
    },
    ClearClippingPlanes {
        id: ObjectId,
    },
    SetAxesInset {
        opts: InsetOptions,
    },
    SetAxesLabels {
        opts: LabelOptions,
    },
    MoveCamera {
        x: Option<f32>,
        y: Option<f32>,
        z: Option<f32>,
        look_at_x: Option<f32>,
        look_at_y: Option<f32>,
        look_at_z: Option<f32>,
        up_x: Option<f32>,
        up_y: Option<f32>,
        up_z: Option<f32>,
        #[serde(default = "default_camera_duration")]
        duration: f32,
    },
    SetOrbitEnabled {
        value: bool,
    },
    SetDragConstraints {
        constraints: String,
    },
    SetTextureUrl {
        id: ObjectId,
        url: String,
    },
    SetTextureCoordinates {
        id: ObjectId,
        coordinates: TextureGrid,
    },
    SetPoints {
        id: ObjectId,
        points: Vec<[f32; 3]>,
        #[serde(default)]
        colors: Vec<[f32; 3]>,
    },
}

impl SceneCommand {
    pub fn from_json(line: &str) -> Result<Self, CommandError> {
        Ok(serde_json::from_str(line)?)
    }
}

/// One row of `init_objects`: everything needed to rebuild a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub parent_id: ObjectId,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_snapshot_color")]
    pub color: Option<String>,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub side: MaterialSide,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "identity_rows")]
    pub rotation: [[f32; 3]; 3],
    #[serde(default = "unit_scale")]
    pub scale: [f32; 3],
    #[serde(default)]
    pub draggable: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_opacity() -> f32 {
    1.0
}

fn default_camera_duration() -> f32 {
    0.5
}

fn default_snapshot_color() -> Option<String> {
    Some("#ffffff".to_string())
}

fn identity_rows() -> [[f32; 3]; 3] {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
}

fn unit_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_visible() -> bool {
    true
}
