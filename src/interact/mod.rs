//! Pointer-driven interaction: free dragging, drag constraints, and
//! transform gizmos. Shared vocabulary types live here; the controllers
//! live in the submodules.

pub mod constraints;
pub mod drag;
pub mod gizmo;

use serde::{Deserialize, Serialize};

/// Gizmo manipulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoMode {
    #[default]
    Translate,
    Rotate,
    Scale,
}

/// Coordinate frame the gizmo handles operate in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GizmoSpace {
    #[default]
    World,
    Local,
}

/// One of the three manipulation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GizmoAxis {
    X,
    Y,
    Z,
}

impl GizmoAxis {
    pub const ALL: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

    pub fn unit(self) -> glam::Vec3 {
        match self {
            GizmoAxis::X => glam::Vec3::X,
            GizmoAxis::Y => glam::Vec3::Y,
            GizmoAxis::Z => glam::Vec3::Z,
        }
    }
}

/// Pointer button, carried through to events with DOM numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    Other(u16),
}

impl PointerButton {
    pub fn dom_code(self) -> i32 {
        match self {
            PointerButton::Left => 0,
            PointerButton::Middle => 1,
            PointerButton::Right => 2,
            PointerButton::Other(code) => i32::from(code),
        }
    }
}

/// Keyboard modifier state at the time of a pointer event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

/// A pointer sample in both normalized device coordinates and raw pixels.
///
/// The raw coordinate triplet (screen/client/offset) is forwarded to the
/// controller unmodified for consumer-side gesture disambiguation. The
/// shell fills all three from window-local pixels; a browser-like host
/// would supply genuinely different values.
#[derive(Debug, Clone, Copy)]
pub struct PointerSnapshot {
    pub ndc_x: f32,
    pub ndc_y: f32,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    pub screen_x: f32,
    pub screen_y: f32,
    pub client_x: f32,
    pub client_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl PointerSnapshot {
    /// Build a snapshot from window-local pixel coordinates.
    ///
    /// NDC x grows rightward, NDC y grows upward, both in [-1, 1].
    pub fn from_window_px(
        x: f32,
        y: f32,
        width: u32,
        height: u32,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> Self {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        Self {
            ndc_x: x / w * 2.0 - 1.0,
            ndc_y: -(y / h * 2.0 - 1.0),
            button,
            modifiers,
            screen_x: x,
            screen_y: y,
            client_x: x,
            client_y: y,
            offset_x: x,
            offset_y: y,
        }
    }
}

/// Pointer event families the hit-tester can subscribe to.
///
/// Which of these actually produce `click3d` events is decided by the
/// `click_events` option, matched against the wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    MouseDown,
    MouseUp,
    Click,
    DblClick,
}

impl ClickKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ClickKind::MouseDown => "mousedown",
            ClickKind::MouseUp => "mouseup",
            ClickKind::Click => "click",
            ClickKind::DblClick => "dblclick",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndc_conversion_centers_and_flips_y() {
        let snap = PointerSnapshot::from_window_px(
            200.0,
            150.0,
            400,
            300,
            PointerButton::Left,
            Modifiers::default(),
        );
        assert!(snap.ndc_x.abs() < 1e-6);
        assert!(snap.ndc_y.abs() < 1e-6);

        let corner = PointerSnapshot::from_window_px(
            0.0,
            0.0,
            400,
            300,
            PointerButton::Left,
            Modifiers::default(),
        );
        assert_eq!(corner.ndc_x, -1.0);
        assert_eq!(corner.ndc_y, 1.0);
    }

    #[test]
    fn button_codes_follow_dom_numbering() {
        assert_eq!(PointerButton::Left.dom_code(), 0);
        assert_eq!(PointerButton::Middle.dom_code(), 1);
        assert_eq!(PointerButton::Right.dom_code(), 2);
        assert_eq!(PointerButton::Other(4).dom_code(), 4);
    }

    #[test]
    fn gizmo_vocabulary_serializes_to_wire_names() {
        assert_eq!(serde_json::to_value(GizmoMode::Rotate).unwrap(), "rotate");
        assert_eq!(serde_json::to_value(GizmoSpace::Local).unwrap(), "local");
        assert_eq!(serde_json::to_value(GizmoAxis::X).unwrap(), "X");
    }
}
