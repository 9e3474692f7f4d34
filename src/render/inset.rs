//! Orientation inset: a secondary axes view in a corner of the canvas.
//!
//! The inset renders the world axes through its own small orthographic
//! camera. Construction is lazy, on the first sync while enabled, and the
//! mini camera is re-posed every frame to match the main camera's viewing
//! direction so the axes always mirror the scene orientation.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::render::camera::CameraRig;
use crate::config::CameraOptions;

/// Distance of the mini camera from the origin.
const MINI_RADIUS: f32 = 2.0;
/// Vertical size of the mini camera's view volume.
const MINI_VIEW_SIZE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsetAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsetOptions {
    pub enabled: bool,
    /// Edge length of the square inset viewport in logical pixels.
    pub size: f32,
    /// Margin from the anchored corner, both axes.
    pub margin: f32,
    /// Horizontal override for `margin`.
    pub margin_x: Option<f32>,
    /// Vertical override for `margin`.
    pub margin_y: Option<f32>,
    pub anchor: InsetAnchor,
}

impl Default for InsetOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 100.0,
            margin: 10.0,
            margin_x: None,
            margin_y: None,
            anchor: InsetAnchor::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelOptions {
    pub enabled: bool,
    pub font: String,
    pub color_x: String,
    pub color_y: String,
    pub color_z: String,
    /// Scale multiplier for the axis labels.
    pub size: f32,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            font: "12px sans-serif".to_string(),
            color_x: "#ff3653".to_string(),
            color_y: "#8adb00".to_string(),
            color_z: "#2c8fff".to_string(),
            size: 1.0,
        }
    }
}

/// Viewport rectangle in logical pixels, origin at the bottom-left of the
/// canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsetViewport {
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

/// Everything the engine needs to draw the inset for one frame.
#[derive(Debug, Clone)]
pub struct InsetFrame {
    pub viewport: InsetViewport,
    pub view_projection: Mat4,
    pub labels: LabelOptions,
}

#[derive(Debug)]
pub struct AxesInset {
    options: InsetOptions,
    labels: LabelOptions,
    mini: Option<CameraRig>,
}

impl Default for AxesInset {
    fn default() -> Self {
        Self::new()
    }
}

impl AxesInset {
    pub fn new() -> Self {
        Self {
            options: InsetOptions {
                enabled: false,
                ..InsetOptions::default()
            },
            labels: LabelOptions::default(),
            mini: None,
        }
    }

    pub fn set_options(&mut self, options: InsetOptions) {
        self.options = options;
    }

    pub fn set_labels(&mut self, labels: LabelOptions) {
        self.labels = labels;
    }

    pub fn enabled(&self) -> bool {
        self.options.enabled
    }

    /// Re-pose the mini camera along the main viewing direction. Builds
    /// the camera on the first call while enabled; a disabled inset stays
    /// unbuilt and this is a no-op.
    pub fn sync(&mut self, main: &CameraRig) {
        if !self.options.enabled {
            return;
        }
        let mini = self.mini.get_or_insert_with(|| {
            CameraRig::new(CameraOptions::Orthographic {
                size: MINI_VIEW_SIZE,
                near: 0.01,
                far: MINI_RADIUS * 4.0,
            })
        });
        mini.position = -main.forward() * MINI_RADIUS;
        mini.target = Vec3::ZERO;
        mini.up = main.up;
    }

    /// Draw state for this frame, `None` while disabled or not yet built.
    pub fn frame(&self, canvas_width: f32, canvas_height: f32) -> Option<InsetFrame> {
        if !self.options.enabled {
            return None;
        }
        let mini = self.mini.as_ref()?;
        Some(InsetFrame {
            viewport: self.viewport_rect(canvas_width, canvas_height),
            view_projection: mini.view_projection(1.0),
            labels: self.labels.clone(),
        })
    }

    fn viewport_rect(&self, canvas_width: f32, canvas_height: f32) -> InsetViewport {
        let size = self.options.size.max(1.0);
        let mx = self.options.margin_x.unwrap_or(self.options.margin);
        let my = self.options.margin_y.unwrap_or(self.options.margin);
        let (x, y) = match self.options.anchor {
            InsetAnchor::BottomLeft => (mx, my),
            InsetAnchor::BottomRight => (canvas_width - size - mx, my),
            InsetAnchor::TopLeft => (mx, canvas_height - size - my),
            InsetAnchor::TopRight => (canvas_width - size - mx, canvas_height - size - my),
        };
        InsetViewport {
            x: x.max(0.0),
            y: y.max(0.0),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_with_camel_case_margins() {
        let opts: InsetOptions =
            serde_json::from_str(r#"{"enabled": true, "marginX": 24.0, "anchor": "top_left"}"#)
                .unwrap();
        assert!(opts.enabled);
        assert_eq!(opts.margin_x, Some(24.0));
        assert_eq!(opts.margin_y, None);
        assert_eq!(opts.anchor, InsetAnchor::TopLeft);
        assert_eq!(opts.size, 100.0);
    }

    #[test]
    fn label_colors_default_per_axis() {
        let labels: LabelOptions = serde_json::from_str(r##"{"colorY": "#00ff00"}"##).unwrap();
        assert_eq!(labels.color_x, "#ff3653");
        assert_eq!(labels.color_y, "#00ff00");
        assert_eq!(labels.color_z, "#2c8fff");
    }

    #[test]
    fn inset_builds_lazily_on_first_enabled_sync() {
        let mut inset = AxesInset::new();
        let main = CameraRig::new(CameraOptions::default());
        assert!(!inset.enabled());

        inset.sync(&main);
        assert!(inset.frame(400.0, 300.0).is_none());

        inset.set_options(InsetOptions::default());
        assert!(inset.enabled());
        assert!(inset.frame(400.0, 300.0).is_none());
        inset.sync(&main);
        assert!(inset.frame(400.0, 300.0).is_some());
    }

    #[test]
    fn mini_camera_tracks_main_view_direction() {
        let mut inset = AxesInset::new();
        inset.set_options(InsetOptions::default());

        let mut main = CameraRig::new(CameraOptions::default());
        main.position = Vec3::new(0.0, -6.0, 0.0);
        main.target = Vec3::ZERO;
        main.up = Vec3::Z;
        inset.sync(&main);

        let mini = inset.mini.as_ref().unwrap();
        // Main looks along +Y, so the mini camera sits on -Y at the fixed
        // radius, sharing the main up vector.
        assert!((mini.position - Vec3::new(0.0, -MINI_RADIUS, 0.0)).length() < 1e-5);
        assert_eq!(mini.target, Vec3::ZERO);
        assert_eq!(mini.up, Vec3::Z);
    }

    #[test]
    fn viewport_rect_respects_anchor_and_margins() {
        let mut inset = AxesInset::new();
        inset.set_options(InsetOptions {
            enabled: true,
            size: 100.0,
            margin: 10.0,
            margin_x: None,
            margin_y: None,
            anchor: InsetAnchor::BottomRight,
        });
        let rect = inset.viewport_rect(400.0, 300.0);
        assert_eq!((rect.x, rect.y), (290.0, 10.0));

        inset.set_options(InsetOptions {
            anchor: InsetAnchor::TopLeft,
            margin_x: Some(4.0),
            ..InsetOptions::default()
        });
        let rect = inset.viewport_rect(400.0, 300.0);
        assert_eq!((rect.x, rect.y), (4.0, 190.0));
    }
}
