//! Session configuration.
//!
//! Mirrors the options a hosting controller passes when opening a scene:
//! canvas size, frame rate, decor (grid, background), camera projection,
//! which pointer events produce `click3d`, and the drag constraint list.
//! Everything has a default so a bare `{}` is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub width: u32,
    pub height: u32,
    /// Target frame rate for the render loop.
    pub fps: u32,
    /// Show frame timing in the window title.
    pub show_stats: bool,
    pub grid: GridOptions,
    /// Polar grid decor as `(radius, sectors, rings)`.
    pub polar_grid: Option<(f32, u32, u32)>,
    /// Hex color, `#rgb` or `#rrggbb`.
    pub background_color: String,
    pub camera: CameraOptions,
    /// Pointer event names that produce `click3d` events.
    pub click_events: Vec<String>,
    /// Comma-separated axis constraints applied to free drags,
    /// e.g. `"x = 0, z = y / 2"`.
    pub drag_constraints: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
            fps: 20,
            show_stats: false,
            grid: GridOptions::default(),
            polar_grid: None,
            background_color: "#eee".to_string(),
            camera: CameraOptions::default(),
            click_events: vec!["click".to_string(), "dblclick".to_string()],
            drag_constraints: String::new(),
        }
    }
}

impl SessionOptions {
    pub fn target_frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }

    pub fn wants_click_event(&self, name: &str) -> bool {
        self.click_events.iter().any(|e| e == name)
    }
}

/// Square grid decor: off, on with defaults, or explicit size/divisions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridOptions {
    Enabled(bool),
    Dimensions(f32, u32),
}

impl Default for GridOptions {
    fn default() -> Self {
        GridOptions::Enabled(true)
    }
}

impl GridOptions {
    pub const DEFAULT_SIZE: f32 = 100.0;
    pub const DEFAULT_DIVISIONS: u32 = 100;

    /// `(size, divisions)` if the grid should be drawn.
    pub fn resolve(self) -> Option<(f32, u32)> {
        match self {
            GridOptions::Enabled(false) => None,
            GridOptions::Enabled(true) => Some((Self::DEFAULT_SIZE, Self::DEFAULT_DIVISIONS)),
            GridOptions::Dimensions(size, divisions) => Some((size, divisions)),
        }
    }
}

/// Camera projection selected at session start.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CameraOptions {
    Perspective {
        /// Vertical field of view in degrees.
        #[serde(default = "default_fov")]
        fov: f32,
        #[serde(default = "default_near")]
        near: f32,
        #[serde(default = "default_far")]
        far: f32,
    },
    Orthographic {
        /// Vertical size of the view volume.
        #[serde(default = "default_ortho_size")]
        size: f32,
        #[serde(default = "default_near")]
        near: f32,
        #[serde(default = "default_far")]
        far: f32,
    },
}

impl Default for CameraOptions {
    fn default() -> Self {
        CameraOptions::Perspective {
            fov: default_fov(),
            near: default_near(),
            far: default_far(),
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_ortho_size() -> f32 {
    10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let opts: SessionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.width, 400);
        assert_eq!(opts.height, 300);
        assert_eq!(opts.fps, 20);
        assert_eq!(opts.background_color, "#eee");
        assert!(opts.wants_click_event("click"));
        assert!(opts.wants_click_event("dblclick"));
        assert!(!opts.wants_click_event("mousedown"));
        assert_eq!(opts.grid.resolve(), Some((100.0, 100)));
    }

    #[test]
    fn grid_accepts_bool_and_tuple() {
        let off: GridOptions = serde_json::from_str("false").unwrap();
        assert_eq!(off.resolve(), None);

        let sized: GridOptions = serde_json::from_str("[50.0, 10]").unwrap();
        assert_eq!(sized.resolve(), Some((50.0, 10)));
    }

    #[test]
    fn camera_config_parses_by_tag() {
        let opts: SessionOptions =
            serde_json::from_str(r#"{"camera": {"type": "orthographic", "size": 4.0}}"#).unwrap();
        match opts.camera {
            CameraOptions::Orthographic { size, near, far } => {
                assert_eq!(size, 4.0);
                assert_eq!(near, 0.1);
                assert_eq!(far, 1000.0);
            }
            CameraOptions::Perspective { .. } => panic!("expected orthographic"),
        }
    }

    #[test]
    fn frame_duration_follows_fps() {
        let mut opts = SessionOptions::default();
        assert_eq!(opts.target_frame_duration(), Duration::from_millis(50));
        opts.fps = 0;
        assert_eq!(opts.target_frame_duration(), Duration::from_secs(1));
    }
}
