//! Rendering seam: the camera rig, hit testing, the orientation inset,
//! and the engine trait the shell drives once per frame.
//!
//! The session core never draws. It hands the engine a [`FrameSnapshot`]
//! borrowing the graph, camera, and decor; any backend that can consume
//! that snapshot plugs in behind [`RenderEngine`]. The bundled
//! [`PlaceholderEngine`] claims the window surface and validates the
//! native handle but draws nothing, which also serves as the degraded
//! mode when a real surface is unavailable.

pub mod camera;
pub mod inset;
pub mod pick;

pub use camera::{CameraGoal, CameraPose, CameraRig, CameraTween, OrbitGate, OrbitRig};
pub use inset::{AxesInset, InsetFrame, InsetOptions, LabelOptions};
pub use pick::{hit_test, Ray};

use raw_window_handle::HasWindowHandle;
use winit::window::Window;

use crate::config::SessionOptions;
use crate::scene::geometry::{grid_segments, polar_grid_segments, Shape};
use crate::scene::SceneGraph;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("native window handle unavailable: {0}")]
    NativeHandleUnavailable(String),
    #[error("rendering surface lost")]
    SurfaceLost,
}

/// Static backdrop drawn behind the scene, fixed at session start.
#[derive(Debug, Clone)]
pub struct Decor {
    pub background_color: String,
    pub grid: Option<Shape>,
    pub polar_grid: Option<Shape>,
}

impl Decor {
    pub fn from_options(options: &SessionOptions) -> Self {
        let grid = options
            .grid
            .resolve()
            .map(|(size, divisions)| grid_segments(size, divisions));
        let polar_grid = options
            .polar_grid
            .map(|(radius, sectors, rings)| polar_grid_segments(radius, sectors, rings));
        Self {
            background_color: options.background_color.clone(),
            grid,
            polar_grid,
        }
    }
}

/// Borrowed view of everything drawable for one frame.
pub struct FrameSnapshot<'a> {
    pub graph: &'a SceneGraph,
    pub camera: &'a CameraRig,
    pub aspect: f32,
    pub decor: &'a Decor,
    pub inset: Option<InsetFrame>,
}

/// The draw seam between the session shell and a rendering backend.
pub trait RenderEngine {
    fn resize(&mut self, width: u32, height: u32);
    fn render(&mut self, frame: &FrameSnapshot<'_>) -> Result<(), RenderError>;
}

/// Engine that claims the surface but draws nothing.
pub struct PlaceholderEngine {
    width: u32,
    height: u32,
    frames: u64,
    has_surface: bool,
    warned_headless: bool,
}

impl PlaceholderEngine {
    /// Validate the window's native handle and take the surface.
    pub fn attach(window: &Window) -> Result<Self, RenderError> {
        let handle = window
            .window_handle()
            .map_err(|e| RenderError::NativeHandleUnavailable(e.to_string()))?;
        log::debug!("render surface attached: {:?}", handle.as_raw());
        let size = window.inner_size();
        Ok(Self {
            width: size.width,
            height: size.height,
            frames: 0,
            has_surface: true,
            warned_headless: false,
        })
    }

    /// Degraded mode for when no surface could be claimed.
    pub fn headless(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frames: 0,
            has_surface: false,
            warned_headless: false,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl RenderEngine for PlaceholderEngine {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn render(&mut self, frame: &FrameSnapshot<'_>) -> Result<(), RenderError> {
        // A minimized window reports a zero-area surface.
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::SurfaceLost);
        }
        if !self.has_surface && !self.warned_headless {
            log::warn!("no rendering surface available, continuing with a blank placeholder");
            self.warned_headless = true;
        }
        self.frames += 1;
        log::trace!(
            "frame {} at {}x{}: {} objects, background {}, inset {}",
            self.frames,
            self.width,
            self.height,
            frame.graph.object_count(),
            frame.decor.background_color,
            frame.inset.is_some(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridOptions;

    #[test]
    fn decor_resolves_grid_defaults() {
        let decor = Decor::from_options(&SessionOptions::default());
        assert_eq!(decor.background_color, "#eee");
        assert!(matches!(decor.grid, Some(Shape::Lines { .. })));
        assert!(decor.polar_grid.is_none());
    }

    #[test]
    fn decor_skips_disabled_grid() {
        let options = SessionOptions {
            grid: GridOptions::Enabled(false),
            polar_grid: Some((2.0, 8, 4)),
            ..SessionOptions::default()
        };
        let decor = Decor::from_options(&options);
        assert!(decor.grid.is_none());
        assert!(decor.polar_grid.is_some());
    }

    #[test]
    fn placeholder_engine_counts_frames() {
        let mut engine = PlaceholderEngine::headless(400, 300);
        let graph = SceneGraph::new();
        let camera = CameraRig::new(crate::config::CameraOptions::default());
        let decor = Decor::from_options(&SessionOptions::default());
        let frame = FrameSnapshot {
            graph: &graph,
            camera: &camera,
            aspect: 4.0 / 3.0,
            decor: &decor,
            inset: None,
        };
        engine.render(&frame).unwrap();
        engine.render(&frame).unwrap();
        assert_eq!(engine.frames(), 2);

        engine.resize(0, 300);
        assert!(matches!(engine.render(&frame), Err(RenderError::SurfaceLost)));
        assert_eq!(engine.frames(), 2);
    }
}
