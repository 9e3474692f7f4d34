use std::time::Instant;
use winit::window::Window;

/// Frame cadence bookkeeping, surfaced in the window title when the
/// `show_stats` option is on.
pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Instant,
    frame_count: u32,
    render_ms: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: Instant::now(),
            frame_count: 0,
            render_ms: 0.0,
            base_title,
        }
    }

    pub fn set_render_ms(&mut self, render_ms: f32) {
        self.render_ms = render_ms;
    }

    /// Record one presented frame. Passing a window refreshes its title
    /// with the measured rate roughly twice a second.
    pub fn update(&mut self, window: Option<&Window>, now: Instant, object_count: usize) {
        let frame_dt = self
            .last_frame_time
            .map(|last| now.saturating_duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame_time = Some(now);

        self.frame_count = self.frame_count.saturating_add(1);
        let elapsed = now.saturating_duration_since(self.last_fps_time);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            let ms = (frame_dt * 1000.0).max(0.0);
            if let Some(window) = window {
                window.set_title(&format!(
                    "{} - {:.1} fps (cadence {:.2} ms, render {:.2} ms, {} objects)",
                    self.base_title, fps, ms, self.render_ms, object_count
                ));
            }
            self.frame_count = 0;
            self.last_fps_time = now;
        }
    }
}
