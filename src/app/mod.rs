//! Desktop shell: window, frame pacing, pointer translation, and the
//! command/event pipes.
//!
//! Commands arrive as JSON lines on stdin, forwarded into the event loop
//! through a user-event proxy so the session is only ever touched from
//! the loop thread. Outbound events leave as JSON lines on stdout, one
//! per line, drained after each frame. Pointer input is translated to
//! normalized device coordinates and handed to the session; whether a
//! gesture orbits the camera or drags an object is the session's call,
//! so the shell forwards both unconditionally.

mod timing;

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::assets::FileLoader;
use crate::config::SessionOptions;
use crate::interact::{ClickKind, Modifiers, PointerButton, PointerSnapshot};
use crate::render::{PlaceholderEngine, RenderEngine};
use crate::session::SceneSession;
use timing::FrameTiming;

const ORBIT_RADIANS_PER_PX: f32 = 0.005;
const PAN_FACTOR_PER_PX: f32 = 0.002;
const WHEEL_ZOOM_STEP: f32 = 0.5;
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);
const DOUBLE_CLICK_SLOP_PX: f32 = 6.0;

/// Messages injected into the event loop from outside threads.
#[derive(Debug)]
pub enum ControlEvent {
    Command(String),
    Disconnected,
}

#[derive(Debug, Default)]
struct HeldButtons {
    left: bool,
    middle: bool,
    right: bool,
}

impl HeldButtons {
    fn set(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left = down,
            MouseButton::Middle => self.middle = down,
            MouseButton::Right => self.right = down,
            _ => {}
        }
    }
}

/// Synthesizes `click` / `dblclick` from left-button releases, the same
/// way a browser does: a second release inside the time window and slop
/// box doubles, and a double resets the chain so a third click starts
/// over.
#[derive(Debug, Default)]
struct ClickSynth {
    last: Option<(Instant, (f32, f32))>,
}

impl ClickSynth {
    fn register(&mut self, now: Instant, pos: (f32, f32)) -> bool {
        let double = self.last.map_or(false, |(then, prev)| {
            now.saturating_duration_since(then) <= DOUBLE_CLICK_WINDOW
                && (pos.0 - prev.0).abs() <= DOUBLE_CLICK_SLOP_PX
                && (pos.1 - prev.1).abs() <= DOUBLE_CLICK_SLOP_PX
        });
        self.last = if double { None } else { Some((now, pos)) };
        double
    }
}

struct App {
    window: Option<Arc<Window>>,
    engine: Option<PlaceholderEngine>,
    session: SceneSession,
    timing: FrameTiming,
    target_frame_duration: Duration,
    next_frame_time: Instant,
    modifiers: Modifiers,
    mouse_pos: Option<(f32, f32)>,
    held: HeldButtons,
    clicks: ClickSynth,
}

impl App {
    fn new(session: SceneSession, target_frame_duration: Duration) -> Self {
        Self {
            window: None,
            engine: None,
            session,
            timing: FrameTiming::new("Maquette".to_string()),
            target_frame_duration,
            next_frame_time: Instant::now(),
            modifiers: Modifiers::default(),
            mouse_pos: None,
            held: HeldButtons::default(),
            clicks: ClickSynth::default(),
        }
    }

    fn canvas_size(&self) -> (u32, u32) {
        match &self.window {
            Some(window) => {
                let size = window.inner_size();
                (size.width, size.height)
            }
            None => (self.session.options().width, self.session.options().height),
        }
    }

    fn snapshot(&self, x: f32, y: f32, button: PointerButton) -> PointerSnapshot {
        let (width, height) = self.canvas_size();
        PointerSnapshot::from_window_px(x, y, width, height, button, self.modifiers)
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.session.resize(new_size.width, new_size.height);
        if let Some(engine) = &mut self.engine {
            engine.resize(new_size.width, new_size.height);
        }
    }

    fn handle_cursor_moved(&mut self, x: f32, y: f32) {
        let (dx, dy) = match self.mouse_pos {
            Some((px, py)) => (x - px, y - py),
            None => (0.0, 0.0),
        };
        self.mouse_pos = Some((x, y));

        let snap = self.snapshot(x, y, PointerButton::Left);
        self.session.pointer_moved(&snap);

        // The orbit gate swallows these while a drag holds the camera.
        if self.held.left {
            self.session
                .orbit_delta(dx * ORBIT_RADIANS_PER_PX, -dy * ORBIT_RADIANS_PER_PX);
        }
        if self.held.middle || self.held.right {
            let rig = self.session.camera();
            let radius = (rig.position - rig.target).length();
            let scale = radius.max(0.1) * PAN_FACTOR_PER_PX;
            self.session.pan_delta(-dx * scale, dy * scale);
        }
    }

    fn handle_mouse_input(&mut self, state: ElementState, button: MouseButton) {
        let pressed = state == ElementState::Pressed;
        self.held.set(button, pressed);
        if map_button(button) != PointerButton::Left {
            return;
        }
        let Some((x, y)) = self.mouse_pos else {
            return;
        };
        let snap = self.snapshot(x, y, PointerButton::Left);
        if pressed {
            self.session.pointer_pressed(&snap);
        } else {
            self.session.pointer_released(&snap);
            let double = self.clicks.register(Instant::now(), (x, y));
            self.session.pointer_click(ClickKind::Click, &snap);
            if double {
                self.session.pointer_click(ClickKind::DblClick, &snap);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.session.advance(now);

        let render_start = Instant::now();
        if let Some(engine) = &mut self.engine {
            let frame = self.session.frame();
            if let Err(err) = engine.render(&frame) {
                log::warn!("frame dropped: {err}");
            }
        }
        self.timing
            .set_render_ms(render_start.elapsed().as_secs_f32() * 1000.0);

        let stats_window = if self.session.options().show_stats {
            self.window.as_deref()
        } else {
            None
        };
        self.timing
            .update(stats_window, now, self.session.graph().object_count());

        if !self.flush_events() {
            log::info!("event consumer went away, shutting down");
            event_loop.exit();
        }
    }

    /// Write queued events to stdout as JSON lines. Returns false when
    /// the pipe is gone.
    fn flush_events(&mut self) -> bool {
        let events = self.session.take_events();
        if events.is_empty() {
            return true;
        }
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for event in &events {
            match serde_json::to_string(event) {
                Ok(line) => {
                    if writeln!(out, "{line}").is_err() {
                        return false;
                    }
                }
                Err(err) => log::error!("failed to encode {} event: {err}", event.kind()),
            }
        }
        out.flush().is_ok()
    }
}

impl ApplicationHandler<ControlEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let options = self.session.options();
        let window_attrs = WindowAttributes::default()
            .with_title("Maquette")
            .with_inner_size(PhysicalSize::new(options.width, options.height))
            .with_resizable(true);

        let window = Arc::new(
            event_loop
                .create_window(window_attrs)
                .expect("Failed to create window"),
        );
        let size = window.inner_size();
        self.session.resize(size.width, size.height);

        let engine = match PlaceholderEngine::attach(&window) {
            Ok(engine) => engine,
            Err(err) => {
                log::warn!("render surface unavailable ({err}), continuing headless");
                PlaceholderEngine::headless(size.width, size.height)
            }
        };
        self.engine = Some(engine);
        self.session.surface_ready();

        self.next_frame_time = Instant::now() + self.target_frame_duration;
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.modifiers = Modifiers {
                    alt: state.alt_key(),
                    ctrl: state.control_key(),
                    meta: state.super_key(),
                    shift: state.shift_key(),
                };
            }
            WindowEvent::Focused(focused) => {
                if !focused {
                    // No release will arrive for buttons held across the
                    // focus loss.
                    if self.held.left {
                        if let Some((x, y)) = self.mouse_pos {
                            let snap = self.snapshot(x, y, PointerButton::Left);
                            self.session.pointer_released(&snap);
                        }
                    }
                    self.held = HeldButtons::default();
                    self.mouse_pos = None;
                }
            }
            WindowEvent::Resized(new_size) => {
                self.handle_resize(new_size);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.handle_cursor_moved(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_pos = None;
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_input(state, button);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 40.0,
                };
                self.session.zoom_delta(lines * WHEEL_ZOOM_STEP);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
            }
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ControlEvent) {
        match event {
            ControlEvent::Command(line) => {
                if let Err(err) = self.session.apply_json(&line) {
                    log::error!("fatal command error: {err}");
                    event_loop.exit();
                }
            }
            ControlEvent::Disconnected => {
                log::info!("command stream closed, shutting down");
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        if now >= self.next_frame_time {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
            self.next_frame_time = now + self.target_frame_duration;
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame_time));
    }
}

fn map_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Left,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Right => PointerButton::Right,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(code) => PointerButton::Other(code),
    }
}

/// Feed stdin lines into the event loop until EOF or a read error.
fn spawn_command_reader(proxy: EventLoopProxy<ControlEvent>) {
    let spawned = thread::Builder::new()
        .name("commands".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        if proxy.send_event(ControlEvent::Command(line)).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        log::warn!("command stream read error: {err}");
                        break;
                    }
                }
            }
            let _ = proxy.send_event(ControlEvent::Disconnected);
        });
    if let Err(err) = spawned {
        log::warn!("could not start command reader: {err}");
    }
}

pub fn run(options: SessionOptions) {
    let event_loop = EventLoop::<ControlEvent>::with_user_event()
        .build()
        .expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Wait);

    spawn_command_reader(event_loop.create_proxy());

    let target_frame_duration = options.target_frame_duration();
    let session = SceneSession::new(options, Box::new(FileLoader::new()));
    let mut app = App::new(session, target_frame_duration);
    event_loop.run_app(&mut app).expect("Event loop error");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_click_inside_the_window_doubles() {
        let mut synth = ClickSynth::default();
        let t0 = Instant::now();
        assert!(!synth.register(t0, (100.0, 100.0)));
        assert!(synth.register(t0 + Duration::from_millis(200), (102.0, 101.0)));
    }

    #[test]
    fn slow_or_far_clicks_stay_single() {
        let mut synth = ClickSynth::default();
        let t0 = Instant::now();
        assert!(!synth.register(t0, (100.0, 100.0)));
        assert!(!synth.register(t0 + Duration::from_millis(600), (100.0, 100.0)));
        assert!(!synth.register(t0 + Duration::from_millis(700), (200.0, 100.0)));
    }

    #[test]
    fn a_double_resets_the_chain() {
        let mut synth = ClickSynth::default();
        let t0 = Instant::now();
        synth.register(t0, (50.0, 50.0));
        assert!(synth.register(t0 + Duration::from_millis(100), (50.0, 50.0)));
        // Third quick click starts a fresh chain rather than doubling.
        assert!(!synth.register(t0 + Duration::from_millis(200), (50.0, 50.0)));
    }

    #[test]
    fn side_buttons_map_to_dom_codes() {
        assert_eq!(map_button(MouseButton::Left), PointerButton::Left);
        assert_eq!(map_button(MouseButton::Back), PointerButton::Other(3));
        assert_eq!(map_button(MouseButton::Other(7)), PointerButton::Other(7));
    }
}
