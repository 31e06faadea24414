use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::input::ActionStates;
use super::metrics::MetricsAccumulator;
use super::rendering::DrawList;
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneCommand};

pub const SLOW_FRAME_ENV_VAR: &str = "MAZE_SLOW_FRAME_MS";
pub const RENDER_FPS_CAP_ENV_VAR: &str = "MAZE_RENDER_FPS_CAP";
const DEFAULT_RENDER_FPS_CAP: u32 = 60;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    /// Root that relative sprite paths resolve against.
    pub asset_root: PathBuf,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Escape The Maze".to_string(),
            window_width: 960,
            window_height: 720,
            asset_root: PathBuf::from("."),
            metrics_log_interval: Duration::from_secs(5),
            simulated_slow_frame_ms: 0,
            max_render_fps: Some(DEFAULT_RENDER_FPS_CAP),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Runs `scene` until it asks to quit or the window closes.
///
/// The scene is updated once per rendered frame with the wall-clock delta
/// since the previous frame; there is no fixed-step accumulator.
pub fn run_app(config: LoopConfig, mut scene: Box<dyn Scene>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer =
        Renderer::new(window, config.asset_root.clone()).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let slow_frame_delay = resolve_slow_frame_delay(config.simulated_slow_frame_ms);
    let effective_render_cap = resolve_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::new(config.window_width, config.window_height);

    scene.load();
    info!(
        window_width = config.window_width,
        window_height = config.window_height,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = slow_frame_delay.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let mut last_applied_title: Option<String> = None;
    let mut draw_list = DrawList::new();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        input_collector.mark_quit_requested();
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        input_collector.set_window_size(size.width, size.height);
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_keyboard_input(&event);
                    }
                    WindowEvent::RedrawRequested => {
                        if slow_frame_delay > Duration::ZERO {
                            // Explicit debug perturbation only; this is not the FPS cap.
                            thread::sleep(slow_frame_delay);
                        }

                        let now = Instant::now();
                        let frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let input_snapshot = input_collector.snapshot_for_frame();
                        let update_started = Instant::now();
                        let command = scene.update(frame_dt.as_secs_f32(), &input_snapshot);
                        let update_time = update_started.elapsed();
                        if command == SceneCommand::Quit {
                            info!(reason = "scene_quit", "shutdown_requested");
                            window_target.exit();
                            return;
                        }

                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep =
                            compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        draw_list.clear();
                        scene.render(&mut draw_list);
                        if let Err(error) = renderer.render(&draw_list) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();

                        let next_title = scene.debug_title();
                        if next_title != last_applied_title {
                            match &next_title {
                                Some(title) => window_for_loop.set_title(title),
                                None => window_for_loop.set_title(&config.window_title),
                            }
                            last_applied_title = next_title;
                        }

                        metrics_accumulator.record_frame(frame_dt, update_time);
                        if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                            info!(
                                fps = snapshot.fps,
                                frame_time_ms = snapshot.frame_time_ms,
                                worst_frame_time_ms = snapshot.worst_frame_time_ms,
                                update_time_ms = snapshot.update_time_ms,
                                draw_commands = draw_list.len(),
                                "loop_metrics"
                            );
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                scene.unload();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    action_states: ActionStates,
    window_width: u32,
    window_height: u32,
}

impl InputCollector {
    fn new(window_width: u32, window_height: u32) -> Self {
        Self {
            window_width,
            window_height,
            ..Self::default()
        }
    }

    fn mark_quit_requested(&mut self) {
        self.quit_requested = true;
    }

    fn handle_keyboard_input(&mut self, key_event: &KeyEvent) {
        let is_pressed = key_event.state == ElementState::Pressed;
        self.update_action_state_from_physical_key(key_event.physical_key, is_pressed);
    }

    fn update_action_state_from_physical_key(&mut self, key: PhysicalKey, is_pressed: bool) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        for action in actions_for_key(code) {
            self.action_states.set(*action, is_pressed);
        }
    }

    fn snapshot_for_frame(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.quit_requested,
            self.action_states,
            self.window_width,
            self.window_height,
        );
        self.action_states.clear_edges();
        snapshot
    }

    fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
    }
}

fn actions_for_key(code: KeyCode) -> &'static [InputAction] {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => &[InputAction::MoveUp],
        KeyCode::KeyS | KeyCode::ArrowDown => &[InputAction::MoveDown],
        KeyCode::KeyA | KeyCode::ArrowLeft => &[InputAction::MoveLeft],
        KeyCode::KeyD | KeyCode::ArrowRight => &[InputAction::MoveRight],
        KeyCode::Space => &[InputAction::Attack, InputAction::Confirm],
        KeyCode::Enter | KeyCode::NumpadEnter => &[InputAction::Confirm],
        KeyCode::KeyE => &[InputAction::Interact],
        KeyCode::Escape => &[InputAction::Pause, InputAction::Back],
        KeyCode::Backspace => &[InputAction::Back],
        KeyCode::F1 => &[InputAction::CheatSilverKeys],
        KeyCode::F2 => &[InputAction::CheatGoldenKeys],
        KeyCode::F3 => &[InputAction::CheatHeal],
        KeyCode::F4 => &[InputAction::CheatInvincible],
        KeyCode::F5 => &[InputAction::CheatKillEnemies],
        KeyCode::F6 => &[InputAction::CheatTeleport],
        _ => &[],
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

/// `off` or `0` disables the cap; `None` means the value did not parse.
fn parse_render_fps_cap(raw: &str) -> Option<Option<u32>> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("off") {
        return Some(None);
    }
    trimmed
        .parse::<u32>()
        .ok()
        .map(|value| normalize_render_fps_cap(Some(value)))
}

fn resolve_render_fps_cap(configured: Option<u32>) -> Option<u32> {
    env_override(
        RENDER_FPS_CAP_ENV_VAR,
        parse_render_fps_cap,
        normalize_render_fps_cap(configured),
    )
}

fn resolve_slow_frame_delay(config_slow_frame_ms: u64) -> Duration {
    let ms = env_override(
        SLOW_FRAME_ENV_VAR,
        |raw| raw.trim().parse::<u64>().ok(),
        config_slow_frame_ms,
    );
    Duration::from_millis(ms)
}

/// Value of `var` parsed with `parse`, or `configured` when unset or invalid.
fn env_override<T>(var: &'static str, parse: impl Fn(&str) -> Option<T>, configured: T) -> T {
    match env::var(var) {
        Ok(value) => parse(&value).unwrap_or_else(|| {
            warn!(env_var = var, value = value.as_str(), "env_override_invalid_using_config");
            configured
        }),
        Err(env::VarError::NotPresent) => configured,
        Err(error) => {
            warn!(env_var = var, error = %error, "env_override_unreadable_using_config");
            configured
        }
    }
}
