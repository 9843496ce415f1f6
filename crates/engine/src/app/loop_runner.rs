use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::assets::AssetProvider;
use crate::base::Extents;

use super::input::{InputCollector, InputEvent};
use super::metrics::MetricsAccumulator;
use super::mode::{FrameOrchestrator, GameMode};
use super::rendering::{PixelsPresenter, Renderer, SoftwareBackend};
use super::services::AudioService;
use super::timing::{resolve_slow_frame_delay, FramePacing};
use super::MetricsHandle;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub max_frame_delta: Duration,
    pub metrics_log_interval: Duration,
    pub simulated_slow_frame_ms: u64,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Duke Nukem II".to_string(),
            window_width: 1280,
            window_height: 960,
            max_frame_delta: Duration::from_millis(250),
            metrics_log_interval: Duration::from_secs(1),
            simulated_slow_frame_ms: 0,
            max_render_fps: Some(60),
        }
    }
}

/// Collaborators the loop hands to every game mode.
pub struct AppServices {
    pub audio: Box<dyn AudioService>,
    pub assets: Box<dyn AssetProvider>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize pixel surface: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(
    config: LoopConfig,
    services: AppServices,
    initial_mode: Box<dyn GameMode>,
) -> Result<(), AppError> {
    run_app_with_metrics(config, services, initial_mode, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    services: AppServices,
    initial_mode: Box<dyn GameMode>,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError> {
    let AppServices { mut audio, assets } = services;

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window: &'static winit::window::Window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    ));

    let window_size = window.inner_size();
    let mut presenter = PixelsPresenter::new(window).map_err(AppError::CreateRenderer)?;
    let mut renderer = Renderer::new(
        Box::new(SoftwareBackend::new(window_size.width, window_size.height)),
        Extents::new(window_size.width as i32, window_size.height as i32),
    );
    let mut orchestrator = FrameOrchestrator::new(&mut renderer, initial_mode);

    event_loop.set_control_flow(ControlFlow::Poll);

    let pacing = FramePacing::new(
        config.max_frame_delta,
        config.max_render_fps,
        resolve_slow_frame_delay(config.simulated_slow_frame_ms),
    );
    let metrics_log_interval = if config.metrics_log_interval.is_zero() {
        Duration::from_secs(1)
    } else {
        config.metrics_log_interval
    };

    info!(
        window_width = window_size.width,
        window_height = window_size.height,
        max_frame_delta_ms = pacing.max_frame_delta().as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        slow_frame_delay_ms = pacing.slow_frame_delay().as_millis() as u64,
        render_fps_cap = %pacing.describe_cap(),
        "loop_config"
    );

    let mut input_collector = InputCollector::default();
    let mut pending_events: Vec<InputEvent> = Vec::new();
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut last_submitted_batches = renderer.submitted_batches();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    match presenter.resize(size.width, size.height) {
                        Ok(()) => renderer
                            .resize_window(Extents::new(size.width as i32, size.height as i32)),
                        Err(error) => {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if let Some(input_event) =
                        input_collector.handle_key(event.physical_key, event.state)
                    {
                        pending_events.push(input_event);
                    }
                }
                WindowEvent::RedrawRequested => {
                    if !pacing.slow_frame_delay().is_zero() {
                        thread::sleep(pacing.slow_frame_delay());
                    }

                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    let outcome = orchestrator.run_frame(
                        pacing.clamp(raw_frame_dt),
                        &pending_events,
                        &mut renderer,
                        audio.as_mut(),
                        assets.as_ref(),
                    );
                    pending_events.clear();

                    let cap_sleep = pacing.sleep_before_present(
                        Instant::now().saturating_duration_since(last_present_instant),
                    );
                    if !cap_sleep.is_zero() {
                        thread::sleep(cap_sleep);
                    }

                    renderer.swap_buffers();
                    if let Some(framebuffer) = renderer.backend().default_framebuffer() {
                        if let Err(error) = presenter.present(framebuffer) {
                            warn!(error = %error, "renderer_present_failed");
                            window_target.exit();
                        }
                    }
                    last_present_instant = Instant::now();

                    let submitted_batches = renderer.submitted_batches();
                    metrics_accumulator.record_frame(
                        raw_frame_dt,
                        outcome.logic_ticks,
                        submitted_batches - last_submitted_batches,
                    );
                    last_submitted_batches = submitted_batches;

                    let mode = orchestrator.current_mode_name();
                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now, mode) {
                        metrics_handle.publish(snapshot);
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            max_frame_time_ms = snapshot.max_frame_time_ms,
                            batch_submits_per_frame = snapshot.batch_submits_per_frame,
                            mode = snapshot.mode,
                            "loop_metrics"
                        );
                        if mode == "ingame" && snapshot.is_logic_falling_behind() {
                            debug!(tps = snapshot.tps, "logic_tick_rate_low");
                        }
                    }

                    if outcome.quit_requested {
                        info!(reason = "mode_quit", "shutdown_requested");
                        window_target.exit();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                audio.stop_music();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}
