use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use compositor::{
    ConfigError, FrameBuffer, MapProvider, OneShot, RenderOutcome, TilePosition, Vec2, Viewport,
    WorldRenderer,
};
use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use super::bootstrap::AppWiring;
use super::demo_world::AnimationCue;
use super::input::{FrameActions, InputCollector};
use super::metrics::{IntervalReport, RenderMetrics};
use super::presenter::Presenter;
use super::screenshot::save_screenshot;

#[derive(Debug, Error)]
pub(crate) enum ViewerError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize presenter: {0}")]
    CreatePresenter(#[source] PixelsError),
    #[error("invalid render configuration: {0}")]
    Renderer(#[from] ConfigError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    if let Err(err) = run_viewer(app) {
        error!(error = %err, "viewer_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run_viewer(app: AppWiring) -> Result<(), ViewerError> {
    let AppWiring {
        config,
        world,
        mut game,
    } = app;

    let event_loop = EventLoop::new().map_err(ViewerError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(ViewerError::CreateWindow)?,
    );
    let mut presenter =
        Presenter::new(Arc::clone(&window)).map_err(ViewerError::CreatePresenter)?;
    let size = window.inner_size();
    let mut renderer =
        WorldRenderer::new(config.render.clone(), Viewport::new(size.width, size.height))?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta(), Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval(), Duration::from_secs(1));
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        "loop_config"
    );

    let mut input = InputCollector::default();
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut metrics = RenderMetrics::new(metrics_log_interval);
    let mut cues: Vec<AnimationCue> = Vec::new();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    input.mark_quit_requested();
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if let Err(error) = presenter.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "presenter_resize_failed");
                        window_target.exit();
                    }
                    renderer.resize(new_size.width, new_size.height);
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if let Err(error) = presenter.resize(size.width, size.height) {
                        warn!(error = %error, "presenter_resize_failed");
                        window_target.exit();
                    }
                    renderer.resize(size.width, size.height);
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.set_cursor_position_px(position.x as f32, position.y as f32);
                }
                WindowEvent::CursorLeft { .. } => input.clear_cursor_position(),
                WindowEvent::MouseInput { state, button, .. } => {
                    input.handle_mouse_input(button, state);
                }
                WindowEvent::MouseWheel { delta, .. } => input.handle_mouse_wheel(delta),
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_keyboard_input(&event);
                    if input.quit_requested() {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;
                    accumulator = accumulator
                        .saturating_add(clamp_frame_delta(raw_frame_dt, max_frame_delta));

                    let actions = input.take_frame_actions();
                    apply_frame_actions(&mut renderer, actions, input.cursor_position_px());

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        game.tick(fixed_dt, input.move_intent(), &world, &mut cues);
                        for cue in cues.drain(..) {
                            play_cue(&mut renderer, cue);
                        }
                        renderer.update(world.sources(), &game, fixed_dt);
                        metrics.record_tick();
                    }
                    accumulator = step_plan.remaining_accumulator;
                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    let hovered = input
                        .cursor_position_px()
                        .and_then(|cursor| hovered_tile(&renderer, &world, cursor));
                    renderer.display_mut().highlighted_tile = hovered;

                    match renderer.render(world.sources(), &game) {
                        RenderOutcome::Drawn => {
                            if let Some(frame) = renderer.frame_buffer() {
                                if let Err(error) = presenter.present(frame) {
                                    warn!(error = %error, "presenter_draw_failed");
                                    window_target.exit();
                                }
                                if actions.screenshot {
                                    write_screenshot(frame, &config.screenshot_dir);
                                }
                            }
                            metrics.record_drawn(raw_frame_dt, renderer.stats());
                        }
                        RenderOutcome::Skipped(reason) => {
                            metrics.record_skipped(raw_frame_dt, reason);
                            debug!(reason = ?reason, "frame_skipped");
                        }
                    }

                    if let Some(report) = metrics.maybe_report(now) {
                        info!(
                            fps = report.fps,
                            tps = report.tps,
                            frame_time_ms = report.frame_time_ms,
                            drawn_frames = report.drawn_frames,
                            skipped_frames = report.skipped.total(),
                            skipped_map_not_loaded = report.skipped.map_not_loaded,
                            avg_quads_rendered = report.avg_quads_rendered,
                            avg_entities_rendered = report.avg_entities_rendered,
                            peak_sprite_draws = report.peak_sprite_draws,
                            texmap_share = report.texture_mix.texmap,
                            art_share = report.texture_mix.art,
                            placeholder_share = report.texture_mix.placeholder,
                            "loop_metrics"
                        );
                        window.set_title(&window_title(&config.window_title, &report));
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                renderer.dispose();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(ViewerError::EventLoopRun)
}

fn apply_frame_actions(renderer: &mut WorldRenderer, actions: FrameActions, cursor: Option<Vec2>) {
    if actions.zoom_steps != 0 {
        renderer.camera_mut().apply_zoom_steps(actions.zoom_steps);
        info!(zoom = renderer.camera().zoom(), "camera_zoom_changed");
    }
    if actions.toggle_statics {
        let options = renderer.display_mut();
        options.show_statics = !options.show_statics;
        info!(show_statics = options.show_statics, "statics_toggled");
    }
    if actions.toggle_asset_tiles {
        let options = renderer.display_mut();
        options.use_asset_tiles = !options.use_asset_tiles;
        info!(use_asset_tiles = options.use_asset_tiles, "asset_tiles_toggled");
    }
    if actions.select {
        let picked =
            cursor.and_then(|cursor| renderer.pick_entity(cursor.x as i32, cursor.y as i32));
        renderer.display_mut().highlighted_entity = picked;
        info!(entity_id = ?picked.map(|id| id.0), "entity_selected");
    }
}

fn play_cue(renderer: &mut WorldRenderer, cue: AnimationCue) {
    match cue.kind {
        OneShot::Attack => renderer.play_attack_animation(cue.id, cue.duration),
        OneShot::Cast => renderer.play_cast_animation(cue.id, cue.duration),
        OneShot::Hit => renderer.play_hit_animation(cue.id, cue.duration),
        OneShot::Death => renderer.play_death_animation(cue.id, cue.duration),
    }
}

/// Picks the cell under the cursor, refining once with the elevation of the first guess.
fn hovered_tile(
    renderer: &WorldRenderer,
    map: &dyn MapProvider,
    cursor: Vec2,
) -> Option<TilePosition> {
    let guess = renderer.screen_to_tile(cursor.x, cursor.y, 0.0);
    let guess_land = map.land_tile(guess.x, guess.y);
    let tile = if guess_land.is_void {
        guess
    } else {
        renderer.screen_to_tile(cursor.x, cursor.y, guess_land.z as f32)
    };
    (!map.land_tile(tile.x, tile.y).is_void).then_some(tile)
}

fn write_screenshot(frame: &FrameBuffer, dir: &Path) {
    let stamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    match save_screenshot(frame, dir, stamp_ms) {
        Ok(path) => info!(path = %path.display(), "screenshot_saved"),
        Err(error) => warn!(error = %error, "screenshot_failed"),
    }
}

fn window_title(base: &str, report: &IntervalReport) -> String {
    format!(
        "{base} | {:.0} fps | {} | ph {:.0}%",
        report.fps,
        report.latest.summary(),
        report.texture_mix.placeholder * 100.0
    )
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
