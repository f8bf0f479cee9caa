#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Mini Roguelike.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere macroquad is pulled in without its
//! default `audio` feature. Enabling this crate's `audio` feature restores
//! sound playback; without it cues go to a silent sink.

#[cfg(feature = "audio")]
mod audio;
mod sprites;

use anyhow::Result;
use glam::Vec2;
use macroquad::{
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
    shapes::{draw_rectangle, draw_rectangle_lines},
    text::{draw_text, measure_text},
};
use mini_roguelike_core::{Direction, Phase, GAME_TITLE};
use mini_roguelike_rendering::{
    palette, ActorPresentation, AudioSettings, AudioSink, Color, FrameInput, FrameOutcome,
    MenuButton, Presentation, RenderingBackend, Scene, SpriteKey, SpriteResolution,
    GAME_OVER_BANNER, GAME_OVER_HINT, HUD_HINT,
};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tracing::{info, warn};

use self::sprites::{DrawParams, SpriteAtlas};

/// Snapshot of edge-triggered keys observed during a single frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// Arrow keys or `WASD`.
    direction: Option<Direction>,
    /// `Enter` confirms the current screen.
    confirm: bool,
    /// `Escape` backs out to the menu.
    back: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        let direction = direction_from_presses(
            is_key_pressed(KeyCode::Left) || is_key_pressed(KeyCode::A),
            is_key_pressed(KeyCode::Right) || is_key_pressed(KeyCode::D),
            is_key_pressed(KeyCode::Up) || is_key_pressed(KeyCode::W),
            is_key_pressed(KeyCode::Down) || is_key_pressed(KeyCode::S),
        );
        let confirm = is_key_pressed(KeyCode::Enter) || is_key_pressed(KeyCode::KpEnter);
        let back = is_key_pressed(KeyCode::Escape);

        Self {
            direction,
            confirm,
            back,
        }
    }
}

/// Resolves simultaneous presses; left wins over right, which wins over up, then down.
fn direction_from_presses(left: bool, right: bool, up: bool, down: bool) -> Option<Direction> {
    if left {
        Some(Direction::West)
    } else if right {
        Some(Direction::East)
    } else if up {
        Some(Direction::North)
    } else if down {
        Some(Direction::South)
    } else {
        None
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Debug)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
    load_sprites: bool,
    asset_root: PathBuf,
}

impl Default for MacroquadBackend {
    fn default() -> Self {
        Self {
            swap_interval: None,
            show_fps: false,
            load_sprites: true,
            asset_root: PathBuf::from("assets"),
        }
    }
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the display refresh rate
    /// or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend logs frame timing metrics once per second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }

    /// Configures whether the backend should attempt to load sprite assets.
    #[must_use]
    pub fn with_sprite_loading(mut self, enabled: bool) -> Self {
        self.load_sprites = enabled;
        self
    }

    /// Directory holding `manifest.toml` and the sound files.
    #[must_use]
    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = asset_root.into();
        self
    }
}

/// Accumulates frame timings and reports averages once per second.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct FpsMetrics {
    per_second: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    fn record_frame(
        &mut self,
        frame: Duration,
        simulation: Duration,
        render: Duration,
    ) -> Option<FpsMetrics> {
        self.elapsed += frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += simulation;
        self.render_accum += render;

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let metrics = FpsMetrics {
            per_second: self.frames as f32 / seconds,
            avg_simulation: self.simulation_accum / frames,
            avg_render: self.render_accum / frames,
        };
        *self = Self::default();
        Some(metrics)
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameOutcome + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
            load_sprites,
            asset_root,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: scene.grid.width().round() as i32,
            window_height: scene.grid.height().round() as i32,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let sprite_atlas = if load_sprites {
                SpriteAtlas::load(&asset_root)
            } else {
                SpriteAtlas::fallback_only()
            };
            let mut audio = open_audio_sink(&asset_root).await;
            let mut audio_settings: Option<AudioSettings> = None;

            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let (cursor_x, cursor_y) = mouse_position();
                let frame_input = gather_frame_input(
                    &metrics,
                    keyboard,
                    Vec2::new(cursor_x, cursor_y),
                    is_mouse_button_pressed(MouseButton::Left),
                );

                let simulation_start = Instant::now();
                let outcome = update_scene(frame_dt, frame_input, &mut scene);
                let simulation_duration = simulation_start.elapsed();

                if outcome.exit_requested {
                    info!("exit requested from menu");
                    break;
                }
                if audio_settings != Some(outcome.audio) {
                    audio_settings = Some(outcome.audio);
                    if let Err(error) = audio.apply_settings(outcome.audio) {
                        warn!("failed to apply audio settings: {error:#}");
                    }
                }
                for cue in outcome.cues {
                    if let Err(error) = audio.play(cue) {
                        warn!(?cue, "failed to play audio cue: {error:#}");
                    }
                }

                let render_start = Instant::now();
                macroquad::window::clear_background(background);
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                if scene.shows_play_field() {
                    draw_tiles(&scene, &metrics, &sprite_atlas);
                    draw_actor(&scene.player, &scene, &metrics, &sprite_atlas);
                    for pursuer in &scene.pursuers {
                        draw_actor(pursuer, &scene, &metrics, &sprite_atlas);
                    }
                    draw_hud(&scene, &metrics);
                } else {
                    draw_menu(&scene, &metrics);
                }
                let render_duration = render_start.elapsed();

                let fps_metrics =
                    fps_counter.record_frame(frame_dt, simulation_duration, render_duration);
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        info!(
                            "FPS: {:.2} | sim: {:>6.2}ms render: {:>6.2}ms",
                            per_second,
                            avg_simulation.as_secs_f64() * 1_000.0,
                            avg_render.as_secs_f64() * 1_000.0,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

#[cfg(feature = "audio")]
async fn open_audio_sink(asset_root: &std::path::Path) -> Box<dyn AudioSink> {
    Box::new(audio::MacroquadAudio::load(asset_root).await)
}

#[cfg(not(feature = "audio"))]
async fn open_audio_sink(_asset_root: &std::path::Path) -> Box<dyn AudioSink> {
    Box::new(mini_roguelike_rendering::SilentAudio)
}

/// Maps scene pixels onto the window, letterboxing when the aspect ratios differ.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    scene_width: f32,
    scene_height: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let scene_width = scene.grid.width();
        let scene_height = scene.grid.height();
        let scale = if scene_width <= f32::EPSILON || scene_height <= f32::EPSILON {
            1.0
        } else {
            (screen_width / scene_width).min(screen_height / scene_height)
        };
        let offset_x = ((screen_width - scene_width * scale) * 0.5).max(0.0);
        let offset_y = ((screen_height - scene_height * scale) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
            scene_width,
            scene_height,
        }
    }

    fn to_screen(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            self.offset_x + point.x * self.scale,
            self.offset_y + point.y * self.scale,
        )
    }

    fn to_scene(&self, point: Vec2) -> Option<Vec2> {
        if self.scale <= f32::EPSILON {
            return None;
        }
        Some(Vec2::new(
            (point.x - self.offset_x) / self.scale,
            (point.y - self.offset_y) / self.scale,
        ))
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let origin = self.to_screen(Vec2::new(x, y));
        draw_rectangle(
            origin.x,
            origin.y,
            width * self.scale,
            height * self.scale,
            to_macroquad_color(color),
        );
    }

    fn outline_rect(&self, x: f32, y: f32, width: f32, height: f32, color: Color) {
        let origin = self.to_screen(Vec2::new(x, y));
        draw_rectangle_lines(
            origin.x,
            origin.y,
            width * self.scale,
            height * self.scale,
            (2.0 * self.scale).max(1.0),
            to_macroquad_color(color),
        );
    }

    fn sprite_params(&self, top_left: Vec2, size: f32) -> DrawParams {
        DrawParams::new(self.to_screen(top_left), Vec2::splat(size * self.scale))
    }
}

fn gather_frame_input(
    metrics: &SceneMetrics,
    keyboard: KeyboardShortcuts,
    cursor: Vec2,
    pointer_pressed: bool,
) -> FrameInput {
    FrameInput {
        direction: keyboard.direction,
        confirm: keyboard.confirm,
        back: keyboard.back,
        cursor: metrics.to_scene(cursor),
        pointer_pressed,
    }
}

fn draw_tiles(scene: &Scene, metrics: &SceneMetrics, sprite_atlas: &SpriteAtlas) {
    let grid = &scene.grid;
    let tile = grid.tile_length;
    for row in 0..grid.rows {
        for column in 0..grid.columns {
            let is_wall = grid.is_wall(column, row);
            let (key, fallback) = if is_wall {
                (SpriteKey::Wall, palette::WALL)
            } else {
                (SpriteKey::Floor, palette::FLOOR)
            };
            let x = column as f32 * tile - scene.camera.x;
            let y = row as f32 * tile - scene.camera.y;
            match sprite_atlas.resolve(key) {
                SpriteResolution::HasSprite(texture) => {
                    sprites::draw(texture, metrics.sprite_params(Vec2::new(x, y), tile));
                }
                SpriteResolution::UseFallbackShape => {
                    metrics.fill_rect(x, y, tile, tile, fallback);
                }
            }
        }
    }
}

fn draw_actor(
    actor: &ActorPresentation,
    scene: &Scene,
    metrics: &SceneMetrics,
    sprite_atlas: &SpriteAtlas,
) {
    let tile = scene.grid.tile_length;
    let center = (actor.position - scene.camera).floor();
    if let SpriteResolution::HasSprite(texture) = sprite_atlas.resolve(actor.sprite) {
        let top_left = center - Vec2::splat((tile * 0.5).floor());
        sprites::draw(texture, metrics.sprite_params(top_left, tile));
        return;
    }

    let (cx, cy) = (center.x, center.y);
    let body_r = (tile * 0.35).floor();
    let leg = actor.leg_offset();
    metrics.fill_rect(cx - body_r - 6.0, cy + body_r - 6.0, 10.0, 8.0, actor.accent);
    metrics.fill_rect(cx + body_r - 4.0, cy + body_r - 6.0, 10.0, 8.0, actor.accent);
    metrics.fill_rect(cx - body_r - 6.0, cy + body_r - 6.0 + leg, 10.0, 6.0, actor.accent);
    metrics.fill_rect(cx + body_r - 4.0, cy + body_r - 6.0 - leg, 10.0, 6.0, actor.accent);

    let side = body_r * 2.0;
    metrics.fill_rect(cx - body_r, cy - body_r, side, side, actor.body);
    metrics.outline_rect(cx - body_r, cy - body_r, side, side, palette::WHITE);

    let eye = actor.eye_offset().trunc();
    let eye_x = cx - 4.0 + eye.x;
    let eye_y = cy - 6.0 + eye.y;
    metrics.fill_rect(eye_x, eye_y, 8.0, 8.0, palette::WHITE);
    metrics.fill_rect(eye_x + 2.0, eye_y + 2.0, 4.0, 4.0, palette::BLACK);
}

fn draw_hud(scene: &Scene, metrics: &SceneMetrics) {
    draw_shadowed_text(HUD_HINT, Vec2::new(5.0, 18.0), 18.0, palette::WHITE, metrics);

    if scene.phase != Phase::Over {
        return;
    }
    let center_x = metrics.scene_width * 0.5;
    let center_y = metrics.scene_height * 0.5;
    draw_centered_text(
        GAME_OVER_BANNER,
        Vec2::new(center_x, center_y - 10.0),
        32.0,
        palette::HIGHLIGHT,
        metrics,
    );
    draw_centered_text(
        GAME_OVER_HINT,
        Vec2::new(center_x, center_y + 20.0),
        20.0,
        palette::WHITE,
        metrics,
    );
}

fn draw_menu(scene: &Scene, metrics: &SceneMetrics) {
    let title = if scene.menu.title.is_empty() {
        GAME_TITLE
    } else {
        scene.menu.title.as_str()
    };
    draw_centered_text(
        title,
        Vec2::new(metrics.scene_width * 0.5, 70.0),
        56.0,
        palette::HIGHLIGHT,
        metrics,
    );

    for button in &scene.menu.buttons {
        draw_button(button, metrics);
    }
}

fn draw_button(button: &MenuButton, metrics: &SceneMetrics) {
    let rect = button.rect;
    let fill = if button.hovered {
        palette::BUTTON.lighten(0.3)
    } else {
        palette::BUTTON
    };
    metrics.fill_rect(rect.x, rect.y, rect.width, rect.height, fill);
    metrics.outline_rect(rect.x, rect.y, rect.width, rect.height, palette::WHITE);
    draw_centered_text(&button.label, rect.center(), 28.0, palette::BLACK, metrics);
}

fn draw_centered_text(
    text: &str,
    center: Vec2,
    font_size: f32,
    color: Color,
    metrics: &SceneMetrics,
) {
    let scaled = (font_size * metrics.scale).max(1.0);
    let dimensions = measure_text(text, None, scaled.round() as u16, 1.0);
    let width = dimensions.width / metrics.scale.max(f32::EPSILON);
    let height = dimensions.height / metrics.scale.max(f32::EPSILON);
    let baseline = Vec2::new(center.x - width * 0.5, center.y + height * 0.5);
    draw_shadowed_text(text, baseline, font_size, color, metrics);
}

fn draw_shadowed_text(
    text: &str,
    baseline: Vec2,
    font_size: f32,
    color: Color,
    metrics: &SceneMetrics,
) {
    let scaled = (font_size * metrics.scale).max(1.0);
    let shadow = metrics.to_screen(baseline + Vec2::ONE);
    let _ = draw_text(
        text,
        shadow.x,
        shadow.y,
        scaled,
        to_macroquad_color(palette::BLACK),
    );
    let position = metrics.to_screen(baseline);
    let _ = draw_text(text, position.x, position.y, scaled, to_macroquad_color(color));
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mini_roguelike_core::CellCoord;
    use mini_roguelike_rendering::GridPresentation;

    fn scene(columns: u32, rows: u32) -> Scene {
        let grid = GridPresentation::new(columns, rows, 16.0, [CellCoord::new(0, 0)])
            .expect("valid grid");
        let player = ActorPresentation {
            sprite: SpriteKey::Hero,
            position: Vec2::new(40.0, 40.0),
            facing: Direction::South,
            moving: false,
            stride_phase: 0.0,
            body: palette::HERO_BODY,
            accent: palette::HERO_ACCENT,
        };
        Scene::new(grid, player)
    }

    #[test]
    fn metrics_are_identity_when_window_matches_grid() {
        let metrics = SceneMetrics::from_scene(&scene(40, 40), 640.0, 640.0);

        assert_eq!(metrics.scale, 1.0);
        assert_eq!(metrics.to_screen(Vec2::new(12.0, 30.0)), Vec2::new(12.0, 30.0));
    }

    #[test]
    fn metrics_letterbox_wide_windows() {
        let metrics = SceneMetrics::from_scene(&scene(40, 40), 1280.0, 640.0);

        assert_eq!(metrics.scale, 1.0);
        assert_eq!(metrics.offset_x, 320.0);
        assert_eq!(metrics.offset_y, 0.0);
    }

    #[test]
    fn cursor_is_converted_to_scene_space() {
        let metrics = SceneMetrics::from_scene(&scene(40, 40), 1280.0, 1280.0);
        let keyboard = KeyboardShortcuts {
            direction: Some(Direction::North),
            confirm: true,
            back: false,
        };

        let input = gather_frame_input(&metrics, keyboard, Vec2::new(640.0, 400.0), true);

        assert_eq!(input.cursor, Some(Vec2::new(320.0, 200.0)));
        assert_eq!(input.direction, Some(Direction::North));
        assert!(input.confirm);
        assert!(input.pointer_pressed);
        assert!(!input.back);
    }

    #[test]
    fn direction_priority_matches_key_order() {
        assert_eq!(direction_from_presses(true, true, true, true), Some(Direction::West));
        assert_eq!(direction_from_presses(false, true, true, false), Some(Direction::East));
        assert_eq!(direction_from_presses(false, false, true, true), Some(Direction::North));
        assert_eq!(direction_from_presses(false, false, false, true), Some(Direction::South));
        assert_eq!(direction_from_presses(false, false, false, false), None);
    }

    #[test]
    fn fps_counter_reports_once_per_second() {
        let mut counter = FpsCounter::default();
        let frame = Duration::from_millis(250);
        for _ in 0..3 {
            assert!(counter
                .record_frame(frame, Duration::from_millis(2), Duration::from_millis(4))
                .is_none());
        }

        let metrics = counter
            .record_frame(frame, Duration::from_millis(2), Duration::from_millis(4))
            .expect("one second elapsed");

        assert_eq!(metrics.per_second, 4.0);
        assert_eq!(metrics.avg_simulation, Duration::from_millis(2));
        assert_eq!(metrics.avg_render, Duration::from_millis(4));
        assert_eq!(counter.frames, 0);
    }
}
