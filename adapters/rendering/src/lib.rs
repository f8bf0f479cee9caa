#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Mini Roguelike adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use mini_roguelike_core::{AudioCue, CellCoord, Direction, Phase};
use std::{error::Error, fmt, time::Duration};
use tracing::trace;

/// Hint printed in the top-left corner while a session is active.
pub const HUD_HINT: &str = "Arrows/WASD to move. ESC: menu";

/// Banner shown once the player has been caught.
pub const GAME_OVER_BANNER: &str = "GAME OVER";

/// Instructions shown below the game over banner.
pub const GAME_OVER_HINT: &str = "Enter: restart  Click/Esc: menu";

/// Radians per second at which actor legs swing.
pub const STRIDE_RATE: f32 = 12.0;

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns a new color lightened towards white by the provided amount.
    #[must_use]
    pub fn lighten(self, amount: f32) -> Self {
        let amount = amount.clamp(0.0, 1.0);

        Self {
            red: lighten_channel(self.red, amount),
            green: lighten_channel(self.green, amount),
            blue: lighten_channel(self.blue, amount),
            alpha: self.alpha,
        }
    }
}

fn lighten_channel(channel: f32, amount: f32) -> f32 {
    channel + (1.0 - channel) * amount
}

/// Fixed colors used by the fallback shapes, HUD and menu.
pub mod palette {
    use super::Color;

    /// Outlines, eyes and HUD text.
    pub const WHITE: Color = Color::from_rgb_u8(240, 240, 240);
    /// Frame background and text shadows.
    pub const BLACK: Color = Color::from_rgb_u8(20, 20, 24);
    /// Wall tiles.
    pub const WALL: Color = Color::from_rgb_u8(70, 70, 80);
    /// Floor tiles.
    pub const FLOOR: Color = Color::from_rgb_u8(30, 30, 36);
    /// Menu button background.
    pub const BUTTON: Color = Color::from_rgb_u8(160, 160, 170);
    /// Title and game over banner.
    pub const HIGHLIGHT: Color = Color::from_rgb_u8(240, 210, 70);
    /// Hero body.
    pub const HERO_BODY: Color = Color::from_rgb_u8(80, 160, 240);
    /// Hero legs.
    pub const HERO_ACCENT: Color = Color::from_rgb_u8(40, 200, 120);
    /// Stalker body.
    pub const STALKER_BODY: Color = Color::from_rgb_u8(220, 80, 80);
    /// Stalker legs.
    pub const STALKER_ACCENT: Color = Color::from_rgb_u8(240, 210, 70);
    /// Lurker body.
    pub const LURKER_BODY: Color = Color::from_rgb_u8(200, 100, 220);
    /// Lurker legs.
    pub const LURKER_ACCENT: Color = Color::from_rgb_u8(255, 230, 120);
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Movement key pressed on this frame, if any.
    pub direction: Option<Direction>,
    /// Whether `Enter` was pressed on this frame.
    pub confirm: bool,
    /// Whether `Escape` was pressed on this frame.
    pub back: bool,
    /// Cursor position in screen pixels.
    pub cursor: Option<Vec2>,
    /// Whether the primary mouse button was pressed on this frame.
    pub pointer_pressed: bool,
}

/// Result of a single scene update handed back to the backend.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameOutcome {
    /// Sound cues the backend should play, already filtered by the audio settings.
    pub cues: Vec<AudioCue>,
    /// Audio settings in effect after the update.
    pub audio: AudioSettings,
    /// Whether the player asked to leave the game.
    pub exit_requested: bool,
}

/// Music and sound effect toggles owned by the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioSettings {
    /// Whether the background theme plays.
    pub music: bool,
    /// Whether step and hit effects play.
    pub effects: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            music: true,
            effects: true,
        }
    }
}

impl AudioSettings {
    /// Creates settings with music and effects both enabled or both disabled.
    #[must_use]
    pub const fn uniform(enabled: bool) -> Self {
        Self {
            music: enabled,
            effects: enabled,
        }
    }

    /// Flips music and effects together.
    pub fn toggle(&mut self) {
        self.music = !self.music;
        self.effects = !self.effects;
    }

    /// Reports whether the cue may be played under these settings.
    #[must_use]
    pub const fn allows(&self, cue: AudioCue) -> bool {
        match cue {
            AudioCue::Theme => self.music,
            AudioCue::Step | AudioCue::Hit => self.effects,
        }
    }

    /// Label shown on the menu's audio toggle button.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "Music: {}  Sounds: {}",
            on_off(self.music),
            on_off(self.effects)
        )
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "On"
    } else {
        "Off"
    }
}

/// Destination for sound cues.
///
/// Failures are reported to the caller, which logs and discards them.
pub trait AudioSink {
    /// Plays the provided cue.
    fn play(&mut self, cue: AudioCue) -> AnyResult<()>;

    /// Applies updated settings, typically starting or silencing the theme.
    fn apply_settings(&mut self, settings: AudioSettings) -> AnyResult<()>;
}

/// Audio sink that only traces the cues it receives.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, cue: AudioCue) -> AnyResult<()> {
        trace!(?cue, "audio cue (silent)");
        Ok(())
    }

    fn apply_settings(&mut self, settings: AudioSettings) -> AnyResult<()> {
        trace!(?settings, "audio settings (silent)");
        Ok(())
    }
}

/// Sprite slots that may be provided by the asset manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteKey {
    /// Walkable tile.
    Floor,
    /// Wall tile.
    Wall,
    /// Player character.
    Hero,
    /// Red pursuer.
    Stalker,
    /// Violet pursuer.
    Lurker,
}

impl SpriteKey {
    /// Every sprite key in canonical order.
    pub const ALL: [SpriteKey; 5] = [
        SpriteKey::Floor,
        SpriteKey::Wall,
        SpriteKey::Hero,
        SpriteKey::Stalker,
        SpriteKey::Lurker,
    ];

    /// Name used for the key inside the sprite manifest.
    #[must_use]
    pub const fn manifest_name(self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Wall => "wall",
            Self::Hero => "hero",
            Self::Stalker => "stalker",
            Self::Lurker => "lurker",
        }
    }

    /// Looks up a key by its manifest name.
    #[must_use]
    pub fn from_manifest_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.manifest_name() == name)
    }
}

/// Outcome of resolving a sprite key once at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpriteResolution<T> {
    /// A texture is available for the key.
    HasSprite(T),
    /// No usable texture; draw the procedural fallback shape instead.
    UseFallbackShape,
}

impl<T> SpriteResolution<T> {
    /// Converts from `&SpriteResolution<T>` to `SpriteResolution<&T>`.
    #[must_use]
    pub const fn as_ref(&self) -> SpriteResolution<&T> {
        match self {
            Self::HasSprite(sprite) => SpriteResolution::HasSprite(sprite),
            Self::UseFallbackShape => SpriteResolution::UseFallbackShape,
        }
    }

    /// Reports whether a texture was resolved.
    #[must_use]
    pub const fn has_sprite(&self) -> bool {
        matches!(self, Self::HasSprite(_))
    }
}

/// Describes the tile grid that forms the play area.
#[derive(Clone, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns contained in the grid.
    pub columns: u32,
    /// Number of rows contained in the grid.
    pub rows: u32,
    /// Side length of a single tile in pixels.
    pub tile_length: f32,
    walls: Vec<bool>,
}

impl GridPresentation {
    /// Creates a new grid descriptor with the provided wall cells.
    ///
    /// Returns an error when the grid has no area or the tile length is not positive.
    pub fn new<I>(
        columns: u32,
        rows: u32,
        tile_length: f32,
        walls: I,
    ) -> Result<Self, RenderingError>
    where
        I: IntoIterator<Item = CellCoord>,
    {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyGrid { columns, rows });
        }
        if !tile_length.is_finite() || tile_length <= 0.0 {
            return Err(RenderingError::InvalidTileLength { tile_length });
        }

        let width = columns as usize;
        let mut mask = vec![false; width * rows as usize];
        for cell in walls {
            if cell.column() < columns && cell.row() < rows {
                mask[cell.row() as usize * width + cell.column() as usize] = true;
            }
        }

        Ok(Self {
            columns,
            rows,
            tile_length,
            walls: mask,
        })
    }

    /// Reports whether the tile at the provided indices is a wall.
    #[must_use]
    pub fn is_wall(&self, column: u32, row: u32) -> bool {
        if column >= self.columns || row >= self.rows {
            return false;
        }
        self.walls
            .get(row as usize * self.columns as usize + column as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Calculates the total width of the grid in pixels.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Calculates the total height of the grid in pixels.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }
}

/// Actor drawn either as a sprite or as the procedural body-and-legs shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorPresentation {
    /// Sprite slot used when a texture is available.
    pub sprite: SpriteKey,
    /// Pixel-space centre of the actor.
    pub position: Vec2,
    /// Direction the actor faces.
    pub facing: Direction,
    /// Whether the actor is interpolating between cells.
    pub moving: bool,
    /// Leg swing phase in `-1.0..=1.0`.
    pub stride_phase: f32,
    /// Fill color of the fallback body.
    pub body: Color,
    /// Fill color of the fallback legs.
    pub accent: Color,
}

impl ActorPresentation {
    /// Vertical leg displacement in pixels; larger while walking.
    #[must_use]
    pub fn leg_offset(&self) -> f32 {
        let swing = if self.moving { 6.0 } else { 2.0 };
        (self.stride_phase * swing).trunc()
    }

    /// Offset of the eye from the body centre toward the facing direction.
    #[must_use]
    pub fn eye_offset(&self) -> Vec2 {
        self.facing.unit_vector() * Vec2::new(6.0, 4.0)
    }
}

/// Action triggered by a menu button.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuAction {
    /// Start a new session.
    Start,
    /// Toggle music and sound effects together.
    ToggleAudio,
    /// Quit the game.
    Exit,
}

/// Axis-aligned rectangle in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Horizontal extent.
    pub width: f32,
    /// Vertical extent.
    pub height: f32,
}

impl ScreenRect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reports whether the point lies inside the rectangle, right and bottom edges excluded.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x
            && point.y >= self.y
            && point.x < self.x + self.width
            && point.y < self.y + self.height
    }

    /// Centre of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Single button of the main menu.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuButton {
    /// Action fired when the button is clicked.
    pub action: MenuAction,
    /// Text drawn on the button.
    pub label: String,
    /// Screen-space bounds of the button.
    pub rect: ScreenRect,
    /// Whether the cursor hovers the button.
    pub hovered: bool,
}

/// Vertical stack of menu buttons centred on the screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MenuLayout {
    screen_width: f32,
    screen_height: f32,
}

impl MenuLayout {
    /// Width of every button.
    pub const BUTTON_WIDTH: f32 = 280.0;
    /// Height of every button.
    pub const BUTTON_HEIGHT: f32 = 56.0;
    /// Vertical distance between the tops of consecutive buttons.
    pub const BUTTON_SPACING: f32 = 80.0;
    /// Distance from the screen centre up to the top of the first button.
    pub const FIRST_BUTTON_RISE: f32 = 120.0;
    /// Buttons from top to bottom.
    pub const ACTIONS: [MenuAction; 3] = [MenuAction::Start, MenuAction::ToggleAudio, MenuAction::Exit];

    /// Creates a layout for a screen of the provided size.
    #[must_use]
    pub const fn new(screen_width: f32, screen_height: f32) -> Self {
        Self {
            screen_width,
            screen_height,
        }
    }

    /// Bounds of the button bound to `action`.
    #[must_use]
    pub fn rect(&self, action: MenuAction) -> ScreenRect {
        let index = match action {
            MenuAction::Start => 0.0,
            MenuAction::ToggleAudio => 1.0,
            MenuAction::Exit => 2.0,
        };
        let x = (self.screen_width * 0.5).floor() - Self::BUTTON_WIDTH * 0.5;
        let y = (self.screen_height * 0.5).floor() - Self::FIRST_BUTTON_RISE
            + Self::BUTTON_SPACING * index;
        ScreenRect::new(x, y, Self::BUTTON_WIDTH, Self::BUTTON_HEIGHT)
    }

    /// Returns the action whose button contains the point, if any.
    #[must_use]
    pub fn hit_test(&self, point: Vec2) -> Option<MenuAction> {
        Self::ACTIONS
            .into_iter()
            .find(|action| self.rect(*action).contains(point))
    }

    /// Builds the buttons for display, labelling the audio toggle from `audio`.
    #[must_use]
    pub fn buttons(&self, audio: AudioSettings, cursor: Option<Vec2>) -> Vec<MenuButton> {
        Self::ACTIONS
            .into_iter()
            .map(|action| {
                let rect = self.rect(action);
                let label = match action {
                    MenuAction::Start => String::from("Start Game"),
                    MenuAction::ToggleAudio => audio.label(),
                    MenuAction::Exit => String::from("Exit"),
                };
                MenuButton {
                    action,
                    label,
                    rect,
                    hovered: cursor.map_or(false, |point| rect.contains(point)),
                }
            })
            .collect()
    }
}

/// Main menu contents.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MenuView {
    /// Title drawn above the buttons.
    pub title: String,
    /// Buttons from top to bottom.
    pub buttons: Vec<MenuButton>,
}

/// Scene description combining the grid, actors, menu and overlays.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Active session phase.
    pub phase: Phase,
    /// Tile grid that composes the play area.
    pub grid: GridPresentation,
    /// Player character.
    pub player: ActorPresentation,
    /// Pursuers in identifier order.
    pub pursuers: Vec<ActorPresentation>,
    /// Pixel offset subtracted from world positions when drawing.
    pub camera: Vec2,
    /// Seconds since the player was caught; zero outside [`Phase::Over`].
    pub over_elapsed: f32,
    /// Menu contents, drawn only in [`Phase::Menu`].
    pub menu: MenuView,
    /// Audio settings shown by the menu.
    pub audio: AudioSettings,
}

impl Scene {
    /// Creates a new scene descriptor with the camera at the origin.
    #[must_use]
    pub fn new(grid: GridPresentation, player: ActorPresentation) -> Self {
        Self {
            phase: Phase::Menu,
            grid,
            player,
            pursuers: Vec::new(),
            camera: Vec2::ZERO,
            over_elapsed: 0.0,
            menu: MenuView::default(),
            audio: AudioSettings::default(),
        }
    }

    /// Whether the play field and HUD are drawn.
    #[must_use]
    pub fn shows_play_field(&self) -> bool {
        self.phase != Phase::Menu
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Mini Roguelike scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// input captured by the adapter, mutates the scene before it is
    /// rendered, and reports the cues to play and whether to quit.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameOutcome + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The grid must contain at least one tile.
    EmptyGrid {
        /// Provided column count.
        columns: u32,
        /// Provided row count.
        rows: u32,
    },
    /// Tiles must have a positive, finite side length.
    InvalidTileLength {
        /// Provided tile length that failed validation.
        tile_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { columns, rows } => {
                write!(f, "grid must not be empty (received {columns}x{rows})")
            }
            Self::InvalidTileLength { tile_length } => {
                write!(f, "tile_length must be positive (received {tile_length})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(facing: Direction, moving: bool, stride_phase: f32) -> ActorPresentation {
        ActorPresentation {
            sprite: SpriteKey::Hero,
            position: Vec2::new(40.0, 40.0),
            facing,
            moving,
            stride_phase,
            body: palette::HERO_BODY,
            accent: palette::HERO_ACCENT,
        }
    }

    #[test]
    fn grid_creation_rejects_degenerate_dimensions_without_panicking() {
        let error = GridPresentation::new(0, 4, 16.0, Vec::<CellCoord>::new()).expect_err("empty grid");
        assert_eq!(error, RenderingError::EmptyGrid { columns: 0, rows: 4 });

        let error = GridPresentation::new(4, 4, 0.0, Vec::<CellCoord>::new()).expect_err("zero tile length");
        assert!(matches!(error, RenderingError::InvalidTileLength { .. }));
    }

    #[test]
    fn grid_tracks_wall_cells() {
        let grid = GridPresentation::new(
            3,
            2,
            16.0,
            [CellCoord::new(2, 1), CellCoord::new(9, 9)],
        )
        .expect("valid grid");

        assert!(grid.is_wall(2, 1));
        assert!(!grid.is_wall(1, 1));
        assert!(!grid.is_wall(9, 9));
        assert_eq!(grid.width(), 48.0);
        assert_eq!(grid.height(), 32.0);
    }

    #[test]
    fn legs_swing_wider_while_moving() {
        assert_eq!(actor(Direction::South, true, 1.0).leg_offset(), 6.0);
        assert_eq!(actor(Direction::South, false, 1.0).leg_offset(), 2.0);
        assert_eq!(actor(Direction::South, true, -0.5).leg_offset(), -3.0);
    }

    #[test]
    fn eye_follows_facing() {
        assert_eq!(actor(Direction::South, false, 0.0).eye_offset(), Vec2::new(0.0, 4.0));
        assert_eq!(actor(Direction::West, false, 0.0).eye_offset(), Vec2::new(-6.0, 0.0));
    }

    #[test]
    fn audio_toggle_flips_both_channels() {
        let mut settings = AudioSettings::default();
        assert_eq!(settings.label(), "Music: On  Sounds: On");

        settings.toggle();

        assert_eq!(settings, AudioSettings::uniform(false));
        assert_eq!(settings.label(), "Music: Off  Sounds: Off");
        assert!(!settings.allows(AudioCue::Step));
        assert!(!settings.allows(AudioCue::Theme));
    }

    #[test]
    fn menu_layout_matches_screen_centre() {
        let layout = MenuLayout::new(640.0, 640.0);

        assert_eq!(
            layout.rect(MenuAction::Start),
            ScreenRect::new(180.0, 200.0, 280.0, 56.0)
        );
        assert_eq!(layout.rect(MenuAction::ToggleAudio).y, 280.0);
        assert_eq!(layout.rect(MenuAction::Exit).y, 360.0);
    }

    #[test]
    fn menu_hit_test_finds_buttons_and_gaps() {
        let layout = MenuLayout::new(640.0, 640.0);

        assert_eq!(layout.hit_test(Vec2::new(320.0, 220.0)), Some(MenuAction::Start));
        assert_eq!(
            layout.hit_test(Vec2::new(181.0, 335.0)),
            Some(MenuAction::ToggleAudio)
        );
        assert_eq!(layout.hit_test(Vec2::new(320.0, 265.0)), None);
        assert_eq!(layout.hit_test(Vec2::new(460.0, 380.0)), None);
    }

    #[test]
    fn menu_buttons_report_hover_and_audio_label() {
        let layout = MenuLayout::new(640.0, 640.0);
        let buttons = layout.buttons(AudioSettings::uniform(false), Some(Vec2::new(320.0, 380.0)));

        let labels: Vec<_> = buttons.iter().map(|button| button.label.as_str()).collect();
        assert_eq!(labels, ["Start Game", "Music: Off  Sounds: Off", "Exit"]);
        let hovered: Vec<_> = buttons.iter().map(|button| button.hovered).collect();
        assert_eq!(hovered, [false, false, true]);
    }

    #[test]
    fn sprite_keys_round_trip_manifest_names() {
        for key in SpriteKey::ALL {
            assert_eq!(SpriteKey::from_manifest_name(key.manifest_name()), Some(key));
        }
        assert_eq!(SpriteKey::from_manifest_name("torch"), None);
    }
}
