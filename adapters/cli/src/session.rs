//! Glue between frame input, the world, the audio cue system and the scene.

use std::time::Duration;

use mini_roguelike_core::{
    ActorSnapshot, AudioCue, CellCoord, Command, Event, Phase, PursuerId, PursuerKind,
    GAME_TITLE,
};
use mini_roguelike_rendering::{
    palette, ActorPresentation, AudioSettings, FrameInput, FrameOutcome, GridPresentation,
    MenuAction, MenuLayout, MenuView, RenderingError, Scene, SpriteKey, STRIDE_RATE,
};
use mini_roguelike_system_audio_cues::AudioCues;
use mini_roguelike_world::{self as world, query, Config, ConfigError, World};
use tracing::{debug, info};

/// Capture recorded when a pursuer reaches the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Capture {
    pub(crate) pursuer: PursuerId,
    pub(crate) cell: CellCoord,
}

/// Owns the world and everything the adapters need to drive it frame by frame.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    audio_cues: AudioCues,
    audio: AudioSettings,
    layout: MenuLayout,
    theme_pending: bool,
    grid_dirty: bool,
    last_capture: Option<Capture>,
    events: Vec<Event>,
}

impl Session {
    pub(crate) fn new(config: Config, audio: AudioSettings) -> Result<Self, ConfigError> {
        let world = World::with_config(config)?;
        let grid = query::grid_map(&world);
        let tile_length = query::config(&world).tile_length;
        let layout = MenuLayout::new(
            grid.columns() as f32 * tile_length,
            grid.rows() as f32 * tile_length,
        );

        Ok(Self {
            world,
            audio_cues: AudioCues,
            audio,
            layout,
            theme_pending: true,
            grid_dirty: true,
            last_capture: None,
            events: Vec::new(),
        })
    }

    pub(crate) fn phase(&self) -> Phase {
        query::phase(&self.world)
    }

    pub(crate) fn ticks(&self) -> u64 {
        query::tick_index(&self.world)
    }

    pub(crate) fn last_capture(&self) -> Option<Capture> {
        self.last_capture
    }

    /// Maps the frame's input to commands, advances the world and collects cues.
    pub(crate) fn frame(&mut self, dt: Duration, input: FrameInput) -> FrameOutcome {
        self.events.clear();
        let mut exit_requested = false;

        match self.phase() {
            Phase::Menu => {
                let clicked = input
                    .cursor
                    .filter(|_| input.pointer_pressed)
                    .and_then(|cursor| self.layout.hit_test(cursor));
                if input.confirm || clicked == Some(MenuAction::Start) {
                    self.submit(Command::StartSession);
                } else if clicked == Some(MenuAction::ToggleAudio) {
                    self.audio.toggle();
                    info!(music = self.audio.music, effects = self.audio.effects, "audio toggled");
                } else if clicked == Some(MenuAction::Exit) {
                    exit_requested = true;
                }
            }
            Phase::Playing => {
                if input.back {
                    self.submit(Command::ReturnToMenu);
                } else if let Some(direction) = input.direction {
                    self.submit(Command::MovePlayer { direction });
                }
            }
            Phase::Over => {
                if input.confirm {
                    self.submit(Command::StartSession);
                } else if input.back || input.pointer_pressed {
                    self.submit(Command::ReturnToMenu);
                }
            }
        }
        self.submit(Command::Tick { dt });

        let mut cues = Vec::new();
        if self.theme_pending {
            self.theme_pending = false;
            cues.push(AudioCue::Theme);
        }
        self.audio_cues.handle(&self.events, &mut cues);
        cues.retain(|cue| self.audio.allows(*cue));

        for event in &self.events {
            match event {
                Event::SessionStarted { .. } => {
                    self.grid_dirty = true;
                    self.last_capture = None;
                }
                Event::PlayerCaught { pursuer, cell } => {
                    self.last_capture = Some(Capture {
                        pursuer: *pursuer,
                        cell: *cell,
                    });
                }
                _ => {}
            }
        }

        FrameOutcome {
            cues,
            audio: self.audio,
            exit_requested,
        }
    }

    fn submit(&mut self, command: Command) {
        debug!(?command, "applying command");
        world::apply(&mut self.world, command, &mut self.events);
    }

    /// Builds a scene reflecting the current world state.
    pub(crate) fn scene(&mut self) -> Result<Scene, RenderingError> {
        let mut scene = Scene::new(self.grid_presentation()?, self.player_presentation());
        self.grid_dirty = false;
        self.populate(&mut scene, None)?;
        Ok(scene)
    }

    /// Refreshes an existing scene in place.
    pub(crate) fn populate(
        &mut self,
        scene: &mut Scene,
        cursor: Option<glam::Vec2>,
    ) -> Result<(), RenderingError> {
        if self.grid_dirty {
            scene.grid = self.grid_presentation()?;
            self.grid_dirty = false;
        }

        scene.phase = self.phase();
        scene.player = self.player_presentation();
        scene.pursuers.clear();
        scene.pursuers.extend(
            query::pursuer_view(&self.world)
                .iter()
                .map(|pursuer| pursuer_presentation(pursuer.kind, &pursuer.actor)),
        );
        scene.over_elapsed = if scene.phase == Phase::Over {
            query::over_elapsed(&self.world)
        } else {
            0.0
        };
        scene.audio = self.audio;
        scene.menu = MenuView {
            title: GAME_TITLE.to_owned(),
            buttons: self.layout.buttons(self.audio, cursor),
        };
        Ok(())
    }

    fn grid_presentation(&self) -> Result<GridPresentation, RenderingError> {
        let grid = query::grid_map(&self.world);
        GridPresentation::new(
            grid.columns(),
            grid.rows(),
            query::config(&self.world).tile_length,
            grid.walls(),
        )
    }

    fn player_presentation(&self) -> ActorPresentation {
        actor_presentation(
            &query::player(&self.world),
            SpriteKey::Hero,
            palette::HERO_BODY,
            palette::HERO_ACCENT,
        )
    }
}

fn pursuer_presentation(kind: PursuerKind, actor: &ActorSnapshot) -> ActorPresentation {
    match kind {
        PursuerKind::Stalker => actor_presentation(
            actor,
            SpriteKey::Stalker,
            palette::STALKER_BODY,
            palette::STALKER_ACCENT,
        ),
        PursuerKind::Lurker => actor_presentation(
            actor,
            SpriteKey::Lurker,
            palette::LURKER_BODY,
            palette::LURKER_ACCENT,
        ),
    }
}

fn actor_presentation(
    actor: &ActorSnapshot,
    sprite: SpriteKey,
    body: mini_roguelike_rendering::Color,
    accent: mini_roguelike_rendering::Color,
) -> ActorPresentation {
    ActorPresentation {
        sprite,
        position: actor.position,
        facing: actor.direction,
        moving: actor.moving,
        stride_phase: actor.stride_phase(STRIDE_RATE),
        body,
        accent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use mini_roguelike_core::Direction;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn empty_session() -> Session {
        let config = Config {
            stalkers: 0,
            lurkers: 0,
            ..Config::default()
        };
        Session::new(config, AudioSettings::default()).expect("valid config")
    }

    fn corridor_session() -> Session {
        let config = Config {
            columns: 4,
            rows: 3,
            stalkers: 1,
            lurkers: 0,
            player_spawn: CellCoord::new(1, 1),
            ..Config::default()
        };
        Session::new(config, AudioSettings::default()).expect("valid config")
    }

    fn confirm() -> FrameInput {
        FrameInput {
            confirm: true,
            ..FrameInput::default()
        }
    }

    fn click(point: Vec2) -> FrameInput {
        FrameInput {
            cursor: Some(point),
            pointer_pressed: true,
            ..FrameInput::default()
        }
    }

    #[test]
    fn first_frame_requests_theme_once() {
        let mut session = empty_session();

        let first = session.frame(FRAME, FrameInput::default());
        let second = session.frame(FRAME, FrameInput::default());

        assert_eq!(first.cues, vec![AudioCue::Theme]);
        assert!(second.cues.is_empty());
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn muted_session_never_emits_cues() {
        let mut session =
            Session::new(Config::default(), AudioSettings::uniform(false)).expect("valid config");

        let outcome = session.frame(FRAME, confirm());

        assert!(outcome.cues.is_empty());
        assert_eq!(outcome.audio, AudioSettings::uniform(false));
    }

    #[test]
    fn enter_starts_and_escape_returns_to_menu() {
        let mut session = empty_session();

        let _ = session.frame(FRAME, confirm());
        assert_eq!(session.phase(), Phase::Playing);

        let _ = session.frame(
            FRAME,
            FrameInput {
                back: true,
                ..FrameInput::default()
            },
        );
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn menu_buttons_start_toggle_and_exit() {
        let mut session = empty_session();
        let layout = MenuLayout::new(640.0, 640.0);

        let outcome = session.frame(FRAME, click(layout.rect(MenuAction::ToggleAudio).center()));
        assert_eq!(outcome.audio, AudioSettings::uniform(false));
        assert_eq!(session.phase(), Phase::Menu);

        let outcome = session.frame(FRAME, click(layout.rect(MenuAction::Exit).center()));
        assert!(outcome.exit_requested);

        let _ = session.frame(FRAME, click(layout.rect(MenuAction::Start).center()));
        assert_eq!(session.phase(), Phase::Playing);
    }

    #[test]
    fn clicks_outside_buttons_are_ignored() {
        let mut session = empty_session();

        let outcome = session.frame(FRAME, click(Vec2::new(5.0, 5.0)));

        assert!(!outcome.exit_requested);
        assert_eq!(outcome.audio, AudioSettings::default());
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn player_step_emits_step_cue() {
        let mut session = empty_session();
        let _ = session.frame(FRAME, confirm());

        let outcome = session.frame(
            FRAME,
            FrameInput {
                direction: Some(Direction::East),
                ..FrameInput::default()
            },
        );

        assert_eq!(outcome.cues, vec![AudioCue::Step]);
    }

    #[test]
    fn capture_is_recorded_and_click_returns_to_menu() {
        let mut session = corridor_session();

        let outcome = session.frame(FRAME, confirm());

        assert_eq!(session.phase(), Phase::Over);
        assert!(outcome.cues.contains(&AudioCue::Hit));
        assert_eq!(
            session.last_capture(),
            Some(Capture {
                pursuer: PursuerId::new(0),
                cell: CellCoord::new(1, 1),
            })
        );

        let _ = session.frame(FRAME, click(Vec2::new(5.0, 5.0)));
        assert_eq!(session.phase(), Phase::Menu);
    }

    #[test]
    fn enter_after_capture_restarts_session() {
        let mut session = corridor_session();
        let _ = session.frame(FRAME, confirm());
        assert_eq!(session.phase(), Phase::Over);
        assert!(mini_roguelike_rendering::GAME_OVER_HINT.starts_with("Enter: restart"));

        let outcome = session.frame(
            FRAME,
            FrameInput {
                confirm: true,
                pointer_pressed: true,
                ..FrameInput::default()
            },
        );

        // The restarted corridor session is caught again on its first tick.
        assert_eq!(session.phase(), Phase::Over);
        assert!(outcome.cues.contains(&AudioCue::Hit));
        assert_eq!(session.ticks(), 2);
    }

    #[test]
    fn scene_reflects_world_state() {
        let mut session = corridor_session();
        let mut scene = session.scene().expect("valid scene");
        assert_eq!(scene.phase, Phase::Menu);
        assert_eq!(scene.menu.buttons.len(), 3);
        assert!(scene.grid.is_wall(0, 0));
        assert!(!scene.grid.is_wall(1, 1));

        let _ = session.frame(FRAME, confirm());
        let _ = session.frame(FRAME, FrameInput::default());
        session.populate(&mut scene, None).expect("valid scene");

        assert_eq!(scene.phase, Phase::Over);
        assert_eq!(scene.pursuers.len(), 1);
        assert_eq!(scene.pursuers[0].sprite, SpriteKey::Stalker);
        assert_eq!(scene.player.sprite, SpriteKey::Hero);
        assert_eq!(scene.player.position, Vec2::new(24.0, 24.0));
        assert!(scene.over_elapsed > 0.0);
    }
}
