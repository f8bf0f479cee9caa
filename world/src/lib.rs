#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Mini Roguelike.
//!
//! The world owns the grid map, the player, the pursuer population and the
//! session phase. Adapters mutate it exclusively through [`apply`] and read
//! it through the [`query`] module.

mod actor;
mod map;

use std::time::Duration;

use mini_roguelike_core::{
    Behavior, CellCoord, Command, Direction, Event, Phase, PursuerId, PursuerKind,
};
use mini_roguelike_system_pursuit::{ready_to_decide, CooldownRange, Pursuit};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use actor::{cell_center, Actor};
pub use map::{GridMap, Tile};

const DEFAULT_TILE_LENGTH: f32 = 16.0;
const DEFAULT_SEED: u64 = 0x6d69_6e69_726f_6775;

/// Tuning constants for a game session.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Number of tile columns, border included.
    pub columns: u32,
    /// Number of tile rows, border included.
    pub rows: u32,
    /// Side length of a tile in pixels.
    pub tile_length: f32,
    /// Player interpolation speed in pixels per second.
    pub player_speed: f32,
    /// Pursuer interpolation speed in pixels per second.
    pub pursuer_speed: f32,
    /// Number of [`PursuerKind::Stalker`] pursuers spawned per session.
    pub stalkers: u32,
    /// Number of [`PursuerKind::Lurker`] pursuers spawned per session.
    pub lurkers: u32,
    /// Range the pursuer decision cooldown is drawn from.
    pub cooldown: CooldownRange,
    /// Cell the player starts every session on.
    pub player_spawn: CellCoord,
    /// Seed for map sampling and cooldown draws.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            columns: 40,
            rows: 40,
            tile_length: DEFAULT_TILE_LENGTH,
            player_speed: 6.0 * DEFAULT_TILE_LENGTH,
            pursuer_speed: 3.0 * DEFAULT_TILE_LENGTH,
            stalkers: 21,
            lurkers: 21,
            cooldown: CooldownRange::default(),
            player_spawn: CellCoord::new(2, 2),
            seed: DEFAULT_SEED,
        }
    }
}

impl Config {
    /// Checks that the configuration describes a playable session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns < 3 || self.rows < 3 {
            return Err(ConfigError::GridTooSmall {
                columns: self.columns,
                rows: self.rows,
            });
        }
        if !self.tile_length.is_finite() || self.tile_length <= 0.0 {
            return Err(ConfigError::InvalidTileLength(self.tile_length));
        }
        for (actor, speed) in [("player", self.player_speed), ("pursuer", self.pursuer_speed)] {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(ConfigError::InvalidSpeed { actor, speed });
            }
        }
        let map = GridMap::bordered(self.columns, self.rows);
        if map.is_blocked(self.player_spawn) {
            return Err(ConfigError::SpawnNotInterior {
                column: self.player_spawn.column(),
                row: self.player_spawn.row(),
            });
        }
        let pursuers = self.pursuer_count();
        if pursuers > 0 && !has_pursuer_room(&map, self.player_spawn) {
            return Err(ConfigError::NoRoomForPursuers { pursuers });
        }
        Ok(())
    }

    /// Total number of pursuers spawned per session.
    #[must_use]
    pub fn pursuer_count(&self) -> u32 {
        self.stalkers.saturating_add(self.lurkers)
    }
}

/// Pursuers may stack, so one free interior cell besides the spawn is enough.
fn has_pursuer_room(map: &GridMap, spawn: CellCoord) -> bool {
    (1..map.rows().saturating_sub(1))
        .flat_map(|row| {
            (1..map.columns().saturating_sub(1)).map(move |column| CellCoord::new(column, row))
        })
        .any(|cell| cell != spawn && !map.is_blocked(cell))
}

/// Reasons a [`Config`] cannot be used to build a world.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The grid has no interior.
    #[error("grid must be at least 3x3 (received {columns}x{rows})")]
    GridTooSmall {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Tiles must have a positive, finite side length.
    #[error("tile length must be positive and finite (received {0})")]
    InvalidTileLength(f32),
    /// Actors must move at a positive, finite speed.
    #[error("{actor} speed must be positive and finite (received {speed})")]
    InvalidSpeed {
        /// Which actor class the speed belongs to.
        actor: &'static str,
        /// Rejected speed in pixels per second.
        speed: f32,
    },
    /// The player spawn lies on the border or outside the grid.
    #[error("player spawn ({column}, {row}) is not an interior cell")]
    SpawnNotInterior {
        /// Column of the rejected spawn.
        column: u32,
        /// Row of the rejected spawn.
        row: u32,
    },
    /// Pursuers are configured but every free interior cell is the player spawn.
    #[error("no free interior cell besides the player spawn for {pursuers} pursuers")]
    NoRoomForPursuers {
        /// Configured pursuer population.
        pursuers: u32,
    },
}

#[derive(Clone, Debug)]
struct Pursuer {
    id: PursuerId,
    kind: PursuerKind,
    actor: Actor,
}

/// Represents the authoritative Mini Roguelike world state.
#[derive(Debug)]
pub struct World {
    config: Config,
    phase: Phase,
    map: GridMap,
    player: Actor,
    pursuers: Vec<Pursuer>,
    pending_move: Option<Direction>,
    over_elapsed: f32,
    rng: ChaCha8Rng,
    pursuit: Pursuit,
    tick_index: u64,
}

impl World {
    /// Creates a world using the default configuration, parked on the menu.
    #[must_use]
    pub fn new() -> Self {
        Self::build(Config::default())
    }

    /// Creates a world using the provided configuration, parked on the menu.
    pub fn with_config(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: Config) -> Self {
        let map = GridMap::bordered(config.columns, config.rows);
        let player = spawn_player(&config);
        let mut world = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            phase: Phase::Menu,
            map,
            player,
            pursuers: Vec::new(),
            pending_move: None,
            over_elapsed: 0.0,
            pursuit: Pursuit,
            tick_index: 0,
            config,
        };
        world.populate();
        world
    }

    fn populate(&mut self) {
        self.map.regenerate();
        self.player = spawn_player(&self.config);

        let spawn = self.config.player_spawn;
        let kinds = std::iter::repeat(PursuerKind::Stalker)
            .take(count_to_usize(self.config.stalkers))
            .chain(std::iter::repeat(PursuerKind::Lurker).take(count_to_usize(self.config.lurkers)));

        self.pursuers.clear();
        for kind in kinds {
            let Some(cell) = self
                .map
                .random_free_cell_where(&mut self.rng, |cell| cell != spawn)
            else {
                warn!(?kind, "no free cell left for pursuer");
                continue;
            };
            let id = PursuerId::new(self.pursuers.len() as u32);
            self.pursuers.push(Pursuer {
                id,
                kind,
                actor: Actor::new(
                    cell,
                    self.config.tile_length,
                    self.config.pursuer_speed,
                    Behavior::GreedyChase,
                ),
            });
        }
    }

    fn reset(&mut self, out_events: &mut Vec<Event>) {
        self.populate();
        self.pending_move = None;
        self.over_elapsed = 0.0;
        self.phase = Phase::Playing;
        info!(
            pursuers = self.pursuers.len(),
            seed = self.config.seed,
            "session started"
        );
        out_events.push(Event::SessionStarted {
            pursuers: self.pursuers.len() as u32,
        });
        out_events.push(Event::PhaseChanged {
            phase: Phase::Playing,
        });
    }

    fn tick_playing(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });
        let seconds = dt.as_secs_f32();

        if let Some(direction) = self.pending_move.take() {
            let from = self.player.cell();
            if self.player.try_move(direction, &self.map) {
                out_events.push(Event::PlayerStepped {
                    from,
                    to: self.player.cell(),
                });
            }
        }
        self.player.update(seconds);

        let target = self.player.cell();
        let map = &self.map;
        for pursuer in &mut self.pursuers {
            let actor = &mut pursuer.actor;
            actor.update(seconds);
            if !ready_to_decide(actor.is_moving(), actor.retarget_cooldown()) {
                continue;
            }

            let from = actor.cell();
            if let Some(direction) =
                self.pursuit
                    .propose(actor.behavior(), from, target, |cell| map.is_blocked(cell))
            {
                if actor.try_move(direction, map) {
                    out_events.push(Event::PursuerAdvanced {
                        pursuer: pursuer.id,
                        from,
                        to: actor.cell(),
                    });
                }
            }
            actor.set_retarget_cooldown(self.config.cooldown.sample(&mut self.rng));
        }

        self.resolve_capture(out_events);
    }

    fn resolve_capture(&mut self, out_events: &mut Vec<Event>) {
        let cell = self.player.cell();
        let Some(pursuer) = self
            .pursuers
            .iter()
            .find(|pursuer| pursuer.actor.cell() == cell)
        else {
            return;
        };

        let pursuer = pursuer.id;
        self.player.kill();
        self.phase = Phase::Over;
        self.over_elapsed = 0.0;
        info!(
            pursuer = pursuer.get(),
            column = cell.column(),
            row = cell.row(),
            tick = self.tick_index,
            "player caught"
        );
        out_events.push(Event::PlayerCaught { pursuer, cell });
        out_events.push(Event::PhaseChanged { phase: Phase::Over });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_player(config: &Config) -> Actor {
    Actor::new(
        config.player_spawn,
        config.tile_length,
        config.player_speed,
        Behavior::Controlled,
    )
}

fn count_to_usize(count: u32) -> usize {
    usize::try_from(count).unwrap_or(usize::MAX)
}

/// Applies the provided command to the world.
///
/// Commands that do not apply to the current phase are ignored.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::StartSession => match world.phase {
            Phase::Menu | Phase::Over => world.reset(out_events),
            Phase::Playing => debug!("start requested while already playing"),
        },
        Command::ReturnToMenu => match world.phase {
            Phase::Playing | Phase::Over => {
                world.phase = Phase::Menu;
                world.pending_move = None;
                info!("returned to menu");
                out_events.push(Event::PhaseChanged { phase: Phase::Menu });
            }
            Phase::Menu => debug!("already on the menu"),
        },
        Command::MovePlayer { direction } => {
            if world.phase == Phase::Playing {
                world.pending_move = Some(direction);
            } else {
                debug!(?direction, phase = ?world.phase, "move ignored outside play");
            }
        }
        Command::Tick { dt } => match world.phase {
            Phase::Menu => {}
            Phase::Playing => world.tick_playing(dt, out_events),
            Phase::Over => world.over_elapsed += dt.as_secs_f32(),
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use mini_roguelike_core::{ActorSnapshot, Phase, PursuerSnapshot, PursuerView};

    use super::{Config, GridMap, World};

    /// Retrieves the active phase.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Provides read-only access to the configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &Config {
        &world.config
    }

    /// Provides read-only access to the tile grid.
    #[must_use]
    pub fn grid_map(world: &World) -> &GridMap {
        &world.map
    }

    /// Captures a snapshot of the player.
    #[must_use]
    pub fn player(world: &World) -> ActorSnapshot {
        world.player.snapshot()
    }

    /// Captures a read-only view of the pursuers.
    #[must_use]
    pub fn pursuer_view(world: &World) -> PursuerView {
        let snapshots = world
            .pursuers
            .iter()
            .map(|pursuer| PursuerSnapshot {
                id: pursuer.id,
                kind: pursuer.kind,
                actor: pursuer.actor.snapshot(),
                retarget_cooldown: pursuer.actor.retarget_cooldown(),
            })
            .collect();
        PursuerView::from_snapshots(snapshots)
    }

    /// Seconds spent in [`Phase::Over`] since the last capture.
    #[must_use]
    pub fn over_elapsed(world: &World) -> f32 {
        world.over_elapsed
    }

    /// Number of simulated ticks processed while playing.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
