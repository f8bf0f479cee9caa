#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Mini Roguelike engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams and immutable snapshots, never the
//! world's mutable state.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Title shown by the window and the main menu.
pub const GAME_TITLE: &str = "Mini Roguelike";

/// Top-level state of a game session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Main menu; the simulation does not advance.
    #[default]
    Menu,
    /// Active session where the player is being chased.
    Playing,
    /// The player was caught; only the display timer advances.
    Over,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Regenerates the map and population and enters [`Phase::Playing`].
    ///
    /// Accepted from [`Phase::Menu`] and [`Phase::Over`].
    StartSession,
    /// Leaves the current session and shows the menu.
    ///
    /// Accepted from [`Phase::Playing`] and [`Phase::Over`].
    ReturnToMenu,
    /// Buffers a player step that is attempted at the start of the next tick.
    ///
    /// Only the last buffered direction before a tick is used.
    MovePlayer {
        /// Direction the player wants to step in.
        direction: Direction,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the map and population were regenerated.
    SessionStarted {
        /// Number of pursuers placed in the new session.
        pursuers: u32,
    },
    /// Announces that the world entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Indicates that the simulation clock advanced during play.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that the player committed a step.
    PlayerStepped {
        /// Cell the player occupied before the step.
        from: CellCoord,
        /// Cell the player occupies after the step.
        to: CellCoord,
    },
    /// Confirms that a pursuer committed a step toward the player.
    PursuerAdvanced {
        /// Identifier of the pursuer that moved.
        pursuer: PursuerId,
        /// Cell the pursuer occupied before the step.
        from: CellCoord,
        /// Cell the pursuer occupies after the step.
        to: CellCoord,
    },
    /// Reports that a pursuer shares the player's cell.
    PlayerCaught {
        /// Identifier of the first pursuer found on the player's cell.
        pursuer: PursuerId,
        /// Cell where the capture happened.
        cell: CellCoord,
    },
}

/// Cardinal movement directions available to actors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing column indices.
    East,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
}

impl Direction {
    /// Order in which chasing actors evaluate candidate steps: right, left, down, up.
    pub const CHASE_ORDER: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::South,
        Direction::North,
    ];

    /// Unit offset of the direction expressed as `(columns, rows)`.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
            Self::West => (-1, 0),
        }
    }

    /// Unit vector of the direction in pixel space, where y grows downward.
    #[must_use]
    pub fn unit_vector(self) -> Vec2 {
        let (column, row) = self.offset();
        Vec2::new(column as f32, row as f32)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the neighbouring cell in the provided direction.
    ///
    /// `None` means the step would leave the non-negative coordinate space,
    /// which callers treat as blocked.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<CellCoord> {
        let (column_offset, row_offset) = direction.offset();
        let column = self.column.checked_add_signed(column_offset)?;
        let row = self.row.checked_add_signed(row_offset)?;
        Some(CellCoord::new(column, row))
    }

    /// Computes the squared Euclidean distance between two cell coordinates.
    #[must_use]
    pub fn squared_distance(self, other: CellCoord) -> u64 {
        let columns = u64::from(self.column.abs_diff(other.column));
        let rows = u64::from(self.row.abs_diff(other.row));
        columns * columns + rows * rows
    }
}

/// Unique identifier assigned to a pursuer within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PursuerId(u32);

impl PursuerId {
    /// Creates a new pursuer identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Cosmetic profile of a pursuer. Both kinds chase the same way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PursuerKind {
    /// Red pursuer with a yellow accent.
    Stalker,
    /// Violet pursuer with a pale yellow accent.
    Lurker,
}

/// Decision policy attached to an actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Behavior {
    /// Moves only when an external input requests it.
    Controlled,
    /// Steps greedily toward the player whenever idle and off cooldown.
    GreedyChase,
}

/// Sound cues requested from the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// The player committed a step.
    Step,
    /// The player was caught.
    Hit,
    /// Background theme, requested once at start-up.
    Theme,
}

/// Immutable representation of an actor used for queries and rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActorSnapshot {
    /// Authoritative grid cell of the actor.
    pub cell: CellCoord,
    /// Interpolated pixel-space centre of the actor.
    pub position: Vec2,
    /// Facing direction, updated on every committed step.
    pub direction: Direction,
    /// Whether the actor is interpolating toward its cell centre.
    pub moving: bool,
    /// Whether the actor is alive.
    pub alive: bool,
    /// Decision policy attached to the actor.
    pub behavior: Behavior,
    /// Seconds accumulated by the actor's animation clock.
    pub animation_time: f32,
}

impl ActorSnapshot {
    /// Sinusoidal animation phase in `-1.0..=1.0` advancing at `rate` radians per second.
    #[must_use]
    pub fn stride_phase(&self, rate: f32) -> f32 {
        (self.animation_time * rate).sin()
    }
}

/// Immutable representation of a single pursuer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PursuerSnapshot {
    /// Identifier assigned to the pursuer.
    pub id: PursuerId,
    /// Cosmetic profile of the pursuer.
    pub kind: PursuerKind,
    /// Movement state shared with every actor.
    pub actor: ActorSnapshot,
    /// Seconds remaining until the pursuer may decide again.
    pub retarget_cooldown: f32,
}

/// Read-only snapshot describing all pursuers in the session.
#[derive(Clone, Debug, Default)]
pub struct PursuerView {
    snapshots: Vec<PursuerSnapshot>,
}

impl PursuerView {
    /// Creates a new pursuer view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<PursuerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &PursuerSnapshot> {
        self.snapshots.iter()
    }

    /// Number of pursuers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no pursuers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<PursuerSnapshot> {
        self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, Direction};

    #[test]
    fn squared_distance_matches_expectation() {
        let player = CellCoord::new(5, 5);
        assert_eq!(CellCoord::new(4, 5).squared_distance(player), 1);
        assert_eq!(CellCoord::new(3, 4).squared_distance(player), 5);
        assert_eq!(player.squared_distance(CellCoord::new(3, 4)), 5);
    }

    #[test]
    fn step_follows_direction_offsets() {
        let origin = CellCoord::new(3, 3);
        assert_eq!(origin.step(Direction::North), Some(CellCoord::new(3, 2)));
        assert_eq!(origin.step(Direction::East), Some(CellCoord::new(4, 3)));
        assert_eq!(origin.step(Direction::South), Some(CellCoord::new(3, 4)));
        assert_eq!(origin.step(Direction::West), Some(CellCoord::new(2, 3)));
    }

    #[test]
    fn step_below_zero_is_rejected() {
        let corner = CellCoord::new(0, 0);
        assert_eq!(corner.step(Direction::West), None);
        assert_eq!(corner.step(Direction::North), None);
        assert_eq!(corner.step(Direction::East), Some(CellCoord::new(1, 0)));
    }

    #[test]
    fn chase_order_is_right_left_down_up() {
        let offsets: Vec<_> = Direction::CHASE_ORDER
            .iter()
            .map(|direction| direction.offset())
            .collect();
        assert_eq!(offsets, vec![(1, 0), (-1, 0), (0, 1), (0, -1)]);
    }

    #[test]
    fn cell_coord_round_trips_through_bincode() {
        let cell = CellCoord::new(17, 4);
        let bytes = bincode::serialize(&cell).expect("serialize");
        let restored: CellCoord = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, cell);
    }
}
