//! Grid-aligned actors with smooth pixel-space interpolation.

use glam::Vec2;
use mini_roguelike_core::{ActorSnapshot, Behavior, CellCoord, Direction};

use crate::map::GridMap;

/// Remaining distance, in pixels, below which an in-flight move snaps to its target.
const ARRIVAL_EPSILON: f32 = 0.1;

/// Pixel-space centre of the provided cell.
#[must_use]
pub fn cell_center(cell: CellCoord, tile_length: f32) -> Vec2 {
    Vec2::new(
        cell.column() as f32 * tile_length + tile_length * 0.5,
        cell.row() as f32 * tile_length + tile_length * 0.5,
    )
}

/// Movable entity with a discrete logical cell and a continuous pixel position.
///
/// The logical cell changes the instant a move is committed; the pixel
/// position then catches up over subsequent [`Actor::update`] calls. While
/// idle the pixel position equals the centre of the logical cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    cell: CellCoord,
    position: Vec2,
    target: Vec2,
    moving: bool,
    speed: f32,
    direction: Direction,
    alive: bool,
    behavior: Behavior,
    retarget_cooldown: f32,
    animation_time: f32,
    tile_length: f32,
}

impl Actor {
    /// Creates an idle actor centred on `cell`.
    ///
    /// `speed` is measured in pixels per second.
    #[must_use]
    pub fn new(cell: CellCoord, tile_length: f32, speed: f32, behavior: Behavior) -> Self {
        let position = cell_center(cell, tile_length);
        Self {
            cell,
            position,
            target: position,
            moving: false,
            speed,
            direction: Direction::South,
            alive: true,
            behavior,
            retarget_cooldown: 0.0,
            animation_time: 0.0,
            tile_length,
        }
    }

    /// Attempts to commit a single step in `direction`.
    ///
    /// Returns `false` without changing anything when the actor is already
    /// moving or the destination is blocked.
    pub fn try_move(&mut self, direction: Direction, map: &GridMap) -> bool {
        if self.moving {
            return false;
        }
        let Some(destination) = self.cell.step(direction) else {
            return false;
        };
        if map.is_blocked(destination) {
            return false;
        }

        self.cell = destination;
        self.direction = direction;
        self.target = cell_center(destination, self.tile_length);
        self.moving = true;
        true
    }

    /// Advances interpolation and timers by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        self.animation_time += dt;
        if self.behavior == Behavior::GreedyChase {
            self.retarget_cooldown -= dt;
        }

        if !self.moving {
            return;
        }

        let offset = self.target - self.position;
        let distance = offset.length();
        if distance <= ARRIVAL_EPSILON || self.speed <= 0.0 {
            self.arrive();
            return;
        }

        let step = self.speed * dt;
        if step >= distance {
            self.arrive();
        } else {
            self.position += offset / distance * step;
        }
    }

    fn arrive(&mut self) {
        self.position = self.target;
        self.moving = false;
    }

    /// Authoritative grid cell of the actor.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Current interpolated pixel position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Pixel-space destination of the in-flight move, or the resting position.
    #[must_use]
    pub const fn target(&self) -> Vec2 {
        self.target
    }

    /// Whether a committed move is still being interpolated.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.moving
    }

    /// Facing direction set by the most recent committed move.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether the actor is alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Decision policy attached to the actor.
    #[must_use]
    pub const fn behavior(&self) -> Behavior {
        self.behavior
    }

    /// Seconds until the actor may run its next decision step.
    #[must_use]
    pub const fn retarget_cooldown(&self) -> f32 {
        self.retarget_cooldown
    }

    pub(crate) fn set_retarget_cooldown(&mut self, seconds: f32) {
        self.retarget_cooldown = seconds;
    }

    pub(crate) fn kill(&mut self) {
        self.alive = false;
    }

    /// Captures a read-only snapshot of the actor.
    #[must_use]
    pub fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            cell: self.cell,
            position: self.position,
            direction: self.direction,
            moving: self.moving,
            alive: self.alive,
            behavior: self.behavior,
            animation_time: self.animation_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: f32 = 16.0;

    fn open_map() -> GridMap {
        GridMap::bordered(10, 10)
    }

    #[test]
    fn new_actor_rests_on_cell_center() {
        let actor = Actor::new(CellCoord::new(2, 2), TILE, 96.0, Behavior::Controlled);
        assert_eq!(actor.position(), Vec2::new(40.0, 40.0));
        assert_eq!(actor.target(), actor.position());
        assert!(!actor.is_moving());
        assert_eq!(actor.direction(), Direction::South);
    }

    #[test]
    fn try_move_commits_logical_position_immediately() {
        let map = open_map();
        let mut actor = Actor::new(CellCoord::new(2, 2), TILE, 96.0, Behavior::Controlled);

        assert!(actor.try_move(Direction::East, &map));

        assert_eq!(actor.cell(), CellCoord::new(3, 2));
        assert_eq!(actor.direction(), Direction::East);
        assert_eq!(actor.target(), cell_center(CellCoord::new(3, 2), TILE));
        assert_eq!(actor.position(), cell_center(CellCoord::new(2, 2), TILE));
        assert!(actor.is_moving());
    }

    #[test]
    fn try_move_into_wall_is_rejected() {
        let map = open_map();
        let mut actor = Actor::new(CellCoord::new(1, 1), TILE, 96.0, Behavior::Controlled);

        assert!(!actor.try_move(Direction::North, &map));
        assert!(!actor.try_move(Direction::West, &map));

        assert_eq!(actor.cell(), CellCoord::new(1, 1));
        assert_eq!(actor.direction(), Direction::South);
        assert!(!actor.is_moving());
    }

    #[test]
    fn try_move_while_moving_keeps_target() {
        let map = open_map();
        let mut actor = Actor::new(CellCoord::new(4, 4), TILE, 96.0, Behavior::Controlled);
        assert!(actor.try_move(Direction::South, &map));
        let target = actor.target();

        assert!(!actor.try_move(Direction::East, &map));

        assert_eq!(actor.target(), target);
        assert_eq!(actor.cell(), CellCoord::new(4, 5));
        assert_eq!(actor.direction(), Direction::South);
    }

    #[test]
    fn distance_to_target_strictly_decreases_until_arrival() {
        let map = open_map();
        let mut actor = Actor::new(CellCoord::new(4, 4), TILE, 48.0, Behavior::GreedyChase);
        assert!(actor.try_move(Direction::West, &map));

        let dt = 1.0 / 60.0;
        let mut previous = actor.position().distance(actor.target());
        let mut updates = 0;
        while actor.is_moving() {
            actor.update(dt);
            let remaining = actor.position().distance(actor.target());
            assert!(remaining < previous, "{remaining} !< {previous}");
            previous = remaining;
            updates += 1;
            assert!(updates < 1_000, "interpolation never finished");
        }

        assert_eq!(previous, 0.0);
        assert_eq!(actor.position(), cell_center(actor.cell(), TILE));

        actor.update(dt);
        assert_eq!(actor.position(), cell_center(actor.cell(), TILE));
        assert!(!actor.is_moving());
    }

    #[test]
    fn large_steps_snap_without_overshooting() {
        let map = open_map();
        let mut actor = Actor::new(CellCoord::new(4, 4), TILE, 96.0, Behavior::Controlled);
        assert!(actor.try_move(Direction::East, &map));

        actor.update(10.0);

        assert!(!actor.is_moving());
        assert_eq!(actor.position(), cell_center(CellCoord::new(5, 4), TILE));
    }

    #[test]
    fn non_positive_speed_still_arrives() {
        let map = open_map();
        let mut actor = Actor::new(CellCoord::new(4, 4), TILE, 0.0, Behavior::Controlled);
        assert!(actor.try_move(Direction::East, &map));

        actor.update(1.0 / 60.0);

        assert!(!actor.is_moving());
        assert_eq!(actor.position(), cell_center(CellCoord::new(5, 4), TILE));
    }

    #[test]
    fn only_chasing_actors_burn_cooldown() {
        let mut player = Actor::new(CellCoord::new(2, 2), TILE, 96.0, Behavior::Controlled);
        let mut pursuer = Actor::new(CellCoord::new(5, 5), TILE, 48.0, Behavior::GreedyChase);
        pursuer.set_retarget_cooldown(0.5);

        player.update(0.25);
        pursuer.update(0.25);

        assert_eq!(player.retarget_cooldown(), 0.0);
        assert!((pursuer.retarget_cooldown() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn snapshot_reports_animation_clock() {
        let mut actor = Actor::new(CellCoord::new(2, 2), TILE, 96.0, Behavior::Controlled);
        actor.update(0.5);
        actor.update(0.25);

        let snapshot = actor.snapshot();
        assert!((snapshot.animation_time - 0.75).abs() < 1e-6);
        assert_eq!(snapshot.cell, CellCoord::new(2, 2));
        assert!(snapshot.alive);
    }
}
