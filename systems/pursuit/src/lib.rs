#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Greedy pursuit policy that selects a chasing actor's next grid step.
//!
//! The policy only ever inspects the four cells adjacent to the actor. It is
//! not a path search: a pursuer facing a dead end keeps choosing the same
//! blocked approach and stalls there.

use mini_roguelike_core::{Behavior, CellCoord, Direction};
use rand::Rng;

/// Pure policy that turns an actor's behavior into step proposals.
#[derive(Clone, Copy, Debug, Default)]
pub struct Pursuit;

impl Pursuit {
    /// Proposes the next step for an actor with the provided behavior.
    ///
    /// Controlled actors never propose steps. Chasing actors propose the
    /// free neighbour closest to `target`, or `None` when boxed in.
    pub fn propose<F>(
        &self,
        behavior: Behavior,
        from: CellCoord,
        target: CellCoord,
        is_blocked: F,
    ) -> Option<Direction>
    where
        F: Fn(CellCoord) -> bool,
    {
        match behavior {
            Behavior::Controlled => None,
            Behavior::GreedyChase => greedy_step(from, target, &is_blocked),
        }
    }
}

/// Reports whether an actor is allowed to run a decision step this tick.
#[must_use]
pub fn ready_to_decide(moving: bool, retarget_cooldown: f32) -> bool {
    !moving && retarget_cooldown <= 0.0
}

/// Picks the unblocked neighbour with the smallest squared distance to `target`.
///
/// Candidates are visited in [`Direction::CHASE_ORDER`]; the first minimum
/// wins, so ties resolve right, left, down, up.
pub fn greedy_step<F>(from: CellCoord, target: CellCoord, is_blocked: &F) -> Option<Direction>
where
    F: Fn(CellCoord) -> bool,
{
    let mut best: Option<Candidate> = None;

    for direction in Direction::CHASE_ORDER {
        let Some(cell) = from.step(direction) else {
            continue;
        };
        if is_blocked(cell) {
            continue;
        }

        let candidate = Candidate {
            direction,
            distance: cell.squared_distance(target),
        };
        best = Some(match best {
            None => candidate,
            Some(existing) => {
                if candidate.is_better_than(existing) {
                    candidate
                } else {
                    existing
                }
            }
        });
    }

    best.map(|candidate| candidate.direction)
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    direction: Direction,
    distance: u64,
}

impl Candidate {
    fn is_better_than(self, other: Candidate) -> bool {
        self.distance < other.distance
    }
}

/// Inclusive range of seconds a pursuer waits between decisions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CooldownRange {
    min: f32,
    max: f32,
}

impl CooldownRange {
    /// Creates a range spanning `min..=max` seconds.
    ///
    /// Returns `None` unless both bounds are finite, `min` is not negative
    /// and `min <= max`.
    #[must_use]
    pub fn new(min: f32, max: f32) -> Option<Self> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || min > max {
            return None;
        }
        Some(Self { min, max })
    }

    /// Lower bound in seconds.
    #[must_use]
    pub const fn min(&self) -> f32 {
        self.min
    }

    /// Upper bound in seconds.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Draws a cooldown uniformly from the range.
    pub fn sample<R>(&self, rng: &mut R) -> f32
    where
        R: Rng + ?Sized,
    {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }
}

impl Default for CooldownRange {
    fn default() -> Self {
        Self { min: 0.2, max: 0.6 }
    }
}
