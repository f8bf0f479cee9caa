use std::time::Duration;

use mini_roguelike_core::{CellCoord, Command, Direction, Event, Phase, PursuerKind};
use mini_roguelike_world::{self as world, query, Config, World};

const FRAME: Duration = Duration::from_micros(16_667);

fn apply_all(world: &mut World, commands: impl IntoIterator<Item = Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        world::apply(world, command, &mut events);
    }
    events
}

fn ticks(count: usize) -> impl Iterator<Item = Command> {
    std::iter::repeat(Command::Tick { dt: FRAME }).take(count)
}

#[test]
fn reset_spawns_configured_population() {
    let config = Config {
        stalkers: 3,
        lurkers: 2,
        ..Config::default()
    };
    let mut world = World::with_config(config).expect("valid config");

    let events = apply_all(&mut world, [Command::StartSession]);

    assert_eq!(events[0], Event::SessionStarted { pursuers: 5 });
    let kinds: Vec<_> = query::pursuer_view(&world)
        .iter()
        .map(|pursuer| (pursuer.id.get(), pursuer.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (0, PursuerKind::Stalker),
            (1, PursuerKind::Stalker),
            (2, PursuerKind::Stalker),
            (3, PursuerKind::Lurker),
            (4, PursuerKind::Lurker),
        ]
    );

    let player = query::player(&world);
    assert_eq!(player.cell, CellCoord::new(2, 2));
    assert_eq!(player.direction, Direction::South);
    assert!(player.alive);
}

#[test]
fn player_walks_and_blocks_at_border() {
    let config = Config {
        stalkers: 0,
        lurkers: 0,
        ..Config::default()
    };
    let mut world = World::with_config(config).expect("valid config");
    let _ = apply_all(&mut world, [Command::StartSession]);

    let mut events = Vec::new();
    for direction in [Direction::North, Direction::North, Direction::North] {
        world::apply(&mut world, Command::MovePlayer { direction }, &mut events);
        for command in ticks(20) {
            world::apply(&mut world, command, &mut events);
        }
    }

    // Only the first step north is legal; row zero is wall.
    let steps: Vec<_> = events
        .iter()
        .filter(|event| matches!(event, Event::PlayerStepped { .. }))
        .collect();
    assert_eq!(steps.len(), 1);
    let player = query::player(&world);
    assert_eq!(player.cell, CellCoord::new(2, 1));
    assert!(!player.moving);
    assert_eq!(player.position.y, 24.0);
}

#[test]
fn capture_ends_the_session_and_freezes_state() {
    let config = Config {
        columns: 4,
        rows: 3,
        stalkers: 1,
        lurkers: 0,
        player_spawn: CellCoord::new(1, 1),
        ..Config::default()
    };
    let mut world = World::with_config(config).expect("valid config");
    let _ = apply_all(&mut world, [Command::StartSession]);

    let events = apply_all(&mut world, ticks(1));
    assert!(events.contains(&Event::PhaseChanged { phase: Phase::Over }));
    assert_eq!(query::phase(&world), Phase::Over);

    let frozen = query::pursuer_view(&world).into_vec();
    let events = apply_all(&mut world, ticks(60));
    assert!(events.is_empty());
    assert_eq!(query::pursuer_view(&world).into_vec(), frozen);
    assert!(query::over_elapsed(&world) > 0.9);

    let events = apply_all(&mut world, [Command::ReturnToMenu]);
    assert_eq!(events, vec![Event::PhaseChanged { phase: Phase::Menu }]);
    assert_eq!(query::phase(&world), Phase::Menu);
}

#[test]
fn commands_outside_their_phase_are_ignored() {
    let mut world = World::new();

    let events = apply_all(
        &mut world,
        [
            Command::ReturnToMenu,
            Command::MovePlayer {
                direction: Direction::East,
            },
            Command::Tick { dt: FRAME },
        ],
    );
    assert!(events.is_empty());
    assert_eq!(query::phase(&world), Phase::Menu);

    let _ = apply_all(&mut world, [Command::StartSession]);
    let events = apply_all(&mut world, [Command::StartSession]);
    assert!(events.is_empty());
    assert_eq!(query::phase(&world), Phase::Playing);
}

#[test]
fn pursuers_close_in_on_a_stationary_player() {
    let config = Config {
        stalkers: 1,
        lurkers: 0,
        ..Config::default()
    };
    let mut world = World::with_config(config).expect("valid config");
    let _ = apply_all(&mut world, [Command::StartSession]);
    let target = query::player(&world).cell;
    let start = query::pursuer_view(&world)
        .iter()
        .map(|pursuer| {
            let cell = pursuer.actor.cell;
            cell.column().abs_diff(target.column()) + cell.row().abs_diff(target.row())
        })
        .next()
        .expect("one pursuer");

    let mut frames = 0;
    while query::phase(&world) == Phase::Playing {
        let _ = apply_all(&mut world, ticks(1));
        frames += 1;
        assert!(frames < 60 * 120, "pursuer failed to reach the player");
    }

    // Every step after the first waits for a full third-of-a-second glide.
    assert!(frames as u32 >= start.saturating_sub(1) * 15);
    let caught_at = query::pursuer_view(&world)
        .iter()
        .map(|pursuer| pursuer.actor.cell)
        .next()
        .expect("one pursuer");
    assert_eq!(caught_at, target);
}
