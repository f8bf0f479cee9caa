#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns world events into sound cue requests.

use mini_roguelike_core::{AudioCue, Event};

/// Translates player-facing events into [`AudioCue`] values.
///
/// Pursuer movement is silent; only the player's own steps and the capture
/// are audible.
#[derive(Clone, Copy, Debug, Default)]
pub struct AudioCues;

impl AudioCues {
    /// Consumes events and appends the cues they trigger, in event order.
    pub fn handle(&self, events: &[Event], out: &mut Vec<AudioCue>) {
        out.extend(events.iter().filter_map(cue_for));
    }
}

fn cue_for(event: &Event) -> Option<AudioCue> {
    match event {
        Event::PlayerStepped { .. } => Some(AudioCue::Step),
        Event::PlayerCaught { .. } => Some(AudioCue::Hit),
        Event::SessionStarted { .. }
        | Event::PhaseChanged { .. }
        | Event::TimeAdvanced { .. }
        | Event::PursuerAdvanced { .. } => None,
    }
}
