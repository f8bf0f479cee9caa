#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots Mini Roguelike.

mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use mini_roguelike_core::GAME_TITLE;
use mini_roguelike_rendering::{
    palette, AudioSettings, AudioSink, FrameInput, FrameOutcome, Presentation, RenderingBackend,
    SilentAudio,
};
use mini_roguelike_rendering_macroquad::MacroquadBackend;
use mini_roguelike_world::Config;
use tracing::{error, info, warn};

use self::session::Session;

const HEADLESS_FRAME: Duration = Duration::from_micros(16_667);

#[derive(Parser, Debug)]
#[command(name = "mini-roguelike")]
#[command(about = "Dodge the pursuers on a walled grid for as long as you can", long_about = None)]
struct CliArgs {
    /// Seed for map generation, pursuer placement and cooldowns
    #[arg(long)]
    seed: Option<u64>,

    /// Synchronise presentation with the display refresh rate
    #[arg(long)]
    vsync: bool,

    /// Log frame timing once per second
    #[arg(long)]
    show_fps: bool,

    /// Skip the sprite manifest and draw fallback shapes only
    #[arg(long)]
    no_sprites: bool,

    /// Directory holding manifest.toml, sprites and sounds
    #[arg(long, value_name = "DIR", default_value = "assets")]
    assets: PathBuf,

    /// Start with music and sound effects disabled
    #[arg(long)]
    mute: bool,

    /// Run N frames without opening a window and report the outcome
    #[arg(long, value_name = "N")]
    headless_frames: Option<u32>,
}

impl CliArgs {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

/// Entry point for the Mini Roguelike command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let mut session = Session::new(args.config(), AudioSettings::uniform(!args.mute))
        .context("invalid game configuration")?;

    match args.headless_frames {
        Some(frames) => {
            run_headless(&mut session, frames, &mut SilentAudio);
            Ok(())
        }
        None => run_windowed(session, &args),
    }
}

fn run_headless(session: &mut Session, frames: u32, audio: &mut dyn AudioSink) {
    info!(frames, "running headless session");
    let mut audio_settings: Option<AudioSettings> = None;
    for frame in 0..frames {
        let input = FrameInput {
            confirm: frame == 0,
            ..FrameInput::default()
        };
        let outcome = session.frame(HEADLESS_FRAME, input);
        if audio_settings != Some(outcome.audio) {
            audio_settings = Some(outcome.audio);
            if let Err(err) = audio.apply_settings(outcome.audio) {
                warn!("failed to apply audio settings: {err:#}");
            }
        }
        for cue in outcome.cues {
            if let Err(err) = audio.play(cue) {
                warn!(?cue, "failed to play audio cue: {err:#}");
            }
        }
    }

    match session.last_capture() {
        Some(capture) => info!(
            phase = ?session.phase(),
            ticks = session.ticks(),
            pursuer = capture.pursuer.get(),
            column = capture.cell.column(),
            row = capture.cell.row(),
            "headless session finished with a capture"
        ),
        None => info!(
            phase = ?session.phase(),
            ticks = session.ticks(),
            "headless session finished without a capture"
        ),
    }
}

fn run_windowed(mut session: Session, args: &CliArgs) -> Result<()> {
    let scene = session
        .scene()
        .context("failed to build the initial scene")?;
    let presentation = Presentation::new(GAME_TITLE, palette::BLACK, scene);

    MacroquadBackend::new()
        .with_vsync(args.vsync)
        .with_show_fps(args.show_fps)
        .with_sprite_loading(!args.no_sprites)
        .with_asset_root(args.assets.clone())
        .run(presentation, move |dt, input, scene| {
            let mut outcome = session.frame(dt, input);
            if let Err(err) = session.populate(scene, input.cursor) {
                error!(%err, "failed to refresh scene");
                outcome = FrameOutcome {
                    exit_requested: true,
                    ..outcome
                };
            }
            outcome
        })
        .context("rendering backend failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mini_roguelike_core::{AudioCue, CellCoord, Phase};

    #[derive(Debug, Default)]
    struct RecordingAudio {
        cues: Vec<AudioCue>,
        settings: Vec<AudioSettings>,
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self, cue: AudioCue) -> Result<()> {
            self.cues.push(cue);
            Ok(())
        }

        fn apply_settings(&mut self, settings: AudioSettings) -> Result<()> {
            self.settings.push(settings);
            Ok(())
        }
    }

    fn corridor_session(audio: AudioSettings) -> Session {
        let config = Config {
            columns: 4,
            rows: 3,
            stalkers: 1,
            lurkers: 0,
            player_spawn: CellCoord::new(1, 1),
            ..Config::default()
        };
        Session::new(config, audio).expect("valid config")
    }

    #[test]
    fn headless_run_forwards_cues_to_the_sink() {
        let mut session = corridor_session(AudioSettings::default());
        let mut audio = RecordingAudio::default();

        run_headless(&mut session, 3, &mut audio);

        assert_eq!(session.phase(), Phase::Over);
        assert_eq!(audio.cues, vec![AudioCue::Theme, AudioCue::Hit]);
        assert_eq!(audio.settings, vec![AudioSettings::default()]);
    }

    #[test]
    fn muted_headless_run_plays_nothing() {
        let mut session = corridor_session(AudioSettings::uniform(false));
        let mut audio = RecordingAudio::default();

        run_headless(&mut session, 3, &mut audio);

        assert!(audio.cues.is_empty());
        assert_eq!(audio.settings, vec![AudioSettings::uniform(false)]);
    }
}
