//! Sound playback through macroquad's audio module.

use std::path::Path;

use anyhow::{Context, Result};
use macroquad::audio::{load_sound, play_sound, play_sound_once, stop_sound, PlaySoundParams, Sound};
use mini_roguelike_core::AudioCue;
use mini_roguelike_rendering::{AudioSettings, AudioSink};
use tracing::warn;

const THEME_VOLUME: f32 = 0.6;

/// Audio sink backed by sounds loaded from the asset directory.
///
/// Sounds that fail to load are skipped; their cues become no-ops.
#[derive(Debug)]
pub(crate) struct MacroquadAudio {
    step: Option<Sound>,
    hit: Option<Sound>,
    theme: Option<Sound>,
    theme_playing: bool,
}

impl MacroquadAudio {
    pub(crate) async fn load(asset_root: &Path) -> Self {
        Self {
            step: load_optional(asset_root, "sounds/step.wav").await,
            hit: load_optional(asset_root, "sounds/hit.wav").await,
            theme: load_optional(asset_root, "music/theme.wav").await,
            theme_playing: false,
        }
    }

    fn start_theme(&mut self) {
        if self.theme_playing {
            return;
        }
        if let Some(theme) = self.theme {
            play_sound(
                theme,
                PlaySoundParams {
                    looped: true,
                    volume: THEME_VOLUME,
                },
            );
            self.theme_playing = true;
        }
    }

    fn stop_theme(&mut self) {
        if let Some(theme) = self.theme {
            stop_sound(theme);
        }
        self.theme_playing = false;
    }
}

async fn load_optional(asset_root: &Path, relative: &str) -> Option<Sound> {
    let path = asset_root.join(relative);
    let loaded = match path.to_str() {
        Some(path) => load_sound(path)
            .await
            .with_context(|| format!("failed to load sound {path}")),
        None => Err(anyhow::anyhow!("sound path {} is not UTF-8", path.display())),
    };
    match loaded {
        Ok(sound) => Some(sound),
        Err(error) => {
            warn!("{error:#}");
            None
        }
    }
}

impl AudioSink for MacroquadAudio {
    fn play(&mut self, cue: AudioCue) -> Result<()> {
        match cue {
            AudioCue::Step => {
                if let Some(step) = self.step {
                    play_sound_once(step);
                }
            }
            AudioCue::Hit => {
                if let Some(hit) = self.hit {
                    play_sound_once(hit);
                }
            }
            AudioCue::Theme => self.start_theme(),
        }
        Ok(())
    }

    fn apply_settings(&mut self, settings: AudioSettings) -> Result<()> {
        if settings.music {
            self.start_theme();
        } else {
            self.stop_theme();
        }
        Ok(())
    }
}
