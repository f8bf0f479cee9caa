use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use macroquad::{
    math::Vec2 as MacroquadVec2,
    texture::{self, DrawTextureParams, Texture2D},
};
use mini_roguelike_rendering::{Color, SpriteKey, SpriteResolution};
use tracing::{debug, info, warn};

use crate::to_macroquad_color;

const SUPPORTED_MANIFEST_VERSION: u32 = 1;
const MANIFEST_FILE_NAME: &str = "manifest.toml";

/// Parameters describing how a sprite should be drawn on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawParams {
    /// Position in screen-space pixels where the sprite's top-left corner is placed.
    pub(crate) position: Vec2,
    /// Desired size in screen-space pixels.
    pub(crate) size: Vec2,
    /// Tint applied to the sprite.
    pub(crate) tint: Color,
}

impl DrawParams {
    /// Creates draw parameters covering the provided screen rectangle.
    #[must_use]
    pub(crate) fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            tint: Color::new(1.0, 1.0, 1.0, 1.0),
        }
    }
}

/// Textures resolved once at start-up, one resolution per sprite key.
#[derive(Debug)]
pub(crate) struct SpriteAtlas {
    resolutions: HashMap<SpriteKey, SpriteResolution<Texture2D>>,
}

impl SpriteAtlas {
    /// Atlas in which every key uses its fallback shape.
    #[must_use]
    pub(crate) fn fallback_only() -> Self {
        Self {
            resolutions: SpriteKey::ALL
                .into_iter()
                .map(|key| (key, SpriteResolution::UseFallbackShape))
                .collect(),
        }
    }

    /// Loads the manifest stored in `asset_root`, falling back per key on any failure.
    pub(crate) fn load(asset_root: &Path) -> Self {
        let manifest_path = asset_root.join(MANIFEST_FILE_NAME);
        match Self::from_manifest_with_loader(&manifest_path, default_loader) {
            Ok(atlas) => atlas,
            Err(error) => {
                warn!(
                    path = %manifest_path.display(),
                    "sprite manifest unavailable, drawing fallback shapes: {error:#}"
                );
                Self::fallback_only()
            }
        }
    }

    /// Resolution recorded for the provided key.
    #[must_use]
    pub(crate) fn resolve(&self, key: SpriteKey) -> SpriteResolution<&Texture2D> {
        self.resolutions
            .get(&key)
            .map_or(SpriteResolution::UseFallbackShape, SpriteResolution::as_ref)
    }

    /// Number of keys that resolved to a texture.
    #[must_use]
    pub(crate) fn texture_count(&self) -> usize {
        self.resolutions
            .values()
            .filter(|resolution| resolution.has_sprite())
            .count()
    }

    fn from_manifest_with_loader(
        manifest_path: &Path,
        mut loader: impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Result<Self> {
        let contents = fs::read_to_string(manifest_path).with_context(|| {
            format!(
                "failed to read sprite manifest at {}",
                manifest_path.display()
            )
        })?;
        let base = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let entries = parse_manifest(&contents, &base)?;
        Ok(Self::from_entries(entries, &mut loader))
    }

    fn from_entries(
        mut entries: HashMap<SpriteKey, PathBuf>,
        loader: &mut impl FnMut(SpriteKey, &Path) -> Result<Texture2D>,
    ) -> Self {
        let mut resolutions = HashMap::with_capacity(SpriteKey::ALL.len());
        for key in SpriteKey::ALL {
            let resolution = match entries.remove(&key) {
                None => {
                    debug!(?key, "no manifest entry, using fallback shape");
                    SpriteResolution::UseFallbackShape
                }
                Some(path) => match loader(key, &path) {
                    Ok(texture) => SpriteResolution::HasSprite(texture),
                    Err(error) => {
                        warn!(?key, path = %path.display(), "using fallback shape: {error:#}");
                        SpriteResolution::UseFallbackShape
                    }
                },
            };
            let _ = resolutions.insert(key, resolution);
        }

        let atlas = Self { resolutions };
        info!(
            textures = atlas.texture_count(),
            keys = SpriteKey::ALL.len(),
            "sprites resolved"
        );
        atlas
    }
}

/// Draws the texture using the supplied parameters.
pub(crate) fn draw(texture: &Texture2D, params: DrawParams) {
    let draw_params = DrawTextureParams {
        dest_size: Some(MacroquadVec2::new(params.size.x, params.size.y)),
        ..DrawTextureParams::default()
    };

    texture::draw_texture_ex(
        *texture,
        params.position.x,
        params.position.y,
        to_macroquad_color(params.tint),
        draw_params,
    );
}

fn default_loader(_key: SpriteKey, path: &Path) -> Result<Texture2D> {
    let image = decode_sprite(path)?;
    Ok(Texture2D::from_rgba8(image.width, image.height, &image.rgba))
}

/// Decoded RGBA pixels ready for upload.
#[derive(Debug)]
struct SpriteImage {
    width: u16,
    height: u16,
    rgba: Vec<u8>,
}

/// Reads and decodes an image file without touching the GPU.
fn decode_sprite(path: &Path) -> Result<SpriteImage> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read sprite asset at {}", path.display()))?;
    let decoded = image::load_from_memory(&bytes)
        .with_context(|| format!("failed to decode sprite asset at {}", path.display()))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let width = u16::try_from(width)
        .with_context(|| format!("sprite {} is wider than {} pixels", path.display(), u16::MAX))?;
    let height = u16::try_from(height)
        .with_context(|| format!("sprite {} is taller than {} pixels", path.display(), u16::MAX))?;

    Ok(SpriteImage {
        width,
        height,
        rgba: decoded.into_raw(),
    })
}

#[derive(Debug, serde::Deserialize)]
struct Manifest {
    version: u32,
    #[serde(default)]
    sprites: HashMap<String, String>,
}

fn parse_manifest(contents: &str, base_path: &Path) -> Result<HashMap<SpriteKey, PathBuf>> {
    let manifest: Manifest =
        toml::from_str(contents).context("failed to parse sprite manifest toml contents")?;
    if manifest.version != SUPPORTED_MANIFEST_VERSION {
        bail!(
            "unsupported sprite manifest version {}; expected {}",
            manifest.version,
            SUPPORTED_MANIFEST_VERSION
        );
    }

    let mut resolved = HashMap::new();
    for (name, relative_path) in manifest.sprites {
        let Some(key) = SpriteKey::from_manifest_name(&name) else {
            warn!(name = %name, "ignoring unknown sprite key in manifest");
            continue;
        };
        let _ = resolved.insert(key, base_path.join(relative_path));
    }

    Ok(resolved)
}
