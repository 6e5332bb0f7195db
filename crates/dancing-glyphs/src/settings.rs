//! Loading, overriding and persisting [`Configuration`], and mapping it onto
//! renderer and motion types.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glyphconfig::{Configuration, GlyphSet, Movement, PowerPreference, Scheme};
use motion::Wave;
use renderer::{
    glyph_set, BoxedGlyph, GpuOptions, GpuPowerPreference, Palette, RendererSettings, Shape,
    ViewSettings,
};

use crate::cli::RunArgs;

pub fn load_configuration(path: &Path) -> Result<Configuration> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no configuration file; using defaults");
        return Ok(Configuration::default());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    Configuration::from_toml_str(&contents)
        .with_context(|| format!("failed to parse configuration at {}", path.display()))
}

pub fn save_configuration(config: &Configuration, path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("configuration path has no parent: {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "failed to prepare directory for configuration at {}",
            dir.display()
        )
    })?;
    let serialized = config
        .to_toml_string()
        .context("failed to serialize configuration to TOML")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write configuration to {}", path.display()))?;
    Ok(())
}

/// Applies command-line flags on top of the file settings and re-validates.
pub fn apply_overrides(config: &mut Configuration, args: &RunArgs) -> Result<()> {
    if let Some(scheme) = args.scheme {
        config.scheme = scheme;
    }
    if let Some(glyph) = args.glyph {
        config.glyph = glyph;
    }
    if let Some(size) = args.size {
        config.size = size;
    }
    if let Some(movement) = args.movement {
        config.movement = movement;
    }
    if let Some(sprites) = args.sprites {
        config.sprites = sprites;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(power) = args.power {
        config.gpu.power = power;
    }
    if args.wait_for_gpu {
        config.diagnostics.wait_for_gpu = true;
    }
    config
        .validate()
        .context("invalid settings after applying command-line flags")?;
    Ok(())
}

pub fn palette(scheme: Scheme) -> Palette {
    match scheme {
        Scheme::Dark => Palette::dark(),
        Scheme::Light => Palette::light(),
        Scheme::Mono => Palette::mono(),
    }
}

pub fn shapes(set: GlyphSet) -> &'static [Shape] {
    match set {
        GlyphSet::Circles => &Shape::ROUND,
        GlyphSet::Polygons => &Shape::ANGULAR,
        GlyphSet::All => &Shape::ALL,
    }
}

pub fn glyphs(config: &Configuration) -> Vec<BoxedGlyph> {
    glyph_set(shapes(config.glyph), &palette(config.scheme))
}

pub fn wave(movement: Movement) -> Wave {
    match movement {
        Movement::Circular => Wave::Circular(Default::default()),
        Movement::Line => Wave::Line(Default::default()),
    }
}

pub fn view_settings(config: &Configuration, preview: bool) -> ViewSettings {
    ViewSettings {
        sprite_count: config.sprites,
        glyph_size: config.size.fraction(),
        wave: wave(config.movement),
        time_scale: config.time_scale(preview),
        seed: config.seed,
        stats_interval: config.diagnostics.stats_interval,
    }
}

pub fn renderer_settings(config: &Configuration) -> RendererSettings {
    RendererSettings {
        ring_size: config.ring_size,
        background: palette(config.scheme).background,
    }
}

pub fn gpu_options(config: &Configuration) -> GpuOptions {
    GpuOptions {
        power: match config.gpu.power {
            PowerPreference::Low => GpuPowerPreference::Low,
            PowerPreference::High => GpuPowerPreference::High,
        },
        wait_for_gpu: config.diagnostics.wait_for_gpu,
    }
}
