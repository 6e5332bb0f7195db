use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glyphconfig::Configuration;
use renderer::{
    run_window, time_source_for, BoxedGlyph, ClockMode, FrameOutcome, GlyphView,
    HeadlessBackend, HostConfig, OutputSize, Renderer, WindowOptions,
};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::settings;

/// Simulated frame length for headless runs.
const HEADLESS_FRAME: Duration = Duration::from_nanos(16_666_667);

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Settings file in effect: `--config` when given, otherwise the one in the
/// config directory.
pub fn config_path(args: &RunArgs, paths: &AppPaths) -> PathBuf {
    args.config.clone().unwrap_or_else(|| paths.config_file())
}

/// File settings with command-line overrides applied.
pub fn effective_configuration(args: &RunArgs, paths: &AppPaths) -> Result<Configuration> {
    let path = config_path(args, paths);
    let mut config = settings::load_configuration(&path)?;
    settings::apply_overrides(&mut config, args)?;
    Ok(config)
}

pub fn run(args: RunArgs) -> Result<()> {
    let paths = AppPaths::discover()?;
    let config = effective_configuration(&args, &paths)?;
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        scheme = %config.scheme,
        glyph = %config.glyph,
        size = %config.size,
        movement = %config.movement,
        sprites = config.sprites,
        seed = ?config.seed,
        "resolved settings"
    );

    let window = window_options(&args);
    let glyphs = settings::glyphs(&config);
    if let Some(dir) = args.dump_glyphs.as_ref() {
        let (width, height) = window.size;
        let pixels = glyph_pixels(OutputSize::new(width, height), config.size.fraction());
        dump_glyphs(&glyphs, dir, pixels)?;
    }

    match args.headless {
        Some(frames) => {
            let size = OutputSize::new(window.size.0, window.size.1);
            run_headless(&config, args.preview, glyphs, size, frames)
        }
        None => {
            let host = HostConfig {
                window,
                renderer: settings::renderer_settings(&config),
                gpu: settings::gpu_options(&config),
                view: settings::view_settings(&config, args.preview),
            };
            tracing::info!(
                sprites = config.sprites,
                movement = %config.movement,
                preview = args.preview,
                "opening dancing glyphs window"
            );
            run_window(host, glyphs)
        }
    }
}

fn window_options(args: &RunArgs) -> WindowOptions {
    let defaults = WindowOptions::default();
    WindowOptions {
        size: args.window_size.unwrap_or(defaults.size),
        fullscreen: args.fullscreen,
        ..defaults
    }
}

fn glyph_pixels(size: OutputSize, fraction: f32) -> u32 {
    ((size.shorter_side() as f32 * fraction).floor() as u32).max(1)
}

fn dump_glyphs(glyphs: &[BoxedGlyph], dir: &Path, pixels: u32) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create glyph dump directory {}", dir.display()))?;
    for (index, glyph) in glyphs.iter().enumerate() {
        let path = dir.join(format!("{index:02}-{}.png", glyph.name()));
        glyph.make_bitmap(pixels).save_png(&path)?;
        tracing::info!(path = %path.display(), pixels, "wrote glyph bitmap");
    }
    Ok(())
}

/// Renders `frames` frames against the in-memory backend with a fixed time
/// step and prints a summary.
fn run_headless(
    config: &Configuration,
    preview: bool,
    glyphs: Vec<BoxedGlyph>,
    size: OutputSize,
    frames: u64,
) -> Result<()> {
    let renderer = Renderer::new(HeadlessBackend::new(), settings::renderer_settings(config));
    let clock = time_source_for(ClockMode::Stepped {
        step: HEADLESS_FRAME,
    });
    let mut view = GlyphView::new(
        renderer,
        glyphs,
        settings::view_settings(config, preview),
        clock,
    )?;
    view.resize(size)?;
    view.start()?;

    let started = Instant::now();
    let mut presented = 0u64;
    for _ in 0..frames {
        if view.render_one_frame()? == FrameOutcome::Presented {
            presented += 1;
        }
    }
    view.stop();

    let backend = view.renderer().backend();
    tracing::info!(
        frames,
        presented,
        sprites = view.sprites().len(),
        live_textures = backend.live_textures(),
        textures_created = backend.textures_created(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "headless run finished"
    );
    println!(
        "rendered {presented} of {frames} frames with {} sprites at {}x{}",
        view.sprites().len(),
        size.width,
        size.height
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_config_flag_wins() {
        let paths = AppPaths::from_raw(PathBuf::from("/etc/glyphs"));
        let args = RunArgs {
            config: Some(PathBuf::from("/tmp/other.toml")),
            ..RunArgs::default()
        };
        assert_eq!(config_path(&args, &paths), PathBuf::from("/tmp/other.toml"));
        assert_eq!(
            config_path(&RunArgs::default(), &paths),
            PathBuf::from("/etc/glyphs/config.toml")
        );
    }

    #[test]
    fn glyph_pixels_never_reach_zero() {
        assert_eq!(glyph_pixels(OutputSize::new(1280, 720), 0.08), 57);
        assert_eq!(glyph_pixels(OutputSize::new(3, 3), 0.05), 1);
    }

    #[test]
    fn window_flag_sets_the_size() {
        let args = RunArgs {
            window_size: Some((640, 480)),
            fullscreen: true,
            ..RunArgs::default()
        };
        let window = window_options(&args);
        assert_eq!(window.size, (640, 480));
        assert!(window.fullscreen);
        assert_eq!(window.title, WindowOptions::default().title);
    }

    #[test]
    fn headless_run_completes() {
        let config = Configuration {
            sprites: 12,
            seed: Some(1),
            ..Configuration::default()
        };
        let glyphs = settings::glyphs(&config);
        run_headless(&config, false, glyphs, OutputSize::new(320, 240), 5).unwrap();
    }

    #[test]
    fn dumps_one_png_per_glyph() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Configuration::default();
        dump_glyphs(&settings::glyphs(&config), dir.path(), 16).unwrap();
        assert!(dir.path().join("00-disc.png").exists());
        assert!(dir.path().join("01-ring.png").exists());
    }
}
