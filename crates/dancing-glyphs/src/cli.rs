use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use glyphconfig::{ConfigError, GlyphSet, GlyphSize, Movement, PowerPreference, Scheme};

#[derive(Parser, Debug)]
#[command(
    name = "dancing-glyphs",
    author,
    version,
    about = "Glyph sprites dancing along a wave",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Configuration file to read instead of the one in the config directory.
    #[arg(long, value_name = "FILE", env = "DANCING_GLYPHS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Colour scheme: `dark`, `light` or `mono`.
    #[arg(long, value_name = "SCHEME", value_parser = parse_setting::<Scheme>)]
    pub scheme: Option<Scheme>,

    /// Glyph set: `circles`, `polygons` or `all`.
    #[arg(long, value_name = "SET", value_parser = parse_setting::<GlyphSet>)]
    pub glyph: Option<GlyphSet>,

    /// Glyph size: `small`, `medium` or `large`.
    #[arg(long, value_name = "SIZE", value_parser = parse_setting::<GlyphSize>)]
    pub size: Option<GlyphSize>,

    /// Movement pattern: `circular` or `line`.
    #[arg(long, value_name = "PATTERN", value_parser = parse_setting::<Movement>)]
    pub movement: Option<Movement>,

    /// Number of sprites to animate.
    #[arg(long, value_name = "COUNT")]
    pub sprites: Option<usize>,

    /// Seed for sprite placement; omit for a different layout every run.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// GPU power preference: `low` or `high`.
    #[arg(long, value_name = "PREFERENCE", value_parser = parse_setting::<PowerPreference>)]
    pub power: Option<PowerPreference>,

    /// Window size in physical pixels (e.g. `1280x720`).
    #[arg(long = "window", value_name = "WIDTHxHEIGHT", value_parser = parse_window_size)]
    pub window_size: Option<(u32, u32)>,

    /// Open a borderless fullscreen window.
    #[arg(long)]
    pub fullscreen: bool,

    /// Run at preview speed (time multiplied by `preview.speedup`).
    #[arg(long)]
    pub preview: bool,

    /// Block on the GPU after every frame so frame statistics are exact.
    #[arg(long)]
    pub wait_for_gpu: bool,

    /// Render FRAMES frames without a window or GPU, then exit.
    #[arg(long, value_name = "FRAMES")]
    pub headless: Option<u64>,

    /// Write every glyph bitmap as PNG into DIR before running.
    #[arg(long, value_name = "DIR")]
    pub dump_glyphs: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect or persist settings.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings as TOML.
    Show,
    /// Print the configuration directory and file.
    Where,
    /// Write the effective settings (file plus command-line overrides) to the config file.
    Save,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_setting<T>(value: &str) -> Result<T, String>
where
    T: FromStr<Err = ConfigError>,
{
    value.parse().map_err(|err: ConfigError| err.to_string())
}

pub fn parse_window_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid window size '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid window width '{width}'"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid window height '{height}'"))?;
    if width == 0 || height == 0 {
        return Err(format!("window size must be non-zero, got {width}x{height}"));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_window_sizes() {
        assert_eq!(parse_window_size("1280x720"), Ok((1280, 720)));
        assert_eq!(parse_window_size(" 640X480 "), Ok((640, 480)));
        assert!(parse_window_size("1280").is_err());
        assert!(parse_window_size("0x720").is_err());
        assert!(parse_window_size("widexhigh").is_err());
    }

    #[test]
    fn parses_settings_case_insensitively() {
        assert_eq!(parse_setting::<Scheme>("Light"), Ok(Scheme::Light));
        assert_eq!(parse_setting::<Movement>("line"), Ok(Movement::Line));
        let err = parse_setting::<GlyphSize>("huge").unwrap_err();
        assert!(err.contains("small, medium, large"), "{err}");
    }

    #[test]
    fn run_flags_can_precede_a_subcommand() {
        let cli = Cli::try_parse_from([
            "dancing-glyphs",
            "--sprites",
            "12",
            "--scheme",
            "mono",
            "config",
            "save",
        ])
        .unwrap();
        assert_eq!(cli.run.sprites, Some(12));
        assert_eq!(cli.run.scheme, Some(Scheme::Mono));
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand {
                action: ConfigAction::Save
            }))
        ));
    }

    #[test]
    fn headless_takes_a_frame_count() {
        let cli =
            Cli::try_parse_from(["dancing-glyphs", "--headless", "30", "--seed", "4"]).unwrap();
        assert_eq!(cli.run.headless, Some(30));
        assert_eq!(cli.run.seed, Some(4));
        assert!(cli.command.is_none());
    }
}
