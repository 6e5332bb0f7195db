use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Upper bound on the number of animated sprites.
pub const MAX_SPRITES: usize = 10_000;
/// Largest supported vertex buffer ring.
pub const MAX_RING_SIZE: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Colour scheme: background plus the inks used for glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Dark,
    Light,
    Mono,
}

/// Which glyph shapes take part in the animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphSet {
    #[default]
    Circles,
    Polygons,
    All,
}

/// Glyph size, one of a small set of presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl GlyphSize {
    /// Maximum glyph edge as a fraction of the shorter screen side.
    pub fn fraction(self) -> f32 {
        match self {
            GlyphSize::Small => 0.05,
            GlyphSize::Medium => 0.08,
            GlyphSize::Large => 0.11,
        }
    }
}

/// Animation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    #[default]
    Circular,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPreference {
    #[default]
    Low,
    High,
}

macro_rules! lowercase_names {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const NAMES: &'static [&'static str] = &[$($name),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(ConfigError::Invalid(format!(
                        "invalid {} '{other}'; expected one of: {}",
                        stringify!($ty).to_ascii_lowercase(),
                        Self::NAMES.join(", ")
                    ))),
                }
            }
        }
    };
}

lowercase_names!(Scheme { Dark => "dark", Light => "light", Mono => "mono" });
lowercase_names!(GlyphSet { Circles => "circles", Polygons => "polygons", All => "all" });
lowercase_names!(GlyphSize { Small => "small", Medium => "medium", Large => "large" });
lowercase_names!(Movement { Circular => "circular", Line => "line" });
lowercase_names!(PowerPreference { Low => "low", High => "high" });

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Time multiplier applied in preview mode.
    pub speedup: f64,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self { speedup: 1.5 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Diagnostics {
    /// Block until the GPU finishes each frame so frame timings are exact.
    pub wait_for_gpu: bool,
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub stats_interval: Duration,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            wait_for_gpu: false,
            stats_interval: default_stats_interval(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GpuSettings {
    pub power: PowerPreference,
}

/// User-facing animation settings.
///
/// Every field has a default, so an empty document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Configuration {
    pub scheme: Scheme,
    pub glyph: GlyphSet,
    pub size: GlyphSize,
    pub movement: Movement,
    pub sprites: usize,
    /// Vertex buffers cycled between frames.
    pub ring_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub preview: PreviewSettings,
    pub diagnostics: Diagnostics,
    pub gpu: GpuSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            scheme: Scheme::default(),
            glyph: GlyphSet::default(),
            size: GlyphSize::default(),
            movement: Movement::default(),
            sprites: 150,
            ring_size: 2,
            seed: None,
            preview: PreviewSettings::default(),
            diagnostics: Diagnostics::default(),
            gpu: GpuSettings::default(),
        }
    }
}

fn default_stats_interval() -> Duration {
    Duration::from_secs(5)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() || v.is_infinite() {
                return Err(E::custom("duration must be a finite non-negative number"));
            }
            Ok(Duration::from_secs_f64(v))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*value).to_string())
}

impl Configuration {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: Configuration = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Time multiplier for the current mode.
    pub fn time_scale(&self, is_preview: bool) -> f64 {
        if is_preview {
            self.preview.speedup
        } else {
            1.0
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sprites > MAX_SPRITES {
            return Err(ConfigError::Invalid(format!(
                "sprites must be at most {MAX_SPRITES}, got {}",
                self.sprites
            )));
        }

        if !(2..=MAX_RING_SIZE).contains(&self.ring_size) {
            return Err(ConfigError::Invalid(format!(
                "ring_size must be between 2 and {MAX_RING_SIZE}, got {}",
                self.ring_size
            )));
        }

        let speedup = self.preview.speedup;
        if !speedup.is_finite() || speedup <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "preview.speedup must be a positive number, got {speedup}"
            )));
        }

        if self.diagnostics.stats_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "diagnostics.stats_interval must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
