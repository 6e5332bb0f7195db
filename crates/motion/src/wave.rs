//! Wave strategies: closed-form functions from elapsed time to sprite motion.
//!
//! Every strategy is stateless. Moving a sprite to time `t` depends only on
//! `t` and the sprite's fixed parameters, so an animation can be resumed or
//! seeked without replaying earlier frames.

use std::f64::consts::PI;

use rand::Rng;

use crate::sprite::Sprite;
use crate::vector::{Matrix2x2, Vector2};

/// Smallest sprite size as a fraction of the requested maximum.
pub const MIN_SIZE_FACTOR: f32 = 0.7;

/// Aspect ratio assumed until the real viewport is known.
pub const DEFAULT_ASPECT_RATIO: f64 = 16.0 / 9.0;

/// Tuning constants for [`CircularWave`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularParams {
    /// Global slow-down applied to wall-clock time.
    pub time_scale: f64,
    /// Amplitude of each sprite's individual up/down swing.
    pub swing_amplitude: f64,
    /// Frequency of the wave shared by all sprites.
    pub wave_frequency: f64,
    /// Phase offset of the shared wave per unit of `base_pos.x`.
    pub wave_phase: f64,
    pub wave_amplitude: f64,
    /// Constant offset that pushes sprites away from the centre.
    pub outward_bias: f64,
    /// Angular speed of the whole formation.
    pub spin_rate: f64,
    /// Viewport width divided by height.
    pub aspect_ratio: f64,
}

impl Default for CircularParams {
    fn default() -> Self {
        Self {
            time_scale: 0.5,
            swing_amplitude: 0.12,
            wave_frequency: 2.8,
            wave_phase: PI,
            wave_amplitude: 0.04,
            outward_bias: 0.28,
            spin_rate: 0.2,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
        }
    }
}

/// Tuning constants for [`LineWave`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineParams {
    pub time_scale: f64,
    pub swing_amplitude: f64,
    pub wave_frequency: f64,
    pub wave_phase: f64,
    pub wave_amplitude: f64,
    /// Half of the horizontal extent covered by the line, in normalized units.
    pub spread: f64,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            time_scale: 0.5,
            swing_amplitude: 0.12,
            wave_frequency: 2.8,
            wave_phase: PI,
            wave_amplitude: 0.15,
            spread: 0.45,
        }
    }
}

/// Sprites spaced evenly on a unit circle, swinging in and out while the
/// circle slowly turns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CircularWave {
    pub params: CircularParams,
}

impl CircularWave {
    pub fn new(params: CircularParams) -> Self {
        Self { params }
    }

    fn base_position(count: usize, index: usize) -> Vector2 {
        let step = (2.0 * std::f32::consts::PI) / count as f32;
        let angle = step * index as f32;
        Vector2::new(angle.sin(), angle.cos())
    }

    pub fn move_sprite(&self, sprite: &mut Sprite, time: f64) {
        let p = &self.params;
        let now = time * p.time_scale;
        let base = sprite.base_pos();

        let mut y = swing(now, sprite.r0(), sprite.r1(), p.swing_amplitude);
        y += (now * p.wave_frequency + f64::from(base.x) * p.wave_phase).sin() * p.wave_amplitude;
        y += p.outward_bias;

        let (scale_x, scale_y) = aspect_scale(p.aspect_ratio);
        let rotated = base * Matrix2x2::rotation((now * p.spin_rate) as f32);
        let scaled = rotated * Vector2::new((y * scale_x) as f32, (y * scale_y) as f32);

        sprite.pos = scaled + Vector2::splat(0.5);
        sprite.rotation = spin(now, sprite.r0());
    }
}

/// Sprites spaced along a horizontal line, riding a travelling wave.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineWave {
    pub params: LineParams,
}

impl LineWave {
    pub fn new(params: LineParams) -> Self {
        Self { params }
    }

    fn base_position(count: usize, index: usize) -> Vector2 {
        let x = -1.0 + 2.0 * (index as f32 + 0.5) / count as f32;
        Vector2::new(x, 0.0)
    }

    pub fn move_sprite(&self, sprite: &mut Sprite, time: f64) {
        let p = &self.params;
        let now = time * p.time_scale;
        let base = sprite.base_pos();

        let mut y = swing(now, sprite.r0(), sprite.r1(), p.swing_amplitude);
        y += (now * p.wave_frequency + f64::from(base.x) * p.wave_phase).sin() * p.wave_amplitude;

        sprite.pos = Vector2::new(
            (0.5 + f64::from(base.x) * p.spread) as f32,
            (0.5 + y) as f32,
        );
        sprite.rotation = spin(now, sprite.r0());
    }
}

/// Individual swing: speed from `r0`, damped by `r1`.
fn swing(now: f64, r0: f64, r1: f64, amplitude: f64) -> f64 {
    let y = (now * (1.0 + r0)).sin() * amplitude;
    y * r1 * (0.5 + r1 / 2.0)
}

fn spin(now: f64, r0: f64) -> f32 {
    ((now * (r0 - 0.5)).sin() * 2.0 * PI) as f32
}

/// Per-axis factors that keep a normalized circle round on screen.
///
/// Landscape shrinks x by the aspect ratio, portrait shrinks y.
fn aspect_scale(aspect_ratio: f64) -> (f64, f64) {
    if aspect_ratio >= 1.0 {
        (1.0 / aspect_ratio, 1.0)
    } else {
        (1.0, aspect_ratio)
    }
}

/// The animation strategy bound to every sprite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wave {
    Circular(CircularWave),
    Line(LineWave),
}

impl Default for Wave {
    fn default() -> Self {
        Wave::Circular(CircularWave::default())
    }
}

impl Wave {
    pub fn name(&self) -> &'static str {
        match self {
            Wave::Circular(_) => "circular",
            Wave::Line(_) => "line",
        }
    }

    /// Returns a copy tuned to the given viewport aspect ratio.
    ///
    /// Non-finite or non-positive ratios leave the strategy unchanged.
    pub fn with_aspect_ratio(self, aspect_ratio: f64) -> Self {
        if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
            return self;
        }
        match self {
            Wave::Circular(mut wave) => {
                wave.params.aspect_ratio = aspect_ratio;
                Wave::Circular(wave)
            }
            line @ Wave::Line(_) => line,
        }
    }

    pub fn move_sprite(&self, sprite: &mut Sprite, time: f64) {
        match self {
            Wave::Circular(wave) => wave.move_sprite(sprite, time),
            Wave::Line(wave) => wave.move_sprite(sprite, time),
        }
    }

    /// Creates `count` sprites bound to this strategy, in placement order.
    ///
    /// Sizes fall in `[MIN_SIZE_FACTOR * max_size, max_size]`; glyph indices are
    /// drawn uniformly from `0..glyph_count`.
    ///
    /// # Panics
    ///
    /// Panics when `count > 0` and `glyph_count == 0`.
    pub fn make_sprites<R: Rng + ?Sized>(
        &self,
        count: usize,
        glyph_count: usize,
        max_size: f32,
        rng: &mut R,
    ) -> Vec<Sprite> {
        assert!(
            count == 0 || glyph_count > 0,
            "cannot create sprites without any glyphs"
        );
        (0..count)
            .map(|index| {
                let jitter = rng.gen::<f32>() * (1.0 - MIN_SIZE_FACTOR);
                let size = max_size * (MIN_SIZE_FACTOR + jitter);
                let glyph = rng.gen_range(0..glyph_count);
                let r0 = rng.gen::<f64>();
                let r1 = rng.gen::<f64>();
                let base_pos = match self {
                    Wave::Circular(_) => CircularWave::base_position(count, index),
                    Wave::Line(_) => LineWave::base_position(count, index),
                };
                Sprite::new(glyph, size, r0, r1, base_pos, *self)
            })
            .collect()
    }
}
