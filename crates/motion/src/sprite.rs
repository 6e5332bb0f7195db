use crate::vector::{Matrix2x2, Vector2};
use crate::wave::Wave;

/// One animated glyph instance.
///
/// The shape parameters (`glyph`, `size`, `r0`, `r1`, `base_pos`) are fixed
/// when the sprite is created. Only `pos` and `rotation` change, and only
/// through the bound [`Wave`], as a function of elapsed time.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    glyph: usize,
    size: f32,
    r0: f64,
    r1: f64,
    base_pos: Vector2,
    pub(crate) pos: Vector2,
    pub(crate) rotation: f32,
    wave: Wave,
}

impl Sprite {
    pub fn new(glyph: usize, size: f32, r0: f64, r1: f64, base_pos: Vector2, wave: Wave) -> Self {
        debug_assert!(size > 0.0, "sprite size must be positive, got {size}");
        debug_assert!((0.0..1.0).contains(&r0), "r0 out of range: {r0}");
        debug_assert!((0.0..1.0).contains(&r1), "r1 out of range: {r1}");
        Self {
            glyph,
            size,
            r0,
            r1,
            base_pos,
            pos: Vector2::splat(0.5),
            rotation: 0.0,
            wave,
        }
    }

    pub fn glyph(&self) -> usize {
        self.glyph
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn r0(&self) -> f64 {
        self.r0
    }

    pub fn r1(&self) -> f64 {
        self.r1
    }

    pub fn base_pos(&self) -> Vector2 {
        self.base_pos
    }

    /// Current centre in normalized screen space.
    pub fn pos(&self) -> Vector2 {
        self.pos
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn wave(&self) -> &Wave {
        &self.wave
    }

    /// Recomputes `pos` and `rotation` for the given time in seconds.
    pub fn move_to(&mut self, time: f64) {
        let wave = self.wave;
        wave.move_sprite(self, time);
    }

    /// Binds a different strategy, e.g. one tuned to a new aspect ratio.
    pub fn retarget(&mut self, wave: Wave) {
        self.wave = wave;
    }

    /// Corners of the sprite's quad in pixel coordinates.
    ///
    /// The quad side is `size * min(width, height)` so the glyph stays square
    /// on non-square viewports. Order is top-left, bottom-left, bottom-right,
    /// top-right (y grows upwards).
    pub fn corners(&self, viewport: Vector2) -> [Vector2; 4] {
        let half = self.size * viewport.min_element() / 2.0;
        let centre = self.pos * viewport;
        let rotation = Matrix2x2::rotation(self.rotation);
        [
            Vector2::new(-half, half),
            Vector2::new(-half, -half),
            Vector2::new(half, -half),
            Vector2::new(half, half),
        ]
        .map(|offset| centre + offset * rotation)
    }
}
