//! Procedural glyph rasterizer.
//!
//! Each shape is a signed distance field over the unit square `[-1, 1]^2`;
//! coverage is the distance to the edge in pixels, clamped to `[0, 1]`, so
//! edges get one pixel of antialiasing at any texture size.

use image::{Rgba, RgbaImage};

use crate::types::{Bitmap, ClearColor};

/// Source of a glyph texture.
pub trait Glyph {
    fn name(&self) -> &str;

    /// Rasterizes the glyph into a `size` x `size` bitmap. `size` is at
    /// least 1.
    fn make_bitmap(&self, size: u32) -> Bitmap;
}

pub type BoxedGlyph = Box<dyn Glyph>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Disc,
    Ring,
    Square,
    Diamond,
    Triangle,
    Cross,
}

impl Shape {
    pub const ROUND: [Shape; 2] = [Shape::Disc, Shape::Ring];
    pub const ANGULAR: [Shape; 4] = [Shape::Square, Shape::Diamond, Shape::Triangle, Shape::Cross];
    pub const ALL: [Shape; 6] = [
        Shape::Disc,
        Shape::Ring,
        Shape::Square,
        Shape::Diamond,
        Shape::Triangle,
        Shape::Cross,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Shape::Disc => "disc",
            Shape::Ring => "ring",
            Shape::Square => "square",
            Shape::Diamond => "diamond",
            Shape::Triangle => "triangle",
            Shape::Cross => "cross",
        }
    }

    /// Signed distance from `(u, v)` to the shape outline, negative inside.
    /// `v` grows upwards.
    pub fn distance(self, u: f32, v: f32) -> f32 {
        match self {
            Shape::Disc => u.hypot(v) - 0.9,
            Shape::Ring => (u.hypot(v) - 0.7).abs() - 0.2,
            Shape::Square => u.abs().max(v.abs()) - 0.7,
            Shape::Diamond => (u.abs() + v.abs() - 0.9) / std::f32::consts::SQRT_2,
            Shape::Triangle => {
                let edge = 0.866_025_4 * u.abs() + 0.5 * v;
                edge.max(-v - 0.45) - 0.45
            }
            Shape::Cross => {
                let bar = |a: f32, b: f32| (a.abs() - 0.8).max(b.abs() - 0.25);
                bar(u, v).min(bar(v, u))
            }
        }
    }
}

/// A shape drawn in one premultiplied colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeGlyph {
    shape: Shape,
    ink: [u8; 3],
}

impl ShapeGlyph {
    pub fn new(shape: Shape, ink: [u8; 3]) -> Self {
        Self { shape, ink }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }
}

impl Glyph for ShapeGlyph {
    fn name(&self) -> &str {
        self.shape.name()
    }

    fn make_bitmap(&self, size: u32) -> Bitmap {
        let size = size.max(1);
        let scale = size as f32 / 2.0;
        let image = RgbaImage::from_fn(size, size, |x, y| {
            let u = (x as f32 + 0.5) / scale - 1.0;
            let v = 1.0 - (y as f32 + 0.5) / scale;
            let coverage = (0.5 - self.shape.distance(u, v) * scale).clamp(0.0, 1.0);
            let premultiply = |channel: u8| (f32::from(channel) * coverage).round() as u8;
            Rgba([
                premultiply(self.ink[0]),
                premultiply(self.ink[1]),
                premultiply(self.ink[2]),
                (coverage * 255.0).round() as u8,
            ])
        });
        Bitmap::from(image)
    }
}

/// Background colour plus the inks glyphs cycle through.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub background: ClearColor,
    pub inks: Vec<[u8; 3]>,
}

impl Palette {
    pub fn dark() -> Self {
        Self {
            background: ClearColor::BLACK,
            inks: vec![
                [0xff, 0x5f, 0x57],
                [0xfe, 0xbc, 0x2e],
                [0x28, 0xc8, 0x40],
                [0x3b, 0x9e, 0xff],
                [0xbf, 0x5a, 0xf2],
                [0xff, 0x9f, 0x0a],
            ],
        }
    }

    pub fn light() -> Self {
        Self {
            background: ClearColor::from_rgb8([0xf2, 0xf0, 0xeb]),
            inks: vec![
                [0x1d, 0x3d, 0x6b],
                [0x8a, 0x1c, 0x2b],
                [0x1f, 0x5e, 0x3a],
                [0x5b, 0x2a, 0x86],
            ],
        }
    }

    pub fn mono() -> Self {
        Self {
            background: ClearColor::BLACK,
            inks: vec![[0xff, 0xff, 0xff]],
        }
    }
}

/// One glyph per shape, inks assigned round-robin from the palette.
pub fn glyph_set(shapes: &[Shape], palette: &Palette) -> Vec<BoxedGlyph> {
    shapes
        .iter()
        .enumerate()
        .map(|(index, &shape)| {
            let ink = if palette.inks.is_empty() {
                [0xff, 0xff, 0xff]
            } else {
                palette.inks[index % palette.inks.len()]
            };
            Box::new(ShapeGlyph::new(shape, ink)) as BoxedGlyph
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_has_requested_size_and_tight_stride() {
        let bitmap = ShapeGlyph::new(Shape::Disc, [255, 0, 0]).make_bitmap(33);
        assert_eq!((bitmap.width(), bitmap.height()), (33, 33));
        assert_eq!(bitmap.bytes_per_row(), 33 * 4);
        assert_eq!(bitmap.pixels().len(), 33 * 33 * 4);
    }

    #[test]
    fn zero_size_is_rounded_up() {
        let bitmap = ShapeGlyph::new(Shape::Square, [255, 255, 255]).make_bitmap(0);
        assert_eq!((bitmap.width(), bitmap.height()), (1, 1));
    }

    #[test]
    fn every_shape_covers_its_centre_region_and_leaves_corners_clear() {
        for shape in Shape::ALL {
            let bitmap = ShapeGlyph::new(shape, [255, 255, 255]).make_bitmap(64);
            assert_eq!(bitmap.pixel(0, 0)[3], 0, "{} corner", shape.name());
            assert_eq!(bitmap.pixel(63, 63)[3], 0, "{} corner", shape.name());
            let covered = bitmap.pixels().chunks(4).filter(|px| px[3] == 255).count();
            assert!(covered > 64, "{} covers only {covered} pixels", shape.name());
        }
    }

    #[test]
    fn ring_has_a_hole() {
        let bitmap = ShapeGlyph::new(Shape::Ring, [255, 255, 255]).make_bitmap(64);
        assert_eq!(bitmap.pixel(32, 32)[3], 0);
        assert_eq!(bitmap.pixel(32, 9)[3], 255);
    }

    #[test]
    fn triangle_points_up() {
        let bitmap = ShapeGlyph::new(Shape::Triangle, [255, 255, 255]).make_bitmap(64);
        let row_coverage = |y: u32| (0..64).filter(|&x| bitmap.pixel(x, y)[3] > 0).count();
        assert!(row_coverage(20) < row_coverage(40));
    }

    #[test]
    fn colours_are_premultiplied() {
        let bitmap = ShapeGlyph::new(Shape::Disc, [200, 100, 50]).make_bitmap(64);
        for px in bitmap.pixels().chunks(4) {
            let alpha = u32::from(px[3]);
            assert!(u32::from(px[0]) <= alpha);
            assert!(u32::from(px[1]) <= alpha);
        }
        assert_eq!(bitmap.pixel(32, 32), [200, 100, 50, 255]);
    }

    #[test]
    fn glyph_set_cycles_inks() {
        let palette = Palette::mono();
        let glyphs = glyph_set(&Shape::ALL, &palette);
        assert_eq!(glyphs.len(), 6);
        let names: Vec<&str> = glyphs.iter().map(|glyph| glyph.name()).collect();
        assert_eq!(names, ["disc", "ring", "square", "diamond", "triangle", "cross"]);
    }
}
