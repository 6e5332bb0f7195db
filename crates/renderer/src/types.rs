use std::path::Path;

use anyhow::{Context, Result};
use motion::Vector2;

/// Output surface size in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_vector(&self) -> Vector2 {
        Vector2::new(self.width as f32, self.height as f32)
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Colour the frame is cleared to before any quad is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl ClearColor {
    pub const BLACK: ClearColor = ClearColor::rgb(0.0, 0.0, 0.0);
    pub const WHITE: ClearColor = ClearColor::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgb8(rgb: [u8; 3]) -> Self {
        Self::rgb(
            f64::from(rgb[0]) / 255.0,
            f64::from(rgb[1]) / 255.0,
            f64::from(rgb[2]) / 255.0,
        )
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl From<ClearColor> for wgpu::Color {
    fn from(value: ClearColor) -> Self {
        wgpu::Color {
            r: value.r,
            g: value.g,
            b: value.b,
            a: value.a,
        }
    }
}

/// Opaque RGBA8 pixel buffer produced by a glyph rasterizer.
///
/// Rows run top to bottom; colours are premultiplied by alpha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    bytes_per_row: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub const BYTES_PER_PIXEL: u32 = 4;

    pub fn new(width: u32, height: u32, bytes_per_row: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("bitmap must not be empty, got {width}x{height}");
        }
        if bytes_per_row < width * Self::BYTES_PER_PIXEL {
            anyhow::bail!("row stride {bytes_per_row} is too small for {width} RGBA pixels");
        }
        let expected = bytes_per_row as usize * height as usize;
        if pixels.len() < expected {
            anyhow::bail!(
                "bitmap holds {} bytes, {width}x{height} with stride {bytes_per_row} needs {expected}",
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            bytes_per_row,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`, `y` counted from the top row.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y * self.bytes_per_row + x * Self::BYTES_PER_PIXEL) as usize;
        [
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        ]
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let mut packed = Vec::with_capacity((self.width * self.height * 4) as usize);
        for row in self.pixels.chunks(self.bytes_per_row as usize).take(self.height as usize) {
            packed.extend_from_slice(&row[..(self.width * Self::BYTES_PER_PIXEL) as usize]);
        }
        let image = image::RgbaImage::from_raw(self.width, self.height, packed)
            .context("bitmap dimensions do not match its pixel data")?;
        image
            .save(path)
            .with_context(|| format!("failed to write glyph bitmap to {}", path.display()))
    }
}

impl From<image::RgbaImage> for Bitmap {
    fn from(image: image::RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            bytes_per_row: width * Self::BYTES_PER_PIXEL,
            pixels: image.into_raw(),
        }
    }
}

/// GPU power preference used when picking an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

/// Options that only affect the wgpu backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GpuOptions {
    pub power: GpuPowerPreference,
    /// Block after each submit until the GPU is idle. Caps throughput at the
    /// GPU's per-frame latency but makes frame timings exact.
    pub wait_for_gpu: bool,
}

/// Settings shared by every backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    /// Number of vertex buffers cycled between frames (at least 2).
    pub ring_size: usize,
    pub background: ClearColor,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            ring_size: 2,
            background: ClearColor::BLACK,
        }
    }
}

/// Window creation options for the desktop host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    pub title: String,
    pub size: (u32, u32),
    pub fullscreen: bool,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Dancing Glyphs".to_string(),
            size: (1280, 720),
            fullscreen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitmap_rejects_short_stride() {
        assert!(Bitmap::new(4, 2, 12, vec![0; 32]).is_err());
    }

    #[test]
    fn bitmap_rejects_missing_pixels() {
        assert!(Bitmap::new(2, 2, 8, vec![0; 15]).is_err());
    }

    #[test]
    fn bitmap_reads_through_padded_rows() {
        let mut pixels = vec![0u8; 2 * 12];
        pixels[12 + 4..12 + 8].copy_from_slice(&[1, 2, 3, 4]);
        let bitmap = Bitmap::new(2, 2, 12, pixels).unwrap();
        assert_eq!(bitmap.pixel(1, 1), [1, 2, 3, 4]);
        assert_eq!(bitmap.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn output_size_reports_aspect_ratio() {
        let size = OutputSize::new(1920, 1080);
        assert!((size.aspect_ratio() - 16.0 / 9.0).abs() < 1e-9);
        assert_eq!(size.shorter_side(), 1080);
        assert!(!size.is_empty());
        assert!(OutputSize::new(0, 10).is_empty());
    }
}
