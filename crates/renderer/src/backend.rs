//! Seam between the frame protocol in [`crate::quad`] and the device that
//! actually owns buffers and textures.

use anyhow::Result;

use crate::types::{Bitmap, ClearColor, OutputSize};
use crate::uniforms::QuadUniforms;

/// Buffer sizes requested by [`crate::quad::Renderer::configure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePlan {
    pub ring_size: usize,
    pub glyph_count: usize,
    pub sprite_count: usize,
    /// Size of each vertex buffer in the ring.
    pub vertex_buffer_bytes: u64,
}

/// Everything a backend needs to encode one frame.
pub struct FrameDraw<'a, T> {
    /// Ring slot holding this frame's vertices.
    pub slot: usize,
    pub background: ClearColor,
    /// Texture id per quad; its length is the number of quads to draw.
    pub quad_textures: &'a [usize],
    pub textures: &'a [Option<T>],
}

impl<'a, T> FrameDraw<'a, T> {
    pub fn quad_count(&self) -> usize {
        self.quad_textures.len()
    }

    /// Quads in draw order with the texture each one samples.
    pub fn quads(&self) -> impl Iterator<Item = (usize, Option<&'a T>)> + 'a {
        let textures = self.textures;
        self.quad_textures
            .iter()
            .enumerate()
            .map(move |(index, &texture_id)| {
                let texture = textures.get(texture_id).and_then(Option::as_ref);
                (index, texture)
            })
    }
}

/// Result of a frame that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Presented,
    /// No drawable was available this tick; nothing was drawn.
    Skipped,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("renderer used before configure()")]
    NotConfigured,
    #[error("renderer has no output size; call set_output_size() first")]
    NoOutputSize,
    #[error("GPU ran out of memory while acquiring the next frame")]
    OutOfMemory,
}

/// Device-side half of the renderer.
///
/// Implementations own the vertex ring, uniform buffer, texture coordinate
/// buffer and glyph textures. Textures are plain values: dropping one
/// releases it.
pub trait RenderBackend {
    type Texture;

    fn allocate(&mut self, plan: &ResourcePlan) -> Result<()>;

    fn resize_output(&mut self, size: OutputSize);

    fn write_uniforms(&mut self, uniforms: &QuadUniforms);

    fn write_texture_coords(&mut self, coords: &[f32]);

    /// Copies `vertices` into ring slot `slot` starting at `byte_offset`.
    fn write_vertices(&mut self, slot: usize, byte_offset: u64, vertices: &[f32]);

    fn create_texture(&mut self, index: usize, bitmap: &Bitmap) -> Result<Self::Texture>;

    fn draw_frame(&mut self, frame: &FrameDraw<'_, Self::Texture>)
        -> Result<FrameOutcome, FrameError>;
}
