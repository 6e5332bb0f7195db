//! In-memory [`RenderBackend`] used for `--headless` runs and tests.
//!
//! Buffers are plain `Vec`s and "drawing" records which texture each quad
//! sampled. Textures carry a drop guard so leaks show up in
//! [`HeadlessBackend::live_textures`].

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;

use crate::backend::{FrameDraw, FrameError, FrameOutcome, RenderBackend, ResourcePlan};
use crate::types::{Bitmap, ClearColor, OutputSize};
use crate::uniforms::QuadUniforms;

/// Texture stand-in that remembers its glyph slot and size.
#[derive(Debug)]
pub struct HeadlessTexture {
    index: usize,
    width: u32,
    height: u32,
    live: Rc<Cell<usize>>,
}

impl HeadlessTexture {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Drop for HeadlessTexture {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// What the last presented frame drew.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub slot: usize,
    pub background: ClearColor,
    /// Glyph slot sampled by each quad, `None` when its texture was missing.
    pub quad_textures: Vec<Option<usize>>,
    pub vertices: Vec<f32>,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    plan: Option<ResourcePlan>,
    vertex_buffers: Vec<Vec<f32>>,
    last_vertex_write: Option<(usize, u64, usize)>,
    vertex_write_count: u64,
    texture_coords: Vec<f32>,
    uniforms: Option<QuadUniforms>,
    output_size: Option<OutputSize>,
    live: Rc<Cell<usize>>,
    textures_created: usize,
    texture_sizes: Vec<Option<(u32, u32)>>,
    withheld_drawables: usize,
    frames_presented: u64,
    frames_skipped: u64,
    last_frame: Option<FrameRecord>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `frames` draws find no drawable, as a hidden window
    /// would.
    pub fn withhold_drawables(&mut self, frames: usize) {
        self.withheld_drawables = frames;
    }

    pub fn plan(&self) -> Option<&ResourcePlan> {
        self.plan.as_ref()
    }

    pub fn vertex_buffer_count(&self) -> usize {
        self.vertex_buffers.len()
    }

    pub fn vertex_buffer(&self, slot: usize) -> Option<&[f32]> {
        self.vertex_buffers.get(slot).map(Vec::as_slice)
    }

    /// Most recent `(slot, byte_offset, float_count)` upload.
    pub fn last_vertex_write(&self) -> Option<(usize, u64, usize)> {
        self.last_vertex_write
    }

    pub fn vertex_write_count(&self) -> u64 {
        self.vertex_write_count
    }

    pub fn texture_coords(&self) -> &[f32] {
        &self.texture_coords
    }

    pub fn uniforms(&self) -> Option<&QuadUniforms> {
        self.uniforms.as_ref()
    }

    pub fn output_size(&self) -> Option<OutputSize> {
        self.output_size
    }

    /// Textures created and not yet dropped.
    pub fn live_textures(&self) -> usize {
        self.live.get()
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    /// Size of the most recent texture uploaded for glyph `index`.
    pub fn texture_size(&self, index: usize) -> Option<(u32, u32)> {
        self.texture_sizes.get(index).copied().flatten()
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.last_frame.as_ref()
    }
}

impl RenderBackend for HeadlessBackend {
    type Texture = HeadlessTexture;

    fn allocate(&mut self, plan: &ResourcePlan) -> Result<()> {
        let floats = (plan.vertex_buffer_bytes / std::mem::size_of::<f32>() as u64) as usize;
        self.vertex_buffers = vec![vec![0.0; floats]; plan.ring_size];
        self.texture_sizes = vec![None; plan.glyph_count];
        self.plan = Some(*plan);
        Ok(())
    }

    fn resize_output(&mut self, size: OutputSize) {
        self.output_size = Some(size);
    }

    fn write_uniforms(&mut self, uniforms: &QuadUniforms) {
        self.uniforms = Some(*uniforms);
    }

    fn write_texture_coords(&mut self, coords: &[f32]) {
        self.texture_coords = coords.to_vec();
    }

    fn write_vertices(&mut self, slot: usize, byte_offset: u64, vertices: &[f32]) {
        let start = (byte_offset / std::mem::size_of::<f32>() as u64) as usize;
        if let Some(buffer) = self.vertex_buffers.get_mut(slot) {
            buffer[start..start + vertices.len()].copy_from_slice(vertices);
        }
        self.last_vertex_write = Some((slot, byte_offset, vertices.len()));
        self.vertex_write_count += 1;
    }

    fn create_texture(&mut self, index: usize, bitmap: &Bitmap) -> Result<HeadlessTexture> {
        self.live.set(self.live.get() + 1);
        self.textures_created += 1;
        if let Some(size) = self.texture_sizes.get_mut(index) {
            *size = Some((bitmap.width(), bitmap.height()));
        }
        Ok(HeadlessTexture {
            index,
            width: bitmap.width(),
            height: bitmap.height(),
            live: Rc::clone(&self.live),
        })
    }

    fn draw_frame(
        &mut self,
        frame: &FrameDraw<'_, HeadlessTexture>,
    ) -> Result<FrameOutcome, FrameError> {
        if self.withheld_drawables > 0 {
            self.withheld_drawables -= 1;
            self.frames_skipped += 1;
            return Ok(FrameOutcome::Skipped);
        }
        let vertices = self
            .vertex_buffers
            .get(frame.slot)
            .map(|buffer| buffer[..frame.quad_count() * crate::quad::FLOATS_PER_QUAD].to_vec())
            .unwrap_or_default();
        self.last_frame = Some(FrameRecord {
            slot: frame.slot,
            background: frame.background,
            quad_textures: frame
                .quads()
                .map(|(_, texture)| texture.map(HeadlessTexture::index))
                .collect(),
            vertices,
        });
        self.frames_presented += 1;
        Ok(FrameOutcome::Presented)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_uploads_keep_only_the_latest_write() {
        let mut backend = HeadlessBackend::new();
        backend
            .allocate(&ResourcePlan {
                ring_size: 2,
                glyph_count: 1,
                sprite_count: 2,
                vertex_buffer_bytes: 96,
            })
            .unwrap();
        for frame in 0..1000u64 {
            let slot = (frame % 2) as usize;
            backend.write_vertices(slot, 48, &[frame as f32; 12]);
        }
        assert_eq!(backend.vertex_write_count(), 1000);
        assert_eq!(backend.last_vertex_write(), Some((1, 48, 12)));
        assert_eq!(backend.vertex_buffer(1).unwrap()[12], 999.0);
    }
}
