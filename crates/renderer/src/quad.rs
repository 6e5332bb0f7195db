//! Frame-oriented quad renderer.
//!
//! A frame goes through `begin_updating_quads` -> `update_quad` (once per
//! sprite) -> `finish_updating_quads` -> `render_frame`. Vertex data for the
//! frame lands in the next slot of a [`BufferRing`]; uniform and texture
//! updates are only accepted between frames.

use std::ops::Range;

use anyhow::Result;
use motion::Vector2;
use tracing::{debug, warn};

use crate::backend::{FrameDraw, FrameError, FrameOutcome, RenderBackend, ResourcePlan};
use crate::ring::BufferRing;
use crate::types::{Bitmap, ClearColor, OutputSize, RendererSettings};
use crate::uniforms::QuadUniforms;

pub const VERTICES_PER_QUAD: usize = 6;
pub const FLOATS_PER_VERTEX: usize = 2;
pub const FLOATS_PER_QUAD: usize = VERTICES_PER_QUAD * FLOATS_PER_VERTEX;
/// Byte distance between consecutive quads in a vertex buffer.
pub const QUAD_STRIDE_BYTES: u64 = (FLOATS_PER_QUAD * std::mem::size_of::<f32>()) as u64;

/// Texture coordinates for the two triangles a-b-c and a-c-d, shared by
/// every quad.
pub const TEXTURE_COORDS: [f32; FLOATS_PER_QUAD] = [
    0.0, 0.0, // a
    0.0, 1.0, // b
    1.0, 1.0, // c
    0.0, 0.0, // a
    1.0, 1.0, // c
    1.0, 0.0, // d
];

/// Corner points a, b, c, d of one quad in pixel space.
pub type QuadCorners = [Vector2; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    /// Slot chosen by `begin_frame`, no quads written yet.
    Begun,
    Updating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    glyph_count: usize,
    sprite_count: usize,
}

pub struct Renderer<B: RenderBackend> {
    backend: B,
    settings: RendererSettings,
    layout: Option<Layout>,
    /// CPU copy of each ring slot's vertex buffer.
    ring: BufferRing<Vec<f32>>,
    quad_textures: Vec<usize>,
    textures: Vec<Option<B::Texture>>,
    uniforms: QuadUniforms,
    output_size: Option<OutputSize>,
    phase: FramePhase,
    /// Quads written since `begin_updating_quads`.
    quad_count: usize,
    dirty: Option<Range<usize>>,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B, settings: RendererSettings) -> Self {
        let ring_size = if settings.ring_size < 2 {
            warn!(
                requested = settings.ring_size,
                "vertex buffer ring needs at least two slots; using 2"
            );
            2
        } else {
            settings.ring_size
        };
        Self {
            backend,
            settings: RendererSettings {
                ring_size,
                ..settings
            },
            layout: None,
            ring: BufferRing::new(vec![Vec::new(); ring_size]),
            quad_textures: Vec::new(),
            textures: Vec::new(),
            uniforms: QuadUniforms::default(),
            output_size: None,
            phase: FramePhase::Idle,
            quad_count: 0,
            dirty: None,
        }
    }

    /// Allocates the vertex ring, uniform buffer, texture coordinates and
    /// `glyph_count` empty texture slots.
    pub fn configure(&mut self, glyph_count: usize, sprite_count: usize) -> Result<()> {
        debug_assert_eq!(self.phase, FramePhase::Idle, "configure() during a frame");
        let plan = ResourcePlan {
            ring_size: self.ring.len(),
            glyph_count,
            sprite_count,
            vertex_buffer_bytes: sprite_count as u64 * QUAD_STRIDE_BYTES,
        };
        self.backend.allocate(&plan)?;
        self.backend.write_texture_coords(&TEXTURE_COORDS);

        for slot in self.ring.iter_mut() {
            *slot = vec![0.0; sprite_count * FLOATS_PER_QUAD];
        }
        self.quad_textures = vec![0; sprite_count];
        self.textures = std::iter::repeat_with(|| None).take(glyph_count).collect();
        self.quad_count = 0;
        self.dirty = None;
        self.layout = Some(Layout {
            glyph_count,
            sprite_count,
        });
        debug!(
            glyph_count,
            sprite_count,
            ring_size = plan.ring_size,
            vertex_buffer_bytes = plan.vertex_buffer_bytes,
            "configured quad renderer"
        );
        Ok(())
    }

    pub fn background(&self) -> ClearColor {
        self.settings.background
    }

    pub fn set_background(&mut self, color: ClearColor) {
        self.settings.background = color;
    }

    /// Recomputes the projection for a new output size and uploads it.
    pub fn set_output_size(&mut self, size: OutputSize) {
        debug_assert_eq!(self.phase, FramePhase::Idle, "resize during a frame");
        if size.is_empty() {
            debug!(?size, "ignoring empty output size");
            return;
        }
        self.uniforms = QuadUniforms::orthographic(size);
        self.output_size = Some(size);
        self.backend.resize_output(size);
        self.backend.write_uniforms(&self.uniforms);
    }

    pub fn output_size(&self) -> Option<OutputSize> {
        self.output_size
    }

    /// Uploads `bitmap` as the texture for glyph `index`, releasing the
    /// texture it replaces.
    pub fn set_texture(&mut self, bitmap: &Bitmap, index: usize) -> Result<()> {
        debug_assert_eq!(self.phase, FramePhase::Idle, "texture upload during a frame");
        let glyph_count = self.layout.map(|layout| layout.glyph_count).unwrap_or(0);
        if index >= glyph_count {
            anyhow::bail!("texture index {index} out of range for {glyph_count} glyphs");
        }
        let texture = self.backend.create_texture(index, bitmap)?;
        self.textures[index] = Some(texture);
        Ok(())
    }

    /// Moves to the next ring slot and returns its index. Calling it again
    /// before the frame is rendered keeps the same slot.
    pub fn begin_frame(&mut self) -> usize {
        if self.phase == FramePhase::Idle {
            self.ring.advance();
            self.phase = FramePhase::Begun;
        }
        self.ring.current_index()
    }

    /// Starts writing quads, beginning the frame first unless `begin_frame`
    /// already did.
    pub fn begin_updating_quads(&mut self) {
        debug_assert_ne!(self.phase, FramePhase::Updating, "quad updates already in progress");
        debug_assert!(self.layout.is_some(), "update before configure()");
        self.begin_frame();
        self.phase = FramePhase::Updating;
        self.quad_count = 0;
        self.dirty = None;
    }

    /// Writes the six vertices of quad `index` (triangles a-b-c and a-c-d)
    /// into the current slot and records which texture it samples.
    pub fn update_quad(&mut self, corners: &QuadCorners, texture_id: usize, index: usize) {
        debug_assert_eq!(
            self.phase,
            FramePhase::Updating,
            "update_quad() outside begin/finish"
        );
        let Some(layout) = self.layout else {
            debug_assert!(false, "update_quad() before configure()");
            return;
        };
        if index >= layout.sprite_count || texture_id >= layout.glyph_count {
            debug_assert!(
                false,
                "quad {index} / texture {texture_id} out of range for {} sprites, {} glyphs",
                layout.sprite_count,
                layout.glyph_count
            );
            warn!(index, texture_id, "dropping out-of-range quad update");
            return;
        }

        let [a, b, c, d] = *corners;
        let vertices = [a.x, a.y, b.x, b.y, c.x, c.y, a.x, a.y, c.x, c.y, d.x, d.y];
        let start = index * FLOATS_PER_QUAD;
        self.ring.current_mut()[start..start + FLOATS_PER_QUAD].copy_from_slice(&vertices);
        self.quad_textures[index] = texture_id;

        self.quad_count = self.quad_count.max(index + 1);
        self.dirty = Some(match self.dirty.take() {
            Some(range) => range.start.min(index)..range.end.max(index + 1),
            None => index..index + 1,
        });
    }

    /// Uploads the quads written this frame to the current slot's buffer.
    pub fn finish_updating_quads(&mut self) {
        debug_assert_eq!(self.phase, FramePhase::Updating, "finish without begin");
        self.phase = FramePhase::Idle;
        let Some(range) = self.dirty.take() else {
            return;
        };
        let slot = self.ring.current_index();
        let floats = range.start * FLOATS_PER_QUAD..range.end * FLOATS_PER_QUAD;
        let byte_offset = range.start as u64 * QUAD_STRIDE_BYTES;
        self.backend
            .write_vertices(slot, byte_offset, &self.ring.current()[floats]);
    }

    /// Clears to the background, draws every quad written this frame with
    /// its glyph texture and presents.
    pub fn render_frame(&mut self) -> Result<FrameOutcome, FrameError> {
        debug_assert_ne!(self.phase, FramePhase::Updating, "render during quad updates");
        self.phase = FramePhase::Idle;
        if self.layout.is_none() {
            return Err(FrameError::NotConfigured);
        }
        if self.output_size.is_none() {
            return Err(FrameError::NoOutputSize);
        }
        let frame = FrameDraw {
            slot: self.ring.current_index(),
            background: self.settings.background,
            quad_textures: &self.quad_textures[..self.quad_count],
            textures: &self.textures,
        };
        self.backend.draw_frame(&frame)
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn ring_size(&self) -> usize {
        self.ring.len()
    }

    pub fn current_slot(&self) -> usize {
        self.ring.current_index()
    }

    /// Number of frames begun since construction.
    pub fn frame_number(&self) -> u64 {
        self.ring.frame()
    }

    pub fn quad_count(&self) -> usize {
        self.quad_count
    }

    pub fn uniforms(&self) -> &QuadUniforms {
        &self.uniforms
    }

    /// CPU copy of the vertex data in ring slot `slot`.
    pub fn slot_vertices(&self, slot: usize) -> Option<&[f32]> {
        self.ring.get(slot).map(Vec::as_slice)
    }

    pub fn loaded_textures(&self) -> usize {
        self.textures.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessBackend;

    fn solid_bitmap(size: u32) -> Bitmap {
        Bitmap::new(size, size, size * 4, vec![255; (size * size * 4) as usize]).unwrap()
    }

    fn corners(offset: f32) -> QuadCorners {
        [
            Vector2::new(offset, offset + 10.0),
            Vector2::new(offset, offset),
            Vector2::new(offset + 10.0, offset),
            Vector2::new(offset + 10.0, offset + 10.0),
        ]
    }

    fn configured(glyphs: usize, sprites: usize) -> Renderer<HeadlessBackend> {
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererSettings::default());
        renderer.configure(glyphs, sprites).unwrap();
        renderer.set_output_size(OutputSize::new(800, 600));
        for index in 0..glyphs {
            renderer.set_texture(&solid_bitmap(4), index).unwrap();
        }
        renderer
    }

    #[test]
    fn configure_allocates_ring_and_texture_coordinates() {
        let renderer = configured(2, 3);
        let backend = renderer.backend();
        assert_eq!(backend.vertex_buffer_count(), 2);
        assert_eq!(backend.vertex_buffer(0).unwrap().len(), 3 * FLOATS_PER_QUAD);
        assert_eq!(backend.texture_coords(), &TEXTURE_COORDS);
        assert_eq!(renderer.loaded_textures(), 2);
    }

    #[test]
    fn update_quad_writes_two_triangles_at_the_quad_offset() {
        let mut renderer = configured(2, 3);
        renderer.begin_updating_quads();
        renderer.update_quad(&corners(0.0), 1, 0);
        renderer.update_quad(&corners(100.0), 0, 2);
        renderer.finish_updating_quads();

        let slot = renderer.current_slot();
        let uploaded = renderer.backend().vertex_buffer(slot).unwrap();
        assert_eq!(
            &uploaded[2 * FLOATS_PER_QUAD..3 * FLOATS_PER_QUAD],
            &[100.0, 110.0, 100.0, 100.0, 110.0, 100.0, 100.0, 110.0, 110.0, 100.0, 110.0, 110.0]
        );
        assert_eq!(renderer.slot_vertices(slot).unwrap(), uploaded);
        assert_eq!(renderer.backend().last_vertex_write(), Some((slot, 0, 36)));
    }

    #[test]
    fn consecutive_frames_write_different_slots() {
        let mut renderer = configured(1, 1);
        let mut previous = None;
        for frame in 0..6 {
            renderer.begin_updating_quads();
            renderer.update_quad(&corners(frame as f32), 0, 0);
            renderer.finish_updating_quads();
            let slot = renderer.current_slot();
            assert_ne!(Some(slot), previous);
            assert_eq!(slot, (frame + 1) % 2);
            previous = Some(slot);
        }
        assert_eq!(renderer.frame_number(), 6);
    }

    #[test]
    fn explicit_begin_frame_does_not_advance_twice() {
        let mut renderer = configured(1, 1);
        let mut slots = Vec::new();
        for _ in 0..4 {
            let begun = renderer.begin_frame();
            renderer.begin_updating_quads();
            assert_eq!(renderer.current_slot(), begun);
            renderer.update_quad(&corners(0.0), 0, 0);
            renderer.finish_updating_quads();
            renderer.render_frame().unwrap();
            slots.push(renderer.current_slot());
        }
        assert_eq!(slots, vec![1, 0, 1, 0]);
        assert_eq!(renderer.frame_number(), 4);
    }

    #[test]
    fn render_draws_each_quad_with_its_own_texture() {
        let mut renderer = configured(2, 3);
        renderer.begin_updating_quads();
        renderer.update_quad(&corners(0.0), 1, 0);
        renderer.update_quad(&corners(20.0), 1, 1);
        renderer.update_quad(&corners(40.0), 0, 2);
        renderer.finish_updating_quads();

        assert_eq!(renderer.render_frame().unwrap(), FrameOutcome::Presented);
        let frame = renderer.backend().last_frame().unwrap();
        assert_eq!(frame.slot, renderer.current_slot());
        assert_eq!(frame.quad_textures, vec![Some(1), Some(1), Some(0)]);
        assert_eq!(frame.background, ClearColor::BLACK);
    }

    #[test]
    fn frame_without_updates_only_clears() {
        let mut renderer = configured(1, 5);
        renderer.begin_updating_quads();
        renderer.finish_updating_quads();
        renderer.render_frame().unwrap();
        assert!(renderer.backend().last_frame().unwrap().quad_textures.is_empty());
    }

    #[test]
    fn replacing_a_texture_releases_the_old_one() {
        let mut renderer = configured(2, 1);
        let live = renderer.backend().live_textures();
        for _ in 0..10 {
            renderer.set_texture(&solid_bitmap(8), 0).unwrap();
            renderer.set_texture(&solid_bitmap(8), 1).unwrap();
        }
        assert_eq!(renderer.backend().live_textures(), live);
        assert_eq!(live, 2);
        assert_eq!(renderer.backend().textures_created(), 22);
    }

    #[test]
    fn set_texture_rejects_unknown_index() {
        let mut renderer = configured(1, 1);
        assert!(renderer.set_texture(&solid_bitmap(2), 1).is_err());
    }

    #[test]
    fn resize_uploads_projection() {
        let mut renderer = configured(1, 1);
        renderer.set_output_size(OutputSize::new(1024, 512));
        let uploaded = renderer.backend().uniforms().unwrap();
        assert_eq!(uploaded, renderer.uniforms());
        let corner = uploaded.project(1024.0, 512.0);
        assert!((corner[0] - 1.0).abs() < 1e-6 && (corner[1] - 1.0).abs() < 1e-6);
        assert_eq!(renderer.backend().output_size(), Some(OutputSize::new(1024, 512)));
    }

    #[test]
    fn empty_output_size_is_ignored() {
        let mut renderer = configured(1, 1);
        renderer.set_output_size(OutputSize::new(0, 100));
        assert_eq!(renderer.output_size(), Some(OutputSize::new(800, 600)));
    }

    #[test]
    fn render_before_configure_fails() {
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererSettings::default());
        assert!(matches!(renderer.render_frame(), Err(FrameError::NotConfigured)));
    }

    #[test]
    fn render_before_resize_fails() {
        let mut renderer = Renderer::new(HeadlessBackend::new(), RendererSettings::default());
        renderer.configure(1, 1).unwrap();
        assert!(matches!(renderer.render_frame(), Err(FrameError::NoOutputSize)));
    }

    #[test]
    fn missing_drawable_skips_the_frame() {
        let mut renderer = configured(1, 1);
        renderer.backend_mut().withhold_drawables(1);
        assert_eq!(renderer.render_frame().unwrap(), FrameOutcome::Skipped);
        assert_eq!(renderer.render_frame().unwrap(), FrameOutcome::Presented);
        assert_eq!(renderer.backend().frames_presented(), 1);
        assert_eq!(renderer.backend().frames_skipped(), 1);
    }

    #[test]
    fn undersized_ring_is_widened() {
        let renderer = Renderer::new(
            HeadlessBackend::new(),
            RendererSettings {
                ring_size: 1,
                ..RendererSettings::default()
            },
        );
        assert_eq!(renderer.ring_size(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn out_of_range_quad_panics_in_debug() {
        let mut renderer = configured(1, 1);
        renderer.begin_updating_quads();
        renderer.update_quad(&corners(0.0), 0, 1);
    }
}
