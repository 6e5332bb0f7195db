//! wgpu backend.
//!
//! - `context` owns the instance, adapter, device and window surface.
//! - `pipeline` builds the textured-quad pipeline and its bind group layouts.
//! - `state` implements [`crate::RenderBackend`] on top of both: a ring of
//!   vertex buffers, a uniform buffer, a shared UV buffer and one texture
//!   per glyph.

mod context;
mod pipeline;
mod state;

pub use state::{GlyphTexture, GpuState};
