//! Renderer crate for Dancing Glyphs.
//!
//! Draws many independently moving, textured quads per frame. The overall
//! flow is:
//!
//! ```text
//!   dancing-glyphs (CLI)
//!          │ HostConfig / ViewSettings
//!          ▼
//!   GlyphView ──▶ Sprite::move_to ──▶ Sprite::corners
//!          │                                 │
//!          ▼                                 ▼
//!   Renderer::begin_updating_quads ─▶ update_quad ─▶ finish_updating_quads
//!          │
//!          └─▶ render_frame ─▶ RenderBackend::draw_frame (GpuState | HeadlessBackend)
//! ```
//!
//! [`Renderer`] owns the frame protocol and the CPU side of the vertex ring;
//! a [`RenderBackend`] owns the device resources. [`GpuState`] draws through
//! `wgpu` into a `winit` window, [`HeadlessBackend`] keeps everything in
//! memory for tests and `--headless` runs.

mod backend;
mod glyphs;
mod gpu;
mod headless;
mod quad;
mod ring;
mod runtime;
mod statistics;
mod types;
mod uniforms;
mod view;
mod window;

pub use backend::{FrameDraw, FrameError, FrameOutcome, RenderBackend, ResourcePlan};
pub use glyphs::{glyph_set, BoxedGlyph, Glyph, Palette, Shape, ShapeGlyph};
pub use gpu::{GlyphTexture, GpuState};
pub use headless::{FrameRecord, HeadlessBackend, HeadlessTexture};
pub use quad::{
    FramePhase, QuadCorners, Renderer, FLOATS_PER_QUAD, FLOATS_PER_VERTEX, QUAD_STRIDE_BYTES,
    TEXTURE_COORDS, VERTICES_PER_QUAD,
};
pub use ring::BufferRing;
pub use runtime::{
    time_source_for, BoxedTimeSource, ClockMode, FixedTimeSource, SteppedTimeSource,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use statistics::{FrameReport, FrameStatistics};
pub use types::{
    Bitmap, ClearColor, GpuOptions, GpuPowerPreference, OutputSize, RendererSettings,
    WindowOptions,
};
pub use uniforms::QuadUniforms;
pub use view::{GlyphView, ViewSettings};
pub use window::{run_window, HostConfig};
