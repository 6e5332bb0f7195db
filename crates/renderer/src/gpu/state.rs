use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;

use crate::backend::{FrameDraw, FrameError, FrameOutcome, RenderBackend, ResourcePlan};
use crate::quad::{QUAD_STRIDE_BYTES, TEXTURE_COORDS, VERTICES_PER_QUAD};
use crate::types::{Bitmap, GpuOptions, OutputSize};
use crate::uniforms::QuadUniforms;

use super::context::{AdapterProfile, GpuContext};
use super::pipeline::QuadPipeline;

/// A glyph texture and the bind group that samples it. Dropping it releases
/// both.
pub struct GlyphTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// wgpu implementation of [`RenderBackend`] drawing into a window surface.
pub struct GpuState {
    context: GpuContext,
    pipeline: QuadPipeline,
    options: GpuOptions,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uv_buffer: wgpu::Buffer,
    vertex_buffers: Vec<wgpu::Buffer>,
}

impl GpuState {
    pub fn new<T>(target: &T, size: OutputSize, options: GpuOptions) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, size, options.power)?;
        let pipeline = QuadPipeline::new(&context.device, context.surface_format);

        let uniform_buffer =
            context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("quad uniforms"),
                    contents: bytemuck::bytes_of(&QuadUniforms::default()),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
        let uniform_bind_group = pipeline.uniform_bind_group(&context.device, &uniform_buffer);
        let uv_buffer = context
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad texture coordinates"),
                contents: bytemuck::cast_slice(&TEXTURE_COORDS),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        if options.wait_for_gpu {
            debug!("waiting for the GPU after every frame");
        }

        Ok(Self {
            context,
            pipeline,
            options,
            uniform_buffer,
            uniform_bind_group,
            uv_buffer,
            vertex_buffers: Vec::new(),
        })
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    fn encode(
        &self,
        view: &wgpu::TextureView,
        frame: &FrameDraw<'_, GlyphTexture>,
    ) -> wgpu::CommandBuffer {
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("quad encoder"),
                });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quad pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(frame.background.into()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(vertices) = self.vertex_buffers.get(frame.slot) {
                render_pass.set_pipeline(&self.pipeline.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_vertex_buffer(1, self.uv_buffer.slice(..));

                for (index, texture) in frame.quads() {
                    let Some(texture) = texture else {
                        continue;
                    };
                    let start = index as u64 * QUAD_STRIDE_BYTES;
                    let quad = vertices.slice(start..start + QUAD_STRIDE_BYTES);
                    render_pass.set_vertex_buffer(0, quad);
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    render_pass.draw(0..VERTICES_PER_QUAD as u32, 0..1);
                }
            }
        }
        encoder.finish()
    }
}

impl RenderBackend for GpuState {
    type Texture = GlyphTexture;

    fn allocate(&mut self, plan: &ResourcePlan) -> Result<()> {
        let size = plan.vertex_buffer_bytes.max(QUAD_STRIDE_BYTES);
        let max = self.context.device.limits().max_buffer_size;
        if size > max {
            anyhow::bail!("vertex buffer of {size} bytes exceeds the device limit of {max}");
        }
        self.vertex_buffers = (0..plan.ring_size)
            .map(|slot| {
                self.context.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("quad vertices {slot}")),
                    size,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();
        debug!(
            ring_size = plan.ring_size,
            bytes_per_buffer = size,
            "allocated vertex ring"
        );
        Ok(())
    }

    fn resize_output(&mut self, size: OutputSize) {
        self.context.resize(size);
    }

    fn write_uniforms(&mut self, uniforms: &QuadUniforms) {
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    fn write_texture_coords(&mut self, coords: &[f32]) {
        self.context
            .queue
            .write_buffer(&self.uv_buffer, 0, bytemuck::cast_slice(coords));
    }

    fn write_vertices(&mut self, slot: usize, byte_offset: u64, vertices: &[f32]) {
        let Some(buffer) = self.vertex_buffers.get(slot) else {
            warn!(slot, "vertex write to an unallocated ring slot");
            return;
        };
        self.context
            .queue
            .write_buffer(buffer, byte_offset, bytemuck::cast_slice(vertices));
    }

    fn create_texture(&mut self, index: usize, bitmap: &Bitmap) -> Result<GlyphTexture> {
        let max = self.context.device.limits().max_texture_dimension_2d;
        if bitmap.width() > max || bitmap.height() > max {
            anyhow::bail!(
                "glyph {index} bitmap is {}x{}, the device allows at most {max}",
                bitmap.width(),
                bitmap.height()
            );
        }
        let extent = wgpu::Extent3d {
            width: bitmap.width(),
            height: bitmap.height(),
            depth_or_array_layers: 1,
        };
        let texture = self
            .context
            .device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("glyph {index}")),
                size: extent,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
        self.context.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bitmap.pixels(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bitmap.bytes_per_row()),
                rows_per_image: Some(bitmap.height()),
            },
            extent,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.pipeline.texture_bind_group(&self.context.device, &view);
        Ok(GlyphTexture {
            _texture: texture,
            bind_group,
        })
    }

    fn draw_frame(
        &mut self,
        frame: &FrameDraw<'_, GlyphTexture>,
    ) -> Result<FrameOutcome, FrameError> {
        let surface_texture = match self.context.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost or outdated; reconfiguring");
                self.context.reconfigure();
                return Ok(FrameOutcome::Skipped);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(err) => {
                debug!(error = %err, "no drawable this frame");
                return Ok(FrameOutcome::Skipped);
            }
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let commands = self.encode(&view, frame);
        let submission = self.context.queue.submit(std::iter::once(commands));
        surface_texture.present();

        if self.options.wait_for_gpu {
            if let Err(err) = self
                .context
                .device
                .poll(wgpu::PollType::WaitForSubmissionIndex(submission))
            {
                warn!(error = %err, "waiting for the GPU failed");
            }
        }
        Ok(FrameOutcome::Presented)
    }
}
