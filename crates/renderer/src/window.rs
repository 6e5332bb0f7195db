use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::backend::FrameOutcome;
use crate::glyphs::BoxedGlyph;
use crate::gpu::GpuState;
use crate::quad::Renderer;
use crate::runtime::{time_source_for, ClockMode};
use crate::types::{GpuOptions, OutputSize, RendererSettings, WindowOptions};
use crate::view::{GlyphView, ViewSettings};

/// Everything needed to open the animation in a desktop window.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub window: WindowOptions,
    pub renderer: RendererSettings,
    pub gpu: GpuOptions,
    pub view: ViewSettings,
}

struct HostState {
    // Declared before `window` so the surface is dropped first.
    view: GlyphView<GpuState>,
    window: Arc<Window>,
}

impl HostState {
    fn new(window: Arc<Window>, config: &HostConfig, glyphs: Vec<BoxedGlyph>) -> Result<Self> {
        let size = output_size(window.inner_size());
        let gpu = GpuState::new(window.as_ref(), size, config.gpu)
            .context("failed to initialise GPU renderer")?;
        if gpu.adapter_profile().is_software() {
            warn!("running on a software rasterizer; expect a low frame rate");
        }
        let renderer = Renderer::new(gpu, config.renderer);
        let mut view = GlyphView::new(
            renderer,
            glyphs,
            config.view,
            time_source_for(ClockMode::Realtime),
        )?;
        view.resize(size)?;
        view.start()?;
        Ok(Self { view, window })
    }
}

fn output_size(size: PhysicalSize<u32>) -> OutputSize {
    OutputSize::new(size.width, size.height)
}

fn is_exit_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && matches!(event.logical_key, Key::Named(NamedKey::Escape))
}

/// Opens a window and animates until it is closed or Escape is pressed.
pub fn run_window(config: HostConfig, glyphs: Vec<BoxedGlyph>) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.window.size;
    let mut builder = WindowBuilder::new()
        .with_title(config.window.title.clone())
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)));
    if config.window.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = Arc::new(
        builder
            .build(&event_loop)
            .map_err(|err| anyhow!("failed to create window: {err}"))?,
    );

    let mut state = HostState::new(Arc::clone(&window), &config, glyphs)?;
    info!(
        width = window.inner_size().width,
        height = window.inner_size().height,
        fullscreen = config.window.fullscreen,
        "window opened"
    );
    state.window.request_redraw();

    let mut fatal: Option<anyhow::Error> = None;
    let run_result = event_loop.run(|event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::WindowEvent { window_id, event } if window_id == state.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        state.view.stop();
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } if is_exit_key(&event) => {
                        state.view.stop();
                        elwt.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(err) = state.view.resize(output_size(new_size)) {
                            error!(error = %err, "failed to resize");
                            fatal = Some(err);
                            elwt.exit();
                        }
                    }
                    WindowEvent::RedrawRequested => match state.view.render_one_frame() {
                        Ok(FrameOutcome::Presented | FrameOutcome::Skipped) => {}
                        Err(err) => {
                            error!(error = %err, "frame failed; closing");
                            state.view.stop();
                            fatal = Some(err);
                            elwt.exit();
                        }
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                if state.view.is_animating() {
                    state.window.request_redraw();
                }
            }
            Event::LoopExiting => {
                state.view.stop();
            }
            _ => {}
        }
    });

    if let Err(err) = run_result {
        return Err(anyhow!("window event loop error: {err}"));
    }
    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
