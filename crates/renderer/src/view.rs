//! Animation driver: owns the sprites and glyphs and feeds the renderer one
//! frame at a time.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use motion::{Sprite, Wave};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::backend::{FrameError, FrameOutcome, RenderBackend};
use crate::glyphs::BoxedGlyph;
use crate::quad::Renderer;
use crate::runtime::BoxedTimeSource;
use crate::statistics::FrameStatistics;
use crate::types::OutputSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSettings {
    pub sprite_count: usize,
    /// Largest sprite edge as a fraction of the viewport's shorter side.
    pub glyph_size: f32,
    pub wave: Wave,
    /// Multiplier applied to sampled time (the preview speed-up).
    pub time_scale: f64,
    /// RNG seed for sprite creation; `None` draws from system entropy.
    pub seed: Option<u64>,
    pub stats_interval: Duration,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            sprite_count: 150,
            glyph_size: 0.08,
            wave: Wave::default(),
            time_scale: 1.0,
            seed: None,
            stats_interval: Duration::from_secs(5),
        }
    }
}

pub struct GlyphView<B: RenderBackend> {
    renderer: Renderer<B>,
    glyphs: Vec<BoxedGlyph>,
    settings: ViewSettings,
    /// `settings.wave` adjusted to the current aspect ratio.
    wave: Wave,
    sprites: Vec<Sprite>,
    clock: BoxedTimeSource,
    stats: FrameStatistics,
    animating: bool,
    texture_size: Option<u32>,
}

impl<B: RenderBackend> GlyphView<B> {
    pub fn new(
        mut renderer: Renderer<B>,
        glyphs: Vec<BoxedGlyph>,
        settings: ViewSettings,
        clock: BoxedTimeSource,
    ) -> Result<Self> {
        renderer
            .configure(glyphs.len(), settings.sprite_count)
            .context("failed to allocate renderer resources")?;
        Ok(Self {
            renderer,
            glyphs,
            wave: settings.wave,
            stats: FrameStatistics::new(settings.stats_interval, Instant::now()),
            settings,
            sprites: Vec::new(),
            clock,
            animating: false,
            texture_size: None,
        })
    }

    /// Adopts a new output size: projection, glyph textures and the wave's
    /// aspect ratio all follow it.
    pub fn resize(&mut self, size: OutputSize) -> Result<()> {
        if size.is_empty() {
            debug!(?size, "ignoring resize to an empty surface");
            return Ok(());
        }
        self.renderer.set_output_size(size);
        self.wave = self.settings.wave.with_aspect_ratio(size.aspect_ratio());
        for sprite in &mut self.sprites {
            sprite.retarget(self.wave);
        }
        self.regenerate_textures()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.settings.sprite_count > 0 && self.glyphs.is_empty() {
            anyhow::bail!(
                "cannot animate {} sprites without any glyphs",
                self.settings.sprite_count
            );
        }
        self.regenerate_textures()?;

        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut sprites = self.wave.make_sprites(
            self.settings.sprite_count,
            self.glyphs.len(),
            self.settings.glyph_size,
            &mut rng,
        );
        sprites.sort_by(|a, b| b.glyph().cmp(&a.glyph()));
        self.sprites = sprites;

        self.clock.reset();
        self.stats.reset(Instant::now());
        self.animating = true;
        info!(
            sprites = self.sprites.len(),
            glyphs = self.glyphs.len(),
            wave = self.wave.name(),
            seed = ?self.settings.seed,
            "animation started"
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.animating {
            info!(frames = self.renderer.frame_number(), "animation stopped");
        }
        self.animating = false;
        self.sprites = Vec::new();
        self.stats.reset(Instant::now());
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Moves every sprite to the current time and draws them. A stopped view
    /// draws the background only.
    pub fn render_one_frame(&mut self) -> Result<FrameOutcome> {
        let Some(size) = self.renderer.output_size() else {
            return Err(FrameError::NoOutputSize.into());
        };
        self.stats.frame_will_start(Instant::now());

        self.renderer.begin_updating_quads();
        if self.animating {
            let sample = self.clock.sample();
            let time = sample.seconds * self.settings.time_scale;
            let viewport = size.as_vector();
            for (index, sprite) in self.sprites.iter_mut().enumerate() {
                sprite.move_to(time);
                self.renderer
                    .update_quad(&sprite.corners(viewport), sprite.glyph(), index);
            }
        }
        self.renderer.finish_updating_quads();

        let outcome = self.renderer.render_frame()?;
        match outcome {
            FrameOutcome::Presented => {
                if let Some(report) = self.stats.frame_did_finish(Instant::now()) {
                    info!(
                        frames = report.frames,
                        average_ms = report.average.as_secs_f64() * 1000.0,
                        max_ms = report.max.as_secs_f64() * 1000.0,
                        fps = report.fps,
                        "frame statistics"
                    );
                }
            }
            FrameOutcome::Skipped => {
                debug!(frame = self.renderer.frame_number(), "no drawable, frame skipped");
            }
        }
        Ok(outcome)
    }

    fn regenerate_textures(&mut self) -> Result<()> {
        let Some(size) = self.renderer.output_size() else {
            return Ok(());
        };
        let shorter = size.shorter_side() as f32;
        let pixels = ((shorter * self.settings.glyph_size).floor() as u32).max(1);
        for (index, glyph) in self.glyphs.iter().enumerate() {
            let bitmap = glyph.make_bitmap(pixels);
            self.renderer
                .set_texture(&bitmap, index)
                .with_context(|| format!("failed to upload texture for glyph {}", glyph.name()))?;
        }
        self.texture_size = Some(pixels);
        debug!(pixels, glyphs = self.glyphs.len(), "glyph textures regenerated");
        Ok(())
    }

    /// Edge length of the current glyph textures in pixels.
    pub fn texture_size(&self) -> Option<u32> {
        self.texture_size
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn wave(&self) -> &Wave {
        &self.wave
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &Renderer<B> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer<B> {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyphs::{glyph_set, Palette, Shape};
    use crate::headless::HeadlessBackend;
    use crate::quad::FLOATS_PER_QUAD;
    use crate::runtime::{time_source_for, ClockMode};
    use crate::types::RendererSettings;

    fn view(glyphs: &[Shape], sprite_count: usize, seed: u64) -> GlyphView<HeadlessBackend> {
        let renderer = Renderer::new(HeadlessBackend::new(), RendererSettings::default());
        let settings = ViewSettings {
            sprite_count,
            seed: Some(seed),
            ..ViewSettings::default()
        };
        let clock = time_source_for(ClockMode::Stepped {
            step: Duration::from_millis(500),
        });
        GlyphView::new(renderer, glyph_set(glyphs, &Palette::dark()), settings, clock).unwrap()
    }

    #[test]
    fn animates_three_sprites_from_two_glyphs() {
        let mut view = view(&[Shape::Disc, Shape::Square], 3, 7);
        view.resize(OutputSize::new(800, 600)).unwrap();
        view.start().unwrap();
        assert_eq!(view.sprites().len(), 3);
        assert_eq!(view.texture_size(), Some(48));

        for _ in 0..3 {
            assert_eq!(view.render_one_frame().unwrap(), FrameOutcome::Presented);
            for sprite in view.sprites() {
                let pos = sprite.pos();
                assert!((0.0..=1.0).contains(&pos.x) && (0.0..=1.0).contains(&pos.y));
            }
        }

        let frame = view.renderer().backend().last_frame().unwrap().clone();
        let glyphs: Vec<Option<usize>> =
            view.sprites().iter().map(|sprite| Some(sprite.glyph())).collect();
        assert_eq!(frame.quad_textures, glyphs);
        assert_eq!(frame.vertices.len(), 3 * FLOATS_PER_QUAD);

        let viewport = OutputSize::new(800, 600).as_vector();
        for (index, sprite) in view.sprites().iter().enumerate() {
            let [a, ..] = sprite.corners(viewport);
            let quad = &frame.vertices[index * FLOATS_PER_QUAD..];
            assert_eq!((quad[0], quad[1]), (a.x, a.y));
        }
    }

    #[test]
    fn sprites_are_sorted_by_descending_glyph() {
        let mut view = view(&Shape::ALL, 40, 3);
        view.resize(OutputSize::new(640, 480)).unwrap();
        view.start().unwrap();
        let glyphs: Vec<usize> = view.sprites().iter().map(Sprite::glyph).collect();
        assert!(glyphs.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn same_seed_gives_the_same_frame() {
        let frames: Vec<Vec<f32>> = (0..2)
            .map(|_| {
                let mut view = view(&Shape::ALL, 20, 99);
                view.resize(OutputSize::new(1024, 768)).unwrap();
                view.start().unwrap();
                view.render_one_frame().unwrap();
                view.render_one_frame().unwrap();
                view.renderer().backend().last_frame().unwrap().vertices.clone()
            })
            .collect();
        assert_eq!(frames[0], frames[1]);
    }

    #[test]
    fn zero_sprites_only_clears() {
        let mut view = view(&[Shape::Disc], 0, 1);
        view.resize(OutputSize::new(320, 200)).unwrap();
        view.start().unwrap();
        view.render_one_frame().unwrap();
        assert!(view.renderer().backend().last_frame().unwrap().quad_textures.is_empty());
    }

    #[test]
    fn stopped_view_only_clears() {
        let mut view = view(&[Shape::Disc], 5, 1);
        view.resize(OutputSize::new(320, 200)).unwrap();
        view.start().unwrap();
        view.stop();
        assert!(!view.is_animating());
        assert!(view.sprites().is_empty());
        view.render_one_frame().unwrap();
        assert!(view.renderer().backend().last_frame().unwrap().quad_textures.is_empty());
    }

    #[test]
    fn start_without_glyphs_fails() {
        let mut view = view(&[], 5, 1);
        view.resize(OutputSize::new(320, 200)).unwrap();
        assert!(view.start().is_err());
    }

    #[test]
    fn render_before_resize_fails() {
        let mut view = view(&[Shape::Disc], 1, 1);
        view.start().unwrap();
        assert!(view.render_one_frame().is_err());
    }

    #[test]
    fn resize_regenerates_textures_without_leaking() {
        let mut view = view(&[Shape::Disc, Shape::Ring], 4, 5);
        view.resize(OutputSize::new(800, 600)).unwrap();
        view.start().unwrap();
        for (width, height) in [(1920, 1080), (300, 900), (1, 1), (2560, 1440)] {
            view.resize(OutputSize::new(width, height)).unwrap();
            view.render_one_frame().unwrap();
        }
        let backend = view.renderer().backend();
        assert_eq!(backend.live_textures(), 2);
        assert_eq!(view.texture_size(), Some(115));
        assert_eq!(backend.texture_size(1), Some((115, 115)));
    }

    #[test]
    fn resize_to_one_pixel_keeps_textures_non_empty() {
        let mut view = view(&[Shape::Disc], 1, 5);
        view.resize(OutputSize::new(1, 1)).unwrap();
        assert_eq!(view.texture_size(), Some(1));
    }

    #[test]
    fn resize_retargets_waves_to_the_new_aspect_ratio() {
        let mut view = view(&[Shape::Disc], 3, 5);
        view.resize(OutputSize::new(800, 600)).unwrap();
        view.start().unwrap();
        view.resize(OutputSize::new(600, 800)).unwrap();
        let expected = Wave::default().with_aspect_ratio(0.75);
        assert_eq!(view.wave(), &expected);
        assert!(view.sprites().iter().all(|sprite| sprite.wave() == &expected));
    }

    #[test]
    fn skipped_frames_are_reported() {
        let mut view = view(&[Shape::Disc], 2, 5);
        view.resize(OutputSize::new(800, 600)).unwrap();
        view.start().unwrap();
        view.renderer_mut().backend_mut().withhold_drawables(2);
        assert_eq!(view.render_one_frame().unwrap(), FrameOutcome::Skipped);
        assert_eq!(view.render_one_frame().unwrap(), FrameOutcome::Skipped);
        assert_eq!(view.render_one_frame().unwrap(), FrameOutcome::Presented);
    }
}
