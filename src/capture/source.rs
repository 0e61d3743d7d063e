use crate::assets::AssetSet;
use crate::composition::config::CompositionConfig;
use crate::foundation::error::ComposerResult;
use crate::layout::engine::{ResolvedLayout, resolve_layout};
use crate::render::compositor::render_frame;
use crate::render::cpu::CpuSurface;
use crate::render::frame::FrameRGBA;

/// Producer of owned frames for a capture stream.
pub trait FrameSource: Send {
    /// Frame size in pixels.
    fn dimensions(&self) -> (u32, u32);
    /// Render the frame presented at `t_secs` and copy it out.
    fn frame_at(&mut self, t_secs: f64) -> ComposerResult<FrameRGBA>;
}

/// Runs the compositor into a [`CpuSurface`] on every tick.
pub struct CompositorSource {
    surface: CpuSurface,
    config: CompositionConfig,
    layout: ResolvedLayout,
    assets: AssetSet,
}

impl CompositorSource {
    /// Validate `config` and size a surface for its canvas, using an installed font for labels.
    pub fn new(config: CompositionConfig, assets: AssetSet) -> ComposerResult<Self> {
        config.validate()?;
        let surface =
            CpuSurface::new(config.canvas.width, config.canvas.height)?.with_system_font(None);
        Ok(Self::with_surface(surface, config, assets))
    }

    /// Use a prepared surface (for example one with a font attached).
    pub fn with_surface(surface: CpuSurface, config: CompositionConfig, assets: AssetSet) -> Self {
        let layout = resolve_layout(&config);
        Self {
            surface,
            config,
            layout,
            assets,
        }
    }
}

impl FrameSource for CompositorSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.config.canvas.width, self.config.canvas.height)
    }

    fn frame_at(&mut self, t_secs: f64) -> ComposerResult<FrameRGBA> {
        render_frame(
            &mut self.surface,
            &self.config,
            &mut self.assets,
            &self.layout,
            t_secs,
        )?;
        self.surface.finish_frame()
    }
}
