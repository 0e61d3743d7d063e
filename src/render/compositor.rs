use crate::assets::AssetSet;
use crate::assets::decode::PreparedImage;
use crate::composition::config::CompositionConfig;
use crate::foundation::core::{Rect, Rgba8Premul, Vec2};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::layout::engine::{PLACEHOLDER_FONT_PX, ResolvedLayout, fit_rect};
use crate::render::surface::{DrawSurface, Shadow, Shape, TextAlign, TextRun};

/// Text shown over the gradient when no background is available.
pub const PLACEHOLDER_TEXT: &str = "Upload Monster Video";

pub(crate) const SKETCH_BORDER_WIDTH: f64 = 3.0;
pub(crate) const SKETCH_INNER_BORDER_WIDTH: f64 = 2.0;
pub(crate) const TEXT_STROKE_WIDTH: f64 = 2.0;
pub(crate) const SHADOW_BLUR: f64 = 10.0;
pub(crate) const SHADOW_OFFSET: (f64, f64) = (2.0, 2.0);
pub(crate) const SHADOW_ALPHA: f32 = 0.3;

/// Fixed palette of the composition.
pub mod palette {
    use crate::foundation::core::Rgba8Premul;

    /// Canvas clear color `#1a1a1a`.
    pub const BACKGROUND: Rgba8Premul = Rgba8Premul {
        r: 0x1a,
        g: 0x1a,
        b: 0x1a,
        a: 255,
    };
    /// Placeholder gradient top `#667eea`.
    pub const GRADIENT_TOP: Rgba8Premul = Rgba8Premul {
        r: 0x66,
        g: 0x7e,
        b: 0xea,
        a: 255,
    };
    /// Placeholder gradient bottom `#764ba2`.
    pub const GRADIENT_BOTTOM: Rgba8Premul = Rgba8Premul {
        r: 0x76,
        g: 0x4b,
        b: 0xa2,
        a: 255,
    };
    /// Opaque white.
    pub const WHITE: Rgba8Premul = Rgba8Premul {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
    /// Opaque black.
    pub const BLACK: Rgba8Premul = Rgba8Premul {
        r: 0,
        g: 0,
        b: 0,
        a: 255,
    };
}

/// Render one frame at presentation time `t_secs`.
///
/// Layers, back to front: background (template, motion or placeholder), inset motion (only over
/// a template), sketch card, label. Missing or undecodable optional inputs degrade their layer
/// and never fail the frame; a zero-sized surface does.
#[tracing::instrument(level = "trace", skip_all, fields(t = t_secs))]
pub fn render_frame(
    surface: &mut dyn DrawSurface,
    config: &CompositionConfig,
    assets: &mut AssetSet,
    layout: &ResolvedLayout,
    t_secs: f64,
) -> ComposerResult<()> {
    let (w, h) = (surface.width(), surface.height());
    if w == 0 || h == 0 {
        return Err(ComposerError::validation(format!(
            "cannot render into a {w}x{h} surface"
        )));
    }
    let full = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));

    surface.clear(palette::BACKGROUND)?;
    let motion = sample_motion(assets, t_secs);

    match (&assets.template, &motion) {
        (Some(template), _) => surface.draw_image(template, full)?,
        (None, Some(frame)) => surface.draw_image(frame, full)?,
        (None, None) => draw_placeholder(surface, full)?,
    }

    if assets.template.is_some()
        && let Some(frame) = &motion
    {
        let inset = Shape::rounded(layout.video.to_rect(), layout.video_radius).for_surface(&*surface);
        surface.push_clip(inset)?;
        surface.draw_image(frame, layout.video.to_rect())?;
        surface.pop_clip()?;
    }

    if let Some(sketch) = &assets.sketch {
        draw_sketch(surface, sketch, layout)?;
    }

    draw_label(surface, config, layout)
}

fn sample_motion(assets: &mut AssetSet, t_secs: f64) -> Option<PreparedImage> {
    let motion = assets.motion.as_mut()?;
    if !motion.is_playing() {
        return None;
    }
    match motion.frame_at(t_secs) {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(error = %err, t = t_secs, "motion frame unavailable; layer skipped");
            None
        }
    }
}

fn draw_placeholder(surface: &mut dyn DrawSurface, full: Rect) -> ComposerResult<()> {
    surface.fill_vertical_gradient(full, palette::GRADIENT_TOP, palette::GRADIENT_BOTTOM)?;
    let run = TextRun {
        text: PLACEHOLDER_TEXT,
        origin: full.center(),
        font_px: PLACEHOLDER_FONT_PX,
        align: TextAlign::Center,
        bold: false,
    };
    surface.fill_text(&run, Rgba8Premul::from_rgb_alpha(255, 255, 255, 0.3))
}

fn draw_sketch(
    surface: &mut dyn DrawSurface,
    sketch: &PreparedImage,
    layout: &ResolvedLayout,
) -> ComposerResult<()> {
    let rect = layout.sketch.to_rect();
    let card = Shape::rounded(rect, layout.sketch_radius).for_surface(&*surface);

    surface.push_clip(card)?;
    surface.fill_shape(card, palette::WHITE)?;
    surface.draw_image(sketch, fit_rect(sketch.width, sketch.height, rect))?;
    surface.pop_clip()?;

    surface.stroke_shape(card, palette::WHITE, SKETCH_BORDER_WIDTH, None)?;
    let shadow = Shadow {
        color: Rgba8Premul::from_rgb_alpha(0, 0, 0, SHADOW_ALPHA),
        blur: SHADOW_BLUR,
        offset: Vec2::new(SHADOW_OFFSET.0, SHADOW_OFFSET.1),
    };
    surface.stroke_shape(
        card,
        Rgba8Premul::from_rgb_alpha(255, 255, 255, 0.8),
        SKETCH_INNER_BORDER_WIDTH,
        Some(shadow),
    )
}

fn draw_label(
    surface: &mut dyn DrawSurface,
    config: &CompositionConfig,
    layout: &ResolvedLayout,
) -> ComposerResult<()> {
    let age = config.label.age_line();
    let lines = [
        (config.label.name.as_str(), layout.name_baseline, layout.name_font_px),
        (age.as_str(), layout.age_baseline, layout.age_font_px),
    ];
    for (text, origin, font_px) in lines {
        let run = TextRun {
            text,
            origin,
            font_px,
            align: TextAlign::Left,
            bold: true,
        };
        surface.stroke_text(&run, palette::BLACK, TEXT_STROKE_WIDTH)?;
        surface.fill_text(&run, palette::WHITE)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
