use crate::composition::config::CompositionConfig;
use crate::foundation::core::{Canvas, PixelRect, Point, Rect};

/// Corner radius of the sketch card.
pub const SKETCH_CORNER_RADIUS: f64 = 8.0;
/// Corner radius of the inset video.
pub const VIDEO_CORNER_RADIUS: f64 = 20.0;
/// Name line font size in pixels.
pub const NAME_FONT_PX: f32 = 28.0;
/// Age line font size in pixels.
pub const AGE_FONT_PX: f32 = 20.0;
/// Vertical distance from the age baseline up to the name baseline.
pub const NAME_LINE_OFFSET: f64 = 30.0;
/// Placeholder label font size in pixels.
pub const PLACEHOLDER_FONT_PX: f32 = 24.0;

/// Every pixel-space decision derived from a [`CompositionConfig`].
///
/// Both the live compositor and the server filter graph read from this value, so the two paths
/// never re-derive geometry on their own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedLayout {
    /// Output canvas.
    pub canvas: Canvas,
    /// Sketch card rectangle.
    pub sketch: PixelRect,
    /// Inset-video rectangle.
    pub video: PixelRect,
    /// Sketch card corner radius.
    pub sketch_radius: f64,
    /// Inset-video corner radius.
    pub video_radius: f64,
    /// Left-aligned baseline origin of the name line.
    pub name_baseline: Point,
    /// Left-aligned baseline origin of the age line.
    pub age_baseline: Point,
    /// Name font size.
    pub name_font_px: f32,
    /// Age font size.
    pub age_font_px: f32,
}

/// Resolve a config into rectangles, baselines and radii.
///
/// Pure and deterministic: equal configs always produce equal layouts.
pub fn resolve_layout(cfg: &CompositionConfig) -> ResolvedLayout {
    let anchor = Point::new(cfg.text_position.x as f64, cfg.text_position.y as f64);
    ResolvedLayout {
        canvas: cfg.canvas,
        sketch: cfg.sketch_rect(),
        video: cfg.video_rect(),
        sketch_radius: SKETCH_CORNER_RADIUS,
        video_radius: VIDEO_CORNER_RADIUS,
        name_baseline: Point::new(anchor.x, anchor.y - NAME_LINE_OFFSET),
        age_baseline: anchor,
        name_font_px: NAME_FONT_PX,
        age_font_px: AGE_FONT_PX,
    }
}

/// Letterbox an `image_w`x`image_h` image into `target`, preserving its aspect ratio.
///
/// Wider images span the full target width and are centered vertically; taller (or equal)
/// images span the full height and are centered horizontally. Degenerate inputs return the
/// target unchanged.
pub fn fit_rect(image_w: u32, image_h: u32, target: Rect) -> Rect {
    let (tw, th) = (target.width(), target.height());
    if image_w == 0 || image_h == 0 || tw <= 0.0 || th <= 0.0 {
        return target;
    }
    let image_aspect = f64::from(image_w) / f64::from(image_h);
    let target_aspect = tw / th;

    if image_aspect > target_aspect {
        let h = tw / image_aspect;
        let y = target.y0 + (th - h) / 2.0;
        Rect::new(target.x0, y, target.x1, y + h)
    } else {
        let w = th * image_aspect;
        let x = target.x0 + (tw - w) / 2.0;
        Rect::new(x, target.y0, x + w, target.y1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/engine.rs"]
mod tests;
