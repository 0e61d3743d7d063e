use kurbo::Shape as _;

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Point, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::ComposerResult;

/// Tolerance used when flattening curves into paths.
pub(crate) const PATH_TOLERANCE: f64 = 0.1;

/// Geometry accepted by [`DrawSurface`] fill, stroke and clip operations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Rectangle with uniformly rounded corners.
    RoundRect {
        /// Outer bounds.
        rect: Rect,
        /// Corner radius in pixels.
        radius: f64,
    },
}

impl Shape {
    /// Rounded rectangle helper.
    pub fn rounded(rect: Rect, radius: f64) -> Self {
        Self::RoundRect { rect, radius }
    }

    /// Outer bounds of the shape.
    pub fn bounds(&self) -> Rect {
        match *self {
            Self::Rect(r) | Self::RoundRect { rect: r, .. } => r,
        }
    }

    /// Plain-rectangle fallback for surfaces without native rounded rectangles.
    pub fn degrade(self) -> Self {
        Self::Rect(self.bounds())
    }

    /// Shape adapted to what `surface` can draw.
    pub fn for_surface(self, surface: &dyn DrawSurface) -> Self {
        match self {
            Self::RoundRect { .. } if !surface.supports_round_rect() => self.degrade(),
            other => other,
        }
    }

    /// Flatten into a path.
    pub fn to_path(&self) -> kurbo::BezPath {
        match *self {
            Self::Rect(r) => r.to_path(PATH_TOLERANCE),
            Self::RoundRect { rect, radius } => {
                kurbo::RoundedRect::from_rect(rect, radius).to_path(PATH_TOLERANCE)
            }
        }
    }
}

/// Drop shadow drawn beneath a stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shadow {
    /// Shadow color.
    pub color: Rgba8Premul,
    /// Canvas-style blur amount (Gaussian sigma is half of it).
    pub blur: f64,
    /// Offset from the stroked geometry.
    pub offset: Vec2,
}

/// Horizontal text alignment relative to the run origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    /// Origin is the left edge.
    Left,
    /// Origin is the horizontal center.
    Center,
}

/// One line of text positioned by its baseline.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun<'a> {
    /// Text content (single line).
    pub text: &'a str,
    /// Baseline origin.
    pub origin: Point,
    /// Font size in pixels.
    pub font_px: f32,
    /// Alignment relative to `origin.x`.
    pub align: TextAlign,
    /// Request a bold weight.
    pub bold: bool,
}

/// Minimal 2D drawing surface the frame compositor renders into.
///
/// Colors are premultiplied. Clips nest and must be balanced within a frame.
pub trait DrawSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;

    /// Surface height in pixels.
    fn height(&self) -> u32;

    /// Whether [`Shape::RoundRect`] is drawn natively.
    fn supports_round_rect(&self) -> bool {
        false
    }

    /// Discard all content and fill the surface with `color`.
    fn clear(&mut self, color: Rgba8Premul) -> ComposerResult<()>;

    /// Fill a shape with a solid color.
    fn fill_shape(&mut self, shape: Shape, color: Rgba8Premul) -> ComposerResult<()>;

    /// Fill `rect` with a top-to-bottom linear gradient.
    fn fill_vertical_gradient(
        &mut self,
        rect: Rect,
        top: Rgba8Premul,
        bottom: Rgba8Premul,
    ) -> ComposerResult<()>;

    /// Draw `image` stretched to `dest`.
    fn draw_image(&mut self, image: &PreparedImage, dest: Rect) -> ComposerResult<()>;

    /// Restrict subsequent drawing to `shape`.
    fn push_clip(&mut self, shape: Shape) -> ComposerResult<()>;

    /// Release the innermost clip.
    fn pop_clip(&mut self) -> ComposerResult<()>;

    /// Stroke the outline of `shape`, optionally over a drop shadow.
    fn stroke_shape(
        &mut self,
        shape: Shape,
        color: Rgba8Premul,
        width: f64,
        shadow: Option<Shadow>,
    ) -> ComposerResult<()>;

    /// Fill the glyphs of `run`.
    fn fill_text(&mut self, run: &TextRun<'_>, color: Rgba8Premul) -> ComposerResult<()>;

    /// Stroke the glyph outlines of `run`.
    fn stroke_text(
        &mut self,
        run: &TextRun<'_>,
        color: Rgba8Premul,
        width: f64,
    ) -> ComposerResult<()>;
}
