use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Point, Rect, Rgba8Premul};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::surface::{DrawSurface, Shadow, Shape, TextAlign, TextRun};

/// One recorded drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Surface cleared to a color.
    Clear(Rgba8Premul),
    /// Solid shape fill.
    FillShape {
        /// Filled geometry.
        shape: Shape,
        /// Fill color.
        color: Rgba8Premul,
    },
    /// Vertical gradient fill.
    Gradient {
        /// Filled area.
        rect: Rect,
        /// Color at the top edge.
        top: Rgba8Premul,
        /// Color at the bottom edge.
        bottom: Rgba8Premul,
    },
    /// Image drawn into a rectangle.
    Image {
        /// Source image size.
        size: (u32, u32),
        /// Destination rectangle.
        dest: Rect,
    },
    /// Clip pushed.
    PushClip(Shape),
    /// Clip released.
    PopClip,
    /// Outline stroke.
    Stroke {
        /// Stroked geometry.
        shape: Shape,
        /// Stroke color.
        color: Rgba8Premul,
        /// Line width.
        width: f64,
        /// Optional drop shadow.
        shadow: Option<Shadow>,
    },
    /// Filled text.
    FillText {
        /// Text content.
        text: String,
        /// Baseline origin.
        origin: Point,
        /// Font size.
        font_px: f32,
        /// Alignment.
        align: TextAlign,
        /// Fill color.
        color: Rgba8Premul,
    },
    /// Stroked text.
    StrokeText {
        /// Text content.
        text: String,
        /// Baseline origin.
        origin: Point,
        /// Font size.
        font_px: f32,
        /// Stroke color.
        color: Rgba8Premul,
        /// Line width.
        width: f64,
    },
}

/// [`DrawSurface`] that records a display list instead of rasterizing.
#[derive(Clone, Debug)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    round_rect: bool,
    clip_depth: usize,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    /// Record onto a `width`x`height` surface with native rounded rectangles.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            round_rect: true,
            clip_depth: 0,
            ops: Vec::new(),
        }
    }

    /// Toggle native rounded-rectangle support.
    pub fn with_round_rect(mut self, supported: bool) -> Self {
        self.round_rect = supported;
        self
    }

    /// Recorded commands in draw order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Forget all recorded commands.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }
}

impl DrawSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn supports_round_rect(&self) -> bool {
        self.round_rect
    }

    fn clear(&mut self, color: Rgba8Premul) -> ComposerResult<()> {
        self.ops.clear();
        self.clip_depth = 0;
        self.ops.push(DrawOp::Clear(color));
        Ok(())
    }

    fn fill_shape(&mut self, shape: Shape, color: Rgba8Premul) -> ComposerResult<()> {
        self.ops.push(DrawOp::FillShape { shape, color });
        Ok(())
    }

    fn fill_vertical_gradient(
        &mut self,
        rect: Rect,
        top: Rgba8Premul,
        bottom: Rgba8Premul,
    ) -> ComposerResult<()> {
        self.ops.push(DrawOp::Gradient { rect, top, bottom });
        Ok(())
    }

    fn draw_image(&mut self, image: &PreparedImage, dest: Rect) -> ComposerResult<()> {
        self.ops.push(DrawOp::Image {
            size: (image.width, image.height),
            dest,
        });
        Ok(())
    }

    fn push_clip(&mut self, shape: Shape) -> ComposerResult<()> {
        self.clip_depth += 1;
        self.ops.push(DrawOp::PushClip(shape));
        Ok(())
    }

    fn pop_clip(&mut self) -> ComposerResult<()> {
        if self.clip_depth == 0 {
            return Err(ComposerError::validation("pop_clip without matching push_clip"));
        }
        self.clip_depth -= 1;
        self.ops.push(DrawOp::PopClip);
        Ok(())
    }

    fn stroke_shape(
        &mut self,
        shape: Shape,
        color: Rgba8Premul,
        width: f64,
        shadow: Option<Shadow>,
    ) -> ComposerResult<()> {
        self.ops.push(DrawOp::Stroke {
            shape,
            color,
            width,
            shadow,
        });
        Ok(())
    }

    fn fill_text(&mut self, run: &TextRun<'_>, color: Rgba8Premul) -> ComposerResult<()> {
        self.ops.push(DrawOp::FillText {
            text: run.text.to_string(),
            origin: run.origin,
            font_px: run.font_px,
            align: run.align,
            color,
        });
        Ok(())
    }

    fn stroke_text(
        &mut self,
        run: &TextRun<'_>,
        color: Rgba8Premul,
        width: f64,
    ) -> ComposerResult<()> {
        self.ops.push(DrawOp::StrokeText {
            text: run.text.to_string(),
            origin: run.origin,
            font_px: run.font_px,
            color,
            width,
        });
        Ok(())
    }
}
