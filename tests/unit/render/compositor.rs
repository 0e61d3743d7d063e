use super::*;
use crate::assets::motion::{FrameSequence, MotionSource};
use crate::foundation::core::Point;
use crate::layout::engine::resolve_layout;
use crate::render::recording::{DrawOp, RecordingSurface};

fn sketch() -> PreparedImage {
    PreparedImage::solid(1, 1, [10, 20, 30, 255]).unwrap()
}

fn still(v: u8) -> FrameSequence {
    FrameSequence::still(PreparedImage::solid(2, 2, [v, v, v, 255]).unwrap())
}

fn render(assets: &mut AssetSet, surface: &mut RecordingSurface) -> Vec<DrawOp> {
    let cfg = CompositionConfig::default();
    let layout = resolve_layout(&cfg);
    render_frame(surface, &cfg, assets, &layout, 0.5).unwrap();
    surface.ops().to_vec()
}

fn has_clip(ops: &[DrawOp]) -> bool {
    ops.iter().any(|op| matches!(op, DrawOp::PushClip(_)))
}

#[test]
fn sketch_only_draws_gradient_sketch_and_text() {
    let mut surface = RecordingSurface::new(405, 720);
    let ops = render(&mut AssetSet::new().with_sketch(sketch()), &mut surface);

    assert_eq!(ops[0], DrawOp::Clear(palette::BACKGROUND));
    assert!(matches!(ops[1], DrawOp::Gradient { .. }));
    assert!(matches!(
        &ops[2],
        DrawOp::FillText { text, align: TextAlign::Center, .. } if text == PLACEHOLDER_TEXT
    ));

    let sketch_rect = Rect::new(50.0, 560.0, 185.0, 800.0);
    let card = Shape::rounded(sketch_rect, 8.0);
    assert_eq!(ops[3], DrawOp::PushClip(card));
    assert_eq!(
        ops[4],
        DrawOp::FillShape {
            shape: card,
            color: palette::WHITE
        }
    );
    assert_eq!(
        ops[5],
        DrawOp::Image {
            size: (1, 1),
            dest: fit_rect(1, 1, sketch_rect)
        }
    );
    assert_eq!(ops[6], DrawOp::PopClip);
    assert!(matches!(ops[7], DrawOp::Stroke { width, shadow: None, .. } if width == 3.0));
    assert!(matches!(ops[8], DrawOp::Stroke { width, shadow: Some(_), .. } if width == 2.0));

    // Only the sketch card clips; the inset-video clip never appears without a template.
    let clips = ops
        .iter()
        .filter(|op| matches!(op, DrawOp::PushClip(_)))
        .count();
    assert_eq!(clips, 1);
    assert_eq!(ops.len(), 13);
}

#[test]
fn label_is_stroked_then_filled_at_layout_baselines() {
    let mut surface = RecordingSurface::new(405, 720);
    let ops = render(&mut AssetSet::new(), &mut surface);
    let text_ops: Vec<_> = ops
        .iter()
        .filter(|op| matches!(op, DrawOp::StrokeText { .. } | DrawOp::FillText { align: TextAlign::Left, .. }))
        .collect();
    assert_eq!(text_ops.len(), 4);
    assert!(matches!(
        text_ops[0],
        DrawOp::StrokeText { text, origin, font_px, width, .. }
            if text == "Whiskers" && *origin == Point::new(220.0, 650.0) && *font_px == 28.0 && *width == 2.0
    ));
    assert!(matches!(
        text_ops[1],
        DrawOp::FillText { text, color, .. } if text == "Whiskers" && *color == palette::WHITE
    ));
    assert!(matches!(
        text_ops[2],
        DrawOp::StrokeText { text, origin, font_px, .. }
            if text == "Age: 8" && *origin == Point::new(220.0, 680.0) && *font_px == 20.0
    ));
    assert!(matches!(text_ops[3], DrawOp::FillText { text, .. } if text == "Age: 8"));
}

#[test]
fn motion_without_template_fills_the_canvas() {
    let mut surface = RecordingSurface::new(405, 720);
    let ops = render(&mut AssetSet::new().with_motion(still(40)), &mut surface);
    assert_eq!(
        ops[1],
        DrawOp::Image {
            size: (2, 2),
            dest: Rect::new(0.0, 0.0, 405.0, 720.0)
        }
    );
    assert!(!ops.iter().any(|op| matches!(op, DrawOp::Gradient { .. })));
    assert!(!has_clip(&ops));
}

#[test]
fn template_with_motion_draws_rounded_inset() {
    let mut surface = RecordingSurface::new(405, 720);
    let template = PreparedImage::solid(3, 3, [1, 2, 3, 255]).unwrap();
    let mut assets = AssetSet::new()
        .with_template(template)
        .with_motion(still(40));
    let ops = render(&mut assets, &mut surface);

    assert_eq!(
        ops[1],
        DrawOp::Image {
            size: (3, 3),
            dest: Rect::new(0.0, 0.0, 405.0, 720.0)
        }
    );
    let inset = Rect::new(60.0, 120.0, 345.0, 548.0);
    assert_eq!(ops[2], DrawOp::PushClip(Shape::rounded(inset, 20.0)));
    assert_eq!(
        ops[3],
        DrawOp::Image {
            size: (2, 2),
            dest: inset
        }
    );
    assert_eq!(ops[4], DrawOp::PopClip);
}

#[test]
fn paused_motion_over_template_is_skipped() {
    let mut surface = RecordingSurface::new(405, 720);
    let template = PreparedImage::solid(3, 3, [1, 2, 3, 255]).unwrap();
    let mut assets = AssetSet::new()
        .with_template(template)
        .with_motion(still(40).with_playing(false));
    let ops = render(&mut assets, &mut surface);
    assert!(!has_clip(&ops));
}

#[test]
fn surfaces_without_round_rect_get_plain_rectangles() {
    let mut surface = RecordingSurface::new(405, 720).with_round_rect(false);
    let ops = render(&mut AssetSet::new().with_sketch(sketch()), &mut surface);
    assert_eq!(
        ops[3],
        DrawOp::PushClip(Shape::Rect(Rect::new(50.0, 560.0, 185.0, 800.0)))
    );
}

struct Broken;

impl MotionSource for Broken {
    fn frame_at(&mut self, _t_secs: f64) -> ComposerResult<PreparedImage> {
        Err(ComposerError::asset_load("corrupt"))
    }
}

#[test]
fn undecodable_motion_falls_back_to_placeholder() {
    let mut surface = RecordingSurface::new(405, 720);
    let ops = render(&mut AssetSet::new().with_motion(Broken), &mut surface);
    assert!(matches!(ops[1], DrawOp::Gradient { .. }));
}

#[test]
fn zero_sized_surface_fails_the_frame() {
    let cfg = CompositionConfig::default();
    let layout = resolve_layout(&cfg);
    let mut surface = RecordingSurface::new(0, 720);
    let err = render_frame(&mut surface, &cfg, &mut AssetSet::new(), &layout, 0.0).unwrap_err();
    assert!(matches!(err, ComposerError::Validation(_)));
}
