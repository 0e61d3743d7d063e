use super::*;
use crate::composition::config::{Dimension, height_for_width, width_for_height};

#[test]
fn default_layout_matches_config() {
    let cfg = CompositionConfig::default();
    let layout = resolve_layout(&cfg);
    assert_eq!(layout.sketch, PixelRect::new(50, 560, 135, 240));
    assert_eq!(layout.video, PixelRect::new(60, 120, 285, 428));
    assert_eq!(layout.age_baseline, Point::new(220.0, 680.0));
    assert_eq!(layout.name_baseline, Point::new(220.0, 650.0));
    assert_eq!(layout.sketch_radius, 8.0);
    assert_eq!(layout.video_radius, 20.0);
    assert_eq!((layout.name_font_px, layout.age_font_px), (28.0, 20.0));
}

#[test]
fn layout_is_deterministic() {
    let cfg = CompositionConfig::default()
        .with_sketch_dimension(Dimension::Width, 77)
        .with_sketch_position(10, 20);
    assert_eq!(resolve_layout(&cfg), resolve_layout(&cfg.clone()));
}

#[test]
fn locked_sketch_layout_tracks_aspect_rule() {
    for w in 50..=200 {
        let cfg = CompositionConfig::default().with_sketch_dimension(Dimension::Width, w);
        let layout = resolve_layout(&cfg);
        assert_eq!(layout.sketch.width, w);
        assert_eq!(layout.sketch.height, height_for_width(w));
    }
    for h in 89..=356 {
        let cfg = CompositionConfig::default().with_sketch_dimension(Dimension::Height, h);
        let layout = resolve_layout(&cfg);
        assert_eq!(layout.sketch.height, h);
        assert_eq!(layout.sketch.width, width_for_height(h));
    }
}

#[test]
fn fit_wide_image_letterboxes_vertically() {
    let target = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(fit_rect(200, 100, target), Rect::new(0.0, 25.0, 100.0, 75.0));
}

#[test]
fn fit_tall_image_pillarboxes_horizontally() {
    let target = Rect::new(10.0, 20.0, 110.0, 120.0);
    assert_eq!(fit_rect(100, 200, target), Rect::new(35.0, 20.0, 85.0, 120.0));
}

#[test]
fn fit_matching_aspect_fills_target() {
    let target = Rect::new(50.0, 560.0, 185.0, 800.0);
    assert_eq!(fit_rect(9, 16, target), target);
}

#[test]
fn fit_square_sketch_into_portrait_card() {
    let target = PixelRect::new(50, 560, 135, 240).to_rect();
    let r = fit_rect(1, 1, target);
    assert_eq!(r.width(), 135.0);
    assert_eq!(r.height(), 135.0);
    assert_eq!(r.y0, 560.0 + (240.0 - 135.0) / 2.0);
}

#[test]
fn fit_degenerate_image_returns_target() {
    let target = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert_eq!(fit_rect(0, 5, target), target);
}
