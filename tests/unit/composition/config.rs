use super::*;

#[test]
fn defaults_are_valid() {
    CompositionConfig::default().validate().unwrap();
}

#[test]
fn width_drives_height_for_every_valid_width() {
    for w in SKETCH_WIDTH_RANGE.0..=SKETCH_WIDTH_RANGE.1 {
        let expected = ((f64::from(w) * 16.0 / 9.0).round() as u32).clamp(89, 356);
        assert_eq!(height_for_width(w), expected, "width {w}");
    }
}

#[test]
fn height_drives_width_for_every_valid_height() {
    for h in SKETCH_HEIGHT_RANGE.0..=SKETCH_HEIGHT_RANGE.1 {
        let expected = ((f64::from(h) * 9.0 / 16.0).round() as u32).clamp(50, 200);
        assert_eq!(width_for_height(h), expected, "height {h}");
    }
}

#[test]
fn width_height_width_is_idempotent() {
    for w in SKETCH_WIDTH_RANGE.0..=SKETCH_WIDTH_RANGE.1 {
        assert_eq!(width_for_height(height_for_width(w)), w, "width {w}");
    }
}

#[test]
fn height_first_roundtrip_settles_after_one_step() {
    // Heights are denser than widths, so h -> w -> h can move by one pixel, but the derived pair
    // is already a fixed point.
    let mut moved = Vec::new();
    for h in SKETCH_HEIGHT_RANGE.0..=SKETCH_HEIGHT_RANGE.1 {
        let w = width_for_height(h);
        let h2 = height_for_width(w);
        assert!(h2.abs_diff(h) <= 1, "height {h} moved to {h2}");
        if h2 != h {
            moved.push(h);
        }
        assert_eq!(height_for_width(width_for_height(h2)), h2);
    }
    assert!(moved.contains(&90));
    assert!(!moved.contains(&89));
    assert!(!moved.contains(&356));
}

#[test]
fn clamp_edges_are_stable() {
    assert_eq!(height_for_width(50), 89);
    assert_eq!(width_for_height(89), 50);
    assert_eq!(height_for_width(200), 356);
    assert_eq!(width_for_height(356), 200);
}

#[test]
fn out_of_range_input_is_clamped_before_deriving() {
    let cfg = CompositionConfig::default().with_sketch_dimension(Dimension::Width, 10);
    assert_eq!(cfg.sketch_size, Size { width: 50, height: 89 });

    let cfg = CompositionConfig::default().with_sketch_dimension(Dimension::Height, 999);
    assert_eq!(
        cfg.sketch_size,
        Size {
            width: 200,
            height: 356
        }
    );
}

#[test]
fn unlocked_dimensions_change_independently() {
    let cfg = CompositionConfig::default()
        .with_aspect_lock(false)
        .with_sketch_dimension(Dimension::Width, 180);
    assert_eq!(cfg.sketch_size.width, 180);
    assert_eq!(cfg.sketch_size.height, 240);
    cfg.validate().unwrap();
}

#[test]
fn repeated_lock_toggles_converge() {
    let mut cfg = CompositionConfig::default()
        .with_aspect_lock(false)
        .with_sketch_dimension(Dimension::Height, 300)
        .with_aspect_lock(true);
    let first = cfg.sketch_size;
    for _ in 0..5 {
        cfg = cfg.with_aspect_lock(false).with_aspect_lock(true);
    }
    assert_eq!(cfg.sketch_size, first);
    assert_eq!(first.height, height_for_width(135));
}

#[test]
fn validation_rejects_bad_ranges() {
    let mut cfg = CompositionConfig::default();
    cfg.video_size.width = 100;
    assert!(cfg.validate().is_err());

    let cfg = CompositionConfig::default().with_duration_secs(20);
    assert!(cfg.validate().is_err());

    let cfg = CompositionConfig::default().with_sketch_position(-1, 0);
    assert!(cfg.validate().is_err());

    let cfg = CompositionConfig::default().with_sketch_position(405, 0);
    assert!(cfg.validate().is_err());
}

#[test]
fn validation_rejects_unlocked_ratio_once_locked() {
    let mut cfg = CompositionConfig::default();
    cfg.sketch_size = Size {
        width: 200,
        height: 89,
    };
    assert!(cfg.validate().is_err());
    cfg.maintain_aspect_ratio = false;
    cfg.validate().unwrap();
}

#[test]
fn label_validation() {
    let cfg = CompositionConfig::default().with_label("  ", 3);
    assert!(cfg.validate().is_err());
    let cfg = CompositionConfig::default().with_label("a\nb", 3);
    assert!(cfg.validate().is_err());
    let cfg = CompositionConfig::default().with_label("Ghost", 151);
    assert!(cfg.validate().is_err());
    assert_eq!(
        CompositionConfig::default().with_label("Ghost", 7).label.age_line(),
        "Age: 7"
    );
}

#[test]
fn json_uses_camel_case_and_fills_defaults() {
    let cfg: CompositionConfig =
        serde_json::from_str(r#"{ "label": { "name": "Ghost", "age": 7 }, "durationSecs": 8 }"#)
            .unwrap();
    assert_eq!(cfg.label.name, "Ghost");
    assert_eq!(cfg.duration_secs, 8);
    assert_eq!(cfg.sketch_size, CompositionConfig::default().sketch_size);

    let json = serde_json::to_string(&cfg).unwrap();
    assert!(json.contains("\"maintainAspectRatio\":true"));
}
