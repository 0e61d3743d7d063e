use super::*;

#[test]
fn capture_fps_frame_timing() {
    let fps = Fps::CAPTURE;
    assert_eq!(fps.frame_to_secs(FrameIndex(30)), 1.0);
    assert_eq!(fps.secs_to_frames_floor(5.0), 150);
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(0, 1).is_err());
}

#[test]
fn pixel_rect_maps_to_float_bounds() {
    let r = PixelRect::new(50, 560, 135, 240).to_rect();
    assert_eq!(r, Rect::new(50.0, 560.0, 185.0, 800.0));
}

#[test]
fn zero_sized_canvas_is_rejected() {
    assert!(Canvas::PORTRAIT.validate().is_ok());
    assert!(
        Canvas {
            width: 0,
            height: 720
        }
        .validate()
        .is_err()
    );
}

#[test]
fn hex_colors_parse_to_opaque() {
    assert_eq!(
        Rgba8Premul::from_hex("#667eea").unwrap(),
        Rgba8Premul::opaque(0x66, 0x7e, 0xea)
    );
    assert!(Rgba8Premul::from_hex("#12345").is_err());
    assert!(Rgba8Premul::from_hex("#zzzzzz").is_err());
}

#[test]
fn css_alpha_is_premultiplied() {
    let c = Rgba8Premul::from_rgb_alpha(255, 255, 255, 0.3);
    assert_eq!(c.a, 77);
    assert_eq!(c.r, 77);
}

#[test]
fn straight_roundtrip_for_css_colors() {
    assert_eq!(
        Rgba8Premul::from_rgb_alpha(255, 255, 255, 0.3).to_straight(),
        [255, 255, 255, 77]
    );
    assert_eq!(
        Rgba8Premul::from_rgb_alpha(0, 0, 0, 0.3).to_straight(),
        [0, 0, 0, 77]
    );
    assert_eq!(Rgba8Premul::transparent().to_straight(), [0, 0, 0, 0]);
}
