use super::*;

const PROBE: &str = r#"{
  "streams": [
    { "index": 0, "codec_type": "audio", "sample_rate": "48000" },
    { "index": 1, "codec_type": "video", "width": 1080, "height": 1920, "r_frame_rate": "30000/1001" }
  ],
  "format": { "duration": "12.480000", "bit_rate": "2451023", "size": "3823104" }
}"#;

#[test]
fn probe_json_uses_first_video_stream() {
    let probe = parse_probe_json(PROBE.as_bytes()).unwrap();
    assert_eq!(probe.width, Some(1080));
    assert_eq!(probe.height, Some(1920));
    assert_eq!(probe.frame_rate, Some((30000, 1001)));
    assert_eq!(probe.bit_rate, Some(2_451_023));
    assert_eq!(probe.duration_secs, Some(12.48));
    assert!(probe.has_audio);
}

#[test]
fn probe_json_tolerates_missing_fields() {
    let probe = parse_probe_json(br#"{ "streams": [] }"#).unwrap();
    assert_eq!(probe.width, None);
    assert_eq!(probe.duration_secs, None);
    assert!(!probe.has_audio);

    let probe =
        parse_probe_json(br#"{ "format": { "duration": "N/A", "bit_rate": "x" } }"#).unwrap();
    assert_eq!(probe.duration_secs, None);
    assert_eq!(probe.bit_rate, None);
}

#[test]
fn probe_json_garbage_is_an_error() {
    assert!(matches!(
        parse_probe_json(b"not json"),
        Err(ComposerError::Serde(_))
    ));
}

#[test]
fn loop_time_wraps() {
    assert_eq!(loop_time(0.0, 4.0), 0.0);
    assert_eq!(loop_time(5.0, 4.0), 1.0);
    assert_eq!(loop_time(8.0, 4.0), 0.0);
    assert_eq!(loop_time(3.0, 0.0), 0.0);
    assert_eq!(loop_time(f64::NAN, 4.0), 0.0);
}

#[test]
fn ff_ratio_rejects_zero() {
    assert_eq!(parse_ff_ratio("30/1"), Some((30, 1)));
    assert_eq!(parse_ff_ratio("0/0"), None);
    assert_eq!(parse_ff_ratio("25"), None);
}
