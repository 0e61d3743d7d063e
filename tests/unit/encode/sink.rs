use super::*;

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data: vec![v; 8],
        premultiplied: true,
    }
}

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 2,
        height: 1,
        fps: Fps::CAPTURE,
    }
}

#[test]
fn in_memory_sink_concatenates_frames() {
    let mut sink = InMemorySink::new();
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(1)).unwrap();
    sink.push_frame(FrameIndex(1), &frame(2)).unwrap();
    let artifact = sink.end().unwrap();

    assert_eq!(artifact.frame_count, 2);
    assert_eq!(artifact.size, 16);
    assert_eq!(artifact.bytes[..8], [1; 8]);
    assert_eq!(artifact.bytes[8..], [2; 8]);
    assert_eq!(artifact.media_type, RAW_RGBA_MEDIA_TYPE);
    assert!(artifact.reference.starts_with("sketch-"));
    assert!(artifact.reference.ends_with(".rgba"));
    assert!(artifact.suggested_name.starts_with("sketch-monster-"));
}

#[test]
fn in_memory_sink_rejects_misuse() {
    let mut sink = InMemorySink::new();
    assert!(sink.push_frame(FrameIndex(0), &frame(1)).is_err());
    assert!(sink.end().is_err());

    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(3), &frame(1)).unwrap();
    assert!(sink.push_frame(FrameIndex(3), &frame(1)).is_err());
    let wrong = FrameRGBA {
        width: 1,
        height: 1,
        data: vec![0; 4],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(4), &wrong).is_err());
}

#[test]
fn references_are_unique() {
    let a = ExportArtifact::new(Vec::new(), WEBM_MEDIA_TYPE, "webm", 0);
    let b = ExportArtifact::new(Vec::new(), WEBM_MEDIA_TYPE, "webm", 0);
    assert_ne!(a.reference, b.reference);
    assert!(a.suggested_name.ends_with(".webm"));
    assert_eq!(a.with_path("/tmp/x.webm").path.unwrap().to_str(), Some("/tmp/x.webm"));
}
