use super::*;

fn frame(v: u8) -> PreparedImage {
    PreparedImage::solid(1, 1, [v, v, v, 255]).unwrap()
}

#[test]
fn sequence_loops_modulo_duration() {
    let mut seq = FrameSequence::new(vec![frame(0), frame(1), frame(2)], Fps::new(1, 1).unwrap())
        .unwrap();
    assert_eq!(seq.frame_at(0.0).unwrap(), frame(0));
    assert_eq!(seq.frame_at(1.5).unwrap(), frame(1));
    assert_eq!(seq.frame_at(2.0).unwrap(), frame(2));
    assert_eq!(seq.frame_at(3.0).unwrap(), frame(0));
    assert_eq!(seq.frame_at(7.2).unwrap(), frame(1));
}

#[test]
fn empty_sequence_is_rejected() {
    assert!(FrameSequence::new(Vec::new(), Fps::CAPTURE).is_err());
}

#[test]
fn still_and_paused_flags() {
    let mut still = FrameSequence::still(frame(9));
    assert!(still.is_playing());
    assert_eq!(still.frame_at(123.0).unwrap(), frame(9));
    assert!(!still.with_playing(false).is_playing());
}

#[test]
fn video_loop_lru_evicts_oldest() {
    let info = VideoSourceInfo {
        source_path: "missing.mp4".into(),
        width: 1,
        height: 1,
        duration_secs: 2.0,
        has_audio: false,
    };
    let mut v = VideoLoop::new(MediaTools::default(), info);
    v.capacity = 2;
    v.insert_frame(1, frame(1));
    v.insert_frame(2, frame(2));
    v.touch(1);
    v.insert_frame(3, frame(3));
    assert!(v.frame_cache.contains_key(&1));
    assert!(!v.frame_cache.contains_key(&2));
    assert!(v.frame_cache.contains_key(&3));

    // Cached keys are served without touching ffmpeg.
    assert_eq!(v.frame_at(2.001).unwrap(), frame(1));
}
