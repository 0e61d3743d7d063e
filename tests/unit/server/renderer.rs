use super::*;
use crate::filtergraph::command::{InputSpec, OutputOptions};

#[test]
fn tail_keeps_the_end_on_char_boundaries() {
    assert_eq!(tail("short", 10), "short");
    assert_eq!(tail("abcdef", 3), "def");
    assert_eq!(tail("aéé", 3), "é");
}

#[tokio::test]
async fn failed_render_removes_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("partial.mp4");
    std::fs::write(&output, b"half").unwrap();
    let renderer = FfmpegCli::new(MediaTools {
        ffmpeg: dir.path().join("missing-ffmpeg"),
        ffprobe: dir.path().join("missing-ffprobe"),
    });
    let request = RenderRequest {
        inputs: vec![InputSpec::file("in.mp4")],
        graph: None,
        options: OutputOptions::compose(5),
        output: output.clone(),
    };
    let err = render_blocking(Arc::new(renderer), request).await.unwrap_err();
    assert!(matches!(err, ComposerError::RenderInvocation(_)));
    assert!(!output.exists());
}
