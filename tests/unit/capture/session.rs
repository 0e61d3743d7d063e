use super::*;
use crate::encode::sink::InMemorySink;
use std::sync::atomic::AtomicU64;

struct Counting {
    frames: Arc<AtomicU64>,
    fail_at: Option<u64>,
    delay: Duration,
}

impl FrameSource for Counting {
    fn dimensions(&self) -> (u32, u32) {
        (2, 2)
    }

    fn frame_at(&mut self, _t_secs: f64) -> ComposerResult<FrameRGBA> {
        std::thread::sleep(self.delay);
        let n = self.frames.fetch_add(1, Ordering::SeqCst);
        if self.fail_at == Some(n) {
            return Err(ComposerError::validation("broken frame"));
        }
        Ok(FrameRGBA {
            width: 2,
            height: 2,
            data: vec![n as u8; 16],
            premultiplied: true,
        })
    }
}

fn counting() -> (Box<dyn FrameSource>, Arc<AtomicU64>) {
    let frames = Arc::new(AtomicU64::new(0));
    (
        Box::new(Counting {
            frames: Arc::clone(&frames),
            fail_at: None,
            delay: Duration::ZERO,
        }),
        frames,
    )
}

type Outcome = mpsc::Receiver<ComposerResult<ExportArtifact>>;

fn start(
    session: &CaptureSession,
    source: Box<dyn FrameSource>,
    duration: Duration,
) -> ComposerResult<Outcome> {
    let (tx, rx) = mpsc::channel();
    session.start(
        source,
        Box::new(InMemorySink::new()),
        CaptureOptions::new(duration),
        move |result| {
            let _ = tx.send(result);
        },
    )?;
    Ok(rx)
}

const LONG: Duration = Duration::from_secs(60);
const WAIT: Duration = Duration::from_secs(10);

#[test]
fn second_start_is_rejected_while_recording() {
    let session = CaptureSession::new();
    let (source, _) = counting();
    let done = start(&session, source, LONG).unwrap();
    assert_eq!(session.state(), SessionState::Recording);

    let (other, other_frames) = counting();
    let err = start(&session, other, LONG).unwrap_err();
    assert!(matches!(err, ComposerError::Capture(_)));
    assert_eq!(session.state(), SessionState::Recording);
    assert_eq!(other_frames.load(Ordering::SeqCst), 0);

    assert!(session.stop());
    assert!(done.recv_timeout(WAIT).unwrap().is_ok());
    assert!(session.wait_timeout(WAIT));
}

#[test]
fn early_stop_flushes_every_frame_into_one_artifact() {
    let session = CaptureSession::new();
    let (source, frames) = counting();
    let done = start(&session, source, LONG).unwrap();
    std::thread::sleep(Duration::from_millis(200));
    assert!(session.stop());

    let artifact = done.recv_timeout(WAIT).unwrap().unwrap();
    session.wait();
    assert_eq!(session.state(), SessionState::Idle);
    let produced = frames.load(Ordering::SeqCst);
    assert!(produced > 0);
    assert!(artifact.frame_count >= produced);
    assert!(artifact.frame_count < 30, "stopped after 200ms, got {}", artifact.frame_count);
    assert_eq!(artifact.size, artifact.frame_count * 16);
    assert_eq!(artifact.bytes[..16], [0u8; 16]);
}

#[test]
fn double_stop_is_a_no_op() {
    let notices = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&notices);
    let session = CaptureSession::with_notices(move |n| seen.lock().unwrap().push(n.clone()));
    let (source, _) = counting();
    let done = start(&session, source, LONG).unwrap();

    assert!(session.stop());
    assert!(!session.stop());
    assert!(done.recv_timeout(WAIT).unwrap().is_ok());
    session.wait();
    assert!(!session.stop());
    assert!(done.recv_timeout(Duration::from_millis(100)).is_err());

    let messages: Vec<_> = notices
        .lock()
        .unwrap()
        .iter()
        .map(|n| n.message.clone())
        .collect();
    assert_eq!(
        messages,
        vec![RECORDING_STARTED, RECORDING_COMPLETED, VIDEO_READY]
    );
}

#[test]
fn auto_stop_timer_fires_once() {
    let session = CaptureSession::new();
    let (source, frames) = counting();
    let done = start(&session, source, Duration::from_millis(150)).unwrap();

    let artifact = done.recv_timeout(WAIT).unwrap().unwrap();
    assert!(session.wait_timeout(WAIT));
    assert_eq!(artifact.frame_count, 5);
    assert!(frames.load(Ordering::SeqCst) <= 5);
    assert!(done.recv_timeout(Duration::from_millis(300)).is_err());
    assert!(!session.stop());
}

#[test]
fn session_is_reusable_after_completion() {
    let session = CaptureSession::new();
    for _ in 0..2 {
        let (source, _) = counting();
        let done = start(&session, source, Duration::from_millis(50)).unwrap();
        assert!(done.recv_timeout(WAIT).unwrap().is_ok());
        assert!(session.wait_timeout(WAIT));
    }
}

#[test]
fn stale_timer_does_not_stop_the_next_recording() {
    let session = CaptureSession::new();
    let (source, _) = counting();
    let first = start(&session, source, Duration::from_millis(200)).unwrap();
    assert!(session.stop());
    assert!(first.recv_timeout(WAIT).unwrap().is_ok());
    session.wait();

    let (source, _) = counting();
    let second = start(&session, source, LONG).unwrap();
    std::thread::sleep(Duration::from_millis(350));
    assert_eq!(session.state(), SessionState::Recording);
    assert!(session.stop());
    assert!(second.recv_timeout(WAIT).unwrap().is_ok());
}

#[test]
fn source_failure_is_reported_and_session_returns_idle() {
    let session = CaptureSession::new();
    let source = Box::new(Counting {
        frames: Arc::new(AtomicU64::new(0)),
        fail_at: Some(2),
        delay: Duration::ZERO,
    });
    let done = start(&session, source, LONG).unwrap();
    let err = done.recv_timeout(WAIT).unwrap().unwrap_err();
    assert!(matches!(err, ComposerError::Validation(_)));
    assert!(session.wait_timeout(WAIT));
    assert!(!session.stop());
}

#[test]
fn slow_source_still_fills_the_configured_duration() {
    let session = CaptureSession::new();
    let frames = Arc::new(AtomicU64::new(0));
    let source = Box::new(Counting {
        frames: Arc::clone(&frames),
        fail_at: None,
        delay: Duration::from_millis(100),
    });
    let done = start(&session, source, Duration::from_secs(1)).unwrap();

    let artifact = done.recv_timeout(WAIT).unwrap().unwrap();
    assert!(session.wait_timeout(WAIT));
    // 1 s at 30 fps, although only about ten frames were rendered.
    assert_eq!(artifact.frame_count, 30);
    assert_eq!(artifact.size, 30 * 16);
    assert!(frames.load(Ordering::SeqCst) < 20);
}

#[test]
fn unpaced_run_stops_after_the_full_frame_count() {
    let session = CaptureSession::new();
    let (source, frames) = counting();
    let (tx, rx) = mpsc::channel();
    session
        .start(
            source,
            Box::new(InMemorySink::new()),
            CaptureOptions::new(Duration::from_secs(2)).with_paced(false),
            move |r| {
                let _ = tx.send(r);
            },
        )
        .unwrap();
    let artifact = rx.recv_timeout(WAIT).unwrap().unwrap();
    assert!(session.wait_timeout(WAIT));
    assert_eq!(artifact.frame_count, 60);
    assert_eq!(frames.load(Ordering::SeqCst), 60);
}

#[test]
fn total_frames_rounds_up() {
    assert_eq!(CaptureOptions::new(Duration::from_secs(3)).total_frames(), 90);
    assert_eq!(CaptureOptions::new(Duration::from_millis(150)).total_frames(), 5);
    assert_eq!(CaptureOptions::new(Duration::from_millis(10)).total_frames(), 1);
}

struct Unstartable;

impl FrameSink for Unstartable {
    fn begin(&mut self, _cfg: SinkConfig) -> ComposerResult<()> {
        Err(ComposerError::capture("no encoder"))
    }
    fn push_frame(&mut self, _idx: FrameIndex, _frame: &FrameRGBA) -> ComposerResult<()> {
        Ok(())
    }
    fn end(&mut self) -> ComposerResult<ExportArtifact> {
        Err(ComposerError::capture("no encoder"))
    }
}

#[test]
fn encoder_start_failure_leaves_session_idle() {
    let session = CaptureSession::new();
    let (source, _) = counting();
    let err = session
        .start(source, Box::new(Unstartable), CaptureOptions::new(LONG), |_| {})
        .unwrap_err();
    assert!(matches!(err, ComposerError::Capture(_)));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn zero_duration_is_rejected() {
    let session = CaptureSession::new();
    let (source, _) = counting();
    assert!(start(&session, source, Duration::ZERO).is_err());
}
