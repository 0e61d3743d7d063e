use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::capture::notice::{
    Notice, NoticeCallback, RECORDING_COMPLETED, RECORDING_STARTED, START_FAILED, VIDEO_READY,
};
use crate::capture::source::FrameSource;
use crate::capture::timer::DeferredTask;
use crate::encode::sink::{ExportArtifact, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::frame::FrameRGBA;

/// Lifecycle of a [`CaptureSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Ready to start.
    Idle,
    /// Frames are being produced and encoded.
    Recording,
    /// Stop requested; the encoder is draining.
    Finalizing,
}

/// Parameters of one recording run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptureOptions {
    /// Frame rate of the stream.
    pub fps: Fps,
    /// Auto-stop delay.
    pub duration: Duration,
    /// Frames that may be queued between render and encode.
    pub channel_capacity: usize,
    /// Follow the wall clock, repeating a frame over ticks it took too long to render.
    /// Unpaced runs render every frame as fast as possible.
    pub paced: bool,
}

impl CaptureOptions {
    /// Paced 30 fps capture that stops after `duration`.
    pub fn new(duration: Duration) -> Self {
        Self {
            fps: Fps::CAPTURE,
            duration,
            channel_capacity: 8,
            paced: true,
        }
    }

    /// Toggle real-time pacing.
    pub fn with_paced(mut self, paced: bool) -> Self {
        self.paced = paced;
        self
    }

    /// Frames in a complete recording: `duration * fps`, rounded up.
    pub fn total_frames(&self) -> u64 {
        let num = u128::from(self.fps.num) * self.duration.as_nanos();
        let den = u128::from(self.fps.den) * 1_000_000_000;
        u64::try_from(num.div_ceil(den.max(1))).unwrap_or(u64::MAX)
    }
}

type CompletionCallback = Box<dyn FnOnce(ComposerResult<ExportArtifact>) + Send>;

struct Core {
    state: SessionState,
    generation: u64,
    stop_flag: Option<Arc<AtomicBool>>,
    timer: Option<DeferredTask>,
}

struct Shared {
    core: Mutex<Core>,
    idle: Condvar,
    notice: Option<NoticeCallback>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notice: Notice) {
        if let Some(cb) = &self.notice {
            cb(&notice);
        }
    }

    /// Stop the run identified by `generation`, or whichever run is active when `None`.
    fn request_stop(&self, generation: Option<u64>) -> bool {
        let mut core = self.lock();
        if core.state != SessionState::Recording
            || generation.is_some_and(|g| g != core.generation)
        {
            return false;
        }
        core.state = SessionState::Finalizing;
        if let Some(flag) = core.stop_flag.take() {
            flag.store(true, Ordering::SeqCst);
        }
        if let Some(mut timer) = core.timer.take() {
            timer.cancel();
        }
        drop(core);
        tracing::info!("recording stopped");
        self.notify(Notice::success(RECORDING_COMPLETED));
        true
    }
}

/// Records a frame stream into an encoder until stopped by hand or by the auto-stop timer.
///
/// States run `Idle -> Recording -> Finalizing -> Idle`. Frames are produced on a capture thread
/// and handed to an encoder thread through a bounded channel, so encoding may lag rendering by
/// at most the channel capacity.
pub struct CaptureSession {
    shared: Arc<Shared>,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    /// Create an idle session without a notice receiver.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Create an idle session that reports transitions to `notice`.
    pub fn with_notices(notice: impl Fn(&Notice) + Send + Sync + 'static) -> Self {
        Self::build(Some(Arc::new(notice)))
    }

    fn build(notice: Option<NoticeCallback>) -> Self {
        Self {
            shared: Arc::new(Shared {
                core: Mutex::new(Core {
                    state: SessionState::Idle,
                    generation: 0,
                    stop_flag: None,
                    timer: None,
                }),
                idle: Condvar::new(),
                notice,
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// Begin recording `source` into `sink`.
    ///
    /// Rejected with a capture error unless the session is idle; a running recording is left
    /// untouched. `on_complete` receives the artifact (or the failure) exactly once, from the
    /// capture thread, before the session returns to idle.
    #[tracing::instrument(level = "debug", skip_all, fields(duration = ?opts.duration))]
    pub fn start(
        &self,
        source: Box<dyn FrameSource>,
        mut sink: Box<dyn FrameSink>,
        opts: CaptureOptions,
        on_complete: impl FnOnce(ComposerResult<ExportArtifact>) + Send + 'static,
    ) -> ComposerResult<()> {
        if opts.duration.is_zero() {
            return Err(ComposerError::validation("capture duration must be positive"));
        }
        let (width, height) = source.dimensions();

        let mut core = self.shared.lock();
        if core.state != SessionState::Idle {
            return Err(ComposerError::capture(format!(
                "cannot start recording while {:?}",
                core.state
            )));
        }

        if let Err(err) = sink.begin(SinkConfig {
            width,
            height,
            fps: opts.fps,
        }) {
            drop(core);
            tracing::warn!(error = %err, "encoder failed to start");
            self.shared.notify(Notice::error(START_FAILED));
            return Err(err);
        }

        core.generation += 1;
        let generation = core.generation;
        let stop = Arc::new(AtomicBool::new(false));

        let run = CaptureRun {
            shared: Arc::clone(&self.shared),
            generation,
            stop: Arc::clone(&stop),
            opts,
            started: Instant::now(),
        };
        let on_complete: CompletionCallback = Box::new(on_complete);
        std::thread::Builder::new()
            .name("capture-producer".to_string())
            .spawn(move || run.run(source, sink, on_complete))
            .map_err(|e| ComposerError::capture(format!("failed to spawn capture thread: {e}")))?;

        let weak = Arc::downgrade(&self.shared);
        core.timer = Some(DeferredTask::schedule(opts.duration, move || {
            if let Some(shared) = weak.upgrade()
                && shared.request_stop(Some(generation))
            {
                tracing::debug!(generation, "auto-stop timer fired");
            }
        }));
        core.stop_flag = Some(stop);
        core.state = SessionState::Recording;
        drop(core);

        tracing::info!(generation, width, height, "recording started");
        self.shared.notify(Notice::info(RECORDING_STARTED));
        Ok(())
    }

    /// Stop the active recording. Returns `false` (and does nothing) when not recording.
    pub fn stop(&self) -> bool {
        self.shared.request_stop(None)
    }

    /// Block until the session is idle.
    pub fn wait(&self) {
        let core = self.shared.lock();
        let _idle = self
            .shared
            .idle
            .wait_while(core, |c| c.state != SessionState::Idle)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Block until idle or until `timeout` elapses. Returns `true` when idle.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let core = self.shared.lock();
        let (core, _) = self
            .shared
            .idle
            .wait_timeout_while(core, timeout, |c| c.state != SessionState::Idle)
            .unwrap_or_else(PoisonError::into_inner);
        core.state == SessionState::Idle
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

struct CaptureRun {
    shared: Arc<Shared>,
    generation: u64,
    stop: Arc<AtomicBool>,
    opts: CaptureOptions,
    /// Stream clock origin; the auto-stop timer is armed right after it.
    started: Instant,
}

impl CaptureRun {
    fn run(
        self,
        mut source: Box<dyn FrameSource>,
        sink: Box<dyn FrameSink>,
        on_complete: CompletionCallback,
    ) {
        let (tx, rx) = mpsc::sync_channel(self.opts.channel_capacity.max(1));
        let result = match std::thread::Builder::new()
            .name("capture-encoder".to_string())
            .spawn(move || encode_frames(sink, rx))
        {
            Ok(encoder) => {
                let produced = self.produce_frames(source.as_mut(), tx);
                let encoded = encoder
                    .join()
                    .map_err(|_| ComposerError::capture("encoder thread panicked"))
                    .and_then(|r| r);
                match produced {
                    Ok(frames) => {
                        tracing::debug!(frames, "frame stream closed");
                        encoded
                    }
                    Err(err) => Err(err),
                }
            }
            Err(e) => Err(ComposerError::capture(format!(
                "failed to spawn encoder thread: {e}"
            ))),
        };
        self.finish(result, on_complete);
    }

    /// Emit a 30 fps stream on the wall clock.
    ///
    /// Ticks that pass while a frame renders are filled with that frame, so the stream always
    /// covers the elapsed time. The run ends after `total_frames` frames or on stop.
    fn produce_frames(
        &self,
        source: &mut dyn FrameSource,
        tx: SyncSender<(FrameIndex, FrameRGBA)>,
    ) -> ComposerResult<u64> {
        let fps = self.opts.fps;
        let total = self.opts.total_frames();
        let mut idx = 0u64;
        let mut last: Option<FrameRGBA> = None;
        while idx < total {
            if self.stop.load(Ordering::SeqCst) {
                if self.opts.paced
                    && let Some(frame) = &last
                {
                    send_repeated(&tx, frame, &mut idx, self.frames_due(total));
                }
                return Ok(idx);
            }
            let t = fps.frame_to_secs(FrameIndex(idx));
            if self.opts.paced {
                let due_at = self.started + Duration::from_secs_f64(t);
                let now = Instant::now();
                if due_at > now {
                    std::thread::sleep(due_at - now);
                    continue;
                }
            }

            let frame = source.frame_at(t)?;
            let upto = if self.opts.paced {
                self.frames_due(total).max(idx + 1)
            } else {
                idx + 1
            };
            if !send_repeated(&tx, &frame, &mut idx, upto) {
                // Encoder quit early; its error is reported by the join.
                return Ok(idx);
            }
            last = Some(frame);
        }

        if self.shared.request_stop(Some(self.generation)) {
            tracing::debug!(frames = idx, "recording reached its full length");
        }
        Ok(idx)
    }

    /// Frames whose presentation time has passed, capped at `total`.
    fn frames_due(&self, total: u64) -> u64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        let due = (elapsed * self.opts.fps.as_f64()).floor() as u64 + 1;
        due.min(total)
    }

    fn finish(self, result: ComposerResult<ExportArtifact>, on_complete: CompletionCallback) {
        {
            let mut core = self.shared.lock();
            if core.generation == self.generation {
                core.state = SessionState::Finalizing;
                core.stop_flag = None;
                if let Some(mut timer) = core.timer.take() {
                    timer.cancel();
                }
            }
        }

        match &result {
            Ok(artifact) => {
                tracing::info!(
                    frames = artifact.frame_count,
                    bytes = artifact.size,
                    reference = %artifact.reference,
                    "recording finalized"
                );
                self.shared.notify(Notice::success(VIDEO_READY));
            }
            Err(err) => {
                tracing::warn!(error = %err, "recording failed");
                self.shared
                    .notify(Notice::error(format!("Recording failed: {err}")));
            }
        }
        on_complete(result);

        self.shared.lock().state = SessionState::Idle;
        self.shared.idle.notify_all();
    }
}

/// Send `frame` for every index in `*idx..upto`. Returns `false` once the encoder is gone.
fn send_repeated(
    tx: &SyncSender<(FrameIndex, FrameRGBA)>,
    frame: &FrameRGBA,
    idx: &mut u64,
    upto: u64,
) -> bool {
    while *idx < upto {
        if tx.send((FrameIndex(*idx), frame.clone())).is_err() {
            return false;
        }
        *idx += 1;
    }
    true
}

fn encode_frames(
    mut sink: Box<dyn FrameSink>,
    rx: Receiver<(FrameIndex, FrameRGBA)>,
) -> ComposerResult<ExportArtifact> {
    for (idx, frame) in rx {
        sink.push_frame(idx, &frame)?;
    }
    sink.end()
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
