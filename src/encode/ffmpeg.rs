use std::io::{Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::assets::media::MediaTools;
use crate::encode::sink::{ExportArtifact, FrameSink, SinkConfig, WEBM_MEDIA_TYPE};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;

/// Options for [`FfmpegWebmSink`].
#[derive(Clone, Debug)]
pub struct FfmpegWebmSinkOpts {
    /// Output `.webm` path.
    pub out_path: PathBuf,
    /// Tool locations.
    pub tools: MediaTools,
    /// Background used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
    /// VP9 constant-quality value.
    pub crf: u8,
}

impl FfmpegWebmSinkOpts {
    /// Write a WebM to `out_path` with default tools.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            tools: MediaTools::default(),
            bg_rgba: [0x1a, 0x1a, 0x1a, 255],
            crf: 32,
        }
    }

    /// Use explicit tool locations.
    pub fn with_tools(mut self, tools: MediaTools) -> Self {
        self.tools = tools;
        self
    }
}

/// Streams raw frames into a system `ffmpeg` producing VP9 WebM.
///
/// Odd frame sizes are padded to even dimensions inside `ffmpeg`.
pub struct FfmpegWebmSink {
    opts: FfmpegWebmSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    frames: u64,
}

impl FfmpegWebmSink {
    /// Create a sink; nothing is spawned until [`FrameSink::begin`].
    pub fn new(opts: FfmpegWebmSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
            frames: 0,
        }
    }

    fn command(&self, cfg: SinkConfig) -> Command {
        let mut cmd = Command::new(&self.opts.tools.ffmpeg);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
            "-r",
            &format!("{}/{}", cfg.fps.num, cfg.fps.den),
            "-i",
            "pipe:0",
            "-an",
            "-vf",
            "pad=ceil(iw/2)*2:ceil(ih/2)*2",
            "-c:v",
            "libvpx-vp9",
            "-pix_fmt",
            "yuv420p",
            "-b:v",
            "0",
            "-crf",
            &self.opts.crf.to_string(),
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-f",
            "webm",
        ]);
        cmd.arg(&self.opts.out_path);
        cmd
    }
}

impl FrameSink for FfmpegWebmSink {
    fn begin(&mut self, cfg: SinkConfig) -> ComposerResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ComposerError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ComposerError::validation(
                "webm sink width/height must be non-zero",
            ));
        }
        ensure_parent_dir(&self.opts.out_path)?;

        let mut child = self.command(cfg).spawn().map_err(|e| {
            ComposerError::capture(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ComposerError::capture("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ComposerError::capture("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        tracing::debug!(
            out = %self.opts.out_path.display(),
            width = cfg.width,
            height = cfg.height,
            "webm encoder started"
        );
        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposerResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| ComposerError::capture("webm sink not started"))?;
        if self.last_idx.is_some_and(|last| idx.0 <= last.0) {
            return Err(ComposerError::capture(
                "webm sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ComposerError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.last_idx = Some(idx);

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ComposerError::capture("webm sink is already finalized"))?;
        stdin.write_all(&self.scratch).map_err(|e| {
            ComposerError::capture(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;
        self.frames += 1;
        Ok(())
    }

    fn end(&mut self) -> ComposerResult<ExportArtifact> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ComposerError::capture("webm sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| ComposerError::capture(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ComposerError::capture("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ComposerError::capture(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        self.cfg = None;
        if !status.success() {
            return Err(ComposerError::capture(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }

        let bytes = std::fs::read(&self.opts.out_path).map_err(|e| {
            ComposerError::capture(format!(
                "failed to read encoded webm '{}': {e}",
                self.opts.out_path.display()
            ))
        })?;
        tracing::info!(frames = self.frames, bytes = bytes.len(), "webm encoded");
        Ok(ExportArtifact::new(bytes, WEBM_MEDIA_TYPE, "webm", self.frames)
            .with_path(&self.opts.out_path))
    }
}

impl Drop for FfmpegWebmSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

pub(crate) fn flatten_premul_over_bg(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> ComposerResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ComposerError::validation(
            "flatten_premul_over_bg expects equal-length rgba8 buffers",
        ));
    }
    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ComposerResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
