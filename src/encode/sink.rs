use std::path::PathBuf;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ComposerError, ComposerResult};
use crate::render::frame::FrameRGBA;

/// Media type of WebM artifacts.
pub const WEBM_MEDIA_TYPE: &str = "video/webm";
/// Media type of raw RGBA frame dumps.
pub const RAW_RGBA_MEDIA_TYPE: &str = "video/x-raw-rgba";

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Capture rate.
    pub fps: Fps,
}

/// The finished product of a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// Declared media type.
    pub media_type: String,
    /// Byte size.
    pub size: u64,
    /// Unique reference, `sketch-<uuid>.<ext>`.
    pub reference: String,
    /// File the bytes were written to, when the sink used one.
    pub path: Option<PathBuf>,
    /// Suggested download file name.
    pub suggested_name: String,
    /// Number of frames encoded.
    pub frame_count: u64,
}

impl ExportArtifact {
    /// Build an artifact with a fresh reference and download name.
    pub fn new(bytes: Vec<u8>, media_type: &str, extension: &str, frame_count: u64) -> Self {
        Self {
            size: bytes.len() as u64,
            bytes,
            media_type: media_type.to_string(),
            reference: format!("sketch-{}.{extension}", uuid::Uuid::new_v4()),
            path: None,
            suggested_name: format!(
                "sketch-monster-{}.{extension}",
                chrono::Utc::now().timestamp_millis()
            ),
            frame_count,
        }
    }

    /// Record the on-disk location of the bytes.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Sink contract for consuming captured frames.
///
/// `push_frame` is called in strictly increasing [`FrameIndex`] order between one `begin` and
/// one `end`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ComposerResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposerResult<()>;
    /// Flush and return the finished artifact.
    fn end(&mut self) -> ComposerResult<ExportArtifact>;
}

/// Sink that concatenates raw premultiplied frames in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    data: Vec<u8>,
    indices: Vec<FrameIndex>,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ComposerResult<()> {
        self.cfg = Some(cfg);
        self.data.clear();
        self.indices.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ComposerResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| ComposerError::capture("in-memory sink not started"))?;
        if self.indices.last().is_some_and(|last| idx.0 <= last.0) {
            return Err(ComposerError::capture(
                "in-memory sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ComposerError::capture(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        self.indices.push(idx);
        self.data.extend_from_slice(&frame.data);
        Ok(())
    }

    fn end(&mut self) -> ComposerResult<ExportArtifact> {
        if self.cfg.take().is_none() {
            return Err(ComposerError::capture("in-memory sink not started"));
        }
        let frames = self.indices.len() as u64;
        self.indices.clear();
        Ok(ExportArtifact::new(
            std::mem::take(&mut self.data),
            RAW_RGBA_MEDIA_TYPE,
            "rgba",
            frames,
        ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
