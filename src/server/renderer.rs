use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::assets::media::{MediaProbe, MediaTools, probe_media};
use crate::filtergraph::command::RenderRequest;
use crate::foundation::error::{ComposerError, ComposerResult};

/// An external tool that renders [`RenderRequest`]s and probes media.
///
/// Calls block; the server runs them on the blocking pool.
pub trait ExternalRenderer: Send + Sync + 'static {
    /// Run one render to completion.
    fn render(&self, request: &RenderRequest) -> ComposerResult<()>;
    /// Read container and stream metadata.
    fn probe(&self, path: &Path) -> ComposerResult<MediaProbe>;
}

/// Renderer backed by the `ffmpeg`/`ffprobe` command-line tools.
#[derive(Clone, Debug, Default)]
pub struct FfmpegCli {
    tools: MediaTools,
}

impl FfmpegCli {
    pub fn new(tools: MediaTools) -> Self {
        Self { tools }
    }
}

impl ExternalRenderer for FfmpegCli {
    fn render(&self, request: &RenderRequest) -> ComposerResult<()> {
        let args = request.to_args();
        tracing::debug!(
            program = %self.tools.ffmpeg.display(),
            args = ?args,
            "running ffmpeg"
        );
        let out = Command::new(&self.tools.ffmpeg)
            .args(&args)
            .output()
            .map_err(|e| {
                ComposerError::render_invocation(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(ComposerError::render_invocation(format!(
                "ffmpeg exited with status {}: {}",
                out.status,
                tail(stderr.trim(), 2000)
            )));
        }
        Ok(())
    }

    fn probe(&self, path: &Path) -> ComposerResult<MediaProbe> {
        probe_media(&self.tools, path)
    }
}

fn tail(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut start = s.len() - max_bytes;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Run `request` on the blocking pool and remove `output` if the render fails.
pub async fn render_blocking(
    renderer: Arc<dyn ExternalRenderer>,
    request: RenderRequest,
) -> ComposerResult<PathBuf> {
    let output = request.output.clone();
    let result = tokio::task::spawn_blocking(move || renderer.render(&request))
        .await
        .map_err(|e| ComposerError::render_invocation(format!("render task failed: {e}")))
        .and_then(|r| r);
    if let Err(err) = result {
        let _ = tokio::fs::remove_file(&output).await;
        return Err(err);
    }
    Ok(output)
}

/// Probe `path` on the blocking pool.
pub async fn probe_blocking(
    renderer: Arc<dyn ExternalRenderer>,
    path: PathBuf,
) -> ComposerResult<MediaProbe> {
    tokio::task::spawn_blocking(move || renderer.probe(&path))
        .await
        .map_err(|e| ComposerError::render_invocation(format!("probe task failed: {e}")))?
}

#[cfg(test)]
#[path = "../../tests/unit/server/renderer.rs"]
mod tests;
