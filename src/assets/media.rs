use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::foundation::error::{ComposerError, ComposerResult};

/// Locations of the external `ffmpeg`/`ffprobe` executables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaTools {
    /// `ffmpeg` binary (name resolved through `PATH`, or an absolute path).
    pub ffmpeg: PathBuf,
    /// `ffprobe` binary.
    pub ffprobe: PathBuf,
}

impl Default for MediaTools {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl MediaTools {
    /// Return `true` when `ffmpeg -version` runs successfully.
    pub fn ffmpeg_available(&self) -> bool {
        runs_ok(&self.ffmpeg)
    }
}

fn runs_ok(bin: &Path) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Container and stream metadata reported by `ffprobe`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaProbe {
    /// Container duration in seconds.
    pub duration_secs: Option<f64>,
    /// Width of the first video stream.
    pub width: Option<u32>,
    /// Height of the first video stream.
    pub height: Option<u32>,
    /// Container bit rate in bits per second.
    pub bit_rate: Option<u64>,
    /// Frame rate of the first video stream as `(num, den)`.
    pub frame_rate: Option<(u32, u32)>,
    /// Whether at least one audio stream exists.
    pub has_audio: bool,
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output.
pub fn parse_probe_json(bytes: &[u8]) -> ComposerResult<MediaProbe> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
        bit_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(bytes)
        .map_err(|e| ComposerError::serde(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));
    let format = parsed.format.as_ref();

    Ok(MediaProbe {
        duration_secs: format
            .and_then(|f| f.duration.as_deref())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0),
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        bit_rate: format
            .and_then(|f| f.bit_rate.as_deref())
            .and_then(|s| s.parse::<u64>().ok()),
        frame_rate: video
            .and_then(|s| s.r_frame_rate.as_deref())
            .and_then(parse_ff_ratio),
        has_audio: parsed
            .streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio")),
    })
}

/// Probe a media file through `ffprobe`.
pub fn probe_media(tools: &MediaTools, path: &Path) -> ComposerResult<MediaProbe> {
    let out = Command::new(&tools.ffprobe)
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| ComposerError::render_invocation(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ComposerError::asset_load(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    parse_probe_json(&out.stdout)
}

/// A probed video that frames can be decoded from.
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    /// Source path used for decoding.
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Duration in seconds (0 when unknown).
    pub duration_secs: f64,
    /// Whether an audio stream exists.
    pub has_audio: bool,
}

/// Probe `path` and require a video stream with known dimensions.
pub fn probe_video(tools: &MediaTools, path: &Path) -> ComposerResult<VideoSourceInfo> {
    let probe = probe_media(tools, path)?;
    let (Some(width), Some(height)) = (probe.width, probe.height) else {
        return Err(ComposerError::asset_load(format!(
            "no video stream found in '{}'",
            path.display()
        )));
    };
    Ok(VideoSourceInfo {
        source_path: path.to_path_buf(),
        width,
        height,
        duration_secs: probe.duration_secs.unwrap_or(0.0),
        has_audio: probe.has_audio,
    })
}

/// Decode a single straight-alpha RGBA8 frame at `source_time_secs`.
pub fn decode_video_frame_rgba8(
    tools: &MediaTools,
    source: &VideoSourceInfo,
    source_time_secs: f64,
) -> ComposerResult<Vec<u8>> {
    let out = Command::new(&tools.ffmpeg)
        .args(["-v", "error", "-ss", &format!("{source_time_secs:.6}")])
        .arg("-i")
        .arg(&source.source_path)
        .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .output()
        .map_err(|e| {
            ComposerError::render_invocation(format!("failed to run ffmpeg for video decode: {e}"))
        })?;

    if !out.status.success() {
        return Err(ComposerError::asset_load(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 || out.stdout.len() < expected_len {
        return Err(ComposerError::asset_load(format!(
            "decoded video frame has {} bytes, expected {expected_len}",
            out.stdout.len()
        )));
    }
    let mut frame = out.stdout;
    frame.truncate(expected_len);
    Ok(frame)
}

/// Map a presentation time onto a looping source of `duration_secs`.
///
/// Unknown or zero durations pin the source to its first frame.
pub fn loop_time(t_secs: f64, duration_secs: f64) -> f64 {
    if !t_secs.is_finite() || !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0.0;
    }
    t_secs.rem_euclid(duration_secs)
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let (a, b) = s.split_once('/')?;
    let a = a.parse::<u32>().ok()?;
    let b = b.parse::<u32>().ok()?;
    if a == 0 || b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
