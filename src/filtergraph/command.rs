use std::ffi::OsString;
use std::path::PathBuf;

use crate::filtergraph::graph::FilterGraph;
use crate::foundation::error::{ComposerError, ComposerResult};

/// Re-encode quality preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    #[default]
    Medium,
    High,
}

impl Quality {
    /// Parse a preset name. Unknown names fall back to [`Quality::Medium`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Medium,
        }
    }

    pub fn crf(self) -> u8 {
        match self {
            Self::Low => 28,
            Self::Medium => 23,
            Self::High => 18,
        }
    }

    pub fn preset(self) -> &'static str {
        match self {
            Self::Low => "fast",
            Self::Medium => "medium",
            Self::High => "slow",
        }
    }
}

/// Whitelisted output containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerFormat {
    Mp4,
    Mov,
    Mkv,
    Webm,
}

impl ContainerFormat {
    /// Parse a user-supplied format name.
    pub fn parse(name: &str) -> ComposerResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mov" => Ok(Self::Mov),
            "mkv" => Ok(Self::Mkv),
            "webm" => Ok(Self::Webm),
            other => Err(ComposerError::validation(format!(
                "unsupported output format '{other}'"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
            Self::Webm => "webm",
        }
    }

    fn video_codec(self) -> &'static str {
        match self {
            Self::Webm => "libvpx-vp9",
            _ => "libx264",
        }
    }

    fn audio_codec(self) -> &'static str {
        match self {
            Self::Webm => "libopus",
            _ => "aac",
        }
    }

    fn faststart(self) -> bool {
        matches!(self, Self::Mp4 | Self::Mov)
    }
}

/// Which audio reaches the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioMap {
    /// Let ffmpeg pick streams (no explicit `-map`).
    Auto,
    /// Optional audio of the given input (`N:a?`).
    FromInput(usize),
}

/// Encoder settings for one output file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputOptions {
    pub format: ContainerFormat,
    pub crf: u8,
    pub preset: &'static str,
    pub audio: AudioMap,
    pub duration_secs: Option<u32>,
}

impl OutputOptions {
    /// Plain compose: H.264 `fast`, CRF 23, audio from the background video.
    pub fn compose(duration_secs: u32) -> Self {
        Self {
            format: ContainerFormat::Mp4,
            crf: 23,
            preset: "fast",
            audio: AudioMap::FromInput(0),
            duration_secs: Some(duration_secs),
        }
    }

    /// Enhanced compose: H.264 `medium`, CRF 20.
    pub fn enhanced(duration_secs: u32, audio: AudioMap) -> Self {
        Self {
            format: ContainerFormat::Mp4,
            crf: 20,
            preset: "medium",
            audio,
            duration_secs: Some(duration_secs),
        }
    }

    /// Re-encode an existing artifact.
    pub fn convert(format: ContainerFormat, quality: Quality) -> Self {
        Self {
            format,
            crf: quality.crf(),
            preset: quality.preset(),
            audio: AudioMap::Auto,
            duration_secs: None,
        }
    }
}

/// One `ffmpeg` input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSpec {
    pub path: PathBuf,
    /// Repeat the input forever (`-stream_loop -1`).
    pub looped: bool,
}

impl InputSpec {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            looped: false,
        }
    }

    pub fn looped(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            looped: true,
        }
    }
}

/// Everything an external renderer needs for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderRequest {
    pub inputs: Vec<InputSpec>,
    /// Graph and the label of its video output pad.
    pub graph: Option<(FilterGraph, String)>,
    pub options: OutputOptions,
    pub output: PathBuf,
}

impl RenderRequest {
    /// Lower to `ffmpeg` arguments (without the program name).
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
            .into_iter()
            .map(OsString::from)
            .collect();
        for input in &self.inputs {
            if input.looped {
                args.extend(["-stream_loop", "-1"].map(OsString::from));
            }
            args.push("-i".into());
            args.push(input.path.clone().into_os_string());
        }

        let opts = &self.options;
        if let Some((graph, pad)) = &self.graph {
            args.push("-filter_complex".into());
            args.push(graph.to_string().into());
            args.push("-map".into());
            args.push(format!("[{pad}]").into());
        }
        match opts.audio {
            AudioMap::Auto => {}
            AudioMap::FromInput(i) => {
                args.push("-map".into());
                args.push(format!("{i}:a?").into());
            }
        }

        let format = opts.format;
        args.extend(["-c:v", format.video_codec()].map(OsString::from));
        if format == ContainerFormat::Webm {
            args.extend(["-b:v", "0"].map(OsString::from));
        } else {
            args.extend(["-preset", opts.preset].map(OsString::from));
        }
        args.push("-crf".into());
        args.push(opts.crf.to_string().into());
        args.extend(["-pix_fmt", "yuv420p"].map(OsString::from));
        args.extend(["-c:a", format.audio_codec()].map(OsString::from));
        if format.faststart() {
            args.extend(["-movflags", "+faststart"].map(OsString::from));
        }
        if let Some(secs) = opts.duration_secs {
            args.push("-t".into());
            args.push(secs.to_string().into());
        }
        args.push(self.output.clone().into_os_string());
        args
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filtergraph/command.rs"]
mod tests;
