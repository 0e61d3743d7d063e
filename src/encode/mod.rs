//! Encoding sinks.
//!
//! Sinks consume rendered frames in capture order and produce one [`sink::ExportArtifact`].

/// `ffmpeg`-based WebM/VP9 sink.
pub mod ffmpeg;
/// Generic frame sink trait, the artifact type and the in-memory sink.
pub mod sink;
