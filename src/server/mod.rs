//! HTTP composition service.
//!
//! Each request stores its uploads under uuid names, runs the external renderer once with a
//! filter graph built from the shared layout, and removes its temporary inputs on every path.

/// Server settings (`clap` arguments with environment fallbacks).
pub mod config;
/// JSON error responses.
pub mod error;
/// Request parameter parsing.
pub mod params;
/// External renderer abstraction and the `ffmpeg` CLI implementation.
pub mod renderer;
/// Router, handlers and the serve loop.
pub mod routes;
/// Multipart upload storage and temp-file cleanup.
pub mod upload;

pub use config::ServerConfig;
pub use renderer::{ExternalRenderer, FfmpegCli};
pub use routes::{AppState, router, serve};
