#![forbid(unsafe_code)]
//! Sketch composer.
//!
//! Layers a sketch image, a looping background video and a two-line label onto a 9:16 canvas.
//! The same resolved layout drives three outputs:
//!
//! - single preview frames rendered on the CPU ([`render::cpu::CpuSurface`]),
//! - live recordings captured to WebM ([`capture::session::CaptureSession`]),
//! - server-side composition through an `ffmpeg` filter graph ([`server`]).

pub mod assets;
pub mod capture;
pub mod composition;
pub mod encode;
pub mod filtergraph;
pub mod foundation;
pub mod layout;
pub mod logging;
pub mod render;
pub mod server;

pub use assets::AssetSet;
pub use assets::decode::PreparedImage;
pub use capture::session::{CaptureOptions, CaptureSession, SessionState};
pub use composition::config::CompositionConfig;
pub use encode::sink::{ExportArtifact, FrameSink};
pub use foundation::core::{Canvas, Fps, FrameIndex, PixelRect, Rgba8Premul};
pub use foundation::error::{ComposerError, ComposerResult};
pub use layout::engine::{ResolvedLayout, resolve_layout};
pub use render::compositor::render_frame;
pub use render::frame::FrameRGBA;
