//! Structured `ffmpeg` filter graphs.
//!
//! Graphs are built as values from a [`crate::layout::engine::ResolvedLayout`] and only lowered
//! to ffmpeg's textual syntax at the very end, with every option value escaped on the way.

/// Compose graph builder and its fixed-order effect stages.
pub mod compose;
/// Output encoding options and the full `ffmpeg` argument list.
pub mod command;
/// Two-level escaping for option values.
pub mod escape;
/// Filter, chain and graph values plus their lowering.
pub mod graph;
