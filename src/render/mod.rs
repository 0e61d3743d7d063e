//! Frame rendering: the drawing-surface abstraction, its raster and recording implementations,
//! and the compositor that layers a composition onto them.

/// Gaussian blur used for drop shadows.
pub mod blur;
/// Layer order and styling of one composed frame.
pub mod compositor;
/// `vello_cpu` raster surface.
pub mod cpu;
/// Owned frame buffers.
pub mod frame;
/// Display-list surface for inspection and tests.
pub mod recording;
/// The [`surface::DrawSurface`] trait and its geometry types.
pub mod surface;
pub(crate) mod text;
