/// Core value types: frame indices, fps, canvas, colors, geometry.
pub mod core;
/// Error taxonomy shared by every module.
pub mod error;
pub(crate) mod math;
