//! Live capture: a paced frame stream feeding an encoder sink until stopped.

/// User-facing status notices.
pub mod notice;
/// Recording session state machine.
pub mod session;
/// Frame sources.
pub mod source;
/// Cancellable one-shot timer.
pub mod timer;
