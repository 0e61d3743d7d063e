use std::sync::Arc;

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Progress information.
    Info,
    /// A step completed.
    Success,
    /// A step failed or degraded.
    Error,
}

/// Transient status message for whoever drives a session.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Receiver of session notices. Called from the capture threads.
pub type NoticeCallback = Arc<dyn Fn(&Notice) + Send + Sync>;

pub(crate) const RECORDING_STARTED: &str = "Recording started...";
pub(crate) const RECORDING_COMPLETED: &str = "Recording completed!";
pub(crate) const VIDEO_READY: &str = "Video ready for download!";
pub(crate) const START_FAILED: &str = "Error starting recording";
