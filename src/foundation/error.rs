/// Convenience result type used across the composer.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Top-level error taxonomy used by composer APIs.
#[derive(thiserror::Error, Debug)]
pub enum ComposerError {
    /// Invalid caller-provided parameters (ranges, sizes, MIME types, upload caps).
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed or unreadable media input.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// The capture/encoding pipeline failed to start or write.
    #[error("capture error: {0}")]
    Capture(String),

    /// The external renderer could not be started or exited with a failure.
    #[error("render invocation error: {0}")]
    RenderInvocation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ComposerError {
    /// Build a [`ComposerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ComposerError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`ComposerError::Capture`] value.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture(msg.into())
    }

    /// Build a [`ComposerError::RenderInvocation`] value.
    pub fn render_invocation(msg: impl Into<String>) -> Self {
        Self::RenderInvocation(msg.into())
    }

    /// Build a [`ComposerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors caused by the caller rather than the environment.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::AssetLoad(_) | Self::Serde(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
