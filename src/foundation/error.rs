use std::path::{Path, PathBuf};

/// Convenience result type used across the recap pipeline.
pub type RecapResult<T> = Result<T, RecapError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum RecapError {
    /// Invalid user-provided configuration or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A required input file does not exist.
    #[error("missing input: '{}' not found", .0.display())]
    MissingInput(PathBuf),

    /// A provider client was constructed without its API credential.
    #[error("missing credential: {0} must be set")]
    MissingCredential(String),

    /// The provider signalled quota exhaustion (HTTP 429 / `RESOURCE_EXHAUSTED`).
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Any other provider failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// Local media tooling or decoding failure (ffmpeg, pdftoppm, image decode).
    #[error("media error: {0}")]
    Media(String),

    /// Nothing was left to render after applying the skip rules.
    #[error("no clips to assemble")]
    EmptyTimeline,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecapError {
    /// Build a [`RecapError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RecapError::MissingInput`] value.
    pub fn missing_input(path: impl AsRef<Path>) -> Self {
        Self::MissingInput(path.as_ref().to_path_buf())
    }

    /// Build a [`RecapError::MissingCredential`] value.
    pub fn missing_credential(name: impl Into<String>) -> Self {
        Self::MissingCredential(name.into())
    }

    /// Build a [`RecapError::QuotaExhausted`] value.
    pub fn quota(msg: impl Into<String>) -> Self {
        Self::QuotaExhausted(msg.into())
    }

    /// Build a [`RecapError::Provider`] value.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Build a [`RecapError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`RecapError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for the only error kind the narration retry loop recovers from.
    pub fn is_quota_exhausted(&self) -> bool {
        matches!(self, Self::QuotaExhausted(_))
    }
}

impl From<serde_json::Error> for RecapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
