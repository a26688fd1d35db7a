//! Shared error types for the services crate.

use thiserror::Error;

use pictalk_core::model::ImageReferenceError;

/// Errors from decoding gateway markup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MarkupError {
    #[error("markup has no checklist container")]
    MissingContainer,

    #[error("checklist container has no readable items")]
    NoItems,
}

/// Classified failures from the remote exercise gateway.
///
/// Each variant is distinguishable so callers can decide whether to retry,
/// wake the service, or fall back to local simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("gateway token is invalid or unauthorized")]
    Auth,

    #[error("access to the exercise space is forbidden")]
    Permission,

    #[error("exercise space {space} was not found")]
    NotFound { space: String },

    #[error("exercise space is not running (stage: {stage})")]
    Unavailable { stage: String },

    #[error("exercise space did not wake up in time")]
    WakeTimeout,

    #[error("gateway request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("gateway returned a response the decoder cannot parse: {0}")]
    Malformed(String),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    ImageReference(#[from] ImageReferenceError),
}

impl GatewayError {
    /// True for failures that may clear on their own (the space waking up or
    /// a transient transport error), where retrying is worthwhile before
    /// falling back to local simulation.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable { .. } | GatewayError::WakeTimeout | GatewayError::Http(_)
        )
    }
}

/// Errors from an exercise provider (remote gateway or local simulation).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{operation} is not available in local simulation")]
    Unsupported { operation: &'static str },

    #[error("placeholder image could not be encoded")]
    PlaceholderEncoding(#[from] image::ImageError),
}

/// Errors emitted by `ExerciseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExerciseError {
    #[error("description is empty")]
    EmptyUtterance,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}
