//! crates/cognipath_core/src/error.rs
//!
//! Error taxonomy for the tutoring pipelines.

use crate::ports::PortError;
use std::time::Duration;

/// Failure of a tutoring operation, as seen by the caller.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    /// Required input was missing. Raised before any remote call is made.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// The remote call failed, or its output could not be turned into the contracted shape.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("remote model call failed: {0}")]
    Remote(#[from] PortError),

    #[error("remote model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("model output is not valid JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    #[error("model output does not match the expected schema: {0}")]
    SchemaViolation(String),
}

/// A convenience type alias for `Result<T, TutorError>`.
pub type TutorResult<T> = Result<T, TutorError>;

impl TutorError {
    pub fn validation(message: impl Into<String>) -> Self {
        TutorError::Validation(message.into())
    }
}
