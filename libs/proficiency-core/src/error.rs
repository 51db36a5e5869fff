//! Error types for proficiency-core.

use thiserror::Error;

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised when stored labels cannot be mapped onto core types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown requirement type: {0}")]
    UnknownRequirementType(String),

    #[error("unknown achievement category: {0}")]
    UnknownCategory(String),

    #[error("unknown submission status: {0}")]
    UnknownSubmissionStatus(String),

    #[error("unknown scheduling algorithm: {0}")]
    UnknownAlgorithm(String),
}
