//! Domain errors for the QA intake system.

use thiserror::Error;

/// Domain-level errors that can occur in the QA intake system.
///
/// Every variant is recoverable from the conversation's point of view: the
/// dialogue engine turns them into a re-prompt rather than ending the chat.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    InvalidProjectId(String),

    #[error("{0}")]
    InvalidTimeWindow(String),

    #[error("{0}")]
    MissingSubmissionData(String),

    #[error("{0}")]
    InvalidMetricInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("I couldn't confidently determine the {0}. Could you be more specific?")]
    AmbiguousExtraction(String),

    #[error("Storage operation failed: {0}")]
    StorageFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
