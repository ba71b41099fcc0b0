use reqwest::StatusCode;
use thiserror::Error;

use crate::domain::errors::DomainError;

/// Errors raised while talking to the extraction service
#[derive(Error, Debug)]
pub enum ExtractionClientError {
    /// Request rejected as malformed (HTTP 400, 422)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or rejected API key (HTTP 401, 403)
    #[error("Extraction service rejected the credentials")]
    Unauthorized,

    /// Endpoint not found (HTTP 404)
    #[error("Extraction endpoint not found")]
    NotFound,

    /// Too many requests (HTTP 429)
    #[error("Extraction service rate limit exceeded")]
    RateLimited,

    /// Server-side failure (HTTP 5xx)
    #[error("Server error ({0}): {1}")]
    ServerError(StatusCode, String),

    /// Connection, timeout or body read failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Unexpected status ({0}): {1}")]
    Unexpected(StatusCode, String),
}

impl ExtractionClientError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status.as_u16() {
            400 | 422 => Self::InvalidRequest(body),
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            429 => Self::RateLimited,
            500..=599 => Self::ServerError(status, body),
            _ => Self::Unexpected(status, body),
        }
    }

    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited | Self::ServerError(_, _) => true,
            Self::Network(err) => !err.is_decode() && !err.is_builder(),
            _ => false,
        }
    }
}

impl From<ExtractionClientError> for DomainError {
    fn from(err: ExtractionClientError) -> Self {
        DomainError::ExtractionFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ExtractionClientError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ExtractionClientError::RateLimited
        ));
        assert!(matches!(
            ExtractionClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ExtractionClientError::Unauthorized
        ));
        assert!(matches!(
            ExtractionClientError::from_status(StatusCode::IM_A_TEAPOT, "tea".to_string()),
            ExtractionClientError::Unexpected(_, _)
        ));
    }

    #[test]
    fn test_transient_errors() {
        assert!(ExtractionClientError::RateLimited.is_transient());
        assert!(
            ExtractionClientError::ServerError(StatusCode::BAD_GATEWAY, "down".to_string())
                .is_transient()
        );
        assert!(!ExtractionClientError::InvalidRequest("bad".to_string()).is_transient());
        assert!(!ExtractionClientError::NotFound.is_transient());
        assert!(!ExtractionClientError::InvalidResponse("{}".to_string()).is_transient());
    }

    #[test]
    fn test_converts_to_extraction_failed() {
        let err: DomainError = ExtractionClientError::NotFound.into();
        assert_eq!(err.to_string(), "Extraction failed: Extraction endpoint not found");
    }
}
