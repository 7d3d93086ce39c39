//! Error types for the LessonChat service.

use thiserror::Error;

/// Result type alias using the LessonChat error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for LessonChat.
///
/// Every failure here is terminal for the current request; nothing is retried
/// automatically and none of these abort the process.
#[derive(Error, Debug)]
pub enum Error {
    /// Service configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or invalid anti-forgery token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Missing or empty required field in a request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Completion provider has no API key configured
    #[error("Provider not configured: {0}")]
    ProviderConfiguration(String),

    /// Network-level failure talking to the completion provider
    #[error("Provider transport error: {0}")]
    ProviderTransport(String),

    /// Provider replied without the expected reply-text field
    #[error("Malformed provider response: {0}")]
    ProviderResponse(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this is a provider-stage error (nothing must be persisted).
    pub const fn is_provider(&self) -> bool {
        matches!(
            self,
            Self::ProviderConfiguration(_) | Self::ProviderTransport(_) | Self::ProviderResponse(_)
        )
    }

    /// Get HTTP status code for this error.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::InvalidRequest(_) => 400,
            Self::ProviderConfiguration(_) | Self::ProviderTransport(_) | Self::ProviderResponse(_) => 502,
            _ => 500,
        }
    }

    /// Stable machine-readable code for the error envelope.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ProviderConfiguration(_) => "PROVIDER_NOT_CONFIGURED",
            Self::ProviderTransport(_) => "PROVIDER_UNAVAILABLE",
            Self::ProviderResponse(_) => "PROVIDER_BAD_RESPONSE",
            _ => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(Error::Unauthorized("test".into()).status_code(), 401);
        assert_eq!(Error::InvalidRequest("test".into()).status_code(), 400);
        assert_eq!(Error::NotFound("test".into()).status_code(), 404);
        assert_eq!(Error::ProviderConfiguration("test".into()).status_code(), 502);
        assert_eq!(Error::ProviderTransport("test".into()).status_code(), 502);
        assert_eq!(Error::ProviderResponse("test".into()).status_code(), 502);
        assert_eq!(Error::Internal("test".into()).status_code(), 500);
    }

    #[test]
    fn test_provider_classification() {
        assert!(Error::ProviderConfiguration("no key".into()).is_provider());
        assert!(Error::ProviderTransport("timeout".into()).is_provider());
        assert!(Error::ProviderResponse("no choices".into()).is_provider());
        assert!(!Error::InvalidRequest("empty".into()).is_provider());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::Unauthorized("t".into()).code(), "UNAUTHORIZED");
        assert_eq!(
            Error::ProviderConfiguration("t".into()).code(),
            "PROVIDER_NOT_CONFIGURED"
        );
    }
}
