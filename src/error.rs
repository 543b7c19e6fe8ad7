//! Error types and result handling.
//!
//! Every fallible SDK operation returns [`Result`]. The variants mirror the
//! ways a request can go wrong: transport failures, HTTP statuses outside
//! the handled set, service status codes the SDK does not recognize, and the
//! two token-refresh failure modes (credentials refused, refresh aborted for
//! transport or protocol reasons).
//!
//! Errors are cheap value types; they clone so that a single failed token
//! refresh can be delivered to every request queued behind it.

use thiserror::Error;

/// Errors produced by the TagSense client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagSenseError {
    /// The HTTP transport failed before a response was delivered
    /// (connection refused, timeout, TLS failure).
    #[error("http transport error: {0}")]
    Http(String),

    /// The service answered with an HTTP status outside the handled set
    /// (not 200, 201, 401, or 429).
    #[error("unexpected http status {0}")]
    UnexpectedStatus(u16),

    /// The response body carried a `status_code` the SDK does not handle.
    #[error("unhandled api status code: {0}")]
    UnhandledApiStatus(String),

    /// The token endpoint refused the configured client credentials.
    #[error("token request refused: {code}")]
    TokenRefused {
        /// Service status code returned by the token endpoint.
        code: String,
        /// Human-readable message, when the service supplied one.
        message: Option<String>,
    },

    /// A token refresh died before a verdict on the credentials was reached,
    /// failing every request queued behind it.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The response body was not valid JSON or did not match the expected
    /// shape.
    #[error("malformed api response: {0}")]
    Json(String),
}

impl From<serde_json::Error> for TagSenseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl TagSenseError {
    /// True when the error means the configured credentials were rejected
    /// outright, so retrying without reconfiguration cannot succeed.
    pub fn is_token_refused(&self) -> bool {
        matches!(self, Self::TokenRefused { .. })
    }
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TagSenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formats() {
        let err = TagSenseError::UnexpectedStatus(503);
        assert_eq!(err.to_string(), "unexpected http status 503");

        let err = TagSenseError::TokenRefused {
            code: "CREDENTIALS_INVALID".to_string(),
            message: None,
        };
        assert_eq!(err.to_string(), "token request refused: CREDENTIALS_INVALID");
    }

    #[test]
    fn test_json_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err = TagSenseError::from(parse_err);
        assert!(matches!(err, TagSenseError::Json(_)));
    }

    #[test]
    fn test_is_token_refused() {
        let refused = TagSenseError::TokenRefused {
            code: "CREDENTIALS_INVALID".to_string(),
            message: Some("bad pair".to_string()),
        };
        assert!(refused.is_token_refused());
        assert!(!TagSenseError::Http("reset".to_string()).is_token_refused());
    }
}
