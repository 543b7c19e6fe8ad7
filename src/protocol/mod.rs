//! Wire-level constants and response classification for the TagSense API.
//!
//! This module owns the parts of the protocol that are independent of any
//! one request: endpoint paths, the throttle header, the service status
//! vocabulary, and the two classifiers every completed exchange is routed
//! through.
//!
//! # Classification stages
//!
//! | Stage | Input | Dispositions |
//! |-------|-------|--------------|
//! | [`classify_http_status`] | HTTP status code | `Deliverable`, `Throttled`, `Unexpected` |
//! | [`classify_api_status`] | body `status_code` | `Deliver`, `RefreshToken`, `Unhandled` |
//!
//! A `401 Unauthorized` is deliberately classified `Deliverable`: the body
//! still carries a machine-readable status code, and the token-invalid
//! decision belongs to the API-level classifier.
//!
//! # Examples
//!
//! ```
//! use tagsense::protocol::{classify_http_status, HttpDisposition};
//!
//! assert_eq!(classify_http_status(200), HttpDisposition::Deliverable);
//! assert_eq!(classify_http_status(401), HttpDisposition::Deliverable);
//! assert_eq!(classify_http_status(429), HttpDisposition::Throttled);
//! assert_eq!(classify_http_status(500), HttpDisposition::Unexpected);
//! ```

use std::collections::BTreeMap;

use tracing::warn;

/// Path of the tagging endpoint.
pub const TAG_PATH: &str = "/v1/tag/";

/// Path of the client-credentials token endpoint.
pub const TOKEN_PATH: &str = "/v1/token";

/// Path of the feedback endpoint (add and remove tags).
pub const FEEDBACK_PATH: &str = "/v1/feedback";

/// Response header carrying the throttle wait interval, in integer seconds.
pub const THROTTLE_WAIT_HEADER: &str = "x-throttle-wait-seconds";

/// Service status codes carried in the `status_code` field of responses.
pub mod status {
    /// Every item in the batch succeeded.
    pub const OK: &str = "OK";
    /// Some items succeeded, some failed; inspect per-item status codes.
    pub const PARTIAL_ERROR: &str = "PARTIAL_ERROR";
    /// Every item in the batch failed; inspect per-item status codes.
    pub const ALL_ERROR: &str = "ALL_ERROR";
    /// The presented access token is not valid.
    pub const TOKEN_INVALID: &str = "TOKEN_INVALID";
    /// The presented access token has expired.
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    /// Synthetic local status delivered while the client is throttled.
    pub const ERROR_THROTTLED: &str = "ERROR_THROTTLED";
}

/// Disposition of a completed HTTP exchange, by status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpDisposition {
    /// The body carries a service status code and should be handed to the
    /// API-level classifier (200, 201, 401).
    Deliverable,
    /// The service instructed the client to suspend traffic (429).
    Throttled,
    /// Any other status. Logged; surfaced to the caller as an error.
    Unexpected,
}

/// Classify an HTTP status code into its handling disposition.
pub fn classify_http_status(status: u16) -> HttpDisposition {
    match status {
        200 | 201 | 401 => HttpDisposition::Deliverable,
        429 => HttpDisposition::Throttled,
        _ => HttpDisposition::Unexpected,
    }
}

/// Disposition of a parsed response body, by service status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiDisposition {
    /// Deliver the parsed envelope to the caller. Covers full success and
    /// the batch-error statuses the caller inspects per item.
    Deliver,
    /// The access token was rejected; refresh it and replay the request.
    RefreshToken,
    /// A status code outside the handled vocabulary. Logged; surfaced to
    /// the caller as an error.
    Unhandled,
}

/// Classify a service status code into its handling disposition.
///
/// ```
/// use tagsense::protocol::{classify_api_status, ApiDisposition};
///
/// assert_eq!(classify_api_status("OK"), ApiDisposition::Deliver);
/// assert_eq!(classify_api_status("TOKEN_INVALID"), ApiDisposition::RefreshToken);
/// assert_eq!(classify_api_status("SOMETHING_NEW"), ApiDisposition::Unhandled);
/// ```
pub fn classify_api_status(code: &str) -> ApiDisposition {
    match code {
        status::OK | status::PARTIAL_ERROR | status::ALL_ERROR => ApiDisposition::Deliver,
        status::TOKEN_INVALID | status::TOKEN_EXPIRED => ApiDisposition::RefreshToken,
        _ => ApiDisposition::Unhandled,
    }
}

/// Read the throttle wait interval from a throttled response's headers.
///
/// Header names are matched case-insensitively. A missing or malformed
/// header is treated as a zero-second wait, so the throttle episode still
/// runs both observer notifications.
pub fn throttle_wait_seconds(headers: &BTreeMap<String, String>) -> u64 {
    let value = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(THROTTLE_WAIT_HEADER))
        .map(|(_, value)| value.trim());

    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(value = raw, "malformed throttle wait header, treating as 0");
            0
        }),
        None => {
            warn!("throttled response without wait header, treating as 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_success_codes() {
        assert_eq!(classify_http_status(200), HttpDisposition::Deliverable);
        assert_eq!(classify_http_status(201), HttpDisposition::Deliverable);
    }

    #[test]
    fn test_classify_http_unauthorized_is_deliverable() {
        assert_eq!(classify_http_status(401), HttpDisposition::Deliverable);
    }

    #[test]
    fn test_classify_http_throttled() {
        assert_eq!(classify_http_status(429), HttpDisposition::Throttled);
    }

    #[test]
    fn test_classify_http_unexpected() {
        assert_eq!(classify_http_status(404), HttpDisposition::Unexpected);
        assert_eq!(classify_http_status(500), HttpDisposition::Unexpected);
        assert_eq!(classify_http_status(302), HttpDisposition::Unexpected);
    }

    #[test]
    fn test_classify_api_deliverable_statuses() {
        assert_eq!(classify_api_status("OK"), ApiDisposition::Deliver);
        assert_eq!(classify_api_status("PARTIAL_ERROR"), ApiDisposition::Deliver);
        assert_eq!(classify_api_status("ALL_ERROR"), ApiDisposition::Deliver);
    }

    #[test]
    fn test_classify_api_refresh_triggers() {
        assert_eq!(classify_api_status("TOKEN_INVALID"), ApiDisposition::RefreshToken);
        assert_eq!(classify_api_status("TOKEN_EXPIRED"), ApiDisposition::RefreshToken);
    }

    #[test]
    fn test_classify_api_unhandled() {
        assert_eq!(classify_api_status("TIMEOUT"), ApiDisposition::Unhandled);
        assert_eq!(classify_api_status(""), ApiDisposition::Unhandled);
    }

    #[test]
    fn test_throttle_wait_seconds() {
        let mut headers = BTreeMap::new();
        headers.insert(THROTTLE_WAIT_HEADER.to_string(), "5".to_string());
        assert_eq!(throttle_wait_seconds(&headers), 5);
    }

    #[test]
    fn test_throttle_wait_seconds_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Throttle-Wait-Seconds".to_string(), " 12 ".to_string());
        assert_eq!(throttle_wait_seconds(&headers), 12);
    }

    #[test]
    fn test_throttle_wait_seconds_missing_or_malformed() {
        assert_eq!(throttle_wait_seconds(&BTreeMap::new()), 0);

        let mut headers = BTreeMap::new();
        headers.insert(THROTTLE_WAIT_HEADER.to_string(), "soon".to_string());
        assert_eq!(throttle_wait_seconds(&headers), 0);
    }
}
