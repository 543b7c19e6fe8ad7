//! Response types for the TagSense API.
//!
//! Tag and feedback responses share one top-level envelope: a service
//! `status_code`, an optional human-readable `status_msg`, and a `results`
//! sequence with one entry per submitted image. Fields the service omits
//! deserialize to their defaults, so partial and error payloads parse with
//! the same types as full successes.

use serde::Deserialize;

use crate::protocol::status;

/// Top-level response envelope shared by the tag and feedback endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiResponse {
    /// Batch-level service status code (`OK`, `PARTIAL_ERROR`, `ALL_ERROR`,
    /// or the synthetic `ERROR_THROTTLED`).
    #[serde(default)]
    pub status_code: String,

    /// Human-readable description of the batch outcome.
    #[serde(default)]
    pub status_msg: Option<String>,

    /// Per-image results. Empty for feedback acknowledgements and synthetic
    /// throttled responses.
    #[serde(default)]
    pub results: Vec<TagResult>,
}

impl ApiResponse {
    /// Synthetic local result delivered while the client is throttled.
    /// No network request was made to produce it.
    pub(crate) fn throttled() -> Self {
        ApiResponse {
            status_code: status::ERROR_THROTTLED.to_string(),
            status_msg: Some("Request refused. Service is throttled.".to_string()),
            results: Vec::new(),
        }
    }

    /// True when every item in the batch succeeded.
    pub fn is_ok(&self) -> bool {
        self.status_code == status::OK
    }

    /// True when this is a synthetic throttled result produced locally.
    pub fn is_throttled(&self) -> bool {
        self.status_code == status::ERROR_THROTTLED
    }
}

/// Outcome for a single image within a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagResult {
    /// Opaque document identifier assigned by the service. Numeric or string
    /// depending on the service version, so it is kept as raw JSON.
    #[serde(default)]
    pub docid: Option<serde_json::Value>,

    /// Caller-supplied correlation token, echoed back unmodified.
    #[serde(default)]
    pub local_id: Option<String>,

    /// Per-item service status code.
    #[serde(default)]
    pub status_code: Option<String>,

    /// The tagging payload, or the per-item error that replaced it.
    #[serde(default)]
    pub result: Option<ResultPayload>,
}

/// Payload of a single result: either a tag annotation or an error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultPayload {
    /// Tag classes and probabilities, present on success.
    #[serde(default)]
    pub tag: Option<TagAnnotation>,

    /// Service-reported error detail, present on per-item failure.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Tag classes with their parallel probability scores.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TagAnnotation {
    /// Recognized class names, most probable first.
    #[serde(default)]
    pub classes: Vec<String>,

    /// Probability for each entry in `classes`, index-aligned.
    #[serde(default)]
    pub probs: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_tag_response() {
        let body = r#"{
            "status_code": "OK",
            "status_msg": "All images in request have completed successfully.",
            "results": [{
                "docid": 15512461224882630000,
                "local_id": "photo-42",
                "status_code": "OK",
                "result": {"tag": {"classes": ["train", "railway"], "probs": [0.98, 0.95]}}
            }]
        }"#;

        let response: ApiResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_ok());
        assert_eq!(response.results.len(), 1);

        let item = &response.results[0];
        assert_eq!(item.local_id.as_deref(), Some("photo-42"));
        let tag = item.result.as_ref().unwrap().tag.as_ref().unwrap();
        assert_eq!(tag.classes, vec!["train", "railway"]);
        assert_eq!(tag.probs.len(), 2);
    }

    #[test]
    fn test_deserialize_sparse_envelope() {
        let response: ApiResponse =
            serde_json::from_str(r#"{"status_code": "ALL_ERROR"}"#).unwrap();
        assert_eq!(response.status_code, "ALL_ERROR");
        assert!(response.status_msg.is_none());
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_per_item_error_payload() {
        let body = r#"{
            "status_code": "PARTIAL_ERROR",
            "results": [{
                "docid": "abc",
                "status_code": "CLIENT_ERROR",
                "result": {"error": "image too large"}
            }]
        }"#;

        let response: ApiResponse = serde_json::from_str(body).unwrap();
        let payload = response.results[0].result.as_ref().unwrap();
        assert!(payload.tag.is_none());
        assert!(payload.error.is_some());
    }

    #[test]
    fn test_synthetic_throttled_result() {
        let response = ApiResponse::throttled();
        assert!(response.is_throttled());
        assert!(!response.is_ok());
        assert!(response.results.is_empty());
        assert_eq!(
            response.status_msg.as_deref(),
            Some("Request refused. Service is throttled.")
        );
    }
}
