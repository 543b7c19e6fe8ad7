//! HTTP transport seam.
//!
//! The client core never talks to the network directly; it hands a
//! [`FormRequest`] to a [`Transport`] and gets back the fully buffered
//! [`RawResponse`]. Production uses [`HttpTransport`], a thin `reqwest`
//! wrapper. Tests inject in-memory transports to script exact response
//! sequences.
//!
//! Network-level failures surface as [`TagSenseError::Http`]; everything
//! that produced an HTTP status code, including 4xx and 5xx, is returned as
//! a response and left to the classifiers.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::config::ClientConfig;
use crate::error::{Result, TagSenseError};

/// An outgoing form-encoded POST request.
#[derive(Debug, Clone)]
pub struct FormRequest {
    /// Absolute request URL.
    pub url: String,

    /// Bearer token for the `Authorization` header. Always reflects the
    /// client's currently stored token, stale or not.
    pub bearer: String,

    /// URL-encoded request body.
    pub body: String,
}

/// A completed HTTP exchange, fully buffered.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers. Names are lower-cased by the built-in transport.
    pub headers: BTreeMap<String, String>,

    /// Response body bytes.
    pub body: Bytes,
}

/// The HTTP collaborator the client core is written against.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a form-encoded POST and deliver the buffered response.
    async fn post_form(&self, request: &FormRequest) -> Result<RawResponse>;
}

/// Production transport built on `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport from the client configuration (timeout, pool
    /// sizing, optional proxy).
    pub fn new(config: &ClientConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_total_connections as usize);

        if !config.proxy_url.is_empty() {
            if let Ok(proxy) = reqwest::Proxy::all(&config.proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        HttpTransport {
            client: builder.build().unwrap_or_default(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_form(&self, request: &FormRequest) -> Result<RawResponse> {
        let response = self
            .client
            .post(&request.url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", request.bearer),
            )
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| TagSenseError::Http(e.to_string()))?;

        let status = response.status().as_u16();

        let mut headers = BTreeMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TagSenseError::Http(e.to_string()))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_construction() {
        let transport = HttpTransport::new(&ClientConfig::default());
        // The builder must not panic with defaults; a usable client exists.
        let _ = &transport.client;
    }

    #[test]
    fn test_transport_with_proxy_config() {
        let config = ClientConfig {
            proxy_url: "http://127.0.0.1:3128".to_string(),
            ..Default::default()
        };
        let _ = HttpTransport::new(&config);
    }
}
