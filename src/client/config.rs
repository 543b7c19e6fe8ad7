//! Client configuration.

use std::fmt;

/// Configuration for a [`TagSenseClient`](crate::TagSenseClient).
///
/// All fields are public so configurations can be built with struct-update
/// syntax:
///
/// ```
/// use tagsense::ClientConfig;
///
/// let config = ClientConfig {
///     host: "api.staging.tagsense.io".to_string(),
///     verbose: true,
///     ..Default::default()
/// };
/// assert_eq!(config.port, 443);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host name.
    pub host: String,

    /// API port.
    pub port: u16,

    /// URL scheme, `https` in production. Overridable so tests can point
    /// the client at a plain-HTTP mock server.
    pub scheme: String,

    /// Optional model name appended to tag and feedback requests.
    pub model: Option<String>,

    /// Log raw request and response bodies at debug level.
    pub log_http: bool,

    /// Log token and throttle lifecycle events at info level.
    pub verbose: bool,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Connection pool size for the built-in HTTP transport.
    pub max_total_connections: u32,

    /// Proxy URL for the built-in HTTP transport; empty disables proxying.
    pub proxy_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "api.tagsense.io".to_string(),
            port: 443,
            scheme: "https".to_string(),
            model: None,
            log_http: false,
            verbose: false,
            request_timeout_ms: 30_000,
            max_total_connections: 16,
            proxy_url: String::new(),
        }
    }
}

/// Client-credentials identity used to obtain access tokens.
///
/// The secret is redacted from debug output.
#[derive(Clone)]
pub struct Credentials {
    /// OAuth-style client id.
    pub client_id: String,

    /// OAuth-style client secret.
    pub client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}
