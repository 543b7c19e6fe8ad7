//! TagSense API client implementation.
//!
//! This module provides the complete client: request operations, the
//! access-token lifecycle, throttle tracking, and the transport seam they
//! all run on.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── api        - TagSenseClient and the request pipeline
//! ├── config     - Client configuration and credentials
//! ├── operations - Operation descriptors and form-body encoding
//! ├── throttle   - Throttle flag, clearing timer, observer
//! ├── token      - Single-flight token refresh and the replay queue
//! └── transport  - Transport trait and the reqwest-backed HttpTransport
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TagSenseClient`] | Main API client |
//! | [`ClientConfig`] | Client configuration options |
//! | [`Credentials`] | Client-credentials identity |
//! | [`Transport`] | Pluggable HTTP collaborator |
//! | [`HttpTransport`] | Production `reqwest` transport |
//! | [`ThrottleHandler`] | Observer for throttle episodes |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use tagsense::{ClientConfig, TagSenseClient};
//!
//! // Default configuration
//! let client = TagSenseClient::new("client-id", "client-secret");
//!
//! // Custom configuration
//! let config = ClientConfig {
//!     host: "api.staging.tagsense.io".to_string(),
//!     verbose: true,
//!     ..Default::default()
//! };
//! let client = TagSenseClient::with_config("client-id", "client-secret", config);
//! ```
//!
//! ## Tagging and Feedback
//!
//! ```ignore
//! let response = client.tag_url("http://example.com/a.jpg", None).await?;
//! let docids = vec!["15512461224882630000".to_string()];
//! client.feedback_add_tags(docids, vec!["train".to_string()], None).await?;
//! ```

mod api;
mod config;
mod operations;
mod throttle;
mod token;
mod transport;

pub use api::TagSenseClient;
pub use config::{ClientConfig, Credentials};
pub use throttle::ThrottleHandler;
pub use transport::{FormRequest, HttpTransport, RawResponse, Transport};
