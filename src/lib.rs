#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//! # TagSense client SDK
//!
//! This crate is a client for the TagSense image-tagging HTTP API. Callers
//! tag images by URL and send feedback (adding or removing tags) against
//! previously tagged documents; the SDK owns everything awkward in between:
//! the access-token lifecycle, replay of requests interrupted by a token
//! refresh, and server-driven throttling.
//!
//! ## How a request flows
//!
//! 1. If the client is throttled, the request resolves locally with a
//!    synthetic `ERROR_THROTTLED` result and no network call is made.
//! 2. Otherwise one form-encoded POST goes out through the [`Transport`],
//!    authenticated with the currently stored bearer token.
//! 3. The HTTP status is classified: `200`/`201`/`401` bodies proceed to
//!    API-level classification, `429` starts a throttle episode, anything
//!    else surfaces as an error.
//! 4. The body's `status_code` is classified: results are delivered to the
//!    caller, a token rejection diverts the request into the refresh path,
//!    and unknown codes surface as errors.
//! 5. On token rejection, the request's descriptor queues behind a
//!    single-flight token refresh and is replayed, newest first, once the
//!    fresh token is stored.
//!
//! ## Module Structure
//!
//! - **[client]** - The client, its configuration, token and throttle
//!   machinery, and the transport seam
//! - **[error]** - Error types and result handling
//! - **[types]** - Response envelope and result payload types
//! - **[protocol]** - Endpoint paths, status vocabulary, and response
//!   classifiers

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{
    ClientConfig, Credentials, FormRequest, HttpTransport, RawResponse, TagSenseClient,
    ThrottleHandler, Transport,
};
pub use error::{Result, TagSenseError};
pub use types::{ApiResponse, ResultPayload, TagAnnotation, TagResult};
