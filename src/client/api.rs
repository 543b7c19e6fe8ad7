//! The TagSense client and its request pipeline.
//!
//! Every request runs the same pipeline: a local throttle check, one HTTP
//! dispatch through the [`Transport`], then the HTTP-status and API-status
//! classifiers. A token rejection diverts the request into the token
//! manager, which refreshes the token once and replays everything queued
//! behind the refresh.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::client::config::{ClientConfig, Credentials};
use crate::client::operations::Operation;
use crate::client::throttle::ThrottleHandler;
use crate::client::token::PendingRetry;
use crate::client::transport::{FormRequest, HttpTransport, RawResponse, Transport};
use crate::error::{Result, TagSenseError};
use crate::protocol::{
    classify_api_status, classify_http_status, throttle_wait_seconds, ApiDisposition,
    HttpDisposition,
};
use crate::types::ApiResponse;

/// Sentinel token value before the first successful refresh. The first
/// request goes out with it, is rejected by the service, and triggers the
/// initial token fetch.
pub(crate) const UNINITIALIZED_TOKEN: &str = "uninitialized";

/// Client for the TagSense image-tagging API.
///
/// One client per configured identity. Cloning is cheap; clones share the
/// access token, the throttle state, and the replay queue.
#[derive(Clone)]
pub struct TagSenseClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) credentials: Credentials,
    pub(crate) config: RwLock<ClientConfig>,
    pub(crate) session: Mutex<SessionState>,
    pub(crate) throttle_handler: Mutex<Option<ThrottleHandler>>,
}

/// Mutable per-client session state. Guarded by one mutex; the lock is
/// never held across an await point.
pub(crate) struct SessionState {
    pub(crate) access_token: String,
    pub(crate) token_request_in_flight: bool,
    pub(crate) retry_queue: Vec<PendingRetry>,
    pub(crate) throttled: bool,
}

impl SessionState {
    fn new() -> Self {
        SessionState {
            access_token: UNINITIALIZED_TOKEN.to_string(),
            token_request_in_flight: false,
            retry_queue: Vec::new(),
            throttled: false,
        }
    }
}

/// Result of one dispatch attempt, before any refresh handling.
pub(crate) enum AttemptOutcome {
    /// A result is ready for the caller (including synthetic throttled
    /// results and parsed throttle-response bodies).
    Done(ApiResponse),
    /// The service rejected the access token; refresh and replay.
    TokenRejected,
}

impl TagSenseClient {
    /// Create a client with the given credentials and default configuration.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::with_config(client_id, client_secret, ClientConfig::default())
    }

    /// Create a client with a custom configuration.
    pub fn with_config(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        config: ClientConfig,
    ) -> Self {
        let transport = Arc::new(HttpTransport::new(&config));
        Self::with_transport(client_id, client_secret, config, transport)
    }

    /// Create a client with a custom [`Transport`]. Used by tests and by
    /// callers that bring their own HTTP stack.
    pub fn with_transport(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        TagSenseClient {
            inner: Arc::new(ClientInner {
                transport,
                credentials: Credentials {
                    client_id: client_id.into(),
                    client_secret: client_secret.into(),
                },
                config: RwLock::new(config),
                session: Mutex::new(SessionState::new()),
                throttle_handler: Mutex::new(None),
            }),
        }
    }

    /// Override the API host.
    pub fn set_host(&self, host: impl Into<String>) {
        self.inner.config.write().host = host.into();
    }

    /// Override the API port.
    pub fn set_port(&self, port: u16) {
        self.inner.config.write().port = port;
    }

    /// Set the model name appended to tag and feedback requests.
    pub fn set_model(&self, model: impl Into<String>) {
        self.inner.config.write().model = Some(model.into());
    }

    /// Enable or disable raw request/response body logging.
    pub fn set_log_http(&self, enabled: bool) {
        self.inner.config.write().log_http = enabled;
    }

    /// Enable or disable lifecycle logging (token refresh, throttling).
    pub fn set_verbose(&self, enabled: bool) {
        self.inner.config.write().verbose = enabled;
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ClientConfig {
        self.inner.config.read().clone()
    }

    /// The currently stored access token. Starts as the uninitialized
    /// sentinel and is replaced on every successful refresh.
    pub fn access_token(&self) -> String {
        self.inner.session.lock().access_token.clone()
    }

    /// Tag a single image URL.
    ///
    /// The URL is normalized into a one-element batch; the response carries
    /// one entry in `results`.
    pub async fn tag_url(&self, url: &str, local_id: Option<&str>) -> Result<ApiResponse> {
        self.tag_urls(vec![url.to_string()], local_id).await
    }

    /// Tag a batch of image URLs in one request.
    pub async fn tag_urls(&self, urls: Vec<String>, local_id: Option<&str>) -> Result<ApiResponse> {
        self.submit(Operation::Tag {
            urls,
            local_id: local_id.map(str::to_string),
        })
        .await
    }

    /// Attach tags to previously tagged documents.
    pub async fn feedback_add_tags(
        &self,
        docids: Vec<String>,
        tags: Vec<String>,
        local_id: Option<&str>,
    ) -> Result<ApiResponse> {
        self.submit(Operation::AddTags {
            docids,
            tags,
            local_id: local_id.map(str::to_string),
        })
        .await
    }

    /// Detach tags from previously tagged documents.
    pub async fn feedback_remove_tags(
        &self,
        docids: Vec<String>,
        tags: Vec<String>,
        local_id: Option<&str>,
    ) -> Result<ApiResponse> {
        self.submit(Operation::RemoveTags {
            docids,
            tags,
            local_id: local_id.map(str::to_string),
        })
        .await
    }

    /// Submit an operation: one attempt, then refresh-and-replay if the
    /// token was rejected. The replay result arrives over a oneshot channel
    /// filled by the drain loop.
    pub(crate) async fn submit(&self, op: Operation) -> Result<ApiResponse> {
        match self.attempt(&op).await? {
            AttemptOutcome::Done(response) => Ok(response),
            AttemptOutcome::TokenRejected => {
                let (reply, result) = oneshot::channel();
                self.request_access_token(PendingRetry { op, reply }).await;
                match result.await {
                    Ok(result) => result,
                    Err(_) => Err(TagSenseError::RefreshFailed(
                        "token refresh abandoned".to_string(),
                    )),
                }
            }
        }
    }

    /// One dispatch attempt: throttle short-circuit, HTTP call, both
    /// classifiers. Never triggers a refresh itself.
    pub(crate) async fn attempt(&self, op: &Operation) -> Result<AttemptOutcome> {
        if self.inner.session.lock().throttled {
            if self.verbose() {
                debug!("throttled, resolving locally without a network call");
            }
            return Ok(AttemptOutcome::Done(ApiResponse::throttled()));
        }

        let request = self.prepare(op);
        let response = self.inner.transport.post_form(&request).await?;
        self.interpret(response)
    }

    fn prepare(&self, op: &Operation) -> FormRequest {
        let config = self.inner.config.read();
        let body = op.encode_form(config.model.as_deref());
        let url = format!(
            "{}://{}:{}{}",
            config.scheme,
            config.host,
            config.port,
            op.path()
        );
        drop(config);

        let bearer = self.inner.session.lock().access_token.clone();
        FormRequest { url, bearer, body }
    }

    fn interpret(&self, response: RawResponse) -> Result<AttemptOutcome> {
        if self.log_http() {
            debug!(
                status = response.status,
                body = %String::from_utf8_lossy(&response.body),
                "raw api response"
            );
        }

        match classify_http_status(response.status) {
            HttpDisposition::Unexpected => {
                warn!(status = response.status, "unexpected http status");
                Err(TagSenseError::UnexpectedStatus(response.status))
            }
            HttpDisposition::Throttled => {
                let wait_seconds = throttle_wait_seconds(&response.headers);
                if self.verbose() {
                    info!(wait_seconds, "service throttled");
                }
                self.enter_throttled(wait_seconds);
                // The throttled response body is still delivered to the
                // caller, parsed like any other envelope.
                let envelope: ApiResponse = serde_json::from_slice(&response.body)?;
                Ok(AttemptOutcome::Done(envelope))
            }
            HttpDisposition::Deliverable => {
                let envelope: ApiResponse = serde_json::from_slice(&response.body)?;
                match classify_api_status(&envelope.status_code) {
                    ApiDisposition::Deliver => {
                        if self.verbose() {
                            debug!(status_code = %envelope.status_code, "delivering api result");
                        }
                        Ok(AttemptOutcome::Done(envelope))
                    }
                    ApiDisposition::RefreshToken => {
                        if self.verbose() {
                            info!("access token rejected by service");
                        }
                        Ok(AttemptOutcome::TokenRejected)
                    }
                    ApiDisposition::Unhandled => {
                        warn!(status_code = %envelope.status_code, "unhandled api status");
                        Err(TagSenseError::UnhandledApiStatus(envelope.status_code))
                    }
                }
            }
        }
    }

    pub(crate) fn verbose(&self) -> bool {
        self.inner.config.read().verbose
    }

    pub(crate) fn log_http(&self) -> bool {
        self.inner.config.read().log_http
    }
}
