//! Access-token lifecycle and replay coordination.
//!
//! Invariants:
//!
//! - At most one token request is in flight at any time. Requests that need
//!   a refresh while one is running enqueue their descriptor and wait.
//! - Every enqueued descriptor is resolved exactly once: replayed after a
//!   successful refresh, or failed with the refresh's error.
//! - The retry queue drains in stack order (most recently enqueued first),
//!   and only by the refresh that owns the in-flight flag.

use futures::future::BoxFuture;
use serde::Deserialize;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use url::form_urlencoded;

use crate::client::api::{AttemptOutcome, TagSenseClient};
use crate::client::operations::Operation;
use crate::client::transport::FormRequest;
use crate::error::{Result, TagSenseError};
use crate::protocol::{classify_http_status, throttle_wait_seconds, HttpDisposition, TOKEN_PATH};
use crate::types::ApiResponse;

/// A request parked behind a token refresh: the operation descriptor to
/// replay and the channel its final result is delivered on.
pub(crate) struct PendingRetry {
    pub(crate) op: Operation,
    pub(crate) reply: oneshot::Sender<Result<ApiResponse>>,
}

/// Verdict of a token endpoint response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TokenOutcome {
    /// A fresh access token was granted.
    Granted(String),
    /// The service refused the client credentials.
    Refused {
        code: String,
        message: Option<String>,
    },
    /// Neither an access token nor an error status was present.
    Unhandled,
}

/// Interpret a token endpoint body. An error `status_code` wins over any
/// `access_token` also present.
pub(crate) fn interpret_token_body(body: &[u8]) -> Result<TokenOutcome> {
    #[derive(Deserialize)]
    struct TokenEnvelope {
        #[serde(default)]
        access_token: Option<String>,
        #[serde(default)]
        status_code: Option<String>,
        #[serde(default)]
        status_msg: Option<String>,
    }

    let envelope: TokenEnvelope = serde_json::from_slice(body)?;
    if let Some(code) = envelope.status_code {
        return Ok(TokenOutcome::Refused {
            code,
            message: envelope.status_msg,
        });
    }
    if let Some(token) = envelope.access_token {
        return Ok(TokenOutcome::Granted(token));
    }
    Ok(TokenOutcome::Unhandled)
}

impl TagSenseClient {
    /// Record a retry behind the token refresh and start a refresh if none
    /// is running. Exactly one HTTP call to the token endpoint results from
    /// any number of concurrent callers.
    pub(crate) async fn request_access_token(&self, pending: PendingRetry) {
        let owns_refresh = {
            let mut session = self.inner.session.lock();
            session.retry_queue.push(pending);
            if session.token_request_in_flight {
                false
            } else {
                session.token_request_in_flight = true;
                true
            }
        };

        if !owns_refresh {
            if self.verbose() {
                debug!("token request already in flight, queued for replay");
            }
            return;
        }

        self.run_token_request().await;
    }

    /// Issue the token request and settle the retry queue. Boxed because
    /// draining replays operations, and a replay that is rejected again
    /// re-enters this path.
    fn run_token_request(&self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if self.verbose() {
                info!("requesting new access token");
            }

            let request = self.token_request();
            let response = match self.inner.transport.post_form(&request).await {
                Ok(response) => response,
                Err(err) => {
                    error!(error = %err, "token request transport failure");
                    self.clear_in_flight();
                    self.fail_retry_queue(TagSenseError::RefreshFailed(err.to_string()));
                    return;
                }
            };

            if self.log_http() {
                debug!(
                    status = response.status,
                    body = %String::from_utf8_lossy(&response.body),
                    "raw token response"
                );
            }

            match classify_http_status(response.status) {
                HttpDisposition::Unexpected => {
                    warn!(
                        status = response.status,
                        "unexpected http status on token request"
                    );
                    self.clear_in_flight();
                    self.fail_retry_queue(TagSenseError::RefreshFailed(format!(
                        "unexpected http status {}",
                        response.status
                    )));
                }
                HttpDisposition::Throttled => {
                    // The refresh itself got throttled. Enter the throttle
                    // episode and drain; every replay resolves locally with
                    // the synthetic throttled result.
                    let wait_seconds = throttle_wait_seconds(&response.headers);
                    if self.verbose() {
                        info!(wait_seconds, "token request throttled");
                    }
                    self.enter_throttled(wait_seconds);
                    self.clear_in_flight();
                    self.drain_retry_queue().await;
                }
                HttpDisposition::Deliverable => {
                    self.clear_in_flight();
                    match interpret_token_body(&response.body) {
                        Ok(TokenOutcome::Granted(token)) => {
                            if self.verbose() {
                                info!("access token replaced");
                            }
                            self.inner.session.lock().access_token = token;
                            self.drain_retry_queue().await;
                        }
                        Ok(TokenOutcome::Refused { code, message }) => {
                            warn!(status_code = %code, "client credentials refused");
                            self.fail_retry_queue(TagSenseError::TokenRefused { code, message });
                        }
                        Ok(TokenOutcome::Unhandled) => {
                            error!("unhandled token endpoint response");
                            self.fail_retry_queue(TagSenseError::RefreshFailed(
                                "unhandled token endpoint response".to_string(),
                            ));
                        }
                        Err(err) => {
                            error!(error = %err, "malformed token endpoint response");
                            self.fail_retry_queue(TagSenseError::RefreshFailed(err.to_string()));
                        }
                    }
                }
            }
        })
    }

    /// Client-credentials form POST to the token endpoint, authenticated
    /// with the currently stored (possibly stale) token.
    fn token_request(&self) -> FormRequest {
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.inner.credentials.client_id)
            .append_pair("client_secret", &self.inner.credentials.client_secret)
            .finish();

        let config = self.inner.config.read();
        let url = format!(
            "{}://{}:{}{}",
            config.scheme, config.host, config.port, TOKEN_PATH
        );
        drop(config);

        let bearer = self.inner.session.lock().access_token.clone();
        FormRequest { url, bearer, body }
    }

    fn clear_in_flight(&self) {
        self.inner.session.lock().token_request_in_flight = false;
    }

    /// Replay queued operations in stack order, delivering each result on
    /// its reply channel. A replay rejected for its token again re-enters
    /// the refresh path with its channel intact.
    async fn drain_retry_queue(&self) {
        loop {
            let pending = self.inner.session.lock().retry_queue.pop();
            let Some(pending) = pending else { break };

            match self.attempt(&pending.op).await {
                Ok(AttemptOutcome::Done(response)) => {
                    let _ = pending.reply.send(Ok(response));
                }
                Ok(AttemptOutcome::TokenRejected) => {
                    self.request_access_token(pending).await;
                }
                Err(err) => {
                    let _ = pending.reply.send(Err(err));
                }
            }
        }
    }

    /// Fail every queued retry with clones of one error, in stack order.
    fn fail_retry_queue(&self, error: TagSenseError) {
        loop {
            let pending = self.inner.session.lock().retry_queue.pop();
            let Some(pending) = pending else { break };
            let _ = pending.reply.send(Err(error.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_granted() {
        let outcome = interpret_token_body(br#"{"access_token": "tok123"}"#).unwrap();
        assert_eq!(outcome, TokenOutcome::Granted("tok123".to_string()));
    }

    #[test]
    fn test_interpret_refused() {
        let body = br#"{"status_code": "CREDENTIALS_INVALID", "status_msg": "bad pair"}"#;
        let outcome = interpret_token_body(body).unwrap();
        assert_eq!(
            outcome,
            TokenOutcome::Refused {
                code: "CREDENTIALS_INVALID".to_string(),
                message: Some("bad pair".to_string()),
            }
        );
    }

    #[test]
    fn test_interpret_error_status_wins_over_token() {
        let body = br#"{"status_code": "CREDENTIALS_INVALID", "access_token": "tok123"}"#;
        let outcome = interpret_token_body(body).unwrap();
        assert!(matches!(outcome, TokenOutcome::Refused { .. }));
    }

    #[test]
    fn test_interpret_unhandled_shape() {
        let outcome = interpret_token_body(br#"{"hello": "world"}"#).unwrap();
        assert_eq!(outcome, TokenOutcome::Unhandled);
    }

    #[test]
    fn test_interpret_malformed_body() {
        assert!(interpret_token_body(b"<html>oops</html>").is_err());
    }
}
