//! Server throttle tracking.
//!
//! A `429` response starts a throttle episode: the throttled flag is set,
//! the registered observer (if any) is told `(true, wait_seconds)`, and a
//! one-shot timer is armed to clear the flag and report `(false, 0)` after
//! the server-specified interval. Further throttle signals received while
//! an episode is running are absorbed; the first episode wins until it
//! expires. While the flag is set, operations resolve locally with a
//! synthetic `ERROR_THROTTLED` result and make no network call.

use std::sync::Arc;
use std::time::Duration;

use crate::client::api::{ClientInner, TagSenseClient};

/// Observer invoked on both edges of a throttle episode with
/// `(is_throttled, wait_seconds)`.
pub type ThrottleHandler = Arc<dyn Fn(bool, u64) + Send + Sync>;

impl TagSenseClient {
    /// Register the throttle observer. It is called once with
    /// `(true, wait_seconds)` when an episode starts and once with
    /// `(false, 0)` when it ends.
    pub fn set_throttle_handler(&self, handler: impl Fn(bool, u64) + Send + Sync + 'static) {
        *self.inner.throttle_handler.lock() = Some(Arc::new(handler));
    }

    /// True while a throttle episode is running.
    pub fn is_throttled(&self) -> bool {
        self.inner.session.lock().throttled
    }

    /// Start a throttle episode, unless one is already running.
    ///
    /// The clearing timer is armed whether or not an observer is
    /// registered, so the flag always clears itself. The timer holds only
    /// a weak reference to the client; abandoning the client cancels the
    /// episode's effect instead of keeping it alive.
    pub(crate) fn enter_throttled(&self, wait_seconds: u64) {
        {
            let mut session = self.inner.session.lock();
            if session.throttled {
                return;
            }
            session.throttled = true;
        }

        notify(&self.inner, true, wait_seconds);

        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(wait_seconds)).await;
            if let Some(inner) = inner.upgrade() {
                inner.session.lock().throttled = false;
                notify(&inner, false, 0);
            }
        });
    }
}

/// Invoke the observer outside the handler lock, so an observer may call
/// back into the client.
fn notify(inner: &ClientInner, throttled: bool, wait_seconds: u64) {
    let handler = inner.throttle_handler.lock().clone();
    if let Some(handler) = handler {
        handler(throttled, wait_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn test_client() -> TagSenseClient {
        TagSenseClient::new("id", "secret")
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_episode_notifies_both_edges() {
        let client = test_client();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.set_throttle_handler(move |throttled, wait| sink.lock().push((throttled, wait)));

        client.enter_throttled(5);
        assert!(client.is_throttled());
        assert_eq!(*events.lock(), vec![(true, 5)]);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!client.is_throttled());
        assert_eq!(*events.lock(), vec![(true, 5), (false, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_throttle_signals_are_absorbed() {
        let client = test_client();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        client.set_throttle_handler(move |throttled, wait| sink.lock().push((throttled, wait)));

        client.enter_throttled(5);
        client.enter_throttled(30);
        assert_eq!(*events.lock(), vec![(true, 5)]);

        // The first episode's timer still governs; 30 seconds was ignored.
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!client.is_throttled());
        assert_eq!(*events.lock(), vec![(true, 5), (false, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flag_clears_without_a_handler() {
        let client = test_client();
        client.enter_throttled(3);
        assert!(client.is_throttled());

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!client.is_throttled());
    }
}
