//! Polling waits
//!
//! A `Wait` evaluates a condition immediately and then once per poll
//! interval until it yields a value or the timeout elapses. The failure
//! message may be an async closure; it runs only on the timeout path.

use crate::{Error, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Default wait timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Message used when a wait was given none
pub const DEFAULT_MESSAGE: &str = "Expected condition was not met";

/// Timeout and poll interval of a wait. The interval never exceeds the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.min(timeout),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self::new(timeout, self.poll_interval)
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

/// Wait budgets of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Every wait without a more specific budget
    pub default: WaitConfig,
    /// Waiting for a message to show up in search results
    pub search: WaitConfig,
    /// Minimum spacing between two search re-submissions
    pub search_resubmit_interval: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            default: WaitConfig::default(),
            search: WaitConfig::new(Duration::from_secs(120), Duration::from_secs(5)),
            search_resubmit_interval: Duration::from_secs(5),
        }
    }
}

type MessageFn<'a> = Box<dyn FnOnce() -> BoxFuture<'a, String> + Send + 'a>;

/// A configured wait, consumed by `until`/`until_some`
pub struct Wait<'a> {
    config: WaitConfig,
    message: Option<MessageFn<'a>>,
}

impl fmt::Debug for Wait<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wait")
            .field("config", &self.config)
            .field("has_message", &self.message.is_some())
            .finish()
    }
}

impl Wait<'static> {
    pub fn new(config: WaitConfig) -> Self {
        Self {
            config,
            message: None,
        }
    }
}

impl<'a> Wait<'a> {
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }

    /// Poll every `interval`, clamped to the timeout
    pub fn polling_every(mut self, interval: Duration) -> Self {
        self.config = WaitConfig::new(self.config.timeout, interval);
        self
    }

    /// Fixed failure message
    pub fn with_message<S: Into<String>>(self, message: S) -> Wait<'static> {
        let message = message.into();
        self.with_message_fn(move || async move { message })
    }

    /// Failure message computed only if the wait times out
    pub fn with_message_fn<'b, F, Fut>(self, message: F) -> Wait<'b>
    where
        F: FnOnce() -> Fut + Send + 'b,
        Fut: Future<Output = String> + Send + 'b,
    {
        Wait {
            config: self.config,
            message: Some(Box::new(move || Box::pin(message()))),
        }
    }

    /// Poll until `condition` yields `true`
    pub async fn until<F, Fut>(self, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        self.until_some(move || {
            let pending = condition();
            async move { Ok(pending.await?.then_some(())) }
        })
        .await
    }

    /// Poll until `condition` yields `Some(value)` and return the value.
    ///
    /// Transient errors (see [`Error::is_transient`]) count as a failed poll;
    /// any other error ends the wait immediately. A single evaluation never
    /// runs past the deadline: one still pending then is abandoned and the
    /// wait times out.
    pub async fn until_some<T, F, Fut>(self, mut condition: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let start = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let remaining = self.config.timeout.saturating_sub(start.elapsed());
            match tokio::time::timeout(remaining, condition()).await {
                Ok(Ok(Some(value))) => return Ok(value),
                Ok(Ok(None)) => {}
                Ok(Err(e)) if e.is_transient() => debug!("Wait attempt {} failed: {}", attempts, e),
                Ok(Err(e)) => return Err(e),
                Err(_) => debug!("Wait attempt {} was still pending at the deadline", attempts),
            }

            let elapsed = start.elapsed();
            if elapsed >= self.config.timeout {
                return Err(self.timed_out(attempts).await);
            }

            let remaining = self.config.timeout - elapsed;
            tokio::time::sleep(self.config.poll_interval.min(remaining)).await;
        }
    }

    async fn timed_out(self, attempts: u32) -> Error {
        let message = match self.message {
            Some(message) => message().await,
            None => DEFAULT_MESSAGE.to_string(),
        };
        warn!(
            "Wait timed out after {:?} ({} attempts): {}",
            self.config.timeout, attempts, message
        );
        Error::wait_timeout(message, self.config.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn wait(timeout_ms: u64, poll_ms: u64) -> Wait<'static> {
        Wait::new(WaitConfig::new(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_ms),
        ))
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let config = WaitConfig::new(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(1));

        let w = wait(1000, 100).polling_every(Duration::from_secs(10));
        assert_eq!(w.poll_interval(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_true_on_third_poll() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let start = Instant::now();

        wait(30_000, 500)
            .until(move || async move { Ok(counter.fetch_add(1, Ordering::SeqCst) == 2) })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_does_not_sleep() {
        let start = Instant::now();
        let value = wait(30_000, 500)
            .until_some(|| async { Ok(Some(42)) })
            .await
            .unwrap();

        assert_eq!(value, 42);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_carries_message() {
        let start = Instant::now();
        let err = wait(2_000, 500)
            .with_message("Message is not displayed: hello")
            .until(|| async { Ok(false) })
            .await
            .unwrap_err();

        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_millis(2_500));
        match err {
            Error::WaitTimeout { message, timeout } => {
                assert_eq!(message, "Message is not displayed: hello");
                assert_eq!(timeout, Duration::from_secs(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_message_not_evaluated_on_success() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = evaluated.clone();

        wait(1_000, 100)
            .with_message_fn(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "never".to_string()
            })
            .until(|| async { Ok(true) })
            .await
            .unwrap();

        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lazy_message_evaluated_on_timeout() {
        let err = wait(300, 100)
            .with_message_fn(|| async { format!("Page got stuck at {}", "https://x.slack.com/") })
            .until(|| async { Ok(false) })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WaitTimeout { message, .. } if message == "Page got stuck at https://x.slack.com/"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_keep_polling() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let result = wait(5_000, 100)
            .until_some(move || async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 => Err(Error::element_not_found("css=.late")),
                    1 => Err(Error::script_execution_failed("detached")),
                    _ => Ok(Some("found")),
                }
            })
            .await
            .unwrap();

        assert_eq!(result, "found");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_errors_propagate() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let err = wait(5_000, 100)
            .until(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::NoActiveSession)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NoActiveSession));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_condition_is_bounded_by_timeout() {
        let start = Instant::now();
        let err = wait(1_000, 100)
            .with_message("Message is not displayed: x")
            .until(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(Error::timeout("Runtime.evaluate"))
            })
            .await
            .unwrap_err();

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert!(start.elapsed() < Duration::from_millis(1_100));
        assert!(matches!(err, Error::WaitTimeout { message, .. } if message == "Message is not displayed: x"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_poll_then_success() {
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let value = wait(10_000, 100)
            .until_some(move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    return Err(Error::timeout("Runtime.evaluate"));
                }
                Ok(Some("ready"))
            })
            .await
            .unwrap();

        assert_eq!(value, "ready");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_message() {
        let err = wait(100, 50).until(|| async { Ok(false) }).await.unwrap_err();
        assert!(matches!(err, Error::WaitTimeout { message, .. } if message == DEFAULT_MESSAGE));
    }
}
