//! Bounded exponential-backoff retry for remote calls
//!
//! Wraps any fallible async operation whose error can report an HTTP status.
//! Only 429 and 5xx responses are retried; everything else fails fast.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default number of retries after the first attempt
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay before the first retry
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// Errors that may carry an HTTP-like status code
pub trait HttpStatus {
    /// The status code attached to this error, if any
    fn http_status(&self) -> Option<u16>;
}

/// Check if an HTTP status code is worth retrying
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Retry budget and backoff base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total tries = max_retries + 1)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles for each later one
    #[serde(rename = "base-delay-ms", with = "duration_ms")]
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Backoff before the retry that follows the failed `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op`, retrying transient failures according to `policy`
///
/// The last error is returned once the budget is spent. Non-retryable errors
/// are returned on the attempt that produced them.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: HttpStatus + std::fmt::Display,
{
    debug!(?policy, "with_retry: called");
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => {
                debug!(attempt, "with_retry: success");
                return Ok(value);
            }
            Err(e) => {
                let status = e.http_status();
                let retryable = status.is_some_and(is_retryable_status);

                if !retryable {
                    debug!(attempt, ?status, error = %e, "with_retry: non-retryable error");
                    return Err(e);
                }
                if attempt >= policy.max_retries {
                    debug!(attempt, ?status, error = %e, "with_retry: retry budget exhausted");
                    return Err(e);
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    status = ?status,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying in {}ms (attempt {}/{})",
                    delay.as_millis(),
                    attempt + 1,
                    policy.max_retries
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct StatusError(Option<u16>);

    impl std::fmt::Display for StatusError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "status {:?}", self.0)
        }
    }

    impl HttpStatus for StatusError {
        fn http_status(&self) -> Option<u16> {
            self.0
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1))
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(599));

        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(408));
        assert!(!is_retryable_status(600));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_policy_deserialize() {
        let policy: RetryPolicy = serde_yaml::from_str("max-retries: 5\nbase-delay-ms: 250\n").unwrap();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&fast_policy(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { Err(StatusError(Some(503))) } else { Ok("done") }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&fast_policy(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StatusError(Some(404)))
        })
        .await;

        assert_eq!(result.unwrap_err().0, Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_status_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&fast_policy(3), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StatusError(None))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_last_error() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&fast_policy(2), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(StatusError(Some(if n == 2 { 502 } else { 429 })))
        })
        .await;

        assert_eq!(result.unwrap_err().0, Some(502));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_tries_once() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&fast_policy(0), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StatusError(Some(500)))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_exponentially() {
        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&RetryPolicy::default(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StatusError(Some(500)))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 1s + 2s + 4s of backoff between the four attempts
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(7000), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(8000), "elapsed {:?}", elapsed);
    }
}
