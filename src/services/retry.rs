//! Retry policy shared by every outbound hop
//!
//! Retries are driven by the HTTP status of a completed exchange. Transport
//! errors are handed back to the caller immediately.

use crate::config::settings::RetryConfig;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Anything carrying an HTTP status the retry policy can inspect
pub trait HasStatus {
    fn status(&self) -> StatusCode;
}

impl HasStatus for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }
}

/// Fixed-delay retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub attempts: u32,
    /// Delay between attempts
    pub delay: Duration,
    /// Statuses that trigger another attempt
    pub retryable_statuses: Vec<StatusCode>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.attempts, Duration::from_millis(config.delay_ms))
    }
}

impl RetryPolicy {
    /// Policy retrying on 429 and every 5xx
    pub fn new(attempts: u32, delay: Duration) -> Self {
        let mut retryable_statuses = vec![StatusCode::TOO_MANY_REQUESTS];
        retryable_statuses.extend(
            (500u16..600).filter_map(|code| StatusCode::from_u16(code).ok()),
        );

        Self {
            attempts: attempts.max(1),
            delay,
            retryable_statuses,
        }
    }

    pub fn is_retryable(&self, status: StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

/// Run `op` under `policy`, returning the last outcome once attempts run out
pub async fn with_retry<F, Fut, R, E>(policy: &RetryPolicy, mut op: F) -> Result<R, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    R: HasStatus,
{
    let mut attempt = 1;

    loop {
        let outcome = op().await?;
        let status = outcome.status();

        if !policy.is_retryable(status) || attempt >= policy.attempts {
            return Ok(outcome);
        }

        warn!(
            status = status.as_u16(),
            attempt = attempt,
            max_attempts = policy.attempts,
            delay_ms = policy.delay.as_millis() as u64,
            "transient upstream status, retrying"
        );

        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    struct Fake(StatusCode);

    impl HasStatus for Fake {
        fn status(&self) -> StatusCode {
            self.0
        }
    }

    async fn run_script(policy: &RetryPolicy, script: Vec<u16>) -> (StatusCode, u32) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let script = Arc::new(script);

        let result: Result<Fake, ()> = with_retry(policy, || {
            let counter = Arc::clone(&counter);
            let script = Arc::clone(&script);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) as usize;
                let code = script[n.min(script.len() - 1)];
                Ok(Fake(StatusCode::from_u16(code).unwrap()))
            }
        })
        .await;

        (result.unwrap().0, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        assert_eq!(run_script(&policy, vec![200]).await, (StatusCode::OK, 1));
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        assert_eq!(run_script(&policy, vec![503, 200]).await, (StatusCode::OK, 2));
        assert_eq!(run_script(&policy, vec![429, 200]).await, (StatusCode::OK, 2));
    }

    #[tokio::test]
    async fn test_second_failure_is_final() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        assert_eq!(
            run_script(&policy, vec![500, 502, 200]).await,
            (StatusCode::BAD_GATEWAY, 2)
        );
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        assert_eq!(run_script(&policy, vec![401, 200]).await, (StatusCode::UNAUTHORIZED, 1));
        assert_eq!(run_script(&policy, vec![400, 200]).await, (StatusCode::BAD_REQUEST, 1));
    }

    #[tokio::test]
    async fn test_transport_error_returned_immediately() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result: Result<Fake, &str> = with_retry(&policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("connection refused") }
        })
        .await;

        assert_eq!(result.err(), Some("connection refused"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_delay_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(50));
        let start = Instant::now();
        run_script(&policy, vec![503, 503]).await;
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_default_statuses() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 2);
        assert_eq!(policy.delay, Duration::from_millis(600));
        assert!(policy.is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(policy.is_retryable(StatusCode::GATEWAY_TIMEOUT));
        assert!(!policy.is_retryable(StatusCode::FORBIDDEN));
        assert!(!policy.is_retryable(StatusCode::NOT_FOUND));
    }
}
