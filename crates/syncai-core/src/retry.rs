use crate::error::SyncError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Bounded retry for backend calls.
///
/// Transient failures (timeouts, transport errors, HTTP 408/5xx) are retried
/// with exponential backoff plus jitter; everything else propagates after the
/// first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// No sleeping between attempts. Used in tests and anywhere latency
    /// matters more than politeness.
    pub fn without_backoff(mut self) -> Self {
        self.base_delay = Duration::ZERO;
        self.max_delay = Duration::ZERO;
        self
    }

    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, SyncError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SyncError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying backend call"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Exponential backoff capped at `max_delay`, with up to 25% added jitter
    /// so concurrent callers do not retry in lockstep.
    fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = self
            .base_delay
            .saturating_mul(1u32 << (attempt - 1).min(16))
            .min(self.max_delay);
        let jitter = rand::thread_rng().gen_range(0.0..=0.25);
        exp.mul_f64(1.0 + jitter).min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn failing_with(err: fn() -> SyncError, counter: &AtomicU32) -> Result<(), SyncError> {
        counter.fetch_add(1, Ordering::SeqCst);
        Err(err())
    }

    #[tokio::test]
    async fn non_retryable_error_attempts_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3).without_backoff();
        let result = policy
            .run(|| failing_with(|| SyncError::Auth("401".into()), &calls))
            .await;
        assert!(matches!(result, Err(SyncError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retryable_error_exhausts_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3).without_backoff();
        let result = policy
            .run(|| failing_with(|| SyncError::api(500, "boom"), &calls))
            .await;
        assert!(matches!(result, Err(SyncError::Api { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn timeout_is_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2).without_backoff();
        let _ = policy
            .run(|| failing_with(|| SyncError::Timeout("deadline".into()), &calls))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn success_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3).without_backoff();
        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(SyncError::api(503, "busy"))
                    } else {
                        Ok("answer")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "answer");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn immediate_success_attempts_once() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default().without_backoff();
        let result = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, SyncError>(7) }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::new(10)
            .with_base_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(4));
        for attempt in 1..10 {
            assert!(policy.delay_for(attempt) <= Duration::from_secs(4));
        }
    }
}
