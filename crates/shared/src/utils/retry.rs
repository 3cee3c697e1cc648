use crate::errors::RepositoryError;
use std::{future::Future, time::Duration};
use tokio::time::{sleep, timeout};
use tracing::warn;

/// Per-call timeout plus a bounded number of retries for transient store
/// errors. A timeout counts as transient.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub timeout: Duration,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
            backoff: Duration::from_millis(50),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Runs one call under the timeout, without retrying.
    pub async fn once<T, Fut>(&self, step: &str, fut: Fut) -> Result<T, RepositoryError>
    where
        Fut: Future<Output = Result<T, RepositoryError>>,
    {
        match timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RepositoryError::Timeout(format!(
                "{step} exceeded {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(5000))
    }
}

pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    step: &str,
    mut op: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt: u32 = 0;

    loop {
        match policy.once(step, op()).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "🔄 {step} failed ({err}), retry {attempt}/{}",
                    policy.max_retries
                );
                sleep(policy.backoff * attempt).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(50)).with_backoff(Duration::ZERO)
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = with_retry(&fast_policy(3), "apply_stock", || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RepositoryError::Timeout("flaky".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = with_retry(&fast_policy(3), "apply_stock", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RepositoryError::NotFound)
            }
        })
        .await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_calls_time_out_and_exhaust_retries() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = with_retry(&fast_policy(2), "mark_placed", || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_secs(5)).await;
                Ok(())
            }
        })
        .await;

        assert!(matches!(result, Err(RepositoryError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
