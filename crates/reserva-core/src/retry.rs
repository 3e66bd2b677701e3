//! Bounded retry of transient backend failures.
//!
//! Every outbound RPC from the gateway goes through
//! [`RetryingBackendClient::call`]. The loop is strictly sequential with a
//! fixed inter-attempt delay: no jitter, no exponential backoff, no
//! per-attempt deadline. The only bound is the attempt count. Changing any
//! of this changes observed traffic patterns, so the policy is loaded once
//! from configuration and shared read-only across all calls.

use std::time::Duration;

use crate::error::BackendError;

/// Retry policy applied to every backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy from raw configuration values.
    #[must_use]
    pub fn new(max_retries: u32, delay_ms: u64) -> Self {
        Self {
            max_retries,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 1_000)
    }
}

/// Wraps a single-attempt backend invocation with the retry policy.
///
/// # Example
///
/// ```ignore
/// let client = RetryingBackendClient::new(RetryPolicy::default());
/// let result = client
///     .call(|| backend.list_items(&query), "inventory.list")
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct RetryingBackendClient {
    policy: RetryPolicy,
}

impl RetryingBackendClient {
    /// Creates a client with the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// The policy this client applies.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Runs `invoke` until it succeeds, fails terminally, or the retry
    /// budget is exhausted.
    ///
    /// `invoke` performs exactly one attempt against the backend. A failure
    /// is retried only when [`BackendError::is_retryable`] holds (transient
    /// code plus non-empty diagnostic details); anything else is surfaced
    /// immediately. After `max_retries` retries the last error is returned.
    ///
    /// `context` names the logical operation for logging only.
    pub async fn call<T, F, Fut>(
        &self,
        mut invoke: F,
        context: &str,
    ) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match invoke().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(context, attempt, "backend call recovered after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_retryable() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        context,
                        attempt,
                        max_retries = self.policy.max_retries,
                        code = %err.code,
                        error = %err,
                        "transient backend failure, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
                Err(err) => {
                    tracing::warn!(
                        context,
                        attempts = attempt + 1,
                        code = %err.code,
                        retryable = err.is_retryable(),
                        "backend call failed"
                    );
                    return Err(err);
                }
            }
        }
    }
}
