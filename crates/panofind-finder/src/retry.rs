//! Retry with exponential back-off and jitter for imagery provider calls.
//!
//! [`retry_with_backoff`] wraps any fallible provider call and retries on
//! transient errors (see [`ImageryError::is_transient`]). Permanent errors are
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use panofind_core::FinderConfig;
use panofind_imagery::ImageryError;

const MAX_DELAY_MS: u64 = 60_000;

/// How many times, and how patiently, a provider call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Base delay: the n-th retry waits `backoff_base_ms * 2^(n-1)` ± 25 %.
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            backoff_base_ms: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &FinderConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        }
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts on
/// transient errors.
///
/// Back-off schedule with `backoff_base_ms = 500`:
///
/// | Retry | Sleep before it            |
/// |-------|----------------------------|
/// | 1     | 500 ms × 2⁰ ± 25 % jitter  |
/// | 2     | 500 ms × 2¹ ± 25 % jitter  |
/// | 3     | 500 ms × 2² ± 25 % jitter  |
///
/// Delay is capped at 60 s. Permanent errors are returned immediately; once
/// retries are exhausted the last transient error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, ImageryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ImageryError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = policy
                    .backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms,
                    error = %err,
                    "transient imagery error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
