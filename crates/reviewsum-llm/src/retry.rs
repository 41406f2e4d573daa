//! Retry with exponential back-off and jitter for completion calls.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! transient errors (network failures, rate limiting, 5xx). Everything else
//! is returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::GenerationError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 429 and 5xx responses.
///
/// **Not retriable:**
/// - Other 4xx responses (bad key, bad request).
/// - [`GenerationError::Deserialize`], [`GenerationError::EmptyCompletion`],
///   [`GenerationError::InvalidBaseUrl`].
#[must_use]
pub fn is_retriable(err: &GenerationError) -> bool {
    match err {
        GenerationError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        GenerationError::Api { status, .. } => *status == 429 || *status >= 500,
        GenerationError::Deserialize { .. }
        | GenerationError::EmptyCompletion
        | GenerationError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 60 s.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GenerationError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt, rand::random::<f64>());
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient completion error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt` (1-based).
///
/// `unit_jitter` in `[0, 1)` scales the capped exponential delay into
/// `[0.75, 1.25)` of its value.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32, unit_jitter: f64) -> u64 {
    let exponent = attempt.saturating_sub(1).min(10);
    let capped = backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS);
    let factor = unit_jitter.clamp(0.0, 1.0) * 0.5 + 0.75;
    (capped as f64 * factor) as u64
}
