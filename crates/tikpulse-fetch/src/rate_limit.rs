//! Retry with exponential backoff for transient fetch failures.
//!
//! Rate limiting (429), transport errors and 5xx responses are retried.
//! Everything else (404, short bodies, missing proxy key) propagates on the
//! first failure.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Executes `operation`, retrying retriable errors up to `max_retries` extra
/// times.
///
/// The wait before retry `n` (1-based) is `backoff_base_secs * 2^(n-1)`
/// seconds. With `max_retries = 2` the operation runs at most three times and
/// the last error is returned.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_retriable() || attempt >= max_retries {
            return Err(err);
        }

        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
