//! Retry with exponential back-off and jitter for Navitia requests.
//!
//! Only transient failures are retried: timeouts, refused connections and
//! 5xx responses. Navitia error bodies and malformed payloads are returned on
//! the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::NavitiaError;

const MAX_DELAY_MS: u64 = 10_000;

pub(crate) fn is_retriable(err: &NavitiaError) -> bool {
    match err {
        NavitiaError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        NavitiaError::Api { .. }
        | NavitiaError::Deserialize { .. }
        | NavitiaError::InvalidRequest(_) => false,
    }
}

/// Runs `operation`, retrying transient errors up to `max_retries` times.
///
/// The delay before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 %
/// jitter, capped at 10 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, NavitiaError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, NavitiaError>>,
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
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "navitia request failed, retrying"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
