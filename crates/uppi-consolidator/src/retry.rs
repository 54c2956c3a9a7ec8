//! Conflict retry with exponential back-off and jitter.
//!
//! A merge attempt that loses a race (name already taken, stale version) is
//! re-run from the match step. [`retry_on_conflict`] drives that loop; real
//! errors are returned immediately.

use std::future::Future;
use std::time::Duration;

const MAX_DELAY_MS: u64 = 5_000;

/// Result of one optimistic attempt.
#[derive(Debug, PartialEq)]
pub(crate) enum Attempt<T> {
    Done(T),
    Conflict,
}

/// Delay before retry number `attempt` (1-based): `base × 2^(attempt-1)`,
/// capped, then scaled by a random factor in `[0.75, 1.25)`.
pub(crate) fn backoff_delay(attempt: u32, backoff_base_ms: u64) -> Duration {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(delay_ms)
}

/// Runs `operation` until it returns [`Attempt::Done`], allowing up to
/// `max_retries` additional attempts after conflicts.
///
/// Returns `Ok(None)` once retries are exhausted.
///
/// # Errors
///
/// Any error from `operation` is returned immediately without retrying.
pub(crate) async fn retry_on_conflict<T, E, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt<T>, E>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await? {
            Attempt::Done(value) => return Ok(Some(value)),
            Attempt::Conflict => {
                if attempt >= max_retries {
                    return Ok(None);
                }
                attempt += 1;
                let delay = backoff_delay(attempt, backoff_base_ms);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "concurrent profile write detected; retrying merge"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
