//! Retry loop: run a closure until success or the policy says stop.

use super::classify::classify;
use super::error::RangeError;
use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds or the retry policy says to stop. On retryable
/// failure, sleeps for the backoff duration then tries again. Generic over
/// the success value so workers can return a typed outcome (a cancelled
/// worker exits through `Ok` and is never retried here).
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut f: F) -> Result<T, RangeError>
where
    F: FnMut() -> Result<T, RangeError>,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(value) => return Ok(value),
            Err(e) => {
                let kind = classify(&e);
                match policy.decide(attempt, kind) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(delay) => {
                        tracing::debug!(
                            attempt,
                            ?kind,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying range transfer"
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                    }
                }
            }
        }
    }
}
