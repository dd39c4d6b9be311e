//! Fixed-delay retry for provider calls.
//!
//! Every provider failure is treated the same way: log, sleep, try again
//! until the attempt budget is spent. The caller picks the budget and the
//! delay, which differ per operation (query rewriting retries quickly,
//! answer generation waits out rate-limit windows).

use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Runs `op` up to `max_attempts` times with a fixed sleep between attempts.
///
/// Returns the first success, or the last error once the budget is spent.
/// The thread blocks for the full delay between attempts.
pub fn retry_with_delay<T, E, F>(max_attempts: usize, delay: Duration, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op() {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max_attempts {
                    return Err(error);
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %error,
                    "provider call failed, retrying after delay"
                );
                thread::sleep(delay);
            }
        }
    }
}
