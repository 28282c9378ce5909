//! Bounded retry around a fallible async operation.

use std::future::Future;
use tracing::warn;

/// Run `op` up to `max_attempts` times, returning the first success or the
/// last error.
///
/// Re-attempts are immediate; uploads are idempotent PUTs, so there is
/// nothing to wait out between attempts. `max_attempts` of 0 is treated
/// as 1.
pub async fn retry<T, E, F, Fut>(max_attempts: u32, mut op: F) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!(attempt, max_attempts, error = %e, "attempt failed, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
