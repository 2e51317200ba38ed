use std::future::Future;

use tracing::warn;

use crate::error::KanbanResult;

/// Default number of re-runs after a write conflict
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or
/// has been re-run `max_retries` times after conflicts.
///
/// Each attempt must be a complete transaction; nothing from a failed
/// attempt may leak into the next.
pub async fn with_conflict_retry<T, F, Fut>(operation: &str, max_retries: u32, mut attempt: F) -> KanbanResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = KanbanResult<T>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Err(err) if err.is_retryable() && retries < max_retries => {
                retries += 1;
                warn!(operation, retries, error = %err, "Write conflict, retrying");
            }
            result => return result,
        }
    }
}
