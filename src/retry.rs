use std::{future::Future, time::Duration};

use crate::error::{AppError, AppResult};

/// Bounded exponential backoff for database reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `n + 1`, doubling from the base delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Connection level failures are worth another attempt; everything else is final.
pub fn is_transient(err: &AppError) -> bool {
    matches!(
        err,
        AppError::OrmError(sea_orm::DbErr::Conn(_))
            | AppError::OrmError(sea_orm::DbErr::ConnectionAcquire(_))
            | AppError::DbError(sqlx::Error::PoolTimedOut)
            | AppError::DbError(sqlx::Error::Io(_))
    )
}

pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    error = %err,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "transient database error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Inserts with freshly generated ids until one does not hit a unique
/// constraint. Gives up with a conflict after `attempts` collisions.
pub async fn with_fresh_id<T, G, F, Fut>(
    attempts: usize,
    what: &str,
    mut next_id: G,
    mut insert: F,
) -> AppResult<T>
where
    G: FnMut() -> String,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    for attempt in 1..=attempts.max(1) {
        let id = next_id();
        match insert(id.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_unique_violation() => {
                tracing::warn!(id = %id, attempt, "{what} collision");
            }
            Err(err) => return Err(err),
        }
    }
    Err(AppError::Conflict(format!(
        "Could not allocate {what}, please retry"
    )))
}
