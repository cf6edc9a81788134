use std::{future::Future, time::Duration};

use sea_orm::DbErr;

const MAX_RETRIES: usize = 3;
const INITIAL_BACKOFF_MS: u64 = 50;
const MAX_BACKOFF_MS: u64 = 1_000;

/// Retries a database operation when SQLite reports the file as locked.
/// Used by background writers that can contend with request handlers.
pub async fn retry_on_db_busy<T, F, Fut>(mut op: F) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut backoff = Duration::from_millis(INITIAL_BACKOFF_MS);
    for attempt in 0..=MAX_RETRIES {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if is_db_busy(&err) && attempt < MAX_RETRIES => {
                tracing::warn!(
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    "Database busy, retrying"
                );
                tokio::time::sleep(backoff).await;
                let next_ms = (backoff.as_millis() as u64)
                    .saturating_mul(2)
                    .min(MAX_BACKOFF_MS);
                backoff = Duration::from_millis(next_ms);
            }
            Err(err) => return Err(err),
        }
    }

    unreachable!("retry loop returns on success or error")
}

fn is_db_busy(err: &DbErr) -> bool {
    let message = err.to_string();
    message.contains("database is locked") || message.contains("database is busy")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use sea_orm::RuntimeErr;

    use super::*;

    fn busy_error() -> DbErr {
        DbErr::Conn(RuntimeErr::Internal("database is locked".to_string()))
    }

    #[tokio::test]
    async fn retries_busy_errors_until_success() {
        let attempts = AtomicUsize::new(0);
        let result = retry_on_db_busy(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(busy_error())
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_busy_errors_are_returned_immediately() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), DbErr> = retry_on_db_busy(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::RecordNotFound("nope".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let attempts = AtomicUsize::new(0);
        let result: Result<(), DbErr> = retry_on_db_busy(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(busy_error()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }
}
