use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub use crate::services::config::WatchConfig;

/// How one watch run ended. A missed deadline is an ordinary outcome here,
/// not an error; only the check itself can fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome<T> {
    Ready(T),
    TimedOut { checks: u32 },
    Cancelled { checks: u32 },
}

/// Runs `check` on a fixed schedule until it yields a value, the deadline
/// passes, or the token is cancelled.
///
/// The first check fires immediately; later checks follow the configured
/// interval. A 60s deadline over a 10s interval therefore performs exactly
/// six checks. A check error ends the run at once.
pub async fn watch_until<T, E, F, Fut>(
    config: WatchConfig,
    cancel: &CancellationToken,
    mut check: F,
) -> Result<WatchOutcome<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let deadline = tokio::time::sleep(Duration::from_secs(config.deadline_secs));
    tokio::pin!(deadline);

    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut checks = 0u32;
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(WatchOutcome::Cancelled { checks });
            }
            _ = &mut deadline => {
                return Ok(WatchOutcome::TimedOut { checks });
            }
            _ = ticker.tick() => {
                checks += 1;
                if let Some(value) = check().await? {
                    return Ok(WatchOutcome::Ready(value));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn config() -> WatchConfig {
        WatchConfig {
            interval_secs: 10,
            deadline_secs: 60,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_check_fires_immediately() {
        let cancel = CancellationToken::new();
        let outcome = watch_until(config(), &cancel, || async {
            Ok::<_, std::convert::Infallible>(Some(42))
        })
        .await
        .unwrap();
        assert_eq!(outcome, WatchOutcome::Ready(42));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_schedule_at_six_checks() {
        let cancel = CancellationToken::new();
        let seen = Arc::new(AtomicU32::new(0));
        let counter = seen.clone();

        let outcome = watch_until(config(), &cancel, move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<Option<()>, std::convert::Infallible>(None)
            }
        })
        .await
        .unwrap();

        // checks at t = 0, 10, 20, 30, 40, 50; the deadline wins at t = 60
        assert_eq!(outcome, WatchOutcome::TimedOut { checks: 6 });
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn becomes_ready_on_a_later_check() {
        let cancel = CancellationToken::new();
        let seen = Arc::new(AtomicU32::new(0));
        let counter = seen.clone();

        let outcome = watch_until(config(), &cancel, move || {
            let counter = counter.clone();
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok::<_, std::convert::Infallible>((n == 3).then_some("klaar"))
            }
        })
        .await
        .unwrap();

        assert_eq!(outcome, WatchOutcome::Ready("klaar"));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_run() {
        let cancel = CancellationToken::new();
        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(25)).await;
            child.cancel();
        });

        let outcome = watch_until(config(), &cancel, || async {
            Ok::<Option<()>, std::convert::Infallible>(None)
        })
        .await
        .unwrap();

        // checks at t = 0, 10, 20 before the cancel at t = 25
        assert_eq!(outcome, WatchOutcome::Cancelled { checks: 3 });
    }

    #[tokio::test(start_paused = true)]
    async fn check_errors_end_the_run() {
        let cancel = CancellationToken::new();
        let result: Result<WatchOutcome<()>, &str> =
            watch_until(config(), &cancel, || async { Err("db unreachable") }).await;
        assert_eq!(result.unwrap_err(), "db unreachable");
    }
}
