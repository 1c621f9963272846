//! Interruptible countdowns.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How a countdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Elapsed,
    Cancelled,
}

/// Deadline used when `now + total` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Wait `total`, checking `cancel` at least every `tick`.
///
/// The deadline is fixed up front, so slow ticks do not stretch the phase.
pub async fn countdown(total: Duration, tick: Duration, cancel: &CancellationToken) -> Countdown {
    let now = Instant::now();
    let deadline = now
        .checked_add(total)
        .unwrap_or_else(|| now + FAR_FUTURE);
    loop {
        if cancel.is_cancelled() {
            return Countdown::Cancelled;
        }
        let now = Instant::now();
        if now >= deadline {
            return Countdown::Elapsed;
        }
        tokio::time::sleep(tick.min(deadline - now)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapses_after_total() {
        let cancel = CancellationToken::new();
        let started = Instant::now();
        let result = countdown(Duration::from_secs(90), Duration::from_secs(1), &cancel).await;
        assert_eq!(result, Countdown::Elapsed);
        assert_eq!(started.elapsed(), Duration::from_secs(90));
    }

    #[tokio::test(start_paused = true)]
    async fn partial_tick_lands_on_deadline() {
        let cancel = CancellationToken::new();
        let started = Instant::now();
        countdown(Duration::from_millis(2500), Duration::from_secs(1), &cancel).await;
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_observed_within_one_tick() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(4500)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = countdown(Duration::from_secs(1800), Duration::from_secs(1), &cancel).await;

        assert_eq!(result, Countdown::Cancelled);
        assert!(started.elapsed() <= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_deadline_still_counts_down() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let result = countdown(Duration::MAX, Duration::from_secs(1), &cancel).await;

        assert_eq!(result, Countdown::Cancelled);
    }

    #[tokio::test]
    async fn already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = countdown(Duration::from_secs(3600), Duration::from_secs(1), &cancel).await;
        assert_eq!(result, Countdown::Cancelled);
    }
}
