//! Bounded, cancellable fan-out with a join barrier.

use std::future::Future;

use futures::future;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::marketplace::FetchError;

/// Run `task` over every item with at most `limit` in flight and wait for all.
///
/// Once `cancel` fires, no further items are started; results come back in
/// completion order.
pub(crate) async fn fan_out<I, F, Fut, T>(
    items: I,
    limit: usize,
    cancel: &CancellationToken,
    task: F,
) -> Vec<T>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    stream::iter(items)
        .take_while(|_| future::ready(!cancel.is_cancelled()))
        .map(task)
        .buffer_unordered(limit.max(1))
        .collect()
        .await
}

/// Race a backend call against the cancellation signal.
pub(crate) async fn cancellable<T, Fut>(
    cancel: &CancellationToken,
    call: Fut,
) -> Result<T, FetchError>
where
    Fut: Future<Output = Result<T, FetchError>>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        result = call => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fan_out_runs_everything() {
        let cancel = CancellationToken::new();
        let mut out = fan_out(1..=10u32, 3, &cancel, |i| async move { i * 2 }).await;
        out.sort();
        assert_eq!(out, (1..=10).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_fan_out_respects_limit() {
        let cancel = CancellationToken::new();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        fan_out(0..20, 4, &cancel, |_| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 4);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_fan_out_zero_limit_still_progresses() {
        let cancel = CancellationToken::new();
        let out = fan_out(0..3, 0, &cancel, |i| async move { i }).await;
        assert_eq!(out.len(), 3);
    }

    #[tokio::test]
    async fn test_fan_out_stops_scheduling_after_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = fan_out(0..5, 2, &cancel, |i| async move { i }).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_cancellable_aborts_pending_call() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let result: Result<(), FetchError> =
            cancellable(&cancel, future::pending::<Result<(), FetchError>>()).await;
        assert_eq!(result, Err(FetchError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, FetchError>(7) }).await;
        assert_eq!(result, Ok(7));
    }
}
