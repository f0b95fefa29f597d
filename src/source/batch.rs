// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use futures::future::join_all;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Run `worker` over `items` with at most `limit` calls in flight.
///
/// Items are taken `limit` at a time; each chunk completes before the next
/// starts, with `pause` between chunks. Output order matches input order
/// whatever order the futures finish in.
pub async fn process_with_limit<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    pause: Duration,
    worker: F,
) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let limit = limit.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut remaining = items.into_iter().peekable();

    while remaining.peek().is_some() {
        let chunk: Vec<T> = remaining.by_ref().take(limit).collect();
        results.extend(join_all(chunk.into_iter().map(&worker)).await);

        if remaining.peek().is_some() && !pause.is_zero() {
            sleep(pause).await;
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_preserves_input_order() {
        // Later items finish first
        let out = process_with_limit(vec![30u64, 20, 10, 0], 4, Duration::ZERO, |ms| async move {
            sleep(Duration::from_millis(ms)).await;
            ms
        })
        .await;

        assert_eq!(out, vec![30, 20, 10, 0]);
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let out = process_with_limit((0..10).collect(), 3, Duration::from_millis(1), |i: usize| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i * 2
            }
        })
        .await;

        assert_eq!(out, (0..10).map(|i| i * 2).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<u32> = process_with_limit(Vec::<u32>::new(), 5, Duration::ZERO, |x| async move { x }).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_zero_limit_still_progresses() {
        let out = process_with_limit(vec![1, 2, 3], 0, Duration::ZERO, |x| async move { x + 1 }).await;
        assert_eq!(out, vec![2, 3, 4]);
    }
}
