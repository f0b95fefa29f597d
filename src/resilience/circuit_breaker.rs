// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Circuit breaker around cache backend calls (recloser).
//!
//! An unreachable Redis would otherwise charge every read a connection
//! timeout. Once the failure rate over the closed window passes the
//! threshold, calls are rejected without touching the backend until
//! `open_wait` elapses; then a few trial calls decide whether to close.
//!
//! Callers treat [`CircuitError::Rejected`] the same as a backend error.

use recloser::{AsyncRecloser, Error as RecloserError, Recloser};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::metrics;

#[derive(Debug, Error)]
pub enum CircuitError<E> {
    #[error("circuit open, call rejected")]
    Rejected,

    #[error(transparent)]
    Inner(E),
}

#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Failure ratio over the closed window that opens the circuit
    pub error_rate: f32,
    pub closed_len: usize,
    pub half_open_len: usize,
    pub open_wait: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self::cache()
    }
}

impl CircuitConfig {
    /// The cache is an optimization, so it trips late and retries often.
    #[must_use]
    pub fn cache() -> Self {
        Self {
            error_rate: 0.5,
            closed_len: 10,
            half_open_len: 2,
            open_wait: Duration::from_secs(15),
        }
    }

    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            error_rate: 0.5,
            closed_len: 2,
            half_open_len: 1,
            open_wait: Duration::from_millis(50),
        }
    }
}

/// Call accounting since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitStats {
    pub passed: u64,
    pub failed: u64,
    pub rejected: u64,
}

pub struct CircuitBreaker {
    name: &'static str,
    inner: AsyncRecloser,
    passed: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitConfig) -> Self {
        let recloser = Recloser::custom()
            .error_rate(config.error_rate)
            .closed_len(config.closed_len)
            .half_open_len(config.half_open_len)
            .open_wait(config.open_wait)
            .build();

        Self {
            name,
            inner: recloser.into(),
            passed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub async fn call<F, Fut, T, E>(&self, f: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let (counter, outcome, result) = match self.inner.call(f()).await {
            Ok(value) => (&self.passed, "success", Ok(value)),
            Err(RecloserError::Inner(e)) => (&self.failed, "failure", Err(CircuitError::Inner(e))),
            Err(RecloserError::Rejected) => {
                debug!(circuit = self.name, "Circuit open, rejecting call");
                (&self.rejected, "rejected", Err(CircuitError::Rejected))
            }
        };
        counter.fetch_add(1, Ordering::Relaxed);
        metrics::record_circuit_breaker_call(self.name, outcome);
        result
    }

    #[must_use]
    pub fn stats(&self) -> CircuitStats {
        CircuitStats {
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    fn refused() -> Result<(), StorageError> {
        Err(StorageError::Backend("connection refused".into()))
    }

    #[tokio::test]
    async fn test_healthy_backend_passes_through() {
        let cb = CircuitBreaker::new("cache", CircuitConfig::test());

        let hit: Result<Option<String>, CircuitError<StorageError>> =
            cb.call(|| async { Ok(Some("{\"id\":25}".to_string())) }).await;

        assert_eq!(hit.unwrap().as_deref(), Some("{\"id\":25}"));
        assert_eq!(cb.stats(), CircuitStats { passed: 1, failed: 0, rejected: 0 });
    }

    #[tokio::test]
    async fn test_backend_error_is_surfaced() {
        let cb = CircuitBreaker::new("cache", CircuitConfig::test());

        let result = cb.call(|| async { refused() }).await;

        assert!(matches!(result, Err(CircuitError::Inner(StorageError::Backend(_)))));
        assert_eq!(cb.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_dead_backend_trips_circuit() {
        let cb = CircuitBreaker::new("cache", CircuitConfig::test());

        for _ in 0..10 {
            let _ = cb.call(|| async { refused() }).await;
        }

        let stats = cb.stats();
        assert!(stats.rejected > 0, "open circuit should reject calls");
        assert_eq!(stats.passed + stats.failed + stats.rejected, 10);
    }

    #[tokio::test]
    async fn test_circuit_recovers_after_open_wait() {
        let cb = CircuitBreaker::new("cache", CircuitConfig::test());
        for _ in 0..4 {
            let _ = cb.call(|| async { refused() }).await;
        }

        tokio::time::sleep(Duration::from_millis(80)).await;

        let trial: Result<u8, CircuitError<StorageError>> = cb.call(|| async { Ok(1) }).await;
        assert_eq!(trial.unwrap(), 1);
    }
}
