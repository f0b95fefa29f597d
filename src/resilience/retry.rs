// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bounded retry with exponential backoff.
//!
//! # Example
//!
//! ```
//! use pokedex_sync::RetryConfig;
//! use std::time::Duration;
//!
//! // Upstream fetches: 3 retries at 1s, 2s, 4s
//! let delays: Vec<Duration> = RetryConfig::source().backoff().collect();
//! assert_eq!(delays, [1, 2, 4].map(Duration::from_secs));
//! assert_eq!(RetryConfig::source().max_attempts(), Some(4));
//! ```

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// `max_retries` counts retries after the first attempt, so an operation
/// that always fails runs `1 + max_retries` times. `None` never gives up.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    pub max_retries: Option<usize>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::source()
    }
}

impl RetryConfig {
    /// Upstream REST fetches: 3 retries, 1s doubling.
    #[must_use]
    pub fn source() -> Self {
        Self {
            max_retries: Some(3),
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            factor: 2.0,
        }
    }

    /// Opening the durable store. Short, so a wrong URL stops the process quickly.
    #[must_use]
    pub fn startup() -> Self {
        Self {
            max_retries: Some(4),
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Single store statements.
    #[must_use]
    pub fn query() -> Self {
        Self {
            max_retries: Some(2),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> Option<usize> {
        self.max_retries.map(|r| r + 1)
    }

    /// The pause before each retry, in order.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.initial_delay,
            max: self.max_delay,
            factor: self.factor,
            remaining: self.max_retries,
        }
    }
}

/// Delay schedule produced by [`RetryConfig::backoff`]. Ends when the
/// retry budget is spent; endless when the budget is unbounded.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
    factor: f64,
    remaining: Option<usize>,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.checked_sub(1)?;
        }
        let delay = self.next.min(self.max);
        self.next = self.next.mul_f64(self.factor).min(self.max);
        Some(delay)
    }
}

/// Retry every error until the budget is spent.
pub async fn retry<F, Fut, T, E>(label: &str, config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    retry_if(label, config, move |_| operation(), |_| true).await
}

/// Retry only errors accepted by `should_retry`; anything else is returned
/// at once. `operation` receives the 1-based attempt number.
pub async fn retry_if<F, Fut, T, E, P>(
    label: &str,
    config: &RetryConfig,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    P: Fn(&E) -> bool,
{
    let mut backoff = config.backoff();
    let mut attempt = 1;

    loop {
        let err = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(label, attempt, "Recovered after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !should_retry(&err) {
            return Err(err);
        }

        let Some(delay) = backoff.next() else {
            warn!(label, attempts = attempt, error = %err, "Giving up");
            return Err(err);
        };

        warn!(label, attempt, error = %err, delay_ms = delay.as_millis() as u64, "Retrying");
        sleep(delay).await;
        attempt += 1;
    }
}
