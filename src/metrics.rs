// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the ingestion pipeline.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `pokedex_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `endpoint`: pokemon, species, ability, move, evolution_chain, list
//! - `operation`: get, set, del
//! - `outcome` / `status`: hit, miss, success, error, degraded
//! - `phase`: generation, forms, chains

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

// ═══════════════════════════════════════════════════════════════════════════
// SOURCE CLIENT - Upstream request accounting
// ═══════════════════════════════════════════════════════════════════════════

/// Record an upstream request outcome
pub fn record_source_request(endpoint: &str, outcome: &str) {
    counter!(
        "pokedex_source_requests_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a retry of a transient upstream failure
pub fn record_source_retry(endpoint: &str) {
    counter!(
        "pokedex_source_retries_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Record upstream request latency (including retries)
pub fn record_source_latency(endpoint: &str, duration: Duration) {
    histogram!(
        "pokedex_source_request_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(duration.as_secs_f64());
}

// ═══════════════════════════════════════════════════════════════════════════
// CACHE LAYER
// ═══════════════════════════════════════════════════════════════════════════

/// Record a cache operation outcome
pub fn record_cache_operation(operation: &str, outcome: &str) {
    counter!(
        "pokedex_cache_operations_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Set cache backend connectivity (1 = connected, 0 = degraded)
pub fn set_cache_connected(connected: bool) {
    gauge!("pokedex_cache_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record circuit breaker call outcome
pub fn record_circuit_breaker_call(circuit: &str, outcome: &str) {
    counter!(
        "pokedex_circuit_breaker_calls_total",
        "circuit" => circuit.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// TRANSFORMER - Degraded sub-resources
// ═══════════════════════════════════════════════════════════════════════════

/// Record a sub-resource replaced by a stub
pub fn record_stub(kind: &str) {
    counter!(
        "pokedex_transform_stubs_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// SYNC - Bulk ingestion progress
// ═══════════════════════════════════════════════════════════════════════════

/// Record one synced unit
pub fn record_sync_item(phase: &str, status: &str) {
    counter!(
        "pokedex_sync_items_total",
        "phase" => phase.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Set the processed fraction (0.0 - 1.0) of the current phase
pub fn set_sync_progress(phase: &str, processed: usize, total: usize) {
    let fraction = if total == 0 { 1.0 } else { processed as f64 / total as f64 };
    gauge!(
        "pokedex_sync_progress",
        "phase" => phase.to_string()
    )
    .set(fraction);
}

/// Record the duration of one sync batch
pub fn record_sync_batch(phase: &str, duration: Duration) {
    histogram!(
        "pokedex_sync_batch_seconds",
        "phase" => phase.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Timer that records upstream latency on drop
pub struct LatencyTimer {
    endpoint: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_source_latency(self.endpoint, self.start.elapsed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    #[test]
    fn test_source_counters_are_labelled() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_source_request("pokemon", "success");
            record_source_request("pokemon", "success");
            record_source_retry("move");
        });

        let snapshot = snapshotter.snapshot().into_vec();
        let requests = snapshot
            .iter()
            .find(|(key, _, _, _)| key.key().name() == "pokedex_source_requests_total")
            .map(|(_, _, _, value)| value);
        assert!(matches!(requests, Some(DebugValue::Counter(2))));
    }

    #[test]
    fn test_progress_gauge_handles_empty_phase() {
        set_sync_progress("chains", 0, 0);
        set_sync_progress("generation", 10, 20);
    }

    #[test]
    fn test_latency_timer() {
        {
            let _timer = LatencyTimer::new("pokemon");
            std::thread::sleep(Duration::from_micros(10));
        }
        // Timer recorded on drop
    }
}
