// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bulk synchronization into the durable store.
//!
//! A full run is three passes, strictly in order:
//!
//! ```text
//! 1. generations 1..=9   ids in each range, batches of 20
//! 2. forms               every known form id, batches of 5
//! 3. chains              distinct chain ids referenced by stored creatures, batches of 5
//! ```
//!
//! Within a batch units run concurrently and fail independently; batches
//! run one after another with a pause between them. Every write is an
//! upsert keyed by id and nothing is deleted, so a rerun over the same
//! upstream data leaves the store unchanged.
//!
//! Progress is published on a `tokio::sync::watch` channel after every unit.

pub mod progress;

pub use progress::{SyncFailure, SyncProgress, SyncReport};

use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::config::PokedexConfig;
use crate::evolution::{ChainError, EvolutionResolver};
use crate::forms::FormVariantTable;
use crate::metrics;
use crate::model::Creature;
use crate::storage::{CatalogStore, StorageError};
use crate::transform::{CatalogError, Transformer};

/// Creature id ranges per generation, in order.
pub const GENERATION_RANGES: [RangeInclusive<u32>; 9] = [
    1..=151,
    152..=251,
    252..=386,
    387..=493,
    494..=649,
    650..=721,
    722..=809,
    810..=905,
    906..=1025,
];

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("unknown generation {0} (expected 1-{max})", max = GENERATION_RANGES.len())]
    UnknownGeneration(u8),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("store write failed: {0}")]
    Storage(#[from] StorageError),
}

/// Ids of generation `n` (1-based).
pub fn generation_ids(n: u8) -> Result<RangeInclusive<u32>, SyncError> {
    usize::from(n)
        .checked_sub(1)
        .and_then(|i| GENERATION_RANGES.get(i))
        .cloned()
        .ok_or(SyncError::UnknownGeneration(n))
}

pub struct SyncOrchestrator {
    transformer: Arc<Transformer>,
    evolution: Arc<EvolutionResolver>,
    forms: Arc<FormVariantTable>,
    store: Arc<dyn CatalogStore>,
    generation_batch_size: usize,
    form_batch_size: usize,
    batch_delay: Duration,
    progress: watch::Sender<SyncProgress>,
}

impl SyncOrchestrator {
    pub fn new(
        transformer: Arc<Transformer>,
        evolution: Arc<EvolutionResolver>,
        forms: Arc<FormVariantTable>,
        store: Arc<dyn CatalogStore>,
        config: &PokedexConfig,
    ) -> Self {
        let (progress, _) = watch::channel(SyncProgress::default());
        Self {
            transformer,
            evolution,
            forms,
            store,
            generation_batch_size: config.generation_batch_size,
            form_batch_size: config.form_batch_size,
            batch_delay: config.batch_delay(),
            progress,
        }
    }

    /// Live view of the pass currently running.
    pub fn subscribe(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// Fetch, resolve and upsert one creature.
    pub async fn sync_creature(&self, id: u32) -> Result<Creature, SyncError> {
        let creature = self.transformer.get_creature(&id.to_string()).await?;
        self.store.upsert_creature(&creature).await?;
        debug!(id, name = creature.species.display_name(), "Creature stored");
        Ok(creature)
    }

    /// Sync an arbitrary id list as one pass.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn sync_range(&self, phase: &str, ids: Vec<u32>, batch_size: usize) -> SyncProgress {
        self.run_pass(phase, ids, batch_size, |id| async move {
            self.sync_creature(id).await.map(|_| ())
        })
        .await
    }

    #[instrument(skip(self))]
    pub async fn sync_generation(&self, generation: u8) -> Result<SyncProgress, SyncError> {
        let ids: Vec<u32> = generation_ids(generation)?.collect();
        let phase = format!("generation-{}", generation);
        Ok(self.sync_range(&phase, ids, self.generation_batch_size).await)
    }

    /// Sync every known form: the table row, then the creature record.
    #[instrument(skip(self))]
    pub async fn sync_forms(&self) -> SyncProgress {
        let ids = self.forms.sorted_form_ids().to_vec();
        self.run_pass("forms", ids, self.form_batch_size, |id| async move {
            if let Some(form) = self.forms.resolve(id) {
                self.store.upsert_form_variant(form).await?;
            }
            self.sync_creature(id).await.map(|_| ())
        })
        .await
    }

    pub async fn sync_chain(&self, id: u32) -> Result<(), SyncError> {
        let chain = self.evolution.resolve_chain(id).await?;
        self.store.upsert_evolution_chain(&chain).await?;
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn sync_chains(&self, ids: Vec<u32>) -> SyncProgress {
        self.run_pass("chains", ids, self.form_batch_size, |id| self.sync_chain(id))
            .await
    }

    /// Sync every chain referenced by a stored creature, once each.
    ///
    /// Chains referenced only by creatures that failed to sync are not
    /// discovered; `failed_creatures` is logged so the gap is visible.
    pub async fn sync_discovered_chains(&self, failed_creatures: usize) -> Result<SyncProgress, SyncError> {
        let ids = self.store.referenced_chain_ids().await?;
        if failed_creatures > 0 {
            warn!(
                failed_creatures,
                "Chains referenced only by failed creatures will not be synced"
            );
        }
        info!(chains = ids.len(), "Discovered evolution chains");
        Ok(self.sync_chains(ids).await)
    }

    /// Full run: all generations, then forms, then discovered chains.
    pub async fn sync_all(&self) -> Result<SyncReport, SyncError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("sync_all", %run_id);
        self.run_all().instrument(span).await
    }

    async fn run_all(&self) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        for generation in 1..=GENERATION_RANGES.len() as u8 {
            report.generations.push(self.sync_generation(generation).await?);
        }

        report.forms = self.sync_forms().await;
        report.chains = self.sync_discovered_chains(report.failed_creatures()).await?;

        info!(
            total = report.total(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            elapsed_secs = started.elapsed().as_secs(),
            "Sync run complete"
        );
        Ok(report)
    }

    /// Run `unit` over `ids` in sequential batches, recording every outcome.
    async fn run_pass<F, Fut>(&self, phase: &str, ids: Vec<u32>, batch_size: usize, unit: F) -> SyncProgress
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<(), SyncError>>,
    {
        let tally = Mutex::new(SyncProgress::new(phase, ids.len()));
        self.progress.send_replace(tally.lock().clone());
        metrics::set_sync_progress(phase, 0, ids.len());
        info!(phase, total = ids.len(), "Sync pass starting");

        let batch_size = batch_size.max(1);
        let batches: Vec<&[u32]> = ids.chunks(batch_size).collect();
        let batch_count = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            let batch_started = Instant::now();

            join_all(batch.iter().map(|&id| {
                let unit = &unit;
                let tally = &tally;
                async move {
                    let outcome = unit(id).await;
                    self.record(phase, tally, id, outcome);
                }
            }))
            .await;

            metrics::record_sync_batch(phase, batch_started.elapsed());

            if index + 1 < batch_count && !self.batch_delay.is_zero() {
                sleep(self.batch_delay).await;
            }
        }

        let done = tally.into_inner();
        info!(
            phase,
            total = done.total,
            succeeded = done.succeeded,
            failed = done.failed,
            "Sync pass finished"
        );
        done
    }

    fn record(&self, phase: &str, tally: &Mutex<SyncProgress>, id: u32, outcome: Result<(), SyncError>) {
        let snapshot = {
            let mut progress = tally.lock();
            match outcome {
                Ok(()) => {
                    progress.record_success();
                    metrics::record_sync_item(phase, "ok");
                }
                Err(e) => {
                    warn!(phase, id, error = %e, "Sync unit failed");
                    progress.record_failure(id, e.to_string());
                    metrics::record_sync_item(phase, "failed");
                }
            }
            metrics::set_sync_progress(phase, progress.processed, progress.total);
            progress.clone()
        };
        self.progress.send_replace(snapshot);
    }
}
