// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::model::{Creature, EvolutionChain, FormVariant};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Stored payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Key/value backend behind the cache layer.
///
/// Values are opaque strings (serialized JSON). Implementations report
/// errors honestly; swallowing them is the cache layer's job.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Cheap liveness check used by health reporting.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Durable catalog store.
///
/// Every write is an upsert keyed by the entity id; nothing is ever deleted,
/// so replaying a sync converges on the same contents.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn upsert_creature(&self, creature: &Creature) -> Result<(), StorageError>;
    async fn upsert_evolution_chain(&self, chain: &EvolutionChain) -> Result<(), StorageError>;
    async fn upsert_form_variant(&self, form: &FormVariant) -> Result<(), StorageError>;

    async fn get_creature(&self, id: u32) -> Result<Option<Creature>, StorageError>;
    async fn get_evolution_chain(&self, id: u32) -> Result<Option<EvolutionChain>, StorageError>;
    async fn get_form_variant(&self, form_id: u32) -> Result<Option<FormVariant>, StorageError>;

    /// Distinct evolution-chain ids referenced by stored creatures' species, ascending.
    async fn referenced_chain_ids(&self) -> Result<Vec<u32>, StorageError>;

    async fn count_creatures(&self) -> Result<u64, StorageError>;
}
