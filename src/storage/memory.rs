// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process backends: a TTL cache and a catalog store.
//!
//! Both keep serialized JSON rather than typed values so they behave like the
//! real backends (a decode failure surfaces the same way) and so tests can
//! compare stored bytes directly.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::traits::{CacheStore, CatalogStore, StorageError};
use crate::model::{Creature, EvolutionChain, FormVariant};

struct CacheSlot {
    value: String,
    expires_at: Instant,
}

/// TTL-aware key/value cache.
pub struct InMemoryCache {
    data: DashMap<String, CacheSlot>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    /// Live (unexpired) entry count
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data.iter().filter(|e| e.value().expires_at > now).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let now = Instant::now();
        let expired = match self.data.get(key) {
            Some(slot) if slot.expires_at > now => return Ok(Some(slot.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.data.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageError> {
        self.data.insert(
            key.to_string(),
            CacheSlot {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.data.remove(key);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

struct CreatureRow {
    evolution_chain_id: Option<u32>,
    payload: String,
}

/// Catalog store keeping one serialized row per entity id.
#[derive(Default)]
pub struct InMemoryCatalog {
    creatures: DashMap<u32, CreatureRow>,
    chains: DashMap<u32, String>,
    forms: DashMap<u32, String>,
}

/// Ordered copy of every stored row, for comparing store contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub creatures: BTreeMap<u32, String>,
    pub chains: BTreeMap<u32, String>,
    pub forms: BTreeMap<u32, String>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    #[must_use]
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    #[must_use]
    pub fn form_count(&self) -> usize {
        self.forms.len()
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            creatures: self
                .creatures
                .iter()
                .map(|e| (*e.key(), e.value().payload.clone()))
                .collect(),
            chains: self.chains.iter().map(|e| (*e.key(), e.value().clone())).collect(),
            forms: self.forms.iter().map(|e| (*e.key(), e.value().clone())).collect(),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn upsert_creature(&self, creature: &Creature) -> Result<(), StorageError> {
        let payload = serde_json::to_string(creature)?;
        self.creatures.insert(
            creature.id,
            CreatureRow {
                evolution_chain_id: creature.species.evolution_chain_id,
                payload,
            },
        );
        Ok(())
    }

    async fn upsert_evolution_chain(&self, chain: &EvolutionChain) -> Result<(), StorageError> {
        self.chains.insert(chain.id, serde_json::to_string(chain)?);
        Ok(())
    }

    async fn upsert_form_variant(&self, form: &FormVariant) -> Result<(), StorageError> {
        self.forms.insert(form.form_id, serde_json::to_string(form)?);
        Ok(())
    }

    async fn get_creature(&self, id: u32) -> Result<Option<Creature>, StorageError> {
        self.creatures
            .get(&id)
            .map(|row| serde_json::from_str(&row.payload))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn get_evolution_chain(&self, id: u32) -> Result<Option<EvolutionChain>, StorageError> {
        self.chains
            .get(&id)
            .map(|row| serde_json::from_str(row.value()))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn get_form_variant(&self, form_id: u32) -> Result<Option<FormVariant>, StorageError> {
        self.forms
            .get(&form_id)
            .map(|row| serde_json::from_str(row.value()))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn referenced_chain_ids(&self) -> Result<Vec<u32>, StorageError> {
        let mut ids: Vec<u32> = self
            .creatures
            .iter()
            .filter_map(|row| row.value().evolution_chain_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn count_creatures(&self) -> Result<u64, StorageError> {
        Ok(self.creatures.len() as u64)
    }
}
