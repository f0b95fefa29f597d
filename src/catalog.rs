// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Read path: cache-aside lookups of normalized creatures and pages.
//!
//! Normalized records are cached whole, so a warm read costs no upstream
//! request and returns exactly what the cold read produced.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::{cache_key, CacheLayer, CacheStats};
use crate::config::PokedexConfig;
use crate::model::raw::RawPokemonList;
use crate::model::{Creature, CreaturePage};
use crate::source::{process_with_limit, resource_id, Endpoint};
use crate::transform::{CatalogError, Transformer};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// A cache backend is attached
    pub cache_configured: bool,
    /// The backend answered a ping just now
    pub cache_connected: bool,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
}

pub struct CatalogService {
    transformer: Arc<Transformer>,
    cache: Arc<CacheLayer>,
    list_concurrency: usize,
    fanout_pause: Duration,
    record_ttl: Duration,
    page_ttl: Duration,
}

impl CatalogService {
    pub fn new(transformer: Arc<Transformer>, cache: Arc<CacheLayer>, config: &PokedexConfig) -> Self {
        Self {
            transformer,
            cache,
            list_concurrency: config.list_concurrency,
            fanout_pause: config.fanout_pause(),
            record_ttl: config.base_record_ttl(),
            page_ttl: config.default_ttl(),
        }
    }

    pub async fn get_by_id(&self, id: u32) -> Result<Creature, CatalogError> {
        let id_str = id.to_string();
        let key = cache_key("creature", &[("id", id_str.as_str())]);

        if let Some(creature) = self.cache.get_json::<Creature>(&key).await {
            debug!(id, "Creature served from cache");
            return Ok(creature);
        }

        let creature = self.transformer.get_creature(&id_str).await?;
        self.cache.set_json(&key, &creature, self.record_ttl).await;
        Ok(creature)
    }

    async fn get_by_ident(&self, ident: &str) -> Result<Creature, CatalogError> {
        match ident.parse::<u32>() {
            Ok(id) => self.get_by_id(id).await,
            Err(_) => self.transformer.get_creature(ident).await,
        }
    }

    /// One page of the upstream list, every entry fully resolved.
    ///
    /// Entries that fail to resolve are left out of `results`; `count`
    /// still reports the upstream total, and the page is not cached.
    pub async fn get_page(&self, limit: u32, offset: u32) -> Result<CreaturePage, CatalogError> {
        let (limit_str, offset_str) = (limit.to_string(), offset.to_string());
        let key = cache_key(
            "page",
            &[("limit", limit_str.as_str()), ("offset", offset_str.as_str())],
        );

        if let Some(page) = self.cache.get_json::<CreaturePage>(&key).await {
            return Ok(page);
        }

        let endpoint = Endpoint::CreatureList { limit, offset };
        let list: RawPokemonList = self
            .transformer
            .client()
            .fetch_as(&endpoint)
            .await
            .map_err(|source| CatalogError::FetchFailed {
                id: endpoint.path(),
                source,
            })?;

        let listed = list.results.len();
        let idents: Vec<String> = list
            .results
            .into_iter()
            .map(|r| resource_id(&r.url).map(|id| id.to_string()).unwrap_or(r.name))
            .collect();

        let resolved = process_with_limit(idents, self.list_concurrency, self.fanout_pause, |ident| async move {
            let result = self.get_by_ident(&ident).await;
            (ident, result)
        })
        .await;

        let mut results = Vec::with_capacity(resolved.len());
        for (ident, result) in resolved {
            match result {
                Ok(creature) => results.push(creature),
                Err(e) => warn!(id = %ident, error = %e, "Dropping unresolvable page entry"),
            }
        }

        let complete = results.len() == listed;
        let page = CreaturePage {
            count: list.count,
            limit,
            offset,
            results,
        };
        if complete {
            self.cache.set_json(&key, &page, self.page_ttl).await;
        } else {
            debug!(limit, offset, dropped = listed - page.results.len(), "Partial page not cached");
        }
        Ok(page)
    }

    pub async fn health(&self) -> HealthReport {
        let stats: CacheStats = self.cache.stats();
        HealthReport {
            cache_configured: self.cache.is_connected(),
            cache_connected: self.cache.ping().await,
            cache_hits: stats.hits,
            cache_misses: stats.misses,
            cache_errors: stats.errors,
        }
    }
}
