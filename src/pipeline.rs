// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Explicit wiring of the pipeline components.
//!
//! Nothing here is global: the cache, transport, client and store are built
//! once and passed down, so tests can assemble the same graph around a fake
//! transport and an in-memory store.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::cache::CacheLayer;
use crate::catalog::CatalogService;
use crate::config::PokedexConfig;
use crate::evolution::EvolutionResolver;
use crate::forms::{FormTableError, FormVariantTable};
use crate::source::{SourceClient, SourceError, Transport};
use crate::storage::{CatalogStore, SqlCatalogStore, StorageError};
use crate::sync::SyncOrchestrator;
use crate::transform::Transformer;

/// Failures that stop the process before any work starts.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("no durable store configured (set sql_url)")]
    MissingSqlUrl,

    #[error("durable store unavailable: {0}")]
    Store(#[from] StorageError),

    #[error("form table invalid: {0}")]
    Forms(#[from] FormTableError),

    #[error("HTTP client could not be built: {0}")]
    Http(#[from] SourceError),
}

pub struct Pipeline {
    config: PokedexConfig,
    cache: Arc<CacheLayer>,
    client: Arc<SourceClient>,
    forms: Arc<FormVariantTable>,
    transformer: Arc<Transformer>,
    evolution: Arc<EvolutionResolver>,
    catalog: Arc<CatalogService>,
}

impl Pipeline {
    /// Production wiring: best-effort Redis, reqwest transport.
    pub async fn connect(config: PokedexConfig) -> Result<Self, StartupError> {
        let cache = Arc::new(CacheLayer::connect(config.redis_url.as_deref(), &config.redis_prefix).await);
        let client = SourceClient::http(&config, cache.clone())?;
        Self::assemble(config, Arc::new(client), cache)
    }

    /// Wiring around a caller-supplied transport and cache.
    pub fn with_transport(
        config: PokedexConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<CacheLayer>,
    ) -> Result<Self, StartupError> {
        let client = SourceClient::new(&config, transport, cache.clone());
        Self::assemble(config, Arc::new(client), cache)
    }

    fn assemble(
        config: PokedexConfig,
        client: Arc<SourceClient>,
        cache: Arc<CacheLayer>,
    ) -> Result<Self, StartupError> {
        let forms = Arc::new(FormVariantTable::embedded()?);
        info!(forms = forms.len(), version = forms.version(), "Form table loaded");

        let transformer = Arc::new(Transformer::new(client.clone(), forms.clone(), &config));
        let evolution = Arc::new(EvolutionResolver::new(client.clone(), forms.clone(), &config));
        let catalog = Arc::new(CatalogService::new(transformer.clone(), cache.clone(), &config));

        Ok(Self {
            config,
            cache,
            client,
            forms,
            transformer,
            evolution,
            catalog,
        })
    }

    /// Open the SQL store named by `sql_url`.
    pub async fn open_store(config: &PokedexConfig) -> Result<Arc<dyn CatalogStore>, StartupError> {
        let url = config.sql_url.as_deref().ok_or(StartupError::MissingSqlUrl)?;
        let store = SqlCatalogStore::new(url).await?;
        Ok(Arc::new(store))
    }

    #[must_use]
    pub fn orchestrator(&self, store: Arc<dyn CatalogStore>) -> SyncOrchestrator {
        SyncOrchestrator::new(
            self.transformer.clone(),
            self.evolution.clone(),
            self.forms.clone(),
            store,
            &self.config,
        )
    }

    pub fn config(&self) -> &PokedexConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheLayer> {
        &self.cache
    }

    pub fn client(&self) -> &Arc<SourceClient> {
        &self.client
    }

    pub fn forms(&self) -> &Arc<FormVariantTable> {
        &self.forms
    }

    pub fn transformer(&self) -> &Arc<Transformer> {
        &self.transformer
    }

    pub fn evolution(&self) -> &Arc<EvolutionResolver> {
        &self.evolution
    }

    pub fn catalog(&self) -> &Arc<CatalogService> {
        &self.catalog
    }

    /// Release the cache backend.
    pub fn shutdown(&self) {
        self.cache.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_requires_sql_url() {
        let config = PokedexConfig::default();
        assert!(matches!(
            Pipeline::open_store(&config).await,
            Err(StartupError::MissingSqlUrl)
        ));
    }
}
