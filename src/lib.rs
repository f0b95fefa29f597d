// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Pokédex Sync
//!
//! Cache-aside ingestion and bulk synchronization for a creature catalog
//! sourced from a read-only, PokéAPI-shaped REST API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          CatalogService (read)   SyncOrchestrator (bulk)    │
//! │  • get_by_id / get_page          • generations → forms →    │
//! │  • whole-record cache-aside        chains, batched          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │         Transformer          EvolutionResolver              │
//! │  • abilities/moves ≤3 in     • recursive tree, cycle and    │
//! │    flight, stub on failure     depth guarded                │
//! │  • placeholder species       • forms from FormVariantTable  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      SourceClient                           │
//! │  • per-endpoint cache policy (long / medium / skip)         │
//! │  • retry transient errors: 1 + 3 attempts, 1s 2s 4s         │
//! │  • Transport seam (reqwest in production)                   │
//! └─────────────────────────────────────────────────────────────┘
//!                  │                            │
//!                  ▼                            ▼
//! ┌───────────────────────────────┐  ┌──────────────────────────┐
//! │ CacheLayer (fail-open)        │  │ CatalogStore (upsert)    │
//! │ • Redis / in-memory backend   │  │ • SQLite / MySQL / memory│
//! │ • circuit breaker             │  │ • creatures, chains,     │
//! └───────────────────────────────┘  │   form_variants          │
//!                                    └──────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pokedex_sync::{Pipeline, PokedexConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PokedexConfig {
//!         redis_url: Some("redis://localhost:6379".into()),
//!         sql_url: Some("sqlite://pokedex.db?mode=rwc".into()),
//!         ..Default::default()
//!     };
//!
//!     let pipeline = Pipeline::connect(config.clone()).await?;
//!
//!     // Read path
//!     let pikachu = pipeline.catalog().get_by_id(25).await?;
//!     println!("{} weighs {}", pikachu.name, pikachu.weight);
//!
//!     // Bulk path
//!     let store = Pipeline::open_store(&config).await?;
//!     let progress = pipeline.orchestrator(store).sync_generation(1).await?;
//!     println!("{}/{} synced", progress.succeeded, progress.total);
//!
//!     pipeline.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`source`]: upstream client, endpoints, transport, bounded fan-out
//! - [`cache`]: fail-open cache layer and key derivation
//! - [`transform`]: raw payloads → normalized creatures
//! - [`evolution`]: evolution chain resolution
//! - [`forms`]: static form-variant table
//! - [`sync`]: bulk synchronization orchestrator
//! - [`storage`]: cache and catalog backends
//! - [`resilience`]: retry and circuit breaker

pub mod cache;
pub mod catalog;
pub mod config;
pub mod evolution;
pub mod forms;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod resilience;
pub mod source;
pub mod storage;
pub mod sync;
pub mod transform;

pub use cache::{cache_key, CacheLayer, CacheStats};
pub use catalog::{CatalogService, HealthReport};
pub use config::PokedexConfig;
pub use evolution::{ChainError, EvolutionResolver};
pub use forms::{FormCategory, FormVariant, FormVariantTable};
pub use metrics::LatencyTimer;
pub use model::{Creature, CreaturePage, EvolutionChain, EvolutionNode, Species};
pub use pipeline::{Pipeline, StartupError};
pub use resilience::circuit_breaker::{CircuitBreaker, CircuitConfig, CircuitError, CircuitStats};
pub use resilience::retry::RetryConfig;
pub use source::{process_with_limit, Endpoint, SourceClient, SourceError, Transport};
pub use storage::traits::{CacheStore, CatalogStore, StorageError};
pub use sync::{SyncError, SyncOrchestrator, SyncProgress, SyncReport};
pub use transform::{CatalogError, Transformer};
