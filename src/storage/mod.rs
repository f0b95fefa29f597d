// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Storage backends.
//!
//! - [`traits`]: the `CacheStore` and `CatalogStore` seams
//! - [`redis`]: Redis cache backend
//! - [`sql`]: SQLite/MySQL catalog store
//! - [`memory`]: in-process cache and catalog (tests, single-process runs)

pub mod memory;
pub mod redis;
pub mod sql;
pub mod traits;

pub use memory::{CatalogSnapshot, InMemoryCache, InMemoryCatalog};
pub use self::redis::RedisCacheStore;
pub use sql::SqlCatalogStore;
pub use traits::{CacheStore, CatalogStore, StorageError};
