// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL catalog store (SQLite or MySQL through sqlx's `Any` driver).
//!
//! One row per entity, keyed by the upstream id. The normalized record is
//! kept whole in a `payload` column; the handful of columns that queries need
//! (chain references, form bases) are lifted out next to it:
//!
//! ```sql
//! CREATE TABLE creatures (
//!   id BIGINT PRIMARY KEY,
//!   name VARCHAR(128) NOT NULL,
//!   is_form TINYINT NOT NULL,
//!   evolution_chain_id BIGINT,     -- NULL when the species had no chain ref
//!   payload LONGTEXT NOT NULL
//! )
//! CREATE TABLE evolution_chains (id BIGINT PRIMARY KEY, root_name ..., payload LONGTEXT)
//! CREATE TABLE form_variants (form_id BIGINT PRIMARY KEY, base_pokemon_id, form_name, category)
//! ```
//!
//! ## sqlx Any Driver Quirks
//!
//! Payloads are TEXT/LONGTEXT rather than native JSON because the `Any`
//! driver cannot map MySQL's JSON type, and it hands LONGTEXT back as bytes.
//! [`text_column`] reads either representation.

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use std::sync::Once;
use std::time::Duration;

use super::traits::{CatalogStore, StorageError};
use crate::model::{Creature, EvolutionChain, FormVariant};
use crate::resilience::retry::{retry, RetryConfig};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

/// Read a text column that SQLite returns as TEXT and MySQL as bytes.
fn text_column(row: &AnyRow, column: &str) -> Option<String> {
    row.try_get::<String, _>(column).ok().or_else(|| {
        row.try_get::<Vec<u8>, _>(column)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    })
}

fn backend(e: sqlx::Error) -> StorageError {
    StorageError::Backend(e.to_string())
}

pub struct SqlCatalogStore {
    pool: AnyPool,
    is_sqlite: bool,
}

impl SqlCatalogStore {
    /// Connect with startup-mode retry (fails fast if the URL is wrong) and
    /// create the tables if they are missing.
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        install_drivers();

        let is_sqlite = connection_string.starts_with("sqlite:");

        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            AnyPoolOptions::new()
                .max_connections(if is_sqlite { 5 } else { 20 })
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(300))
                .connect(connection_string)
                .await
                .map_err(backend)
        })
        .await?;

        let store = Self { pool, is_sqlite };

        if is_sqlite {
            store.enable_wal_mode().await?;
        }

        store.init_schema().await?;
        Ok(store)
    }

    async fn enable_wal_mode(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to enable WAL mode: {}", e)))?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to set synchronous mode: {}", e)))?;

        Ok(())
    }

    fn schema(&self) -> [&'static str; 3] {
        if self.is_sqlite {
            [
                r#"
                CREATE TABLE IF NOT EXISTS creatures (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    is_form INTEGER NOT NULL DEFAULT 0,
                    evolution_chain_id INTEGER,
                    payload TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS evolution_chains (
                    id INTEGER PRIMARY KEY,
                    root_name TEXT NOT NULL,
                    payload TEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS form_variants (
                    form_id INTEGER PRIMARY KEY,
                    base_pokemon_id INTEGER NOT NULL,
                    form_name TEXT NOT NULL,
                    category TEXT NOT NULL
                )
                "#,
            ]
        } else {
            [
                r#"
                CREATE TABLE IF NOT EXISTS creatures (
                    id BIGINT PRIMARY KEY,
                    name VARCHAR(128) NOT NULL,
                    is_form TINYINT NOT NULL DEFAULT 0,
                    evolution_chain_id BIGINT,
                    payload LONGTEXT NOT NULL,
                    INDEX idx_evolution_chain (evolution_chain_id)
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS evolution_chains (
                    id BIGINT PRIMARY KEY,
                    root_name VARCHAR(128) NOT NULL,
                    payload LONGTEXT NOT NULL
                )
                "#,
                r#"
                CREATE TABLE IF NOT EXISTS form_variants (
                    form_id BIGINT PRIMARY KEY,
                    base_pokemon_id BIGINT NOT NULL,
                    form_name VARCHAR(128) NOT NULL,
                    category VARCHAR(16) NOT NULL,
                    INDEX idx_base (base_pokemon_id)
                )
                "#,
            ]
        }
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        for sql in self.schema() {
            retry("sql_init_schema", &RetryConfig::startup(), || async {
                sqlx::query(sql).execute(&self.pool).await.map_err(backend)
            })
            .await?;
        }
        Ok(())
    }

    async fn fetch_payload(&self, sql: &'static str, id: u32) -> Result<Option<String>, StorageError> {
        let row = retry("sql_get", &RetryConfig::query(), || async {
            sqlx::query(sql)
                .bind(i64::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;

        match row {
            Some(row) => text_column(&row, "payload")
                .map(Some)
                .ok_or_else(|| StorageError::Backend(format!("row {} has no payload", id))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn upsert_creature(&self, creature: &Creature) -> Result<(), StorageError> {
        let payload = serde_json::to_string(creature)?;
        let id = i64::from(creature.id);
        let is_form = i64::from(creature.is_form());
        let chain_id = creature.species.evolution_chain_id.map(i64::from);

        let sql = if self.is_sqlite {
            "INSERT INTO creatures (id, name, is_form, evolution_chain_id, payload)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                is_form = excluded.is_form,
                evolution_chain_id = excluded.evolution_chain_id,
                payload = excluded.payload"
        } else {
            "INSERT INTO creatures (id, name, is_form, evolution_chain_id, payload)
             VALUES (?, ?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                is_form = VALUES(is_form),
                evolution_chain_id = VALUES(evolution_chain_id),
                payload = VALUES(payload)"
        };

        retry("sql_upsert_creature", &RetryConfig::query(), || async {
            sqlx::query(sql)
                .bind(id)
                .bind(&creature.name)
                .bind(is_form)
                .bind(chain_id)
                .bind(&payload)
                .execute(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;

        Ok(())
    }

    async fn upsert_evolution_chain(&self, chain: &EvolutionChain) -> Result<(), StorageError> {
        let payload = serde_json::to_string(chain)?;
        let id = i64::from(chain.id);

        let sql = if self.is_sqlite {
            "INSERT INTO evolution_chains (id, root_name, payload) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET root_name = excluded.root_name, payload = excluded.payload"
        } else {
            "INSERT INTO evolution_chains (id, root_name, payload) VALUES (?, ?, ?)
             ON DUPLICATE KEY UPDATE root_name = VALUES(root_name), payload = VALUES(payload)"
        };

        retry("sql_upsert_chain", &RetryConfig::query(), || async {
            sqlx::query(sql)
                .bind(id)
                .bind(&chain.chain.name)
                .bind(&payload)
                .execute(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;

        Ok(())
    }

    async fn upsert_form_variant(&self, form: &FormVariant) -> Result<(), StorageError> {
        let category = form.category.to_string();

        let sql = if self.is_sqlite {
            "INSERT INTO form_variants (form_id, base_pokemon_id, form_name, category) VALUES (?, ?, ?, ?)
             ON CONFLICT(form_id) DO UPDATE SET
                base_pokemon_id = excluded.base_pokemon_id,
                form_name = excluded.form_name,
                category = excluded.category"
        } else {
            "INSERT INTO form_variants (form_id, base_pokemon_id, form_name, category) VALUES (?, ?, ?, ?)
             ON DUPLICATE KEY UPDATE
                base_pokemon_id = VALUES(base_pokemon_id),
                form_name = VALUES(form_name),
                category = VALUES(category)"
        };

        retry("sql_upsert_form", &RetryConfig::query(), || async {
            sqlx::query(sql)
                .bind(i64::from(form.form_id))
                .bind(i64::from(form.base_pokemon_id))
                .bind(&form.form_name)
                .bind(&category)
                .execute(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;

        Ok(())
    }

    async fn get_creature(&self, id: u32) -> Result<Option<Creature>, StorageError> {
        self.fetch_payload("SELECT payload FROM creatures WHERE id = ?", id)
            .await?
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn get_evolution_chain(&self, id: u32) -> Result<Option<EvolutionChain>, StorageError> {
        self.fetch_payload("SELECT payload FROM evolution_chains WHERE id = ?", id)
            .await?
            .map(|payload| serde_json::from_str(&payload))
            .transpose()
            .map_err(StorageError::from)
    }

    async fn get_form_variant(&self, form_id: u32) -> Result<Option<FormVariant>, StorageError> {
        let row = retry("sql_get_form", &RetryConfig::query(), || async {
            sqlx::query(
                "SELECT base_pokemon_id, form_name, category FROM form_variants WHERE form_id = ?",
            )
            .bind(i64::from(form_id))
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
        })
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let base: i64 = row.try_get("base_pokemon_id").map_err(backend)?;
        let form_name = text_column(&row, "form_name").unwrap_or_default();
        let category = text_column(&row, "category").unwrap_or_default();

        // Category round-trips through its serde name
        let category = serde_json::from_value(serde_json::Value::String(category))?;

        Ok(Some(FormVariant {
            form_id,
            base_pokemon_id: u32::try_from(base)
                .map_err(|_| StorageError::Backend(format!("form {} has base id {}", form_id, base)))?,
            form_name,
            category,
        }))
    }

    async fn referenced_chain_ids(&self) -> Result<Vec<u32>, StorageError> {
        let rows = retry("sql_chain_ids", &RetryConfig::query(), || async {
            sqlx::query(
                "SELECT DISTINCT evolution_chain_id FROM creatures
                 WHERE evolution_chain_id IS NOT NULL
                 ORDER BY evolution_chain_id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
        })
        .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("evolution_chain_id").map_err(backend)?;
            if let Ok(id) = u32::try_from(id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn count_creatures(&self) -> Result<u64, StorageError> {
        let row = retry("sql_count", &RetryConfig::query(), || async {
            sqlx::query("SELECT COUNT(*) as cnt FROM creatures")
                .fetch_one(&self.pool)
                .await
                .map_err(backend)
        })
        .await?;

        let count: i64 = row.try_get("cnt").map_err(backend)?;
        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormCategory;
    use crate::model::{EvolutionNode, Species, SpeciesSummary, Sprites};
    use tempfile::TempDir;

    async fn temp_store() -> (SqlCatalogStore, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("catalog.db").display());
        let store = SqlCatalogStore::new(&url).await.unwrap();
        (store, dir)
    }

    fn creature(id: u32, chain: Option<u32>) -> Creature {
        let mut species = Species::placeholder(id, format!("species-{}", id));
        species.evolution_chain_id = chain;
        Creature {
            id,
            name: format!("creature-{}", id),
            height: 4,
            weight: 60,
            base_experience: None,
            types: vec![],
            sprites: Sprites::default(),
            stats: vec![],
            abilities: vec![],
            moves: vec![],
            game_indices: vec![],
            species,
        }
    }

    #[tokio::test]
    async fn test_creature_upsert_and_get() {
        let (store, _dir) = temp_store().await;
        let original = creature(25, Some(10));

        store.upsert_creature(&original).await.unwrap();

        assert_eq!(store.get_creature(25).await.unwrap(), Some(original));
        assert!(store.get_creature(26).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repeat_upsert_keeps_one_row() {
        let (store, _dir) = temp_store().await;
        let mut c = creature(1, Some(1));

        store.upsert_creature(&c).await.unwrap();
        c.name = "renamed".into();
        store.upsert_creature(&c).await.unwrap();

        assert_eq!(store.count_creatures().await.unwrap(), 1);
        assert_eq!(store.get_creature(1).await.unwrap().unwrap().name, "renamed");
    }

    #[tokio::test]
    async fn test_referenced_chain_ids() {
        let (store, _dir) = temp_store().await;
        for (id, chain) in [(4, Some(2)), (1, Some(1)), (5, Some(2)), (10033, None)] {
            store.upsert_creature(&creature(id, chain)).await.unwrap();
        }

        assert_eq!(store.referenced_chain_ids().await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_chain_and_form_tables() {
        let (store, _dir) = temp_store().await;
        let species = Species::placeholder(133, "eevee");
        let chain = EvolutionChain {
            id: 67,
            chain: EvolutionNode {
                id: 133,
                name: "eevee".into(),
                sprites: Sprites::default(),
                types: vec!["normal".into()],
                species: SpeciesSummary::from(&species),
                evolution_details: vec![],
                forms: vec![],
                evolves_to: vec![],
            },
        };
        let form = FormVariant {
            form_id: 10205,
            base_pokemon_id: 133,
            form_name: "eevee-gmax".into(),
            category: FormCategory::Gigantamax,
        };

        store.upsert_evolution_chain(&chain).await.unwrap();
        store.upsert_form_variant(&form).await.unwrap();
        store.upsert_form_variant(&form).await.unwrap();

        assert_eq!(store.get_evolution_chain(67).await.unwrap(), Some(chain));
        assert_eq!(store.get_form_variant(10205).await.unwrap(), Some(form));
    }
}
