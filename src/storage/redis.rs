// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis cache backend.
//!
//! Plain string values written with `SET key value EX ttl`. Keys are
//! namespaced with an optional prefix so several deployments can share one
//! instance:
//!
//! ```text
//! pokedex:creature:5f1c…   →  {"id":25,"name":"pikachu",...}   (EX 3600)
//! pokedex:source:9ab0…     →  {"count":1302,"results":[...]}   (EX 1800)
//! ```
//!
//! Connection is attempted once. Failures are reported upward, where the
//! cache layer turns them into misses.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, AsyncCommands, Client};
use std::time::Duration;

use super::traits::{CacheStore, StorageError};

fn backend(e: redis::RedisError) -> StorageError {
    StorageError::Backend(e.to_string())
}

pub struct RedisCacheStore {
    connection: ConnectionManager,
    /// Optional key prefix for namespacing (e.g., "pokedex:" → "pokedex:creature:…")
    prefix: String,
}

impl RedisCacheStore {
    /// Connect with an optional key prefix prepended to every key.
    pub async fn with_prefix(
        connection_string: &str,
        prefix: Option<&str>,
    ) -> Result<Self, StorageError> {
        let client = Client::open(connection_string).map_err(backend)?;
        let connection = ConnectionManager::new(client).await.map_err(backend)?;

        Ok(Self {
            connection,
            prefix: prefix.unwrap_or("").to_string(),
        })
    }

    #[inline]
    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.connection.clone();
        conn.get(self.prefixed_key(key)).await.map_err(backend)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        // EX 0 is rejected by Redis
        let secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.prefixed_key(key), value, secs)
            .await
            .map_err(backend)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.prefixed_key(key)).await.map_err(backend)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        let pong: String = cmd("PING").query_async(&mut conn).await.map_err(backend)?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(StorageError::Backend(format!("unexpected PING reply: {}", pong)))
        }
    }
}
