// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Rate-limited upstream client.
//!
//! ```text
//! fetch(endpoint)
//!    │
//!    ├─ cacheable? ── cache hit ──────────────────────────► value
//!    │
//!    ├─ retry_if(transient) { transport.get(url) → JSON }
//!    │        attempts = 1 + max_retries, delays 1s, 2s, 4s
//!    │
//!    ├─ decode into T ── mismatch ────────────────────────► Malformed
//!    │
//!    └─ cacheable? ── cache.set(body, ttl by policy) ─────► value
//! ```
//!
//! Two call styles: [`SourceClient::fetch_required`] returns the classified
//! error; [`SourceClient::fetch_optional`] logs it and yields `None`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::endpoint::{CachePolicy, Endpoint};
use super::error::SourceError;
use super::transport::{HttpTransport, Transport};
use crate::cache::{cache_key, CacheLayer};
use crate::config::PokedexConfig;
use crate::metrics::{self, LatencyTimer};
use crate::resilience::retry::{retry_if, RetryConfig};

pub struct SourceClient {
    transport: Arc<dyn Transport>,
    cache: Arc<CacheLayer>,
    base_url: String,
    retry: RetryConfig,
    long_ttl: Duration,
    medium_ttl: Duration,
    network_requests: AtomicU64,
}

impl SourceClient {
    pub fn new(config: &PokedexConfig, transport: Arc<dyn Transport>, cache: Arc<CacheLayer>) -> Self {
        Self {
            transport,
            cache,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            retry: config.source_retry(),
            long_ttl: config.base_record_ttl(),
            medium_ttl: config.default_ttl(),
            network_requests: AtomicU64::new(0),
        }
    }

    /// Client over the real HTTP transport.
    pub fn http(config: &PokedexConfig, cache: Arc<CacheLayer>) -> Result<Self, SourceError> {
        let transport = HttpTransport::new(config.request_timeout(), config.max_redirects)?;
        Ok(Self::new(config, Arc::new(transport), cache))
    }

    pub fn cache(&self) -> &Arc<CacheLayer> {
        &self.cache
    }

    #[must_use]
    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    /// Requests that actually reached the transport (retries included).
    #[must_use]
    pub fn network_requests(&self) -> u64 {
        self.network_requests.load(Ordering::Relaxed)
    }

    fn ttl_for(&self, policy: CachePolicy) -> Option<Duration> {
        match policy {
            CachePolicy::Long => Some(self.long_ttl),
            CachePolicy::Medium => Some(self.medium_ttl),
            CachePolicy::Skip => None,
        }
    }

    /// Fetch an essential resource, surfacing the classified error.
    pub async fn fetch_required(&self, endpoint: &Endpoint) -> Result<Value, SourceError> {
        self.fetch_as(endpoint).await
    }

    /// Fetch a non-essential resource; any failure after retries is `None`.
    pub async fn fetch_optional(&self, endpoint: &Endpoint) -> Option<Value> {
        self.fetch_optional_as(endpoint).await
    }

    /// Fetch and decode into an upstream shape. A decode failure is `Malformed`.
    ///
    /// Only bodies that decode into `T` are written to the cache, and a
    /// cached body that no longer decodes is refetched.
    pub async fn fetch_as<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Result<T, SourceError> {
        let ttl = self.ttl_for(endpoint.cache_policy());
        let path = endpoint.path();
        let key = ttl.map(|_| cache_key("source", &[("endpoint", path.as_str())]));

        if let Some(key) = &key {
            if let Some(raw) = self.cache.get(key).await {
                match serde_json::from_str(&raw) {
                    Ok(value) => {
                        debug!(endpoint = %endpoint, "Source cache hit");
                        return Ok(value);
                    }
                    Err(e) => warn!(endpoint = %endpoint, error = %e, "Ignoring corrupt cached payload"),
                }
            }
        }

        let (value, body) = self.fetch_with_retry(endpoint).await?;
        let decoded = serde_json::from_value(value).map_err(|e| {
            metrics::record_source_request(endpoint.kind(), "malformed");
            SourceError::Malformed {
                endpoint: path.clone(),
                message: e.to_string(),
            }
        })?;

        if let (Some(key), Some(ttl)) = (key, ttl) {
            self.cache.set(&key, &body, ttl).await;
        }

        Ok(decoded)
    }

    pub async fn fetch_optional_as<T: DeserializeOwned>(&self, endpoint: &Endpoint) -> Option<T> {
        match self.fetch_as(endpoint).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "Optional fetch failed");
                None
            }
        }
    }

    async fn fetch_with_retry(&self, endpoint: &Endpoint) -> Result<(Value, String), SourceError> {
        let url = self.url_for(endpoint);
        let path = endpoint.path();
        let kind = endpoint.kind();

        retry_if(
            &path,
            &self.retry,
            |attempt| {
                let (path, url) = (&path, &url);
                async move {
                    if attempt > 1 {
                        metrics::record_source_retry(kind);
                    }
                    self.attempt(kind, path, url).await
                }
            },
            SourceError::is_transient,
        )
        .await
    }

    async fn attempt(&self, kind: &'static str, path: &str, url: &str) -> Result<(Value, String), SourceError> {
        self.network_requests.fetch_add(1, Ordering::Relaxed);
        let _timer = LatencyTimer::new(kind);

        let body = match self.transport.get(url).await {
            Ok(body) => body,
            Err(e) => {
                metrics::record_source_request(kind, e.kind());
                return Err(e);
            }
        };

        match serde_json::from_str(&body) {
            Ok(value) => {
                metrics::record_source_request(kind, "ok");
                Ok((value, body))
            }
            Err(e) => {
                metrics::record_source_request(kind, "malformed");
                Err(SourceError::Malformed {
                    endpoint: path.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}
