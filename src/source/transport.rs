// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP seam.
//!
//! The client's retry and cache policy sit above [`Transport`], so tests can
//! swap in a scripted transport and observe exactly how many requests go out.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use std::time::Duration;

use super::error::SourceError;

/// One GET, returning the body of a 2xx response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, SourceError>;
}

/// Production transport over `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration, max_redirects: usize) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(Policy::limited(max_redirects))
            .user_agent(concat!("pokedex-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Request {
                endpoint: "http client".into(),
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

fn classify(url: &str, e: reqwest::Error) -> SourceError {
    let endpoint = url.to_string();
    if e.is_timeout() {
        SourceError::Timeout { endpoint }
    } else if e.is_redirect() || e.is_builder() {
        SourceError::Request { endpoint, message: e.to_string() }
    } else if e.is_connect() || e.is_body() || e.is_request() {
        // Refused, reset, DNS, or a body cut off mid-read
        SourceError::Connect { endpoint, message: e.to_string() }
    } else {
        SourceError::Request { endpoint, message: e.to_string() }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, SourceError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                endpoint: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}
