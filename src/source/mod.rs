// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Upstream REST access.

pub mod batch;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use batch::process_with_limit;
pub use client::SourceClient;
pub use endpoint::{resource_id, CachePolicy, Endpoint};
pub use error::SourceError;
pub use transport::{HttpTransport, Transport};
