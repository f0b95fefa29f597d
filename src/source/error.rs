// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

/// Classified upstream failure.
///
/// `endpoint` is the request path (or URL for transport-level failures).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("connection to {endpoint} failed: {message}")]
    Connect { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("{endpoint} returned malformed JSON: {message}")]
    Malformed { endpoint: String, message: String },

    #[error("request to {endpoint} failed: {message}")]
    Request { endpoint: String, message: String },
}

impl SourceError {
    /// Worth another attempt: timeouts, connection failures, 5xx and 429.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Malformed { .. } | Self::Request { .. } => false,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label for metrics and logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connect { .. } => "connect",
            Self::Status { .. } => "status",
            Self::Malformed { .. } => "malformed",
            Self::Request { .. } => "request",
        }
    }
}
