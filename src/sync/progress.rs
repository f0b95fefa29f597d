// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use serde::Serialize;

/// One unit that failed during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub id: u32,
    pub message: String,
}

/// Running tally for one sync pass.
///
/// `processed == succeeded + failed` at every observation, and
/// `errors.len() == failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    pub phase: String,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<SyncFailure>,
}

impl SyncProgress {
    pub fn new(phase: impl Into<String>, total: usize) -> Self {
        Self {
            phase: phase.into(),
            total,
            ..Default::default()
        }
    }

    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
    }

    pub fn record_failure(&mut self, id: u32, message: impl Into<String>) {
        self.processed += 1;
        self.failed += 1;
        self.errors.push(SyncFailure {
            id,
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }

    #[must_use]
    pub fn failed_ids(&self) -> Vec<u32> {
        self.errors.iter().map(|e| e.id).collect()
    }
}

/// Outcome of a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub generations: Vec<SyncProgress>,
    pub forms: SyncProgress,
    pub chains: SyncProgress,
}

impl SyncReport {
    fn passes(&self) -> impl Iterator<Item = &SyncProgress> {
        self.generations.iter().chain([&self.forms, &self.chains])
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.passes().map(|p| p.total).sum()
    }

    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.passes().map(|p| p.succeeded).sum()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.passes().map(|p| p.failed).sum()
    }

    /// Creature failures only (generations and forms); these are the
    /// creatures whose chain references could not be discovered.
    #[must_use]
    pub fn failed_creatures(&self) -> usize {
        self.generations.iter().map(|p| p.failed).sum::<usize>() + self.forms.failed
    }
}
