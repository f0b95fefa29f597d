// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Upstream endpoints and their cache policy.
//!
//! | endpoint                  | policy            |
//! |---------------------------|-------------------|
//! | `pokemon/{id}`            | long (base TTL)   |
//! | `pokemon-species/{id}`    | long (base TTL)   |
//! | `ability/{id}`            | not cached        |
//! | `move/{id}`               | not cached        |
//! | `evolution-chain/{id}`    | not cached        |
//! | `pokemon?limit=&offset=`  | medium (default)  |

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Base records: creatures and species
    Long,
    /// Everything not otherwise classified
    Medium,
    Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `pokemon/{id or name}`
    Creature(String),
    Species(String),
    Ability(String),
    Move(String),
    EvolutionChain(u32),
    CreatureList { limit: u32, offset: u32 },
}

impl Endpoint {
    pub fn creature(ident: impl ToString) -> Self {
        Self::Creature(ident.to_string())
    }

    pub fn species(ident: impl ToString) -> Self {
        Self::Species(ident.to_string())
    }

    pub fn ability(ident: impl ToString) -> Self {
        Self::Ability(ident.to_string())
    }

    pub fn moves(ident: impl ToString) -> Self {
        Self::Move(ident.to_string())
    }

    /// Path relative to the API root.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Creature(id) => format!("pokemon/{}", id),
            Self::Species(id) => format!("pokemon-species/{}", id),
            Self::Ability(id) => format!("ability/{}", id),
            Self::Move(id) => format!("move/{}", id),
            Self::EvolutionChain(id) => format!("evolution-chain/{}", id),
            Self::CreatureList { limit, offset } => {
                format!("pokemon?limit={}&offset={}", limit, offset)
            }
        }
    }

    /// Low-cardinality label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Creature(_) => "pokemon",
            Self::Species(_) => "pokemon-species",
            Self::Ability(_) => "ability",
            Self::Move(_) => "move",
            Self::EvolutionChain(_) => "evolution-chain",
            Self::CreatureList { .. } => "pokemon-list",
        }
    }

    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        match self {
            Self::Creature(_) | Self::Species(_) => CachePolicy::Long,
            Self::Ability(_) | Self::Move(_) | Self::EvolutionChain(_) => CachePolicy::Skip,
            Self::CreatureList { .. } => CachePolicy::Medium,
        }
    }

    /// Map an absolute upstream resource URL (as found in `{name, url}`
    /// references) back to an endpoint.
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        let mut segments = url.trim_end_matches('/').rsplit('/');
        let ident = segments.next().filter(|s| !s.is_empty())?;
        let kind = segments.next()?;

        match kind {
            "pokemon" => Some(Self::creature(ident)),
            "pokemon-species" => Some(Self::species(ident)),
            "ability" => Some(Self::ability(ident)),
            "move" => Some(Self::moves(ident)),
            "evolution-chain" => ident.parse().ok().map(Self::EvolutionChain),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Numeric id at the end of a resource URL (`.../evolution-chain/67/` → 67).
#[must_use]
pub fn resource_id(url: &str) -> Option<u32> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}
