// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Normalized catalog types.
//!
//! These are the shapes served to callers and written to the durable store.
//! They serialize camelCase so cached payloads and stored rows share one
//! wire format.
//!
//! ```text
//! Creature ──┬── types[], stats[6], sprites
//!            ├── abilities[] ── Ability (resolved or stub)
//!            ├── moves[≤20]  ── Move (resolved or stub)
//!            └── species     ── Species (never absent)
//!
//! EvolutionChain ── EvolutionNode ── evolvesTo[] ── EvolutionNode ...
//!                                 └─ forms[] (FormVariant, never in evolvesTo)
//! ```

pub mod raw;

use serde::{Deserialize, Serialize};

pub use crate::forms::{FormCategory, FormVariant};

/// Gender rate used when the species record is unavailable (upstream: 4 = 50% female).
pub const DEFAULT_GENDER_RATE: i8 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name: String,
    pub language: String,
}

/// Pick the English entry, falling back to the first one.
pub fn english_name(names: &[LocalizedName]) -> Option<&str> {
    names
        .iter()
        .find(|n| n.language == "en")
        .or_else(|| names.first())
        .map(|n| n.name.as_str())
}

/// Flattened sprite bundle. Every image is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
    pub official_artwork: Option<String>,
    pub official_artwork_shiny: Option<String>,
    pub home: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub name: String,
    pub base_stat: u32,
    pub effort: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u8,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ability {
    pub id: u32,
    pub name: String,
    pub is_hidden: bool,
    pub slot: u8,
    pub names: Vec<LocalizedName>,
    pub effect: String,
    pub short_effect: String,
    pub generation: Option<String>,
}

impl Ability {
    /// True when the detail fetch failed and only the reference survived.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.names.is_empty() && self.effect.is_empty() && self.short_effect.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveLearnDetail {
    pub version_group: String,
    pub learn_method: String,
    pub level_learned_at: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub id: u32,
    pub name: String,
    pub names: Vec<LocalizedName>,
    pub power: Option<u32>,
    pub accuracy: Option<u32>,
    pub pp: Option<u32>,
    pub move_type: Option<String>,
    pub damage_class: Option<String>,
    pub effect: String,
    pub learn_details: Vec<MoveLearnDetail>,
}

impl Move {
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.names.is_empty() && self.effect.is_empty() && self.move_type.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameIndex {
    pub game_index: u32,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorText {
    pub text: String,
    pub language: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genus {
    pub genus: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variety {
    pub is_default: bool,
    pub pokemon_id: Option<u32>,
    pub name: String,
}

/// Taxonomic grouping. Always structurally complete, even when the upstream
/// record could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
    pub id: u32,
    pub name: String,
    pub names: Vec<LocalizedName>,
    pub flavor_text_entries: Vec<FlavorText>,
    pub genera: Vec<Genus>,
    pub generation: Option<String>,
    pub gender_rate: i8,
    pub is_baby: bool,
    pub is_legendary: bool,
    pub is_mythical: bool,
    pub evolution_chain_id: Option<u32>,
    pub varieties: Vec<Variety>,
}

impl Species {
    /// Conservative placeholder used when the species fetch failed.
    #[must_use]
    pub fn placeholder(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            names: Vec::new(),
            flavor_text_entries: Vec::new(),
            genera: Vec::new(),
            generation: None,
            gender_rate: DEFAULT_GENDER_RATE,
            is_baby: false,
            is_legendary: false,
            is_mythical: false,
            evolution_chain_id: None,
            varieties: Vec::new(),
        }
    }

    /// English display name, else any localized name, else the slug.
    #[must_use]
    pub fn display_name(&self) -> &str {
        english_name(&self.names).unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creature {
    pub id: u32,
    pub name: String,
    pub height: u32,
    pub weight: u32,
    pub base_experience: Option<u32>,
    pub types: Vec<TypeSlot>,
    pub sprites: Sprites,
    pub stats: Vec<Stat>,
    pub abilities: Vec<Ability>,
    pub moves: Vec<Move>,
    pub game_indices: Vec<GameIndex>,
    pub species: Species,
}

impl Creature {
    /// Form variants occupy the reserved id range.
    #[must_use]
    pub fn is_form(&self) -> bool {
        crate::forms::is_form_id(self.id)
    }
}

/// One page of the browse surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreaturePage {
    pub count: u32,
    pub limit: u32,
    pub offset: u32,
    pub results: Vec<Creature>,
}

/// Conditions on one evolution edge. Several may be required at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionDetail {
    pub trigger: Option<String>,
    pub min_level: Option<u32>,
    pub item: Option<String>,
    pub held_item: Option<String>,
    pub time_of_day: Option<String>,
    pub location: Option<String>,
    pub known_move: Option<String>,
    pub min_happiness: Option<u32>,
    pub gender: Option<i8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesSummary {
    pub id: u32,
    pub name: String,
    pub is_baby: bool,
    pub is_legendary: bool,
    pub is_mythical: bool,
}

impl From<&Species> for SpeciesSummary {
    fn from(species: &Species) -> Self {
        Self {
            id: species.id,
            name: species.name.clone(),
            is_baby: species.is_baby,
            is_legendary: species.is_legendary,
            is_mythical: species.is_mythical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionNode {
    pub id: u32,
    pub name: String,
    pub sprites: Sprites,
    pub types: Vec<String>,
    pub species: SpeciesSummary,
    pub evolution_details: Vec<EvolutionDetail>,
    pub forms: Vec<FormVariant>,
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Number of nodes in this subtree, including self.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.evolves_to.iter().map(EvolutionNode::node_count).sum::<usize>()
    }

    /// Longest root-to-leaf path, counting nodes.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.evolves_to.iter().map(EvolutionNode::depth).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionChain {
    pub id: u32,
    pub chain: EvolutionNode,
}
