// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Upstream payload shapes.
//!
//! Only the fields the transformer reads are modelled; everything else in the
//! upstream JSON is ignored. Every collection defaults to empty so partial
//! payloads still decode.

use serde::{Deserialize, Serialize};

/// `{ "name": ..., "url": ... }` reference used throughout the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNamedResource {
    pub name: String,
    pub url: String,
}

/// `{ "url": ... }` reference without a name (evolution chains).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawApiResource {
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawName {
    pub name: String,
    pub language: RawNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub types: Vec<RawTypeSlot>,
    #[serde(default)]
    pub sprites: RawSprites,
    #[serde(default)]
    pub stats: Vec<RawStat>,
    #[serde(default)]
    pub abilities: Vec<RawAbilitySlot>,
    #[serde(default)]
    pub moves: Vec<RawMoveSlot>,
    #[serde(default)]
    pub game_indices: Vec<RawGameIndex>,
    #[serde(default)]
    pub species: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawTypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
    pub other: Option<RawOtherSprites>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOtherSprites {
    #[serde(rename = "official-artwork")]
    pub official_artwork: Option<RawArtwork>,
    pub home: Option<RawArtwork>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawArtwork {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStat {
    pub base_stat: u32,
    pub effort: u32,
    pub stat: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAbilitySlot {
    pub is_hidden: bool,
    pub slot: u8,
    pub ability: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawMoveSlot {
    #[serde(rename = "move")]
    pub move_ref: RawNamedResource,
    pub version_group_details: Vec<RawVersionGroupDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVersionGroupDetail {
    pub level_learned_at: u32,
    pub move_learn_method: RawNamedResource,
    pub version_group: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawGameIndex {
    pub game_index: u32,
    pub version: RawNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSpecies {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub names: Vec<RawName>,
    #[serde(default)]
    pub flavor_text_entries: Vec<RawFlavorText>,
    #[serde(default)]
    pub genera: Vec<RawGenus>,
    #[serde(default)]
    pub generation: Option<RawNamedResource>,
    #[serde(default)]
    pub gender_rate: Option<i8>,
    #[serde(default)]
    pub is_baby: Option<bool>,
    #[serde(default)]
    pub is_legendary: Option<bool>,
    #[serde(default)]
    pub is_mythical: Option<bool>,
    #[serde(default)]
    pub evolution_chain: Option<RawApiResource>,
    #[serde(default)]
    pub varieties: Vec<RawVariety>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFlavorText {
    pub flavor_text: String,
    pub language: RawNamedResource,
    pub version: Option<RawNamedResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawGenus {
    pub genus: String,
    pub language: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawVariety {
    pub is_default: bool,
    pub pokemon: RawNamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEffect {
    pub effect: String,
    pub short_effect: String,
    pub language: RawNamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAbility {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub names: Vec<RawName>,
    #[serde(default)]
    pub effect_entries: Vec<RawEffect>,
    #[serde(default)]
    pub generation: Option<RawNamedResource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMove {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub names: Vec<RawName>,
    #[serde(default)]
    pub power: Option<u32>,
    #[serde(default)]
    pub accuracy: Option<u32>,
    #[serde(default)]
    pub pp: Option<u32>,
    #[serde(default, rename = "type")]
    pub kind: Option<RawNamedResource>,
    #[serde(default)]
    pub damage_class: Option<RawNamedResource>,
    #[serde(default)]
    pub effect_entries: Vec<RawEffect>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvolutionChain {
    pub id: u32,
    pub chain: RawChainLink,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawChainLink {
    pub is_baby: bool,
    pub species: RawNamedResource,
    pub evolution_details: Vec<RawEvolutionDetail>,
    pub evolves_to: Vec<RawChainLink>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEvolutionDetail {
    pub trigger: Option<RawNamedResource>,
    pub min_level: Option<u32>,
    pub item: Option<RawNamedResource>,
    pub held_item: Option<RawNamedResource>,
    /// Upstream sends `""` when there is no time-of-day condition
    pub time_of_day: Option<String>,
    pub location: Option<RawNamedResource>,
    pub known_move: Option<RawNamedResource>,
    pub min_happiness: Option<u32>,
    pub gender: Option<i8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPokemonList {
    pub count: u32,
    pub results: Vec<RawNamedResource>,
}
