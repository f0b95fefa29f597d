// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Raw upstream payloads → normalized [`Creature`].
//!
//! ```text
//! RawPokemon ─┬─ types/stats/sprites/game indices ── mapped in place
//!             ├─ abilities[] ── ability/{id}  (≤3 in flight) ── Ability | stub
//!             ├─ moves[..cap] ─ move/{id}     (≤3 in flight) ── Move    | stub
//!             └─ species ────── pokemon-species/{id} ────────── Species | placeholder
//! ```
//!
//! Only the base creature record is essential. Every sub-resource failure
//! degrades to a stub that keeps the reference's id and name, so the entry
//! count of a creature never depends on upstream health.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::PokedexConfig;
use crate::forms::FormVariantTable;
use crate::metrics;
use crate::model::raw::{
    RawAbility, RawAbilitySlot, RawEffect, RawMove, RawMoveSlot, RawName, RawPokemon, RawSpecies,
    RawSprites,
};
use crate::model::{
    Ability, Creature, FlavorText, GameIndex, Genus, LocalizedName, Move, MoveLearnDetail, Species,
    Sprites, Stat, TypeSlot, Variety,
};
use crate::source::{process_with_limit, resource_id, Endpoint, SourceClient, SourceError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to fetch entity {id}")]
    FetchFailed {
        id: String,
        #[source]
        source: SourceError,
    },
}

impl CatalogError {
    #[must_use]
    pub fn entity_id(&self) -> &str {
        match self {
            Self::FetchFailed { id, .. } => id,
        }
    }
}

pub struct Transformer {
    client: Arc<SourceClient>,
    forms: Arc<FormVariantTable>,
    sub_resource_limit: usize,
    fanout_pause: Duration,
    move_cap: usize,
}

impl Transformer {
    pub fn new(client: Arc<SourceClient>, forms: Arc<FormVariantTable>, config: &PokedexConfig) -> Self {
        Self {
            client,
            forms,
            sub_resource_limit: config.sub_resource_concurrency,
            fanout_pause: config.fanout_pause(),
            move_cap: config.move_cap,
        }
    }

    pub fn client(&self) -> &Arc<SourceClient> {
        &self.client
    }

    /// Fetch and fully resolve one creature by id or name.
    #[instrument(skip(self), fields(id = %ident))]
    pub async fn get_creature(&self, ident: &str) -> Result<Creature, CatalogError> {
        let raw: RawPokemon = self
            .client
            .fetch_as(&Endpoint::creature(ident))
            .await
            .map_err(|source| CatalogError::FetchFailed {
                id: ident.to_string(),
                source,
            })?;

        let species = self.fetch_species(&raw).await;
        Ok(self.transform(raw, species).await)
    }

    async fn fetch_species(&self, raw: &RawPokemon) -> Option<RawSpecies> {
        let endpoint = Endpoint::from_url(&raw.species.url)
            .filter(|e| matches!(e, Endpoint::Species(_)))
            .or_else(|| {
                (!raw.species.name.is_empty()).then(|| Endpoint::species(&raw.species.name))
            })?;
        self.client.fetch_optional_as(&endpoint).await
    }

    /// Map a raw creature, resolving its abilities and capped move list.
    pub async fn transform(&self, raw: RawPokemon, species: Option<RawSpecies>) -> Creature {
        let species = match species {
            Some(species) => map_species(species),
            None => {
                metrics::record_stub("species");
                debug!(id = raw.id, "Species unavailable, using placeholder");
                placeholder_species(&raw, &self.forms)
            }
        };

        let abilities = process_with_limit(
            raw.abilities,
            self.sub_resource_limit,
            self.fanout_pause,
            |slot| self.resolve_ability(slot),
        )
        .await;

        let move_slots: Vec<RawMoveSlot> = raw.moves.into_iter().take(self.move_cap).collect();
        let moves = process_with_limit(
            move_slots,
            self.sub_resource_limit,
            self.fanout_pause,
            |slot| self.resolve_move(slot),
        )
        .await;

        Creature {
            id: raw.id,
            name: raw.name,
            height: raw.height,
            weight: raw.weight,
            base_experience: raw.base_experience,
            types: map_types(&raw.types),
            sprites: map_sprites(&raw.sprites),
            stats: raw
                .stats
                .into_iter()
                .map(|s| Stat {
                    name: s.stat.name,
                    base_stat: s.base_stat,
                    effort: s.effort,
                })
                .collect(),
            abilities,
            moves,
            game_indices: raw
                .game_indices
                .into_iter()
                .map(|g| GameIndex {
                    game_index: g.game_index,
                    version: g.version.name,
                })
                .collect(),
            species,
        }
    }

    async fn resolve_ability(&self, slot: RawAbilitySlot) -> Ability {
        let endpoint = Endpoint::from_url(&slot.ability.url)
            .unwrap_or_else(|| Endpoint::ability(&slot.ability.name));

        match self.client.fetch_optional_as::<RawAbility>(&endpoint).await {
            Some(detail) => {
                let (effect, short_effect) = english_effect(&detail.effect_entries);
                Ability {
                    id: detail.id,
                    name: detail.name,
                    is_hidden: slot.is_hidden,
                    slot: slot.slot,
                    names: map_names(detail.names),
                    effect,
                    short_effect,
                    generation: detail.generation.map(|g| g.name),
                }
            }
            None => {
                metrics::record_stub("ability");
                Ability {
                    id: resource_id(&slot.ability.url).unwrap_or(0),
                    name: slot.ability.name,
                    is_hidden: slot.is_hidden,
                    slot: slot.slot,
                    names: Vec::new(),
                    effect: String::new(),
                    short_effect: String::new(),
                    generation: None,
                }
            }
        }
    }

    async fn resolve_move(&self, slot: RawMoveSlot) -> Move {
        let learn_details = slot
            .version_group_details
            .into_iter()
            .map(|d| MoveLearnDetail {
                version_group: d.version_group.name,
                learn_method: d.move_learn_method.name,
                level_learned_at: d.level_learned_at,
            })
            .collect();

        let endpoint = Endpoint::from_url(&slot.move_ref.url)
            .unwrap_or_else(|| Endpoint::moves(&slot.move_ref.name));

        match self.client.fetch_optional_as::<RawMove>(&endpoint).await {
            Some(detail) => Move {
                id: detail.id,
                name: detail.name,
                names: map_names(detail.names),
                power: detail.power,
                accuracy: detail.accuracy,
                pp: detail.pp,
                move_type: detail.kind.map(|t| t.name),
                damage_class: detail.damage_class.map(|d| d.name),
                effect: english_effect(&detail.effect_entries).0,
                learn_details,
            },
            None => {
                metrics::record_stub("move");
                Move {
                    id: resource_id(&slot.move_ref.url).unwrap_or(0),
                    name: slot.move_ref.name,
                    names: Vec::new(),
                    power: None,
                    accuracy: None,
                    pp: None,
                    move_type: None,
                    damage_class: None,
                    effect: String::new(),
                    learn_details,
                }
            }
        }
    }
}

pub(crate) fn map_types(types: &[crate::model::raw::RawTypeSlot]) -> Vec<TypeSlot> {
    let mut mapped: Vec<TypeSlot> = types
        .iter()
        .map(|t| TypeSlot {
            slot: t.slot,
            name: t.kind.name.clone(),
        })
        .collect();
    mapped.sort_by_key(|t| t.slot);
    mapped
}

pub(crate) fn map_sprites(raw: &RawSprites) -> Sprites {
    let other = raw.other.as_ref();
    let artwork = other.and_then(|o| o.official_artwork.as_ref());
    Sprites {
        front_default: raw.front_default.clone(),
        front_shiny: raw.front_shiny.clone(),
        back_default: raw.back_default.clone(),
        back_shiny: raw.back_shiny.clone(),
        official_artwork: artwork.and_then(|a| a.front_default.clone()),
        official_artwork_shiny: artwork.and_then(|a| a.front_shiny.clone()),
        home: other
            .and_then(|o| o.home.as_ref())
            .and_then(|h| h.front_default.clone()),
    }
}

fn map_names(names: Vec<RawName>) -> Vec<LocalizedName> {
    names
        .into_iter()
        .map(|n| LocalizedName {
            name: n.name,
            language: n.language.name,
        })
        .collect()
}

/// `(effect, short_effect)`, English preferred.
fn english_effect(entries: &[RawEffect]) -> (String, String) {
    entries
        .iter()
        .find(|e| e.language.name == "en")
        .or_else(|| entries.first())
        .map(|e| (e.effect.clone(), e.short_effect.clone()))
        .unwrap_or_default()
}

/// Upstream flavor text carries hard line breaks and form feeds.
fn clean_flavor_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn map_species(raw: RawSpecies) -> Species {
    Species {
        id: raw.id,
        name: raw.name,
        names: map_names(raw.names),
        flavor_text_entries: raw
            .flavor_text_entries
            .into_iter()
            .map(|f| FlavorText {
                text: clean_flavor_text(&f.flavor_text),
                language: f.language.name,
                version: f.version.map(|v| v.name),
            })
            .collect(),
        genera: raw
            .genera
            .into_iter()
            .map(|g| Genus {
                genus: g.genus,
                language: g.language.name,
            })
            .collect(),
        generation: raw.generation.map(|g| g.name),
        gender_rate: raw.gender_rate.unwrap_or(crate::model::DEFAULT_GENDER_RATE),
        is_baby: raw.is_baby.unwrap_or(false),
        is_legendary: raw.is_legendary.unwrap_or(false),
        is_mythical: raw.is_mythical.unwrap_or(false),
        evolution_chain_id: raw.evolution_chain.and_then(|c| resource_id(&c.url)),
        varieties: raw
            .varieties
            .into_iter()
            .map(|v| Variety {
                is_default: v.is_default,
                pokemon_id: resource_id(&v.pokemon.url),
                name: v.pokemon.name,
            })
            .collect(),
    }
}

/// Species id comes from the link, else the form table's base, else 0.
/// An unknown form-range id never becomes a species id.
fn placeholder_species(raw: &RawPokemon, forms: &FormVariantTable) -> Species {
    let id = resource_id(&raw.species.url)
        .or_else(|| forms.base_id(raw.id))
        .unwrap_or(0);
    let name = if raw.species.name.is_empty() {
        raw.name.clone()
    } else {
        raw.species.name.clone()
    };
    Species::placeholder(id, name)
}
