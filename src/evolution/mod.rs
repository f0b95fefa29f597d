// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Evolution chain resolution.
//!
//! An upstream chain is a tree of species links. Each link is enriched with
//! the creature's sprites and types, a species summary, the conditions on
//! the incoming edge, and any form variants of that species:
//!
//! ```text
//! eevee ─┬─► vaporeon     (item: water-stone)
//!        ├─► jolteon      (item: thunder-stone)
//!        ├─► flareon      (item: fire-stone)
//!        └─► ...
//!   forms: [eevee-gmax]   (attached, never a branch)
//! ```
//!
//! Sibling branches resolve concurrently through the shared bounded helper.
//! A species repeated along one root-to-leaf path is a [`ChainError::Cycle`];
//! a path longer than the configured depth is [`ChainError::TooDeep`].

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::PokedexConfig;
use crate::forms::FormVariantTable;
use crate::model::raw::{RawChainLink, RawEvolutionChain, RawEvolutionDetail, RawPokemon, RawSpecies};
use crate::model::{EvolutionChain, EvolutionDetail, EvolutionNode, FormVariant, Species, SpeciesSummary, Sprites};
use crate::source::{process_with_limit, resource_id, Endpoint, SourceClient, SourceError};
use crate::transform::{map_species, map_sprites, map_types};

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("failed to fetch evolution chain {id}")]
    Source {
        id: u32,
        #[source]
        source: SourceError,
    },

    #[error("evolution chain revisits species {species}")]
    Cycle { species: String },

    #[error("evolution chain deeper than {max_depth} stages")]
    TooDeep { max_depth: usize },
}

pub struct EvolutionResolver {
    client: Arc<SourceClient>,
    forms: Arc<FormVariantTable>,
    branch_limit: usize,
    fanout_pause: Duration,
    max_depth: usize,
}

impl EvolutionResolver {
    pub fn new(client: Arc<SourceClient>, forms: Arc<FormVariantTable>, config: &PokedexConfig) -> Self {
        Self {
            client,
            forms,
            branch_limit: config.sub_resource_concurrency,
            fanout_pause: config.fanout_pause(),
            max_depth: config.max_chain_depth,
        }
    }

    /// Fetch `evolution-chain/{id}` and resolve every node.
    #[instrument(skip(self))]
    pub async fn resolve_chain(&self, id: u32) -> Result<EvolutionChain, ChainError> {
        let raw: RawEvolutionChain = self
            .client
            .fetch_as(&Endpoint::EvolutionChain(id))
            .await
            .map_err(|source| ChainError::Source { id, source })?;

        let chain = self.resolve_root(&raw.chain).await?;
        debug!(id, nodes = chain.node_count(), depth = chain.depth(), "Evolution chain resolved");

        Ok(EvolutionChain { id: raw.id, chain })
    }

    /// Resolve a tree from an already-fetched root link.
    pub async fn resolve_root(&self, root: &RawChainLink) -> Result<EvolutionNode, ChainError> {
        self.resolve_link(root, Vec::new()).await
    }

    fn resolve_link<'a>(
        &'a self,
        link: &'a RawChainLink,
        ancestors: Vec<String>,
    ) -> BoxFuture<'a, Result<EvolutionNode, ChainError>> {
        async move {
            let species_key = species_key(link);
            if ancestors.contains(&species_key) {
                warn!(species = %species_key, "Cycle in evolution chain");
                return Err(ChainError::Cycle { species: species_key });
            }
            if ancestors.len() >= self.max_depth {
                return Err(ChainError::TooDeep { max_depth: self.max_depth });
            }

            let mut path = ancestors;
            path.push(species_key);

            let node = self.resolve_node(link).await;

            let children: Vec<&RawChainLink> = link.evolves_to.iter().collect();
            let evolves_to = process_with_limit(children, self.branch_limit, self.fanout_pause, |child| {
                self.resolve_link(child, path.clone())
            })
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

            Ok(EvolutionNode { evolves_to, ..node })
        }
        .boxed()
    }

    /// One node without its children. Fetch failures degrade to a minimal
    /// node built from the link alone.
    async fn resolve_node(&self, link: &RawChainLink) -> EvolutionNode {
        let species_id = resource_id(&link.species.url);
        let species_endpoint = match species_id {
            Some(id) => Endpoint::species(id),
            None => Endpoint::species(&link.species.name),
        };

        let species: Option<Species> = self
            .client
            .fetch_optional_as::<RawSpecies>(&species_endpoint)
            .await
            .map(map_species);

        // The default variety is the creature the species is displayed as
        let creature_ident = species
            .as_ref()
            .and_then(|s| s.varieties.iter().find(|v| v.is_default))
            .and_then(|v| v.pokemon_id)
            .map(|id| id.to_string())
            .or_else(|| species_id.map(|id| id.to_string()))
            .unwrap_or_else(|| link.species.name.clone());

        let creature: Option<RawPokemon> = self
            .client
            .fetch_optional_as(&Endpoint::creature(&creature_ident))
            .await;

        let summary = match &species {
            Some(s) => SpeciesSummary::from(s),
            None => {
                let mut placeholder = SpeciesSummary::from(&Species::placeholder(
                    species_id.unwrap_or(0),
                    link.species.name.clone(),
                ));
                placeholder.is_baby = link.is_baby;
                placeholder
            }
        };

        let (id, sprites, types) = match &creature {
            Some(raw) => (
                raw.id,
                map_sprites(&raw.sprites),
                map_types(&raw.types).into_iter().map(|t| t.name).collect(),
            ),
            None => (species_id.unwrap_or(0), Sprites::default(), Vec::new()),
        };
        let forms = self.forms_for(id, species.as_ref());

        EvolutionNode {
            id,
            name: link.species.name.clone(),
            sprites,
            types,
            species: summary,
            evolution_details: link.evolution_details.iter().map(map_detail).collect(),
            forms,
            evolves_to: Vec::new(),
        }
    }

    /// Table forms of the node's base creature plus any form-range
    /// varieties the species lists, ascending by form id.
    fn forms_for(&self, id: u32, species: Option<&Species>) -> Vec<FormVariant> {
        let mut forms: Vec<FormVariant> = self
            .forms
            .base_id(id)
            .map(|base| self.forms.forms_of(base).into_iter().cloned().collect())
            .unwrap_or_default();

        let varieties = species.into_iter().flat_map(|s| s.varieties.iter());
        for variant in varieties.filter_map(|v| v.pokemon_id).filter_map(|id| self.forms.resolve(id)) {
            if !forms.iter().any(|f| f.form_id == variant.form_id) {
                forms.push(variant.clone());
            }
        }
        forms.sort_by_key(|f| f.form_id);
        forms
    }
}

fn species_key(link: &RawChainLink) -> String {
    resource_id(&link.species.url)
        .map(|id| id.to_string())
        .unwrap_or_else(|| link.species.name.clone())
}

fn map_detail(raw: &RawEvolutionDetail) -> EvolutionDetail {
    let name = |r: &Option<crate::model::raw::RawNamedResource>| r.as_ref().map(|r| r.name.clone());
    EvolutionDetail {
        trigger: name(&raw.trigger),
        min_level: raw.min_level,
        item: name(&raw.item),
        held_item: name(&raw.held_item),
        time_of_day: raw.time_of_day.clone().filter(|t| !t.is_empty()),
        location: name(&raw.location),
        known_move: name(&raw.known_move),
        min_happiness: raw.min_happiness,
        gender: raw.gender,
    }
}
