// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Shared harness: a scripted transport and upstream-shaped fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pokedex_sync::storage::InMemoryCatalog;
use pokedex_sync::{CacheLayer, Pipeline, PokedexConfig, SourceError, SyncOrchestrator, Transport};

pub const BASE: &str = "http://pokeapi.test/api/v2";

/// Transport answering from a route table keyed by path (`pokemon/25`).
///
/// Unknown paths are 404. Paths marked failing answer 503 on every call.
/// Every request is counted, including retries.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    log: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, path: impl Into<String>, body: Value) {
        self.routes.lock().insert(path.into(), body.to_string());
    }

    pub fn route_raw(&self, path: impl Into<String>, body: impl Into<String>) {
        self.routes.lock().insert(path.into(), body.into());
    }

    pub fn fail(&self, path: impl Into<String>) {
        self.failing.lock().insert(path.into());
    }

    pub fn heal(&self, path: &str) {
        self.failing.lock().remove(path);
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    /// Requested paths in arrival order.
    pub fn request_log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
        self.log.lock().clear();
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: &str) -> Result<String, SourceError> {
        let path = url
            .strip_prefix(BASE)
            .unwrap_or(url)
            .trim_start_matches('/')
            .to_string();
        *self.calls.lock().entry(path.clone()).or_insert(0) += 1;
        self.log.lock().push(path.clone());

        if self.failing.lock().contains(&path) {
            return Err(SourceError::Status { endpoint: url.to_string(), status: 503 });
        }

        self.routes
            .lock()
            .get(&path)
            .cloned()
            .ok_or_else(|| SourceError::Status { endpoint: url.to_string(), status: 404 })
    }
}

pub fn test_config() -> PokedexConfig {
    PokedexConfig {
        api_base_url: BASE.to_string(),
        ..Default::default()
    }
    .without_delays()
}

pub fn pipeline(transport: Arc<FakeTransport>, cache: CacheLayer) -> Pipeline {
    Pipeline::with_transport(test_config(), transport, Arc::new(cache)).unwrap()
}

pub fn orchestrator(pipeline: &Pipeline) -> (SyncOrchestrator, Arc<InMemoryCatalog>) {
    let store = Arc::new(InMemoryCatalog::new());
    (pipeline.orchestrator(store.clone()), store)
}

// ═══════════════════════════════════════════════════════════════════════════
// Fixtures
// ═══════════════════════════════════════════════════════════════════════════

fn named(kind: &str, id: u32, name: &str) -> Value {
    json!({ "name": name, "url": format!("{}/{}/{}/", BASE, kind, id) })
}

pub fn pokemon(id: u32, name: &str, species_id: u32, abilities: &[u32], moves: &[u32]) -> Value {
    let abilities: Vec<Value> = abilities
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let hidden = i > 0;
            let slot = i + 1;
            json!({
                "is_hidden": hidden,
                "slot": slot,
                "ability": named("ability", *a, &format!("ability-{}", a)),
            })
        })
        .collect();
    let moves: Vec<Value> = moves
        .iter()
        .map(|m| {
            json!({
                "move": named("move", *m, &format!("move-{}", m)),
                "version_group_details": [{
                    "level_learned_at": 1,
                    "move_learn_method": { "name": "level-up", "url": "" },
                    "version_group": { "name": "red-blue", "url": "" }
                }]
            })
        })
        .collect();

    json!({
        "id": id,
        "name": name,
        "height": 7,
        "weight": 69,
        "base_experience": 64,
        "types": [{ "slot": 1, "type": named("type", 1, "normal") }],
        "sprites": {
            "front_default": format!("https://img.test/{}.png", id),
            "front_shiny": null,
            "other": { "official-artwork": { "front_default": format!("https://img.test/art/{}.png", id) } }
        },
        "stats": [
            { "base_stat": 45, "effort": 0, "stat": { "name": "hp", "url": "" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "attack", "url": "" } },
            { "base_stat": 49, "effort": 0, "stat": { "name": "defense", "url": "" } },
            { "base_stat": 65, "effort": 1, "stat": { "name": "special-attack", "url": "" } },
            { "base_stat": 65, "effort": 0, "stat": { "name": "special-defense", "url": "" } },
            { "base_stat": 45, "effort": 0, "stat": { "name": "speed", "url": "" } }
        ],
        "abilities": abilities,
        "moves": moves,
        "game_indices": [{ "game_index": id, "version": { "name": "red", "url": "" } }],
        "species": named("pokemon-species", species_id, name)
    })
}

/// `varieties`: `(pokemon id, name, is_default)`
pub fn species(id: u32, name: &str, chain_id: Option<u32>, varieties: &[(u32, &str, bool)]) -> Value {
    let varieties: Vec<Value> = varieties
        .iter()
        .map(|(pid, vname, default)| json!({ "is_default": default, "pokemon": named("pokemon", *pid, vname) }))
        .collect();

    json!({
        "id": id,
        "name": name,
        "names": [{ "name": name.to_uppercase(), "language": { "name": "en", "url": "" } }],
        "flavor_text_entries": [{
            "flavor_text": "A strange seed was\nplanted on its\u{c}back at birth.",
            "language": { "name": "en", "url": "" },
            "version": { "name": "red", "url": "" }
        }],
        "genera": [{ "genus": "Seed Pokémon", "language": { "name": "en", "url": "" } }],
        "generation": { "name": "generation-i", "url": "" },
        "gender_rate": 1,
        "is_baby": false,
        "is_legendary": false,
        "is_mythical": false,
        "evolution_chain": chain_id.map(|c| json!({ "url": format!("{}/evolution-chain/{}/", BASE, c) })),
        "varieties": varieties
    })
}

pub fn ability(id: u32) -> Value {
    json!({
        "id": id,
        "name": format!("ability-{}", id),
        "names": [{ "name": format!("Ability {}", id), "language": { "name": "en", "url": "" } }],
        "effect_entries": [{
            "effect": format!("Full effect {}", id),
            "short_effect": format!("Short {}", id),
            "language": { "name": "en", "url": "" }
        }],
        "generation": { "name": "generation-iii", "url": "" }
    })
}

pub fn move_detail(id: u32) -> Value {
    json!({
        "id": id,
        "name": format!("move-{}", id),
        "names": [{ "name": format!("Move {}", id), "language": { "name": "en", "url": "" } }],
        "power": 40,
        "accuracy": 100,
        "pp": 35,
        "type": { "name": "normal", "url": "" },
        "damage_class": { "name": "physical", "url": "" },
        "effect_entries": [{ "effect": "Inflicts regular damage.", "short_effect": "", "language": { "name": "en", "url": "" } }]
    })
}

/// One chain link. `item` becomes a use-item evolution condition.
pub fn link(species_id: u32, name: &str, item: Option<&str>, children: Vec<Value>) -> Value {
    let details = match item {
        Some(item) => json!([{
            "trigger": { "name": "use-item", "url": "" },
            "item": { "name": item, "url": "" },
            "time_of_day": ""
        }]),
        None => json!([]),
    };
    json!({
        "is_baby": false,
        "species": named("pokemon-species", species_id, name),
        "evolution_details": details,
        "evolves_to": children
    })
}

pub fn chain(id: u32, root: Value) -> Value {
    json!({ "id": id, "chain": root })
}

/// Route a creature with its species and every referenced detail record.
pub fn route_creature(transport: &FakeTransport, id: u32, name: &str, chain_id: Option<u32>, abilities: &[u32], moves: &[u32]) {
    transport.route(format!("pokemon/{}", id), pokemon(id, name, id, abilities, moves));
    transport.route(
        format!("pokemon-species/{}", id),
        species(id, name, chain_id, &[(id, name, true)]),
    );
    for a in abilities {
        transport.route(format!("ability/{}", a), ability(*a));
    }
    for m in moves {
        transport.route(format!("move/{}", m), move_detail(*m));
    }
}
