// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Form variant lookup.
//!
//! The upstream API exposes no direct form → base relationship, and name
//! suffixes (`-mega-x`, `-galar-standard`, `-paldea-aqua-breed`) are too
//! irregular to parse reliably. The mapping is therefore a hand-curated,
//! versioned data asset embedded at build time:
//!
//! ```text
//! data/form_variants.json
//! { "version": 1, "forms": [ { "formId": 10033, "basePokemonId": 3, ... }, ... ] }
//! ```
//!
//! Lookups are O(1). [`FormVariantTable::sorted_form_ids`] clusters forms next
//! to their base creature (by base id, then form id).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// First id of the reserved form-variant range.
pub const FORM_ID_FLOOR: u32 = 10_000;

const EMBEDDED_TABLE: &str = include_str!("../../data/form_variants.json");

/// Whether `id` falls in the reserved form-variant range.
#[inline]
#[must_use]
pub fn is_form_id(id: u32) -> bool {
    id >= FORM_ID_FLOOR
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormCategory {
    Mega,
    Primal,
    Alolan,
    Galarian,
    Hisuian,
    Paldean,
    Gigantamax,
    Other,
}

impl std::fmt::Display for FormCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Mega => "mega",
            Self::Primal => "primal",
            Self::Alolan => "alolan",
            Self::Galarian => "galarian",
            Self::Hisuian => "hisuian",
            Self::Paldean => "paldean",
            Self::Gigantamax => "gigantamax",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormVariant {
    pub form_id: u32,
    pub base_pokemon_id: u32,
    pub form_name: String,
    pub category: FormCategory,
}

#[derive(Error, Debug)]
pub enum FormTableError {
    #[error("form table is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("form {form_id} is outside the reserved range (>= 10000)")]
    NotAFormId { form_id: u32 },
    #[error("form {form_id} maps to base {base_id}, which is itself a form id")]
    BaseIsForm { form_id: u32, base_id: u32 },
    #[error("form {form_id} is listed more than once")]
    Duplicate { form_id: u32 },
}

#[derive(Deserialize)]
struct TableFile {
    version: u32,
    forms: Vec<FormVariant>,
}

/// Loaded, validated form table.
#[derive(Debug, Clone)]
pub struct FormVariantTable {
    version: u32,
    by_id: HashMap<u32, FormVariant>,
    by_base: HashMap<u32, Vec<u32>>,
    sorted: Vec<u32>,
}

impl FormVariantTable {
    /// Load the table compiled into the binary.
    pub fn embedded() -> Result<Self, FormTableError> {
        Self::from_json(EMBEDDED_TABLE)
    }

    /// Parse and validate a table document.
    pub fn from_json(json: &str) -> Result<Self, FormTableError> {
        let file: TableFile = serde_json::from_str(json)?;
        let mut by_id = HashMap::with_capacity(file.forms.len());
        let mut by_base: HashMap<u32, Vec<u32>> = HashMap::new();

        for form in file.forms {
            if !is_form_id(form.form_id) {
                return Err(FormTableError::NotAFormId { form_id: form.form_id });
            }
            if is_form_id(form.base_pokemon_id) {
                return Err(FormTableError::BaseIsForm {
                    form_id: form.form_id,
                    base_id: form.base_pokemon_id,
                });
            }
            if by_id.contains_key(&form.form_id) {
                return Err(FormTableError::Duplicate { form_id: form.form_id });
            }
            by_base.entry(form.base_pokemon_id).or_default().push(form.form_id);
            by_id.insert(form.form_id, form);
        }

        for ids in by_base.values_mut() {
            ids.sort_unstable();
        }

        let mut sorted: Vec<u32> = by_id.keys().copied().collect();
        sorted.sort_unstable_by_key(|id| (by_id[id].base_pokemon_id, *id));

        Ok(Self {
            version: file.version,
            by_id,
            by_base,
            sorted,
        })
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    #[must_use]
    pub fn resolve(&self, form_id: u32) -> Option<&FormVariant> {
        self.by_id.get(&form_id)
    }

    #[must_use]
    pub fn is_form(&self, id: u32) -> bool {
        self.by_id.contains_key(&id)
    }

    /// Base creature for a form id; non-form ids map to themselves.
    #[must_use]
    pub fn base_id(&self, id: u32) -> Option<u32> {
        if is_form_id(id) {
            self.resolve(id).map(|f| f.base_pokemon_id)
        } else {
            Some(id)
        }
    }

    /// All forms of a base creature, ascending by form id.
    pub fn forms_of(&self, base_id: u32) -> Vec<&FormVariant> {
        self.by_base
            .get(&base_id)
            .map(|ids| ids.iter().filter_map(|id| self.by_id.get(id)).collect())
            .unwrap_or_default()
    }

    /// Every form id, ascending.
    #[must_use]
    pub fn all_form_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.by_id.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Form ids ordered by base creature, then by form id.
    #[must_use]
    pub fn sorted_form_ids(&self) -> &[u32] {
        &self.sorted
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormVariant> {
        self.sorted.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_table_loads() {
        let table = FormVariantTable::embedded().unwrap();
        assert!(table.len() > 100);
        assert_eq!(table.version(), 1);
    }

    #[test]
    fn test_every_base_is_a_regular_creature() {
        let table = FormVariantTable::embedded().unwrap();
        for form in table.iter() {
            assert!(form.form_id >= FORM_ID_FLOOR, "{:?}", form);
            assert!(form.base_pokemon_id < FORM_ID_FLOOR, "{:?}", form);
            assert!(form.base_pokemon_id > 0);
        }
    }

    #[test]
    fn test_resolve_known_forms() {
        let table = FormVariantTable::embedded().unwrap();

        let mega_x = table.resolve(10034).unwrap();
        assert_eq!(mega_x.base_pokemon_id, 6);
        assert_eq!(mega_x.category, FormCategory::Mega);
        assert_eq!(mega_x.form_name, "charizard-mega-x");

        assert_eq!(table.resolve(10077).unwrap().category, FormCategory::Primal);
        assert_eq!(table.resolve(10252).unwrap().category, FormCategory::Paldean);
        assert!(table.resolve(25).is_none());
    }

    #[test]
    fn test_base_id_passthrough_for_regular_ids() {
        let table = FormVariantTable::embedded().unwrap();
        assert_eq!(table.base_id(25), Some(25));
        assert_eq!(table.base_id(10100), Some(26));
        assert_eq!(table.base_id(19999), None);
    }

    #[test]
    fn test_forms_of_base() {
        let table = FormVariantTable::embedded().unwrap();
        let charizard: Vec<u32> = table.forms_of(6).iter().map(|f| f.form_id).collect();
        assert_eq!(charizard, vec![10034, 10035, 10196]);
        assert!(table.forms_of(1).is_empty());
    }

    #[test]
    fn test_sorted_clusters_by_base_then_form() {
        let table = FormVariantTable::embedded().unwrap();
        let sorted = table.sorted_form_ids();

        assert_eq!(sorted.len(), table.len());
        for pair in sorted.windows(2) {
            let a = table.resolve(pair[0]).unwrap();
            let b = table.resolve(pair[1]).unwrap();
            assert!((a.base_pokemon_id, a.form_id) < (b.base_pokemon_id, b.form_id));
        }
        // Venusaur's forms lead the ordering
        assert_eq!(&sorted[..2], &[10033, 10195]);
    }

    #[test]
    fn test_rejects_base_in_form_range() {
        let json = r#"{"version": 1, "forms": [
            {"formId": 10001, "basePokemonId": 10002, "formName": "bad", "category": "other"}
        ]}"#;
        assert!(matches!(
            FormVariantTable::from_json(json),
            Err(FormTableError::BaseIsForm { form_id: 10001, base_id: 10002 })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_low_ids() {
        let dup = r#"{"version": 1, "forms": [
            {"formId": 10001, "basePokemonId": 1, "formName": "a", "category": "other"},
            {"formId": 10001, "basePokemonId": 2, "formName": "b", "category": "other"}
        ]}"#;
        assert!(matches!(FormVariantTable::from_json(dup), Err(FormTableError::Duplicate { .. })));

        let low = r#"{"version": 1, "forms": [
            {"formId": 25, "basePokemonId": 1, "formName": "a", "category": "other"}
        ]}"#;
        assert!(matches!(FormVariantTable::from_json(low), Err(FormTableError::NotAFormId { form_id: 25 })));
    }
}
