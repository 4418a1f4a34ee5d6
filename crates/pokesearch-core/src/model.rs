//! Core data model types for pokesearch.
//!
//! These are the domain shapes every other module works with. They are
//! decoupled from the PokéAPI wire format; `pokesearch-api` converts into
//! them.

use serde::{Deserialize, Serialize};

/// A single creature as returned by a lookup by name or id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    /// National id, always at least 1.
    pub id: u32,
    /// Lowercase API name (e.g. "pikachu").
    pub name: String,
    /// Type names in slot order.
    pub types: Vec<String>,
    /// Height in decimetres.
    pub height: u32,
    /// Weight in hectograms.
    pub weight: u32,
    /// Ability names.
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Front sprite URL, when the API has one.
    #[serde(default)]
    pub sprite: Option<String>,
    /// URL of the creature's species record.
    pub species_url: String,
}

impl Creature {
    /// Height in metres.
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    /// Weight in kilograms.
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    /// Id of the previous creature in national order, if there is one.
    pub fn previous_id(&self) -> Option<u32> {
        (self.id > 1).then(|| self.id - 1)
    }

    /// Id of the next creature in national order.
    pub fn next_id(&self) -> u32 {
        self.id + 1
    }
}

/// Species record: generation label and the evolution chain it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Generation label, e.g. "generation-i".
    pub generation: String,
    /// URL of the evolution chain record.
    pub evolution_chain_url: String,
}

/// Damage relations for a single type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDamageRelations {
    /// Types that deal double damage to this type.
    pub double_damage_from: Vec<String>,
}

/// A node of an evolution tree. Children are alternate evolutions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionNode {
    pub species: String,
    #[serde(default)]
    pub evolves_to: Vec<EvolutionNode>,
}

impl EvolutionNode {
    pub fn leaf(species: &str) -> Self {
        Self {
            species: species.to_string(),
            evolves_to: Vec::new(),
        }
    }

    pub fn with_children(species: &str, evolves_to: Vec<EvolutionNode>) -> Self {
        Self {
            species: species.to_string(),
            evolves_to,
        }
    }
}

/// One row of the national Pokédex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexEntry {
    pub entry_number: u32,
    pub name: String,
    /// Species URL; its last path segment is the species id.
    pub url: String,
}
