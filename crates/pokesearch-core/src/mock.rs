//! In-memory dex for testing without real API calls.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DexError;
use crate::model::{Creature, DexEntry, EvolutionNode, Species, TypeDamageRelations};
use crate::traits::DexClient;

/// A mock dex backed by hash maps.
///
/// Creatures are reachable by name and by id. Names registered with
/// [`MockDex::failing`] answer every creature lookup with a transport error,
/// which lets tests exercise partial-failure paths.
#[derive(Default)]
pub struct MockDex {
    creatures: HashMap<String, Creature>,
    types: HashMap<String, TypeDamageRelations>,
    species: HashMap<String, Species>,
    chains: HashMap<String, EvolutionNode>,
    dex: Vec<DexEntry>,
    failing: HashSet<String>,
    call_count: AtomicU32,
    creature_lookups: Mutex<Vec<String>>,
}

impl MockDex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a creature under both its name and its id.
    pub fn with_creature(mut self, creature: Creature) -> Self {
        self.creatures
            .insert(creature.id.to_string(), creature.clone());
        self.creatures.insert(creature.name.clone(), creature);
        self
    }

    pub fn with_type(mut self, name: &str, double_damage_from: &[&str]) -> Self {
        self.types.insert(
            name.to_string(),
            TypeDamageRelations {
                double_damage_from: double_damage_from.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_species(mut self, url: &str, species: Species) -> Self {
        self.species.insert(url.to_string(), species);
        self
    }

    pub fn with_chain(mut self, url: &str, root: EvolutionNode) -> Self {
        self.chains.insert(url.to_string(), root);
        self
    }

    pub fn with_dex(mut self, entries: Vec<DexEntry>) -> Self {
        self.dex = entries;
        self
    }

    /// Make creature lookups for `name` fail with a transport error.
    pub fn failing(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    /// Total number of trait calls made.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Names or ids passed to `creature`, in call order.
    pub fn creature_lookups(&self) -> Vec<String> {
        self.creature_lookups
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }

    fn record(&self) {
        self.call_count.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl DexClient for MockDex {
    async fn creature(&self, name_or_id: &str) -> Result<Creature, DexError> {
        self.record();
        if let Ok(mut lookups) = self.creature_lookups.lock() {
            lookups.push(name_or_id.to_string());
        }

        if self.failing.contains(name_or_id) {
            return Err(DexError::Transport {
                status: Some(500),
                message: format!("mock failure for {name_or_id}"),
            });
        }

        self.creatures
            .get(name_or_id)
            .cloned()
            .ok_or_else(|| DexError::NotFound(format!("pokemon/{name_or_id}")))
    }

    async fn type_relations(&self, type_name: &str) -> Result<TypeDamageRelations, DexError> {
        self.record();
        self.types
            .get(type_name)
            .cloned()
            .ok_or_else(|| DexError::NotFound(format!("type/{type_name}")))
    }

    async fn species(&self, url: &str) -> Result<Species, DexError> {
        self.record();
        self.species
            .get(url)
            .cloned()
            .ok_or_else(|| DexError::NotFound(url.to_string()))
    }

    async fn evolution_chain(&self, url: &str) -> Result<EvolutionNode, DexError> {
        self.record();
        self.chains
            .get(url)
            .cloned()
            .ok_or_else(|| DexError::NotFound(url.to_string()))
    }

    async fn national_dex(&self) -> Result<Vec<DexEntry>, DexError> {
        self.record();
        Ok(self.dex.clone())
    }

    async fn creature_names(&self, limit: u32) -> Result<Vec<String>, DexError> {
        self.record();
        let mut creatures: Vec<&Creature> = self
            .creatures
            .iter()
            .filter(|(key, c)| **key == c.name)
            .map(|(_, c)| c)
            .collect();
        creatures.sort_by_key(|c| c.id);
        Ok(creatures
            .into_iter()
            .take(limit as usize)
            .map(|c| c.name.clone())
            .collect())
    }
}

/// Build a creature with the fields tests usually care about.
pub fn creature(id: u32, name: &str, types: &[&str], height: u32, weight: u32) -> Creature {
    Creature {
        id,
        name: name.to_string(),
        types: types.iter().map(|t| t.to_string()).collect(),
        height,
        weight,
        abilities: Vec::new(),
        sprite: Some(format!("https://sprites.test/{id}.png")),
        species_url: format!("https://pokeapi.co/api/v2/pokemon-species/{id}/"),
    }
}
