//! Core trait definitions for data access, storage and time.
//!
//! `DexClient` is implemented by `pokesearch-api` against PokéAPI and by
//! [`crate::mock::MockDex`] for tests.

use async_trait::async_trait;

use crate::error::DexError;
use crate::model::{Creature, DexEntry, EvolutionNode, Species, TypeDamageRelations};

// ---------------------------------------------------------------------------
// Data access
// ---------------------------------------------------------------------------

/// Remote source of creature data.
#[async_trait]
pub trait DexClient: Send + Sync {
    /// Look up a creature by lowercase name or numeric id.
    async fn creature(&self, name_or_id: &str) -> Result<Creature, DexError>;

    /// Look up the damage relations of a type.
    async fn type_relations(&self, type_name: &str) -> Result<TypeDamageRelations, DexError>;

    /// Fetch a species record by its absolute URL.
    async fn species(&self, url: &str) -> Result<Species, DexError>;

    /// Fetch the root of an evolution chain by its absolute URL.
    async fn evolution_chain(&self, url: &str) -> Result<EvolutionNode, DexError>;

    /// Fetch every entry of the national Pokédex.
    async fn national_dex(&self) -> Result<Vec<DexEntry>, DexError>;

    /// Fetch up to `limit` creature names, in national order.
    async fn creature_names(&self, limit: u32) -> Result<Vec<String>, DexError>;
}

// ---------------------------------------------------------------------------
// Key-value storage
// ---------------------------------------------------------------------------

/// Durable string-to-string storage for state that must survive restarts.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, DexError>;

    fn set(&self, key: &str, value: &str) -> Result<(), DexError>;

    fn remove(&self, key: &str) -> Result<(), DexError>;
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Wall-clock source in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Normalise user input into the form the API expects for names.
pub fn normalize_name(input: &str) -> String {
    input.trim().to_lowercase()
}
