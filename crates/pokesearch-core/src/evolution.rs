//! Evolution chain flattening.
//!
//! Turns an evolution tree into the ordered list a detail card shows:
//! pre-order, siblings in declaration order, one sprite per species.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DexError;
use crate::model::EvolutionNode;
use crate::traits::DexClient;

/// Default nesting limit for evolution trees.
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// One stage of a flattened chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionEntry {
    pub name: String,
    /// `None` when the sprite lookup failed or the creature has no sprite.
    pub sprite: Option<String>,
}

/// A chain in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedEvolution {
    pub entries: Vec<EvolutionEntry>,
    /// Number of sprite lookups that failed.
    #[serde(default)]
    pub failed_lookups: usize,
}

impl FlattenedEvolution {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Species names in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// A chain with a single stage has nothing worth showing.
    pub fn has_evolutions(&self) -> bool {
        self.entries.len() > 1
    }
}

/// Walk the tree in pre-order and return species names.
///
/// Uses an explicit stack; the root sits at depth 1. Fails with
/// [`DexError::MalformedChain`] if any node is deeper than `max_depth`.
pub fn preorder_names(root: &EvolutionNode, max_depth: usize) -> Result<Vec<String>, DexError> {
    let mut names = Vec::new();
    let mut stack: Vec<(&EvolutionNode, usize)> = vec![(root, 1)];

    while let Some((node, depth)) = stack.pop() {
        if depth > max_depth {
            return Err(DexError::MalformedChain { max_depth });
        }
        names.push(node.species.clone());
        // Reverse push so the first child is popped first.
        for child in node.evolves_to.iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    Ok(names)
}

/// Flatten an evolution tree and resolve a sprite for every stage.
///
/// Sprite lookups run concurrently; output order is the traversal order.
/// A failed lookup keeps the entry with no sprite and is counted in
/// [`FlattenedEvolution::failed_lookups`].
pub async fn flatten_chain(
    client: &dyn DexClient,
    root: &EvolutionNode,
    max_depth: usize,
) -> Result<FlattenedEvolution, DexError> {
    let names = preorder_names(root, max_depth)?;
    debug!(stages = names.len(), root = %root.species, "flattening evolution chain");

    let lookups = names.iter().map(|name| client.creature(name));
    let results = join_all(lookups).await;

    let mut failed_lookups = 0;
    let entries = names
        .into_iter()
        .zip(results)
        .map(|(name, result)| {
            let sprite = match result {
                Ok(creature) => creature.sprite,
                Err(e) => {
                    warn!(species = %name, error = %e, "sprite lookup failed");
                    failed_lookups += 1;
                    None
                }
            };
            EvolutionEntry { name, sprite }
        })
        .collect();

    Ok(FlattenedEvolution {
        entries,
        failed_lookups,
    })
}
