//! Detail card assembly for a single creature.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::DexError;
use crate::evolution::{flatten_chain, FlattenedEvolution};
use crate::model::Creature;
use crate::traits::{normalize_name, DexClient};

/// Everything a detail view shows about one creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureCard {
    pub creature: Creature,
    /// Types that deal double damage to any of the creature's types,
    /// deduplicated in first-seen order.
    pub weaknesses: Vec<String>,
    /// Generation label from the species record, if it resolved.
    pub generation: Option<String>,
    pub evolutions: FlattenedEvolution,
}

impl CreatureCard {
    pub fn previous_id(&self) -> Option<u32> {
        self.creature.previous_id()
    }

    pub fn next_id(&self) -> u32 {
        self.creature.next_id()
    }
}

/// Union of weaknesses across types, keeping the first occurrence of each.
pub fn merge_weaknesses(per_type: Vec<Vec<String>>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for weakness in per_type.into_iter().flatten() {
        if !merged.contains(&weakness) {
            merged.push(weakness);
        }
    }
    merged
}

/// Weaknesses of a creature. A type whose lookup fails contributes nothing.
pub async fn weaknesses_of(client: &dyn DexClient, creature: &Creature) -> Vec<String> {
    let lookups = creature.types.iter().map(|t| client.type_relations(t));
    let per_type = join_all(lookups)
        .await
        .into_iter()
        .zip(&creature.types)
        .map(|(result, type_name)| match result {
            Ok(relations) => relations.double_damage_from,
            Err(e) => {
                warn!(type_name = %type_name, error = %e, "type lookup failed");
                Vec::new()
            }
        })
        .collect();
    merge_weaknesses(per_type)
}

/// Look up a creature and everything its card shows.
///
/// Fails only if the creature itself cannot be fetched or its evolution
/// chain is malformed. Species and chain lookups that fail leave the card
/// without a generation or evolutions.
#[instrument(skip(client))]
pub async fn build_card(
    client: &dyn DexClient,
    name_or_id: &str,
    max_depth: usize,
) -> Result<CreatureCard, DexError> {
    let creature = client.creature(&normalize_name(name_or_id)).await?;
    let weaknesses = weaknesses_of(client, &creature).await;

    let (generation, evolutions) = match client.species(&creature.species_url).await {
        Ok(species) => {
            let evolutions = match client.evolution_chain(&species.evolution_chain_url).await {
                Ok(root) => flatten_chain(client, &root, max_depth).await?,
                Err(e) => {
                    warn!(error = %e, "evolution chain lookup failed");
                    FlattenedEvolution::default()
                }
            };
            (Some(species.generation), evolutions)
        }
        Err(e) => {
            warn!(error = %e, "species lookup failed");
            (None, FlattenedEvolution::default())
        }
    };

    debug!(
        id = creature.id,
        weaknesses = weaknesses.len(),
        stages = evolutions.len(),
        "card assembled"
    );

    Ok(CreatureCard {
        creature,
        weaknesses,
        generation,
        evolutions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::DEFAULT_MAX_DEPTH;
    use crate::mock::{creature, MockDex};
    use crate::model::{EvolutionNode, Species};

    const CHAIN_URL: &str = "https://pokeapi.co/api/v2/evolution-chain/1/";

    fn bulbasaur_dex() -> MockDex {
        let bulbasaur = creature(1, "bulbasaur", &["grass", "poison"], 7, 69);
        let species_url = bulbasaur.species_url.clone();
        MockDex::new()
            .with_creature(bulbasaur)
            .with_creature(creature(2, "ivysaur", &["grass", "poison"], 10, 130))
            .with_creature(creature(3, "venusaur", &["grass", "poison"], 20, 1000))
            .with_type("grass", &["fire", "ice", "poison", "flying", "bug"])
            .with_type("poison", &["ground", "psychic"])
            .with_species(
                &species_url,
                Species {
                    generation: "generation-i".into(),
                    evolution_chain_url: CHAIN_URL.into(),
                },
            )
            .with_chain(
                CHAIN_URL,
                EvolutionNode::with_children(
                    "bulbasaur",
                    vec![EvolutionNode::with_children(
                        "ivysaur",
                        vec![EvolutionNode::leaf("venusaur")],
                    )],
                ),
            )
    }

    #[test]
    fn merge_dedupes_in_first_seen_order() {
        let merged = merge_weaknesses(vec![
            vec!["fire".into(), "ice".into()],
            vec!["ground".into(), "fire".into()],
        ]);
        assert_eq!(merged, vec!["fire", "ice", "ground"]);
    }

    #[tokio::test]
    async fn full_card() {
        let dex = bulbasaur_dex();
        let card = build_card(&dex, " Bulbasaur ", DEFAULT_MAX_DEPTH)
            .await
            .unwrap();

        assert_eq!(card.creature.id, 1);
        assert_eq!(
            card.weaknesses,
            vec!["fire", "ice", "poison", "flying", "bug", "ground", "psychic"]
        );
        assert_eq!(card.generation.as_deref(), Some("generation-i"));
        assert_eq!(card.evolutions.names(), vec!["bulbasaur", "ivysaur", "venusaur"]);
        assert_eq!(card.previous_id(), None);
        assert_eq!(card.next_id(), 2);
    }

    #[tokio::test]
    async fn missing_creature_aborts() {
        let dex = bulbasaur_dex();
        let err = build_card(&dex, "missingno", DEFAULT_MAX_DEPTH)
            .await
            .unwrap_err();
        assert!(err.is_absent());
    }

    #[tokio::test]
    async fn missing_type_contributes_nothing() {
        let dex = MockDex::new()
            .with_creature(creature(25, "pikachu", &["electric", "shadow"], 4, 60))
            .with_type("electric", &["ground"]);

        let card = build_card(&dex, "pikachu", DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(card.weaknesses, vec!["ground"]);
        assert_eq!(card.generation, None);
        assert!(card.evolutions.is_empty());
    }

    #[tokio::test]
    async fn missing_chain_leaves_generation() {
        let pikachu = creature(25, "pikachu", &["electric"], 4, 60);
        let species_url = pikachu.species_url.clone();
        let dex = MockDex::new().with_creature(pikachu).with_species(
            &species_url,
            Species {
                generation: "generation-i".into(),
                evolution_chain_url: "https://pokeapi.co/api/v2/evolution-chain/10/".into(),
            },
        );

        let card = build_card(&dex, "25", DEFAULT_MAX_DEPTH).await.unwrap();
        assert_eq!(card.generation.as_deref(), Some("generation-i"));
        assert!(card.evolutions.is_empty());
        assert_eq!(card.previous_id(), Some(24));
    }

    #[tokio::test]
    async fn malformed_chain_propagates() {
        let dex = bulbasaur_dex();
        let err = build_card(&dex, "bulbasaur", 2).await.unwrap_err();
        assert!(matches!(err, DexError::MalformedChain { max_depth: 2 }));
    }
}
