//! The `pokesearch search` command.

use std::path::PathBuf;

use anyhow::Result;

use pokesearch_api::config::{create_client, load_config_from};
use pokesearch_core::card::{build_card, CreatureCard};

use super::display_name;

pub async fn execute(name: String, json: bool, config_path: Option<PathBuf>) -> Result<()> {
    anyhow::ensure!(!name.trim().is_empty(), "name must not be empty");

    let config = load_config_from(config_path.as_deref())?;
    let client = create_client(&config)?;

    let card = match build_card(&client, &name, config.evolution_max_depth).await {
        Ok(card) => card,
        Err(e) if e.is_absent() => anyhow::bail!("Pokémon not found: {}", name.trim()),
        Err(e) => {
            return Err(anyhow::Error::new(e).context(format!("failed to look up {}", name.trim())))
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        print_card(&card);
    }

    Ok(())
}

fn print_card(card: &CreatureCard) {
    let c = &card.creature;

    println!("#{} {}", c.id, display_name(&c.name));
    if let Some(sprite) = &c.sprite {
        println!("Sprite: {sprite}");
    }
    println!("Types: {}", c.types.join(", "));
    println!("Weaknesses: {}", card.weaknesses.join(", "));
    println!("Height: {} m", c.height_m());
    println!("Weight: {} kg", c.weight_kg());
    println!("Abilities: {}", c.abilities.join(", "));
    if let Some(generation) = &card.generation {
        println!("Generation: {generation}");
    }

    if card.evolutions.has_evolutions() {
        let stages: Vec<String> = card
            .evolutions
            .entries
            .iter()
            .map(|e| display_name(&e.name))
            .collect();
        println!("Evolutions: {}", stages.join(" -> "));
        if card.evolutions.failed_lookups > 0 {
            println!(
                "  ({} evolution sprite(s) unavailable)",
                card.evolutions.failed_lookups
            );
        }
    }

    match card.previous_id() {
        Some(prev) => println!("Previous: #{prev} | Next: #{}", card.next_id()),
        None => println!("Next: #{}", card.next_id()),
    }
}
