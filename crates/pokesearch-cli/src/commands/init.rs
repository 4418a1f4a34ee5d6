//! The `pokesearch init` command.

use std::path::Path;

use anyhow::{Context, Result};

const CONFIG_FILE: &str = "pokesearch.toml";

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
        return Ok(());
    }

    std::fs::write(CONFIG_FILE, SAMPLE_CONFIG)
        .with_context(|| format!("failed to write {CONFIG_FILE}"))?;
    println!("Created {CONFIG_FILE}");

    println!("\nNext steps:");
    println!("  1. Run: pokesearch search pikachu");
    println!("  2. Run: pokesearch pokedex --generation 1");
    println!("  3. Run: pokesearch quiz status");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# pokesearch configuration

# Deepest evolution chain accepted before it is rejected as malformed.
evolution_max_depth = 16
# Quiz state file. Defaults to ~/.config/pokesearch/state.json
# state_file = "~/.config/pokesearch/state.json"

[api]
base_url = "https://pokeapi.co/api/v2"
timeout_secs = 10

[quiz]
max_guesses = 5
cooldown_secs = 3600
size_tolerance = 10
mass_tolerance = 100
max_creature_id = 898
suggestion_limit = 1000
"#;
