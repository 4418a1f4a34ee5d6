//! The `pokesearch pokedex` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use pokesearch_api::config::{create_client, load_config_from};
use pokesearch_core::model::DexEntry;
use pokesearch_core::pokedex::{
    group_by_generation, paginate, species_id_from_url, sprite_url, Generation,
};
use pokesearch_core::traits::DexClient;

use super::display_name;

pub async fn execute(
    generation: Option<String>,
    page: usize,
    per_page: usize,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(page >= 1, "page must be at least 1");
    anyhow::ensure!(per_page >= 1, "per-page must be at least 1");

    let only = generation
        .map(|g| {
            Generation::parse(&g).ok_or_else(|| anyhow::anyhow!("unknown generation: '{g}'"))
        })
        .transpose()?;

    let config = load_config_from(config_path.as_deref())?;
    let client = create_client(&config)?;
    let entries = client
        .national_dex()
        .await
        .context("failed to fetch the national Pokédex")?;

    // Flatten back in generation order so pages follow the grouping.
    let listed: Vec<(Generation, DexEntry)> = group_by_generation(&entries)
        .into_iter()
        .filter(|group| only.map_or(true, |g| g == group.generation))
        .flat_map(|group| {
            let generation = group.generation;
            group.entries.into_iter().map(move |e| (generation, e))
        })
        .collect();

    let page = paginate(&listed, page, per_page);
    if page.items.is_empty() {
        println!(
            "No entries on page {} ({} entries, {} pages).",
            page.page, page.total_items, page.total_pages
        );
        return Ok(());
    }

    let mut current: Option<Generation> = None;
    let mut table: Option<Table> = None;
    for (generation, entry) in page.items {
        if current != Some(*generation) {
            if let (Some(g), Some(t)) = (current, table.take()) {
                println!("{g}\n{t}\n");
            }
            current = Some(*generation);
            table = Some(new_table());
        }
        if let Some(t) = table.as_mut() {
            let sprite = species_id_from_url(&entry.url)
                .map(sprite_url)
                .unwrap_or_default();
            t.add_row(vec![
                Cell::new(entry.entry_number),
                Cell::new(display_name(&entry.name)),
                Cell::new(sprite),
            ]);
        }
    }
    if let (Some(g), Some(t)) = (current, table) {
        println!("{g}\n{t}\n");
    }

    println!(
        "Page {}/{} ({} entries)",
        page.page, page.total_pages, page.total_items
    );
    if page.has_next() {
        println!("Next: --page {}", page.page + 1);
    }

    Ok(())
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Sprite"]);
    table
}
