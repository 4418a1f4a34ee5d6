//! National Pokédex index: generation grouping and pagination.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::DexEntry;

const SPRITE_BASE_URL: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Last national number of each generation, I through VII.
const GENERATION_BOUNDS: [u32; 7] = [151, 251, 386, 493, 649, 721, 809];

/// A generation of the national roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Generation {
    I,
    II,
    III,
    IV,
    V,
    VI,
    VII,
    VIII,
}

impl Generation {
    pub const ALL: [Generation; 8] = [
        Generation::I,
        Generation::II,
        Generation::III,
        Generation::IV,
        Generation::V,
        Generation::VI,
        Generation::VII,
        Generation::VIII,
    ];

    /// Generation a national entry number belongs to. Anything past the last
    /// known boundary lands in VIII.
    pub fn from_entry_number(entry_number: u32) -> Self {
        GENERATION_BOUNDS
            .iter()
            .position(|&bound| entry_number <= bound)
            .map(|i| Self::ALL[i])
            .unwrap_or(Generation::VIII)
    }

    /// 1-based generation number.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Parse "3", "iii" or "generation-iii".
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim().to_lowercase();
        let s = s.strip_prefix("generation-").unwrap_or(&s);
        if let Ok(n) = s.parse::<usize>() {
            return n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied());
        }
        Self::ALL
            .iter()
            .copied()
            .find(|g| g.roman().eq_ignore_ascii_case(s))
    }

    pub fn roman(self) -> &'static str {
        match self {
            Generation::I => "I",
            Generation::II => "II",
            Generation::III => "III",
            Generation::IV => "IV",
            Generation::V => "V",
            Generation::VI => "VI",
            Generation::VII => "VII",
            Generation::VIII => "VIII",
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation {}", self.roman())
    }
}

/// Entries of one generation, in national order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationGroup {
    pub generation: Generation,
    pub entries: Vec<DexEntry>,
}

/// Group entries by generation. Groups come out in generation order and
/// entries keep their input order.
pub fn group_by_generation(entries: &[DexEntry]) -> Vec<GenerationGroup> {
    let mut groups: BTreeMap<Generation, Vec<DexEntry>> = BTreeMap::new();
    for entry in entries {
        groups
            .entry(Generation::from_entry_number(entry.entry_number))
            .or_default()
            .push(entry.clone());
    }
    groups
        .into_iter()
        .map(|(generation, entries)| GenerationGroup {
            generation,
            entries,
        })
        .collect()
}

/// Id from a resource URL such as `.../pokemon-species/25/`.
pub fn species_id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// Static sprite image for a creature id.
pub fn sprite_url(id: u32) -> String {
    format!("{SPRITE_BASE_URL}/{id}.png")
}

/// One page of a longer list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    /// 1-based page number that was requested.
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<'_, T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1 && self.total_pages > 0
    }
}

/// Slice `items` into 1-based pages of `per_page`. Page 0 is treated as 1;
/// a page past the end is empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let page = page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);

    let start = (page - 1).saturating_mul(per_page).min(total_items);
    let end = start.saturating_add(per_page).min(total_items);

    Page {
        items: &items[start..end],
        page,
        per_page,
        total_items,
        total_pages,
    }
}
