//! pokesearch-api: PokéAPI integration.
//!
//! Implements the `DexClient` trait over HTTP and loads the `pokesearch.toml`
//! configuration that points it at an API.

pub mod config;
pub mod pokeapi;

pub use config::{create_client, load_config, ApiConfig, PokesearchConfig};
pub use pokeapi::PokeApiClient;
