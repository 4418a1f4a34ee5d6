//! pokesearch-core: Data model, quiz scoring, evolution flattening and the
//! cooldown timer.
//!
//! This crate holds everything that does not talk HTTP. Data access goes
//! through the [`traits::DexClient`] trait, implemented by `pokesearch-api`.

pub mod card;
pub mod cooldown;
pub mod error;
pub mod evolution;
pub mod mock;
pub mod model;
pub mod pokedex;
pub mod quiz;
pub mod session;
pub mod store;
pub mod traits;

pub use error::DexError;
