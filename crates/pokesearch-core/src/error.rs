//! Dex error types.
//!
//! Every `DexClient` call and every stateful core operation reports failure
//! through [`DexError`]. The taxonomy keeps "confirmed absent" apart from
//! transport trouble so callers can choose whether to collapse the two.

use thiserror::Error;

/// Errors produced by data lookups, chain flattening, quiz rounds and storage.
#[derive(Debug, Error)]
pub enum DexError {
    /// The API answered, and the entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request failed in transit or the API returned an error status.
    #[error("transport error{}: {message}", http_status(.status))]
    Transport { status: Option<u16>, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// An evolution chain was nested deeper than the configured limit.
    #[error("malformed evolution chain: deeper than {max_depth} levels")]
    MalformedChain { max_depth: usize },

    /// A guess was submitted after the round ended.
    #[error("the round is over; reset it or wait for the cooldown")]
    RoundOver,

    /// The persisted key-value state could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

fn http_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl DexError {
    /// Returns `true` if the entity was confirmed absent.
    pub fn is_absent(&self) -> bool {
        matches!(self, DexError::NotFound(_))
    }

    /// Returns `true` if the failure happened talking to the API rather
    /// than in the data itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DexError::Transport { .. } | DexError::Timeout(_) | DexError::Decode(_)
        )
    }
}
