//! Quiz scoring and round state.
//!
//! The player guesses a hidden creature. Each guess is compared to the
//! target on four attributes, and the round ends on a correct guess or when
//! the guess cap is reached.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::DexError;
use crate::model::Creature;

/// Tunable game-balance parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRules {
    /// Largest height difference (decimetres) that still counts as a match.
    #[serde(default = "default_size_tolerance")]
    pub size_tolerance: u32,
    /// Largest weight difference (hectograms) that still counts as a match.
    #[serde(default = "default_mass_tolerance")]
    pub mass_tolerance: u32,
    /// Guesses allowed per round.
    #[serde(default = "default_max_guesses")]
    pub max_guesses: u32,
    /// Cooldown between rounds, in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Highest id a random target may have.
    #[serde(default = "default_max_creature_id")]
    pub max_creature_id: u32,
    /// How many names to fetch for guess suggestions.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: u32,
}

fn default_size_tolerance() -> u32 {
    10
}
fn default_mass_tolerance() -> u32 {
    100
}
fn default_max_guesses() -> u32 {
    5
}
fn default_cooldown_secs() -> u64 {
    3600
}
fn default_max_creature_id() -> u32 {
    898
}
fn default_suggestion_limit() -> u32 {
    1000
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            size_tolerance: default_size_tolerance(),
            mass_tolerance: default_mass_tolerance(),
            max_guesses: default_max_guesses(),
            cooldown_secs: default_cooldown_secs(),
            max_creature_id: default_max_creature_id(),
            suggestion_limit: default_suggestion_limit(),
        }
    }
}

/// Outcome of comparing one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Match,
    NoMatch,
}

impl Signal {
    fn from_bool(matched: bool) -> Self {
        if matched {
            Signal::Match
        } else {
            Signal::NoMatch
        }
    }

    pub fn is_match(self) -> bool {
        self == Signal::Match
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Match => write!(f, "match"),
            Signal::NoMatch => write!(f, "no match"),
        }
    }
}

/// Per-attribute feedback for one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Same species record.
    pub category: Signal,
    pub size: Signal,
    pub mass: Signal,
    /// Every guessed type is one of the target's types.
    pub type_overlap: Signal,
}

impl Feedback {
    pub fn all(signal: Signal) -> Self {
        Self {
            category: signal,
            size: signal,
            mass: signal,
            type_overlap: signal,
        }
    }

    pub fn all_match(&self) -> bool {
        self.category.is_match()
            && self.size.is_match()
            && self.mass.is_match()
            && self.type_overlap.is_match()
    }
}

/// Compare a guess against the target. Direction matters: the type signal
/// checks the guess's types against the target's, not the reverse.
pub fn score(target: &Creature, guess: &Creature, rules: &QuizRules) -> Feedback {
    if guess.id == target.id {
        return Feedback::all(Signal::Match);
    }

    let size_diff = target.height.abs_diff(guess.height);
    let mass_diff = target.weight.abs_diff(guess.weight);
    let stray_types = guess
        .types
        .iter()
        .filter(|t| !target.types.contains(*t))
        .count();

    Feedback {
        category: Signal::from_bool(guess.species_url == target.species_url),
        size: Signal::from_bool(size_diff <= rules.size_tolerance),
        mass: Signal::from_bool(mass_diff <= rules.mass_tolerance),
        type_overlap: Signal::from_bool(stray_types == 0),
    }
}

/// Where a round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    InProgress,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn is_terminal(self) -> bool {
        self != RoundStatus::InProgress
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::InProgress => write!(f, "in_progress"),
            RoundStatus::Won => write!(f, "won"),
            RoundStatus::Lost => write!(f, "lost"),
        }
    }
}

impl FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in_progress" => Ok(RoundStatus::InProgress),
            "won" => Ok(RoundStatus::Won),
            "lost" => Ok(RoundStatus::Lost),
            other => Err(format!("unknown round status: {other}")),
        }
    }
}

/// Clues shown alongside feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hint {
    pub generation: Option<String>,
    pub height: u32,
    pub weight: u32,
    pub types: Vec<String>,
}

impl Hint {
    pub fn for_target(target: &Creature, generation: Option<String>) -> Self {
        Self {
            generation,
            height: target.height,
            weight: target.weight,
            types: target.types.clone(),
        }
    }
    /// Height in metres.
    pub fn height_m(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    /// Weight in kilograms.
    pub fn weight_kg(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }
}

/// A single guessing round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRound {
    pub target: Creature,
    pub guesses: u32,
    pub status: RoundStatus,
}

/// Result of submitting a guess: the next round value and its feedback.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    pub round: QuizRound,
    pub feedback: Feedback,
}

impl QuizRound {
    pub fn new(target: Creature) -> Self {
        Self {
            target,
            guesses: 0,
            status: RoundStatus::InProgress,
        }
    }

    /// Rebuild a round from persisted counters, clamping the count to the cap.
    pub fn restore(target: Creature, guesses: u32, status: RoundStatus, rules: &QuizRules) -> Self {
        let guesses = guesses.min(rules.max_guesses);
        let status = if status == RoundStatus::InProgress && guesses >= rules.max_guesses {
            RoundStatus::Lost
        } else {
            status
        };
        Self {
            target,
            guesses,
            status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn guesses_left(&self, rules: &QuizRules) -> u32 {
        rules.max_guesses.saturating_sub(self.guesses)
    }

    /// Apply a guess. `None` means the guessed name could not be resolved:
    /// every signal is a miss and the round does not change.
    pub fn submit(
        &self,
        guess: Option<&Creature>,
        rules: &QuizRules,
    ) -> Result<GuessOutcome, DexError> {
        if self.is_terminal() {
            return Err(DexError::RoundOver);
        }

        let Some(guess) = guess else {
            return Ok(GuessOutcome {
                round: self.clone(),
                feedback: Feedback::all(Signal::NoMatch),
            });
        };

        let feedback = score(&self.target, guess, rules);
        let mut round = self.clone();

        if guess.id == self.target.id {
            round.status = RoundStatus::Won;
        } else {
            round.guesses += 1;
            if round.guesses >= rules.max_guesses {
                round.status = RoundStatus::Lost;
            }
        }

        Ok(GuessOutcome { round, feedback })
    }
}

/// Pick a random target id in `1..=max_id`.
pub fn pick_target_id<R: Rng>(rng: &mut R, max_id: u32) -> u32 {
    rng.gen_range(1..=max_id.max(1))
}

/// Names from `names` that start with `prefix` (case-insensitive), in order.
pub fn suggest<'a>(prefix: &str, names: &'a [String]) -> Vec<&'a str> {
    let prefix = prefix.trim().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    names
        .iter()
        .filter(|n| n.starts_with(&prefix))
        .map(String::as_str)
        .collect()
}
