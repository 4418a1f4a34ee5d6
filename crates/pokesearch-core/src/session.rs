//! Quiz session: the glue between rounds, the cooldown and persisted state.
//!
//! A session owns no state of its own. Each call reads the round and the
//! deadline from the store, applies one transition and writes them back.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::cooldown::{CooldownStatus, CooldownTimer};
use crate::error::DexError;
use crate::model::Creature;
use crate::quiz::{pick_target_id, suggest, Feedback, Hint, QuizRound, QuizRules, RoundStatus};
use crate::traits::{normalize_name, Clock, DexClient, KeyValueStore};

/// Storage key of the guess counter.
pub const ATTEMPTS_KEY: &str = "quiz.attempts";
/// Storage key of the target creature id.
pub const TARGET_KEY: &str = "quiz.target";
/// Storage key of the round status.
pub const STATUS_KEY: &str = "quiz.status";
/// Storage key of the cooldown deadline the current round belongs to.
pub const ROUND_DEADLINE_KEY: &str = "quiz.round_deadline";

/// Snapshot of the current round for display.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizState {
    pub round: QuizRound,
    pub hint: Hint,
    pub remaining_secs: u64,
    /// The cooldown ran out since the round started, so this is a fresh round.
    pub cooldown_expired: bool,
}

/// What happened to one guess.
#[derive(Debug)]
pub struct GuessReport {
    /// Normalised name the player submitted.
    pub guess: String,
    /// The guessed creature, if it resolved.
    pub resolved: Option<Creature>,
    /// Why it did not resolve, if it did not.
    pub lookup_error: Option<DexError>,
    pub feedback: Feedback,
    pub state: QuizState,
}

pub struct QuizSession<'a> {
    client: &'a dyn DexClient,
    store: &'a dyn KeyValueStore,
    clock: &'a dyn Clock,
    rules: QuizRules,
}

impl<'a> QuizSession<'a> {
    pub fn new(
        client: &'a dyn DexClient,
        store: &'a dyn KeyValueStore,
        clock: &'a dyn Clock,
        rules: QuizRules,
    ) -> Self {
        Self {
            client,
            store,
            clock,
            rules,
        }
    }

    pub fn rules(&self) -> &QuizRules {
        &self.rules
    }

    fn cooldown(&self) -> Duration {
        Duration::from_secs(self.rules.cooldown_secs)
    }

    /// The persisted cooldown timer, armed if this is the first use.
    pub fn timer(&self) -> Result<CooldownTimer, DexError> {
        CooldownTimer::restore(self.store, self.clock.now_ms(), self.cooldown())
    }

    /// Load the current round, starting a new one if the cooldown expired or
    /// no target has been picked yet.
    ///
    /// The timer may also have been re-armed elsewhere, e.g. by a
    /// [`CooldownTicker`](crate::cooldown::CooldownTicker). A round whose
    /// recorded deadline differs from the current one is stale either way.
    pub async fn load<R: Rng>(&self, rng: &mut R) -> Result<QuizState, DexError> {
        let now = self.clock.now_ms();
        let mut timer = self.timer()?;
        let expired_now = timer.tick(now, self.store)? == CooldownStatus::Expired;
        let round_deadline = self.read_parsed::<i64>(ROUND_DEADLINE_KEY)?;
        let stale = round_deadline.is_some_and(|d| d != timer.deadline_ms());

        let cooldown_expired = expired_now || stale;
        if cooldown_expired {
            info!(expired_now, stale, "cooldown expired, starting a new round");
            self.clear_round()?;
        }
        if cooldown_expired || round_deadline.is_none() {
            self.store
                .set(ROUND_DEADLINE_KEY, &timer.deadline_ms().to_string())?;
        }

        let target_id = match self.read_parsed::<u32>(TARGET_KEY)? {
            Some(id) if id >= 1 => id,
            _ => {
                let id = pick_target_id(rng, self.rules.max_creature_id);
                debug!(target_id = id, "picked new quiz target");
                self.store.set(TARGET_KEY, &id.to_string())?;
                id
            }
        };

        let target = self.client.creature(&target_id.to_string()).await?;
        let generation = match self.client.species(&target.species_url).await {
            Ok(species) => Some(species.generation),
            Err(e) => {
                warn!(error = %e, "species lookup for hint failed");
                None
            }
        };

        let guesses = self.read_parsed::<u32>(ATTEMPTS_KEY)?.unwrap_or(0);
        let status = self
            .read_parsed::<RoundStatus>(STATUS_KEY)?
            .unwrap_or(RoundStatus::InProgress);
        let round = QuizRound::restore(target, guesses, status, &self.rules);
        let hint = Hint::for_target(&round.target, generation);

        Ok(QuizState {
            round,
            hint,
            remaining_secs: timer.remaining_secs(now),
            cooldown_expired,
        })
    }

    /// Submit a guess by name. A name that does not resolve scores as a
    /// complete miss and does not use up a guess.
    pub async fn guess<R: Rng>(&self, name: &str, rng: &mut R) -> Result<GuessReport, DexError> {
        let guess = normalize_name(name);
        let state = self.load(rng).await?;
        if state.round.is_terminal() {
            return Err(DexError::RoundOver);
        }

        let (resolved, lookup_error) = if guess.is_empty() {
            (None, Some(DexError::NotFound("empty guess".into())))
        } else {
            match self.client.creature(&guess).await {
                Ok(creature) => (Some(creature), None),
                Err(e) => {
                    debug!(guess = %guess, error = %e, "guess did not resolve");
                    (None, Some(e))
                }
            }
        };

        let outcome = state.round.submit(resolved.as_ref(), &self.rules)?;
        self.persist_round(&outcome.round)?;
        info!(
            guesses = outcome.round.guesses,
            status = %outcome.round.status,
            "guess scored"
        );

        Ok(GuessReport {
            guess,
            resolved,
            lookup_error,
            feedback: outcome.feedback,
            state: QuizState {
                round: outcome.round,
                ..state
            },
        })
    }

    /// Forget the current round and restart the cooldown.
    pub fn reset(&self) -> Result<(), DexError> {
        self.clear_round()?;
        CooldownTimer::start(self.store, self.clock.now_ms(), self.cooldown())?;
        info!("quiz round reset");
        Ok(())
    }

    /// Creature names starting with `prefix`.
    pub async fn suggestions(&self, prefix: &str) -> Result<Vec<String>, DexError> {
        if prefix.trim().is_empty() {
            return Ok(Vec::new());
        }
        let names = self.client.creature_names(self.rules.suggestion_limit).await?;
        Ok(suggest(prefix, &names)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    fn persist_round(&self, round: &QuizRound) -> Result<(), DexError> {
        self.store.set(ATTEMPTS_KEY, &round.guesses.to_string())?;
        self.store.set(STATUS_KEY, &round.status.to_string())?;
        self.store.set(TARGET_KEY, &round.target.id.to_string())
    }

    fn clear_round(&self) -> Result<(), DexError> {
        self.store.remove(ATTEMPTS_KEY)?;
        self.store.remove(STATUS_KEY)?;
        self.store.remove(ROUND_DEADLINE_KEY)?;
        self.store.remove(TARGET_KEY)
    }

    fn read_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<Option<T>, DexError> {
        Ok(self
            .store
            .get(key)?
            .and_then(|raw| raw.trim().parse::<T>().ok()))
    }
}
