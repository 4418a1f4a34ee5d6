//! The `pokesearch quiz` command family.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use pokesearch_api::config::{create_client, load_config_from};
use pokesearch_core::cooldown::{format_mm_ss, CooldownStatus, CooldownTicker};
use pokesearch_core::quiz::{Hint, RoundStatus, Signal};
use pokesearch_core::session::{GuessReport, QuizSession, QuizState};
use pokesearch_core::store::FileStore;
use pokesearch_core::traits::{Clock, KeyValueStore, SystemClock};
use pokesearch_core::DexError;

use super::display_name;
use crate::QuizAction;

pub async fn execute(
    action: QuizAction,
    config_path: Option<PathBuf>,
    state_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let client = create_client(&config)?;
    let state_path = state_path.unwrap_or_else(|| config.state_path());
    tracing::debug!(path = %state_path.display(), "using quiz state file");

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(state_path));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let session = QuizSession::new(&client, store.as_ref(), clock.as_ref(), config.quiz.clone());
    let mut rng = StdRng::from_entropy();

    match action {
        QuizAction::Status => {
            let state = session
                .load(&mut rng)
                .await
                .context("failed to load the quiz")?;
            print_state(&state, &session);
        }
        QuizAction::Guess { name } => match session.guess(&name, &mut rng).await {
            Ok(report) => print_report(&report, &session),
            Err(DexError::RoundOver) => {
                println!("This round is over. Wait for the cooldown or run `pokesearch quiz reset`.");
            }
            Err(e) => return Err(anyhow::Error::new(e).context("failed to score the guess")),
        },
        QuizAction::Suggest { prefix } => {
            let names = session
                .suggestions(&prefix)
                .await
                .context("failed to fetch suggestions")?;
            if names.is_empty() {
                println!("No suggestions.");
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        QuizAction::Reset => {
            session.reset().context("failed to reset the quiz")?;
            println!("Quiz reset.");
        }
        QuizAction::Watch => {
            let timer = session.timer().context("failed to read the cooldown")?;
            let mut ticker = CooldownTicker::spawn(
                timer,
                Arc::clone(&store),
                Arc::clone(&clock),
                Duration::from_secs(1),
            );

            loop {
                tokio::select! {
                    status = ticker.next() => match status {
                        Some(CooldownStatus::Running { remaining_secs }) => {
                            println!("Next Pokémon in: {}", format_mm_ss(remaining_secs));
                        }
                        Some(CooldownStatus::Expired) => {
                            println!("A new Pokémon is ready!");
                            break;
                        }
                        None => anyhow::bail!("cooldown ticker stopped unexpectedly"),
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            ticker.cancel();
        }
    }

    Ok(())
}

fn print_state(state: &QuizState, session: &QuizSession<'_>) {
    let rules = session.rules();
    if state.cooldown_expired {
        println!("A new Pokémon is waiting!");
    }
    println!("Guesses: {} / {}", state.round.guesses, rules.max_guesses);
    print_hint(&state.hint);
    match state.round.status {
        RoundStatus::InProgress => {}
        RoundStatus::Won | RoundStatus::Lost => {
            println!("Answer: {}", display_name(&state.round.target.name));
        }
    }
    println!("Next Pokémon in: {}", format_mm_ss(state.remaining_secs));
}

fn print_hint(hint: &Hint) {
    println!("Hint:");
    if let Some(generation) = &hint.generation {
        println!("  Generation: {generation}");
    }
    println!("  Height: {} m", hint.height_m());
    println!("  Weight: {} kg", hint.weight_kg());
    println!("  Types: {}", hint.types.join(", "));
}

fn print_report(report: &GuessReport, session: &QuizSession<'_>) {
    let rules = session.rules();
    let state = &report.state;

    match &report.lookup_error {
        Some(e) if e.is_absent() => println!("No Pokémon named '{}'.", report.guess),
        Some(e) => println!("Could not look up '{}': {e}", report.guess),
        None => {}
    }

    let hint = &state.hint;
    let generation = hint.generation.as_deref().unwrap_or("?");
    println!(
        "Generation: {generation} {}",
        tag(report.feedback.category)
    );
    println!("Height: {} m {}", hint.height_m(), tag(report.feedback.size));
    println!("Weight: {} kg {}", hint.weight_kg(), tag(report.feedback.mass));
    println!(
        "Types: {} {}",
        hint.types.join(", "),
        tag(report.feedback.type_overlap)
    );

    let target = display_name(&state.round.target.name);
    match state.round.status {
        RoundStatus::Won => println!("Correct! It was {target}."),
        RoundStatus::Lost => println!("Out of guesses. It was {target}."),
        RoundStatus::InProgress => println!(
            "Guesses left: {}",
            state.round.guesses_left(rules)
        ),
    }
    println!("Next Pokémon in: {}", format_mm_ss(state.remaining_secs));
}

fn tag(signal: Signal) -> String {
    format!("[{signal}]")
}
