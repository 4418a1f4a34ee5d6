//! pokesearch CLI: search, browse and quiz against PokéAPI.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pokesearch", version, about = "Pokémon search, Pokédex and quiz")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Quiz state file (overrides the config)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a Pokémon by name or national id
    Search {
        /// Name or id, e.g. "pikachu" or "25"
        name: String,

        /// Print the card as JSON
        #[arg(long)]
        json: bool,
    },

    /// Browse the national Pokédex grouped by generation
    Pokedex {
        /// Only show one generation ("1", "iv", "generation-iv")
        #[arg(long)]
        generation: Option<String>,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Entries per page
        #[arg(long, default_value = "20")]
        per_page: usize,
    },

    /// Play the guessing game
    Quiz {
        #[command(subcommand)]
        action: QuizAction,
    },

    /// Create a starter config
    Init,
}

#[derive(Subcommand)]
pub enum QuizAction {
    /// Show the current round, hints and cooldown
    Status,

    /// Guess the hidden Pokémon
    Guess {
        /// Pokémon name
        name: String,
    },

    /// List Pokémon names starting with a prefix
    Suggest {
        /// Name prefix
        prefix: String,
    },

    /// Abandon the current round and restart the cooldown
    Reset,

    /// Count down until the next round
    Watch,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pokesearch=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Search { name, json } => commands::search::execute(name, json, cli.config).await,
        Commands::Pokedex {
            generation,
            page,
            per_page,
        } => commands::pokedex::execute(generation, page, per_page, cli.config).await,
        Commands::Quiz { action } => commands::quiz::execute(action, cli.config, cli.state).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
