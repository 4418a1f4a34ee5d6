//! Configuration loading and client factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use pokesearch_core::evolution::DEFAULT_MAX_DEPTH;
use pokesearch_core::quiz::QuizRules;

use crate::pokeapi::{PokeApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Where and how to reach the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Top-level pokesearch configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokesearchConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub quiz: QuizRules,
    /// Deepest evolution chain accepted before it is treated as malformed.
    #[serde(default = "default_max_depth")]
    pub evolution_max_depth: usize,
    /// Quiz state file. Defaults to `~/.config/pokesearch/state.json`.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for PokesearchConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            quiz: QuizRules::default(),
            evolution_max_depth: default_max_depth(),
            state_file: None,
        }
    }
}

impl PokesearchConfig {
    /// Resolved path of the quiz state file.
    pub fn state_path(&self) -> PathBuf {
        match &self.state_file {
            Some(path) => expand_home(path),
            None => config_dir()
                .map(|dir| dir.join("state.json"))
                .unwrap_or_else(|| PathBuf::from(".pokesearch-state.json")),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs.max(1))
    }
}

/// Expand `${VAR}` references using `lookup`. Unset variables expand to an
/// empty string; an unterminated `${` is kept as written.
fn expand_env(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some((before, after)) = rest.split_once("${") {
        out.push_str(before);
        match after.split_once('}') {
            Some((name, tail)) => {
                out.push_str(&lookup(name).unwrap_or_default());
                rest = tail;
            }
            None => {
                out.push_str("${");
                rest = after;
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Replace a leading `~/` with `$HOME/`.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var("HOME")) {
        (Ok(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("pokesearch"))
}

impl PokesearchConfig {
    /// Apply `POKESEARCH_API_URL` / `POKESEARCH_STATE` and expand `${VAR}`
    /// references in the URL and state path.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("POKESEARCH_API_URL") {
            self.api.base_url = url;
        }
        if let Some(state) = lookup("POKESEARCH_STATE") {
            self.state_file = Some(PathBuf::from(state));
        }

        self.api.base_url = expand_env(&self.api.base_url, &lookup);
        if let Some(path) = self.state_file.take() {
            self.state_file = Some(PathBuf::from(expand_env(&path.to_string_lossy(), &lookup)));
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.quiz.max_guesses >= 1,
            "quiz.max_guesses must be at least 1"
        );
        anyhow::ensure!(
            self.evolution_max_depth >= 1,
            "evolution_max_depth must be at least 1"
        );
        anyhow::ensure!(
            !self.api.base_url.trim().is_empty(),
            "api.base_url must not be empty"
        );
        Ok(())
    }
}

/// The config file to read: the explicit path if given (it must exist),
/// else `./pokesearch.toml`, else `~/.config/pokesearch/config.toml`.
fn locate_config(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
        return Ok(Some(path.to_path_buf()));
    }
    let candidates = [
        Some(PathBuf::from("pokesearch.toml")),
        config_dir().map(|dir| dir.join("config.toml")),
    ];
    Ok(candidates.into_iter().flatten().find(|p| p.exists()))
}

/// Load configuration from the default locations.
///
/// Environment variable overrides: `POKESEARCH_API_URL`, `POKESEARCH_STATE`.
pub fn load_config() -> Result<PokesearchConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
/// Defaults apply when no file is found.
pub fn load_config_from(path: Option<&Path>) -> Result<PokesearchConfig> {
    let mut config = match locate_config(path)? {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<PokesearchConfig>(&content)
                .with_context(|| format!("invalid config in {}", path.display()))?
        }
        None => PokesearchConfig::default(),
    };

    config.apply_env(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}

/// Create an API client from configuration.
pub fn create_client(config: &PokesearchConfig) -> Result<PokeApiClient> {
    PokeApiClient::new(Some(config.api.base_url.clone()), config.timeout())
        .context("failed to create PokéAPI client")
}
