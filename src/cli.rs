//! CLI command implementations for gemrail.

pub(crate) mod autoplay;
pub(crate) mod battle;
pub(crate) mod sweep;
pub(crate) mod world;

mod output;

use clap::ValueEnum;
use gemrail::battle::{BattleMode, Difficulty, WordBook};
use gemrail::error::{ConfigError, MapGenError};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Output format for the `battle` and `world` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `sweep` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SweepFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Difficulty preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum DifficultyArg {
    /// Weaker enemies, more moves.
    Easy,
    /// Default tables.
    Normal,
    /// Stronger enemies, fewer moves.
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(d: DifficultyArg) -> Self {
        match d {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

/// Budget mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ModeArg {
    /// Limited swaps.
    Moves,
    /// Countdown clock.
    Time,
}

impl From<ModeArg> for BattleMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Moves => BattleMode::Moves,
            ModeArg::Time => BattleMode::Time,
        }
    }
}

/// Vocabulary used when no word list is given.
const BUILTIN_WORDS: &str = "\
## Level 1
火:fire
水:water
木:wood
山:mountain
日:sun
月:moon
";

/// Load a word book from a file, or fall back to the built-in list.
pub(crate) fn load_words(path: Option<&Path>) -> Result<WordBook, CliError> {
    match path {
        Some(p) => Ok(WordBook::load(p)?),
        None => Ok(WordBook::parse(BUILTIN_WORDS)),
    }
}

/// Seed from the clock when none is given.
pub(crate) fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(42)
    })
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<MapGenError> for CliError {
    fn from(e: MapGenError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}
