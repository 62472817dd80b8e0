//! Battle command implementation.

use super::output::{JsonBattleResult, format_battle_text};
use super::{CliError, DifficultyArg, ModeArg, OutputFormat, autoplay, load_words, resolve_seed};
use gemrail::battle::{Battle, EventLog, LevelConfig, LevelOptions, WordDeck};
use gemrail::spell::SpellRegistry;
use std::path::PathBuf;

/// Arguments for a single autoplayed battle.
#[derive(clap::Args, Debug)]
pub(crate) struct BattleArgs {
    /// Level config JSON (default: generated from --level)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Level number when no config is given
    #[arg(short, long, default_value = "1")]
    level: u32,

    /// Difficulty preset
    #[arg(short, long, default_value = "normal")]
    difficulty: DifficultyArg,

    /// Budget mode when the config names none
    #[arg(short, long, default_value = "moves")]
    mode: ModeArg,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Word list in `## Level N` / `汉字:english` format
    #[arg(short, long)]
    words: Option<PathBuf>,

    /// Board rows
    #[arg(long, default_value = "8")]
    rows: usize,

    /// Board columns
    #[arg(long, default_value = "8")]
    cols: usize,

    /// Gem types in play (3-6)
    #[arg(long, default_value = "6")]
    gem_types: u8,

    /// Equip random spells instead of signature spells
    #[arg(long)]
    random_spells: bool,

    /// Stop after this many actions
    #[arg(long, default_value = "200")]
    max_actions: u32,

    /// Include the event log in JSON output
    #[arg(long)]
    events: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

/// Execute the battle command.
///
/// # Errors
///
/// Returns an error if the config or word list cannot be loaded, or the
/// level cannot be built.
pub(crate) fn execute(args: &BattleArgs) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => LevelConfig::load(path)?,
        None => LevelConfig::for_level(args.level),
    };
    let options = LevelOptions {
        difficulty: args.difficulty.into(),
        rows: args.rows,
        cols: args.cols,
        gem_types: args.gem_types,
        mode: args.mode.into(),
        random_spells: args.random_spells,
    };
    let book = load_words(args.words.as_deref())?;
    let deck = WordDeck::from_book(&book, config.level_number());
    let registry = SpellRegistry::with_defaults();
    let seed = resolve_seed(args.seed);

    let mut battle = Battle::from_config(&config, &options, &registry, deck, seed)?;
    let recorder = args.events.then(EventLog::new);
    if let Some(r) = &recorder {
        battle.set_events(Box::new(r.clone()));
    }

    let summary = autoplay::play(&mut battle, args.max_actions);
    log::info!("battle finished after {} swaps: {:?}", summary.swaps, summary.outcome);

    match args.format {
        OutputFormat::Text => print!("{}", format_battle_text(seed, &battle, &summary)),
        OutputFormat::Json => {
            let result = JsonBattleResult::from_battle(seed, &battle, summary, recorder.map(|r| r.events()));
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
