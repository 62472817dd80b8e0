//! Sweep command implementation.

use super::output::{SweepStats, format_sweep_csv, format_sweep_text, sweep_rows};
use super::{CliError, DifficultyArg, SweepFormat, autoplay, load_words, resolve_seed};
use gemrail::battle::{Battle, Difficulty, LevelConfig, LevelOptions, WordDeck};
use gemrail::spell::SpellRegistry;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for a difficulty sweep.
#[derive(clap::Args, Debug)]
pub(crate) struct SweepArgs {
    /// First level to play
    #[arg(long, default_value = "1")]
    from: u32,

    /// Last level to play, inclusive
    #[arg(long, default_value = "10")]
    to: u32,

    /// Games per level
    #[arg(short, long, default_value = "100")]
    games: u64,

    /// Starting seed (increments for each game)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Parallel threads (default: CPU count)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Difficulty preset
    #[arg(short, long, default_value = "normal")]
    difficulty: DifficultyArg,

    /// Word list in `## Level N` / `汉字:english` format
    #[arg(short, long)]
    words: Option<PathBuf>,

    /// Actions per game before giving up
    #[arg(long, default_value = "200")]
    max_actions: u32,

    /// Output format: text, json, or csv
    #[arg(short, long, default_value = "text")]
    format: SweepFormat,

    /// Show progress bar
    #[arg(short, long)]
    progress: bool,
}

/// Execute the sweep command.
///
/// # Errors
///
/// Returns an error if the level range is empty or the word list cannot be
/// loaded.
pub(crate) fn execute(args: &SweepArgs) -> Result<(), CliError> {
    if args.from == 0 || args.to < args.from {
        return Err(CliError::new(format!("invalid level range {}..={}", args.from, args.to)));
    }
    let book = load_words(args.words.as_deref())?;
    let registry = SpellRegistry::with_defaults();
    let difficulty: Difficulty = args.difficulty.into();
    let options = LevelOptions {
        difficulty,
        ..LevelOptions::default()
    };

    if let Some(num_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // already initialized
    }

    let base_seed = resolve_seed(args.seed);
    let levels = u64::from(args.to - args.from + 1);
    let total = levels * args.games;

    let pb = if args.progress {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("bad progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each thread folds into its own stats; merged once at the end
    let stats = (0..total)
        .into_par_iter()
        .fold(SweepStats::default, |mut local, i| {
            let offset = u32::try_from(i / args.games).unwrap_or(u32::MAX);
            let level = args.from.saturating_add(offset);
            let config = LevelConfig::for_level(level);
            let deck = WordDeck::from_book(&book, level);
            match Battle::from_config(&config, &options, &registry, deck, base_seed.wrapping_add(i)) {
                Ok(mut battle) => local.add(level, &autoplay::play(&mut battle, args.max_actions)),
                Err(e) => log::warn!("level {level} failed to build: {e}"),
            }
            local
        })
        .reduce(SweepStats::default, |mut a, b| {
            a.merge(&b);
            a
        });

    if let Some(pb) = pb {
        pb.set_position(stats.games_played());
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played() as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match args.format {
        SweepFormat::Text => {
            println!();
            print!("{}", format_sweep_text(&stats, &difficulty.to_string()));
            println!();
            println!("Duration: {:.2}s ({games_per_sec:.0} games/sec)", duration.as_secs_f64());
        }
        SweepFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sweep_rows(&stats))?);
        }
        SweepFormat::Csv => print!("{}", format_sweep_csv(&stats)),
    }
    Ok(())
}
