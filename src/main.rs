//! Gemrail CLI - autoplay battles, sweep difficulty and generate boards.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Gemrail - match-3 elemental battles on a procedural rail board
#[derive(Parser, Debug)]
#[command(name = "gemrail")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Autoplay a single battle
    Battle(cli::battle::BattleArgs),

    /// Autoplay many battles per level in parallel and aggregate statistics
    Sweep(cli::sweep::SweepArgs),

    /// Generate a board from a station list
    World(cli::world::WorldArgs),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let result = match args.command {
        Commands::Battle(battle) => cli::battle::execute(&battle),
        Commands::Sweep(sweep) => cli::sweep::execute(&sweep),
        Commands::World(world) => cli::world::execute(&world),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
