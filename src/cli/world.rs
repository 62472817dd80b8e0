//! World command implementation.

use super::output::{JsonWorld, format_world_text, render_ascii};
use super::{CliError, OutputFormat, resolve_seed};
use gemrail::world::{WorldConfig, generate_world, load_stations};
use std::fs;
use std::path::PathBuf;

/// Stations used when no file is given.
const BUILTIN_STATIONS: &str = r#"[
  {"name": "上海", "lat": 31.23, "lng": 121.47, "population": 24870000, "level": 4},
  {"name": "苏州", "lat": 31.30, "lng": 120.62, "population": 12750000, "level": 3},
  {"name": "无锡", "lat": 31.49, "lng": 120.31, "population": 7460000, "level": 3},
  {"name": "常州", "lat": 31.81, "lng": 119.97, "population": 5280000, "level": 2},
  {"name": "南京", "lat": 32.06, "lng": 118.80, "population": 9310000, "level": 4},
  {"name": "杭州", "lat": 30.27, "lng": 120.16, "population": 12200000, "level": 4},
  {"name": "嘉兴", "lat": 30.75, "lng": 120.76, "population": 5400000, "level": 2},
  {"name": "湖州", "lat": 30.89, "lng": 120.09, "population": 3370000, "level": 1}
]"#;

/// Arguments for board generation.
#[derive(clap::Args, Debug)]
pub(crate) struct WorldArgs {
    /// Station list JSON: `[{"name", "lat", "lng", "population", "level"}]`
    #[arg(long)]
    stations: Option<PathBuf>,

    /// Random seed (default: random)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid units per degree
    #[arg(long, default_value = "96")]
    scale: f64,

    /// Terrain radius around each station
    #[arg(long, default_value = "6")]
    radius: i32,

    /// Chance a road tile becomes an event tile
    #[arg(long, default_value = "0.3")]
    special_chance: f64,

    /// Skip shortcut roads
    #[arg(long)]
    no_shortcuts: bool,

    /// Draw the board after the summary
    #[arg(long)]
    map: bool,

    /// Output format: text or json
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

/// Execute the world command.
///
/// # Errors
///
/// Returns an error if the station list cannot be read or parsed, or the
/// settings are invalid.
pub(crate) fn execute(args: &WorldArgs) -> Result<(), CliError> {
    let text = match &args.stations {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?,
        None => BUILTIN_STATIONS.to_string(),
    };
    let stations = load_stations(&text)?;
    let seed = resolve_seed(args.seed);
    let config = WorldConfig {
        seed,
        scale: args.scale,
        render_radius: args.radius,
        special_chance: args.special_chance,
        shortcuts: !args.no_shortcuts,
        ..WorldConfig::default()
    };
    let world = generate_world(&stations, &config)?;

    match args.format {
        OutputFormat::Text => {
            print!("{}", format_world_text(seed, &world));
            if args.map {
                println!();
                print!("{}", render_ascii(&world));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&JsonWorld::from_world(seed, &world))?);
        }
    }
    Ok(())
}
