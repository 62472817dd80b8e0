//! Output formatting utilities for CLI.

// Averages and rates are computed in floating point for display
#![allow(clippy::cast_precision_loss)]

use std::collections::BTreeMap;
use std::fmt::Write as _;

use gemrail::battle::{Battle, BattleEvent, Outcome};
use gemrail::world::{GridPos, Link, Node, Tile, TileKind, World};
use serde::Serialize;

use super::autoplay::PlaySummary;

/// JSON-serializable enemy state.
#[derive(Debug, Serialize)]
pub(super) struct JsonEnemy {
    /// Display name.
    pub(super) name: String,
    /// Remaining HP.
    pub(super) hp: u32,
    /// HP cap.
    pub(super) max_hp: u32,
    /// Boss flag.
    pub(super) is_boss: bool,
}

/// JSON-serializable battle result.
#[derive(Debug, Serialize)]
pub(super) struct JsonBattleResult {
    /// Random seed used.
    pub(super) seed: u64,
    /// Level played.
    pub(super) level: u32,
    /// What the player did.
    pub(super) summary: PlaySummary,
    /// Enemies at the end.
    pub(super) enemies: Vec<JsonEnemy>,
    /// Event log, if recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) events: Option<Vec<BattleEvent>>,
}

impl JsonBattleResult {
    /// Create from a finished battle.
    pub(super) fn from_battle(seed: u64, battle: &Battle, summary: PlaySummary, events: Option<Vec<BattleEvent>>) -> Self {
        Self {
            seed,
            level: battle.state().level,
            summary,
            enemies: battle
                .state()
                .enemies
                .iter()
                .map(|e| JsonEnemy {
                    name: e.name.clone(),
                    hp: e.hp,
                    max_hp: e.max_hp,
                    is_boss: e.is_boss,
                })
                .collect(),
            events,
        }
    }
}

fn outcome_label(outcome: Option<Outcome>) -> &'static str {
    match outcome {
        Some(Outcome::Victory) => "victory",
        Some(Outcome::PlayerDefeated) => "defeated",
        Some(Outcome::OutOfMoves) => "out of moves",
        Some(Outcome::OutOfTime) => "out of time",
        None => "undecided",
    }
}

/// Format a battle result as human-readable text.
pub(super) fn format_battle_text(seed: u64, battle: &Battle, summary: &PlaySummary) -> String {
    let mut out = String::new();
    let state = battle.state();
    let _ = writeln!(out, "Battle Result (level {}, seed {seed})", state.level);
    let _ = writeln!(out, "  Outcome: {}", outcome_label(summary.outcome));
    let _ = writeln!(out, "  Score: {}", summary.score);
    let _ = writeln!(
        out,
        "  Swaps: {} ({} misses), spells: {}, cascades: {}, words: {}",
        summary.swaps, summary.misses, summary.casts, summary.cascades, summary.words
    );
    let _ = writeln!(out, "  Player HP: {}/{}", state.player_hp, state.player_max_hp);
    for e in &state.enemies {
        let tag = if e.is_boss { " [boss]" } else { "" };
        let _ = writeln!(out, "  {}{tag}: {}/{} ({})", e.name, e.hp, e.max_hp, e.element.name());
    }
    for s in state.spirits() {
        let spell = s.spell.as_ref().map_or("-", |sp| sp.id.as_str());
        let _ = writeln!(out, "  {} {}: mana {}/{} spell {spell}", s.element.icon(), s.name, s.mana, s.max_mana);
    }
    out
}

/// Per-level aggregate for the sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub(super) struct LevelStats {
    /// Games played.
    pub(super) games: u64,
    /// Victories.
    pub(super) wins: u64,
    /// Losses by HP.
    pub(super) defeats: u64,
    /// Losses by budget.
    pub(super) timeouts: u64,
    /// Games that never finished.
    pub(super) undecided: u64,
    total_score: u64,
    total_swaps: u64,
    total_casts: u64,
}

impl LevelStats {
    fn add(&mut self, summary: &PlaySummary) {
        self.games += 1;
        match summary.outcome {
            Some(Outcome::Victory) => self.wins += 1,
            Some(Outcome::PlayerDefeated) => self.defeats += 1,
            Some(Outcome::OutOfMoves | Outcome::OutOfTime) => self.timeouts += 1,
            None => self.undecided += 1,
        }
        self.total_score += summary.score;
        self.total_swaps += u64::from(summary.swaps);
        self.total_casts += u64::from(summary.casts);
    }

    fn merge(&mut self, other: &LevelStats) {
        self.games += other.games;
        self.wins += other.wins;
        self.defeats += other.defeats;
        self.timeouts += other.timeouts;
        self.undecided += other.undecided;
        self.total_score += other.total_score;
        self.total_swaps += other.total_swaps;
        self.total_casts += other.total_casts;
    }

    fn ratio(part: u64, whole: u64) -> f64 {
        if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
    }

    /// Fraction of games won.
    pub(super) fn win_rate(&self) -> f64 {
        Self::ratio(self.wins, self.games)
    }

    /// Mean final score.
    pub(super) fn avg_score(&self) -> f64 {
        Self::ratio(self.total_score, self.games)
    }

    /// Mean swaps per game.
    pub(super) fn avg_swaps(&self) -> f64 {
        Self::ratio(self.total_swaps, self.games)
    }

    /// Mean spells per game.
    pub(super) fn avg_casts(&self) -> f64 {
        Self::ratio(self.total_casts, self.games)
    }
}

/// Sweep statistics keyed by level.
#[derive(Debug, Clone, Default)]
pub(super) struct SweepStats {
    /// Stats per level.
    pub(super) levels: BTreeMap<u32, LevelStats>,
}

impl SweepStats {
    /// Record one game.
    pub(super) fn add(&mut self, level: u32, summary: &PlaySummary) {
        self.levels.entry(level).or_default().add(summary);
    }

    /// Fold another thread's stats into this one.
    pub(super) fn merge(&mut self, other: &SweepStats) {
        for (level, stats) in &other.levels {
            self.levels.entry(*level).or_default().merge(stats);
        }
    }

    /// Games recorded across all levels.
    pub(super) fn games_played(&self) -> u64 {
        self.levels.values().map(|s| s.games).sum()
    }
}

/// Format sweep stats as a text table.
pub(super) fn format_sweep_text(stats: &SweepStats, difficulty: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Difficulty sweep ({difficulty}, {} games)", stats.games_played());
    let _ = writeln!(
        out,
        "{:>5} {:>6} {:>7} {:>9} {:>8} {:>7} {:>10}",
        "level", "games", "win %", "defeated", "budget", "swaps", "score"
    );
    for (level, s) in &stats.levels {
        let _ = writeln!(
            out,
            "{level:>5} {:>6} {:>6.1}% {:>9} {:>8} {:>7.1} {:>10.0}",
            s.games,
            s.win_rate() * 100.0,
            s.defeats,
            s.timeouts,
            s.avg_swaps(),
            s.avg_score()
        );
    }
    out
}

/// Format sweep stats as CSV.
pub(super) fn format_sweep_csv(stats: &SweepStats) -> String {
    let mut out = String::from("level,games,wins,defeats,timeouts,undecided,win_rate,avg_score,avg_swaps,avg_casts\n");
    for (level, s) in &stats.levels {
        let _ = writeln!(
            out,
            "{level},{},{},{},{},{},{:.4},{:.1},{:.2},{:.2}",
            s.games,
            s.wins,
            s.defeats,
            s.timeouts,
            s.undecided,
            s.win_rate(),
            s.avg_score(),
            s.avg_swaps(),
            s.avg_casts()
        );
    }
    out
}

/// JSON-serializable sweep row.
#[derive(Debug, Serialize)]
pub(super) struct JsonLevelRow {
    /// Level.
    pub(super) level: u32,
    /// Raw counts.
    #[serde(flatten)]
    pub(super) stats: LevelStats,
    /// Fraction of games won.
    pub(super) win_rate: f64,
    /// Mean final score.
    pub(super) avg_score: f64,
}

/// Rows for JSON output.
pub(super) fn sweep_rows(stats: &SweepStats) -> Vec<JsonLevelRow> {
    stats
        .levels
        .iter()
        .map(|(&level, s)| JsonLevelRow {
            level,
            stats: s.clone(),
            win_rate: s.win_rate(),
            avg_score: s.avg_score(),
        })
        .collect()
}

/// JSON-serializable world.
#[derive(Debug, Serialize)]
pub(super) struct JsonWorld<'a> {
    /// Seed used.
    pub(super) seed: u64,
    /// Start tile id.
    pub(super) start: Option<usize>,
    /// Placed stations.
    pub(super) nodes: &'a [Node],
    /// Station links.
    pub(super) links: &'a [Link],
    /// Every tile.
    pub(super) tiles: &'a [Tile],
}

impl<'a> JsonWorld<'a> {
    /// Borrow from a generated world.
    pub(super) fn from_world(seed: u64, world: &'a World) -> Self {
        Self {
            seed,
            start: world.tiles().start(),
            nodes: world.nodes(),
            links: &world.network().links,
            tiles: world.tiles().tiles(),
        }
    }
}

const TILE_KINDS: [TileKind; 8] = [
    TileKind::Start,
    TileKind::Station,
    TileKind::Road,
    TileKind::Blue,
    TileKind::Red,
    TileKind::Yellow,
    TileKind::DecorNature,
    TileKind::DecorCulture,
];

/// Format a world summary as text.
pub(super) fn format_world_text(seed: u64, world: &World) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "World (seed {seed})");
    let _ = writeln!(out, "  Stations: {}", world.nodes().len());
    let _ = writeln!(out, "  Road cells: {}", world.network().roads.len());
    let _ = writeln!(out, "  Links: {}", world.network().links.len());
    let _ = writeln!(out, "  Tiles: {}", world.tiles().len());
    for kind in TILE_KINDS {
        let _ = writeln!(out, "    {kind:?}: {}", world.tiles().count(kind));
    }
    if let Some(start) = world.start() {
        let _ = writeln!(
            out,
            "  Start: {} at {}",
            start.name.as_deref().unwrap_or("?"),
            start.pos
        );
    }
    out
}

const fn tile_char(kind: TileKind) -> char {
    match kind {
        TileKind::Start => '@',
        TileKind::Station => '#',
        TileKind::Road => '=',
        TileKind::Blue => 'b',
        TileKind::Red => 'r',
        TileKind::Yellow => 'y',
        TileKind::DecorNature => '"',
        TileKind::DecorCulture => '^',
    }
}

/// Draw the board as characters, north at the top. Water is `~`.
pub(super) fn render_ascii(world: &World) -> String {
    let cells = world.cells();
    let Some((min, max)) = cells.iter().fold(None, |acc: Option<(GridPos, GridPos)>, (p, _)| {
        Some(match acc {
            None => (p, p),
            Some((lo, hi)) => (
                GridPos::new(lo.x.min(p.x), lo.z.min(p.z)),
                GridPos::new(hi.x.max(p.x), hi.z.max(p.z)),
            ),
        })
    }) else {
        return String::new();
    };
    let mut out = String::new();
    for z in min.z..=max.z {
        for x in min.x..=max.x {
            let pos = GridPos::new(x, z);
            let ch = match world.tiles().at(pos) {
                Some(t) => tile_char(t.kind),
                None if cells.get(pos).is_some() => '~',
                None => ' ',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}
