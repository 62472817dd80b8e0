//! Match-3 grid and elemental battle engine.
//!
//! This module contains:
//! - `element`: the six elements and the suppression cycle
//! - `scoring`: base, terrain and combo score tables
//! - `grid`: the gem board with its word overlay
//! - `state`: enemies, spirits and the player's resources
//! - `level`: level configs and auto-generation
//! - `session`: the turn orchestrator

mod element;
mod events;
mod grid;
mod level;
mod scoring;
mod session;
mod state;
mod terrain;
mod words;

pub use element::{ADVANTAGE, DISADVANTAGE, Element, damage_modifier, modified_damage};
pub use events::{BattleEvent, BattleEvents, EventLog, NullEvents};
pub use grid::{ClearedCell, GravityMove, Language, MAX_EN_WORDS, MatchGrid, Pos, WordCell};
pub use level::{
    Difficulty, EnemyConfig, LevelConfig, LevelOptions, LevelSetup, ModeConfig, PlayerConfig, SpiritConfig,
    generate_enemies, generate_spirits,
};
pub use scoring::{MatchScore, base_score, calculate_match_score, combo_multiplier, terrain_bonus};
pub use session::{
    Battle, CascadeStep, MANA_PER_GEM, MatchGroup, MoveReport, SpellOutcome, SwapOutcome, SwapRejection,
};
pub use state::{
    BattleMode, BattleState, Enemy, EnemyHit, EnemyTarget, MAX_SPIRITS_IN_BATTLE, Outcome, Spirit,
};
pub use terrain::{TerrainGrid, TerrainPattern, TerrainReport};
pub use words::{WordBook, WordDeck, WordPair};
