// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Gemrail: a deterministic match-3 battle engine and a procedural rail board.
//!
//! The crate has two halves that share a seeded RNG:
//! - Battles: a gem grid with word pairs, elemental spirits that bank mana
//!   and cast spells, and enemies that attack on a timer
//! - Boards: stations snapped onto a grid, joined by A* roads, dressed with
//!   noise terrain and played as a property game
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI: battle / sweep / world       │
//! ├──────────────────┬──────────────────┤
//! │  battle + spell  │  world + board   │
//! ├──────────────────┴──────────────────┤
//! │        rng (ChaCha8, seeded)        │
//! └─────────────────────────────────────┘
//! ```

pub mod battle;
pub mod board;
pub mod error;
pub mod rng;
pub mod spell;
pub mod world;

pub use error::{ConfigError, MapGenError, PurchaseError};
pub use rng::GameRng;

// Re-export the types most hosts need at crate root
pub use battle::{Battle, BattleEvent, BattleEvents, Element, LevelConfig, LevelOptions, Outcome, Pos};
pub use spell::{CastResult, SpellRegistry, SpellTarget};
pub use world::{GridPos, Station, TileGraph, World, WorldConfig, generate_world};
