//! Error types for initialization and board actions.
//!
//! Only setup can fail with an `Err`: malformed level configs and invalid
//! world settings are rejected before any player-visible state exists.
//! In-play failures (bad spell targets, rejected swaps) are ordinary values.

use thiserror::Error;

/// Errors raised while building a battle from a level config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config text is not valid JSON for a level.
    #[error("invalid level config: {0}")]
    Json(#[from] serde_json::Error),

    /// A config or word-list file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Grid dimensions or gem type count are unusable.
    #[error("invalid grid dimensions {rows}x{cols} with {gem_types} gem types")]
    Dimensions {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
        /// Requested gem type count.
        gem_types: u8,
    },

    /// A supplied grid (gems or terrain) does not match the board size.
    #[error("{which} grid is {got_rows}x{got_cols}, expected {rows}x{cols}")]
    GridShape {
        /// Which grid was malformed (`"gem"` or `"terrain"`).
        which: &'static str,
        /// Expected rows.
        rows: usize,
        /// Expected columns.
        cols: usize,
        /// Actual rows.
        got_rows: usize,
        /// Actual columns of the first offending row.
        got_cols: usize,
    },

    /// A gem value is outside `0..gem_types`.
    #[error("gem value {value} at ({row}, {col}) is outside 0..{gem_types}")]
    GemOutOfRange {
        /// Row of the offending cell.
        row: usize,
        /// Column of the offending cell.
        col: usize,
        /// Offending value.
        value: u8,
        /// Number of gem types in play.
        gem_types: u8,
    },

    /// An element id is not one of the six elements.
    #[error("unknown element id {0}")]
    UnknownElement(i64),

    /// Two spirits share an element.
    #[error("duplicate spirit for element {0}")]
    DuplicateSpirit(&'static str),

    /// More spirits than a roster allows.
    #[error("too many spirits: {count} (max {max})")]
    TooManySpirits {
        /// Spirits supplied.
        count: usize,
        /// Roster limit.
        max: usize,
    },

    /// A spell id is not in the registry.
    #[error("unknown spell '{0}'")]
    UnknownSpell(String),
}

/// Errors raised by world generation settings.
#[derive(Debug, Error)]
pub enum MapGenError {
    /// Projection scale must be finite and positive.
    #[error("invalid projection scale {0}")]
    Scale(f64),

    /// Terrain seeding radius must be positive.
    #[error("render radius must be positive, got {0}")]
    RenderRadius(i32),

    /// Special tile probability must be within `[0, 1]`.
    #[error("special tile chance {0} is outside [0, 1]")]
    SpecialChance(f64),

    /// The station list could not be parsed.
    #[error("invalid station list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by property and building purchases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// The property already has an owner.
    #[error("property {0} is already owned")]
    AlreadyOwned(String),

    /// The station already carries this building tier.
    #[error("building tier {0} already built here")]
    AlreadyBuilt(usize),

    /// The building tier does not exist.
    #[error("unknown building tier {0}")]
    UnknownTier(usize),

    /// The tile is not a station.
    #[error("tile {0} is not a station")]
    NotAStation(usize),

    /// The station belongs to another player.
    #[error("station is owned by player {0}")]
    OwnedByOther(u8),

    /// The player cannot afford the purchase.
    #[error("insufficient funds: need {need}, have {have}")]
    InsufficientFunds {
        /// Price of the purchase.
        need: i64,
        /// Money the player holds, negative when in debt.
        have: i64,
    },
}
