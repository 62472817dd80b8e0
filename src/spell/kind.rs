//! Spell variants and their targets.

use serde::{Deserialize, Serialize};

use crate::battle::{Element, Pos};

/// The eleven spell behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellKind {
    /// Hits the living boss, else the first living enemy.
    SingleTarget,
    /// Hits every living enemy for full damage.
    AllTargets,
    /// Hits an enemy the player picks.
    SelectEnemy,
    /// Clears a row the player picks.
    SelectRow,
    /// Clears a column the player picks.
    SelectColumn,
    /// Clears the 3x3 area around a cell the player picks.
    SelectArea,
    /// Restores player HP.
    Heal,
    /// Delays every living enemy's next attack.
    Shield,
    /// Recolors random gems to the caster's element.
    Transform,
    /// Permutes gem types among filled cells.
    Shuffle,
    /// Clears every gem of the rarest type.
    PurgeRarest,
}

/// What a spell needs from the player before it can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Resolves on its own.
    Auto,
    /// An enemy index.
    Enemy,
    /// A row index.
    Row,
    /// A column index.
    Column,
    /// A grid cell.
    Cell,
}

/// A player-chosen target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellTarget {
    /// An enemy index.
    Enemy(usize),
    /// A row index.
    Row(usize),
    /// A column index.
    Column(usize),
    /// A grid cell.
    Cell(Pos),
}

impl SpellKind {
    /// Every variant.
    pub const ALL: [SpellKind; 11] = [
        SpellKind::SingleTarget,
        SpellKind::AllTargets,
        SpellKind::SelectEnemy,
        SpellKind::SelectRow,
        SpellKind::SelectColumn,
        SpellKind::SelectArea,
        SpellKind::Heal,
        SpellKind::Shield,
        SpellKind::Transform,
        SpellKind::Shuffle,
        SpellKind::PurgeRarest,
    ];

    /// The target this variant needs.
    #[must_use]
    pub const fn target_kind(self) -> TargetKind {
        match self {
            SpellKind::SelectEnemy => TargetKind::Enemy,
            SpellKind::SelectRow => TargetKind::Row,
            SpellKind::SelectColumn => TargetKind::Column,
            SpellKind::SelectArea => TargetKind::Cell,
            _ => TargetKind::Auto,
        }
    }

    /// True for variants that empty grid cells and need gravity afterwards.
    #[must_use]
    pub const fn clears_grid(self) -> bool {
        matches!(
            self,
            SpellKind::SelectRow | SpellKind::SelectColumn | SpellKind::SelectArea | SpellKind::PurgeRarest
        )
    }
}

impl TargetKind {
    /// True if the player must pick something.
    #[must_use]
    pub const fn needs_selection(self) -> bool {
        !matches!(self, TargetKind::Auto)
    }

    /// Prompt shown while waiting for a selection.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            TargetKind::Auto => "",
            TargetKind::Enemy => "Select an enemy",
            TargetKind::Row => "Select a row",
            TargetKind::Column => "Select a column",
            TargetKind::Cell => "Select a cell",
        }
    }

    /// True if `target` is the right shape for this kind.
    #[must_use]
    pub const fn accepts(self, target: &SpellTarget) -> bool {
        matches!(
            (self, target),
            (TargetKind::Enemy, SpellTarget::Enemy(_))
                | (TargetKind::Row, SpellTarget::Row(_))
                | (TargetKind::Column, SpellTarget::Column(_))
                | (TargetKind::Cell, SpellTarget::Cell(_))
        )
    }
}

/// A configured spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Spell {
    /// Registry id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Behavior.
    pub kind: SpellKind,
    /// Element used for damage modifiers and transforms.
    pub element: Element,
    /// Power before mana scaling.
    pub base_power: u32,
    /// Minimum mana needed to cast. Casting spends all mana regardless.
    pub mana_cost: u32,
}

impl Spell {
    /// The target this spell needs.
    #[must_use]
    pub const fn target_kind(&self) -> TargetKind {
        self.kind.target_kind()
    }
}

/// Power scale from banked mana: 100 mana is 1.0x.
#[must_use]
pub fn mana_multiplier(mana: u32) -> f64 {
    f64::from(mana) / 100.0
}

/// Scale a power value by banked mana, flooring the result.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_by_mana(power: u32, mana: u32) -> u32 {
    (f64::from(power) * mana_multiplier(mana)).floor() as u32
}
