//! Spirit spells.
//!
//! - `kind`: the eleven spell behaviors and what each needs targeted
//! - `engine`: resolving a cast against the battle and the grid
//! - `registry`: the spell catalogue and the casting gatekeeper

mod clear;
mod engine;
mod kind;
mod registry;

pub use clear::{LOOSE_GEM_SCORE, component_score};
pub use engine::{CastRejection, CastResult, Caster, SHIELD_DELAY, SpellEffect, SpellReport, execute};
pub use kind::{Spell, SpellKind, SpellTarget, TargetKind, mana_multiplier, scale_by_mana};
pub use registry::{SpellManager, SpellRegistry, SpellTemplate};
