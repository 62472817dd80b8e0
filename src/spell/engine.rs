//! Spell resolution.
//!
//! [`execute`] is a single dispatch over [`SpellKind`]. It checks the target,
//! applies the effect to the battle and the grid, and describes what
//! happened. It never touches the caster's mana; the manager does that.

use serde::Serialize;
use thiserror::Error;

use super::clear::component_score;
use super::kind::{Spell, SpellKind, SpellTarget, TargetKind, scale_by_mana};
use crate::battle::{
    BattleState, ClearedCell, Element, EnemyHit, EnemyTarget, MatchGrid, Pos, modified_damage,
};
use crate::rng::GameRng;

/// Enemy turns added by a shield, whatever its configured power.
pub const SHIELD_DELAY: i32 = 1;

/// The spirit casting a spell, as seen at cast time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caster {
    /// Spirit index in the roster.
    pub index: usize,
    /// Spirit element.
    pub element: Element,
    /// Mana banked at cast time.
    pub mana: u32,
}

/// Why a cast did not happen. Nothing was mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum CastRejection {
    /// No spirit at that index.
    #[error("no spirit at index {0}")]
    UnknownSpirit(usize),
    /// The spirit has no spell equipped.
    #[error("spirit has no spell equipped")]
    NoSpell,
    /// Mana is below the spell's threshold.
    #[error("not enough mana: {have}/{need}")]
    NotEnoughMana {
        /// Mana banked.
        have: u32,
        /// Threshold.
        need: u32,
    },
    /// The battle is already decided.
    #[error("the battle is over")]
    BattleOver,
    /// The chosen target is dead, out of range or the wrong shape.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    /// Nothing on the board or field for the spell to act on.
    #[error("no valid target")]
    NoTarget,
    /// A selection was supplied with no spell waiting for one.
    #[error("no spell is waiting for a target")]
    NoPendingSpell,
}

/// What a successful spell did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SpellEffect {
    /// Direct damage to enemies.
    Damage {
        /// Damage per enemy hit.
        hits: Vec<EnemyHit>,
    },
    /// Cells cleared; their score was dealt as damage.
    Cleared {
        /// Removed cells.
        cells: Vec<ClearedCell>,
        /// Mana-scaled score passed on as damage.
        score: u32,
        /// Damage per enemy hit.
        hits: Vec<EnemyHit>,
    },
    /// Player healed.
    Healed {
        /// HP the spell tried to restore.
        requested: u32,
        /// HP actually restored.
        healed: u32,
    },
    /// Enemy attacks delayed.
    Delayed {
        /// Turns added per enemy.
        turns: i32,
        /// Enemies affected.
        enemies: usize,
    },
    /// Gems recolored.
    Transformed {
        /// Recolored cells.
        cells: Vec<Pos>,
        /// New gem type.
        gem: u8,
    },
    /// Gem types permuted.
    Shuffled {
        /// Filled cells involved.
        cells: usize,
    },
}

impl SpellEffect {
    /// True if the grid has holes that gravity must fill.
    #[must_use]
    pub const fn requires_gravity(&self) -> bool {
        matches!(self, SpellEffect::Cleared { .. })
    }

    /// Total enemy damage dealt.
    #[must_use]
    pub fn total_damage(&self) -> u32 {
        match self {
            SpellEffect::Damage { hits } | SpellEffect::Cleared { hits, .. } => {
                hits.iter().map(|h| h.amount).sum()
            }
            _ => 0,
        }
    }
}

/// A resolved spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellReport {
    /// Spell id.
    pub spell: String,
    /// Casting spirit.
    pub spirit: usize,
    /// Summary for display.
    pub message: String,
    /// What happened.
    pub effect: SpellEffect,
}

/// Outcome of a cast request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CastResult {
    /// The spell resolved.
    Cast(SpellReport),
    /// The spell needs a target; call again with one.
    NeedsSelection {
        /// Casting spirit.
        spirit: usize,
        /// What to pick.
        target: TargetKind,
    },
    /// The cast was refused.
    Rejected(CastRejection),
}

impl CastResult {
    /// True if the spell resolved.
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, CastResult::Cast(_))
    }

    /// True if a target must be chosen first.
    #[must_use]
    pub const fn needs_selection(&self) -> bool {
        matches!(self, CastResult::NeedsSelection { .. })
    }

    /// Human readable summary.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            CastResult::Cast(report) => report.message.clone(),
            CastResult::NeedsSelection { target, .. } => target.prompt().to_string(),
            CastResult::Rejected(reason) => reason.to_string(),
        }
    }
}

fn invalid(msg: impl Into<String>) -> CastResult {
    CastResult::Rejected(CastRejection::InvalidTarget(msg.into()))
}

/// Resolve a spell.
///
/// Selection spells without a target return [`CastResult::NeedsSelection`]
/// and change nothing. Bad targets are rejected before any mutation.
pub fn execute(
    spell: &Spell,
    caster: Caster,
    target: Option<SpellTarget>,
    state: &mut BattleState,
    grid: &mut MatchGrid,
    rng: &mut GameRng,
) -> CastResult {
    let wanted = spell.target_kind();
    let target = match (wanted.needs_selection(), target) {
        (true, None) => {
            return CastResult::NeedsSelection {
                spirit: caster.index,
                target: wanted,
            };
        }
        (true, Some(t)) if !wanted.accepts(&t) => {
            return invalid(format!("{} expects a {wanted:?} target", spell.name));
        }
        (true, Some(t)) => Some(t),
        (false, _) => None,
    };

    let power = scale_by_mana(spell.base_power, caster.mana);
    let effect = match (spell.kind, target) {
        (SpellKind::SingleTarget, _) => {
            if state.primary_target().is_none() {
                return CastResult::Rejected(CastRejection::NoTarget);
            }
            let hits = state.damage_enemy(power, spell.element, EnemyTarget::Index(0));
            SpellEffect::Damage { hits }
        }
        (SpellKind::AllTargets, _) => {
            let living = state.living_enemies();
            if living.is_empty() {
                return CastResult::Rejected(CastRejection::NoTarget);
            }
            let mut hits = Vec::with_capacity(living.len());
            for i in living {
                let dealt = modified_damage(power, spell.element, state.enemies[i].element);
                hits.extend(state.strike_enemy(i, dealt));
            }
            state.check_win_condition();
            SpellEffect::Damage { hits }
        }
        (SpellKind::SelectEnemy, Some(SpellTarget::Enemy(i))) => {
            let Some(enemy) = state.enemies.get(i).filter(|e| e.is_alive()) else {
                return invalid(format!("enemy {i} is not a living enemy"));
            };
            let dealt = modified_damage(power, spell.element, enemy.element);
            let hits: Vec<EnemyHit> = state.strike_enemy(i, dealt).into_iter().collect();
            state.check_win_condition();
            SpellEffect::Damage { hits }
        }
        (SpellKind::SelectRow, Some(SpellTarget::Row(r))) => {
            if r >= grid.rows() {
                return invalid(format!("row {r} is off the board"));
            }
            let cells: Vec<Pos> = (0..grid.cols()).map(|c| Pos::new(r, c)).collect();
            clear_and_strike(&cells, spell, caster, state, grid)
        }
        (SpellKind::SelectColumn, Some(SpellTarget::Column(c))) => {
            if c >= grid.cols() {
                return invalid(format!("column {c} is off the board"));
            }
            let cells: Vec<Pos> = (0..grid.rows()).map(|r| Pos::new(r, c)).collect();
            clear_and_strike(&cells, spell, caster, state, grid)
        }
        (SpellKind::SelectArea, Some(SpellTarget::Cell(center))) => {
            if !grid.in_bounds(center) {
                return invalid(format!("cell ({}, {}) is off the board", center.r, center.c));
            }
            let cells: Vec<Pos> = grid
                .positions()
                .filter(|p| p.chebyshev(center) <= 1)
                .collect();
            clear_and_strike(&cells, spell, caster, state, grid)
        }
        (SpellKind::Heal, _) => {
            let healed = state.heal_player(power);
            SpellEffect::Healed {
                requested: power,
                healed,
            }
        }
        (SpellKind::Shield, _) => SpellEffect::Delayed {
            turns: SHIELD_DELAY,
            enemies: state.delay_enemies(SHIELD_DELAY),
        },
        (SpellKind::Transform, _) => {
            let element = if caster.element == Element::None { spell.element } else { caster.element };
            let Some(gem) = element.gem().filter(|&g| g < grid.gem_types()) else {
                return CastResult::Rejected(CastRejection::NoTarget);
            };
            let mut candidates: Vec<Pos> = grid
                .positions()
                .filter(|&p| grid.gem(p).is_some_and(|g| g != gem))
                .collect();
            if candidates.is_empty() {
                return CastResult::Rejected(CastRejection::NoTarget);
            }
            let count = usize::try_from(power.max(1)).unwrap_or(usize::MAX);
            rng.shuffle(&mut candidates);
            candidates.truncate(count);
            for &p in &candidates {
                grid.set_gem(p, Some(gem));
            }
            SpellEffect::Transformed { cells: candidates, gem }
        }
        (SpellKind::Shuffle, _) => {
            let filled: Vec<Pos> = grid.positions().filter(|&p| grid.gem(p).is_some()).collect();
            let mut values: Vec<Option<u8>> = filled.iter().map(|&p| grid.gem(p)).collect();
            rng.shuffle(&mut values);
            for (&p, v) in filled.iter().zip(values) {
                grid.set_gem(p, v);
            }
            SpellEffect::Shuffled { cells: filled.len() }
        }
        (SpellKind::PurgeRarest, _) => {
            let Some(rarest) = rarest_gem(grid) else {
                return CastResult::Rejected(CastRejection::NoTarget);
            };
            let cells: Vec<Pos> = grid
                .positions()
                .filter(|&p| grid.gem(p) == Some(rarest))
                .collect();
            clear_and_strike(&cells, spell, caster, state, grid)
        }
        (kind, _) => return invalid(format!("{kind:?} cannot use that target")),
    };

    let message = describe(spell, &effect);
    CastResult::Cast(SpellReport {
        spell: spell.id.clone(),
        spirit: caster.index,
        message,
        effect,
    })
}

/// Clear cells and deal their mana-scaled component score to the enemies.
fn clear_and_strike(
    cells: &[Pos],
    spell: &Spell,
    caster: Caster,
    state: &mut BattleState,
    grid: &mut MatchGrid,
) -> SpellEffect {
    let cleared = grid.clear(cells);
    let score = scale_by_mana(component_score(&cleared), caster.mana);
    let hits = state.damage_enemy(score, spell.element, EnemyTarget::Index(0));
    SpellEffect::Cleared {
        cells: cleared,
        score,
        hits,
    }
}

/// The gem type with the fewest cells on the board.
///
/// Ties go to the type met first scanning row by row.
fn rarest_gem(grid: &MatchGrid) -> Option<u8> {
    let counts = grid.count_by_type();
    let mut order: Vec<u8> = Vec::new();
    for p in grid.positions() {
        if let Some(g) = grid.gem(p)
            && !order.contains(&g)
        {
            order.push(g);
        }
    }
    let count = |g: u8| counts.get(usize::from(g)).copied().unwrap_or(0);
    let mut best: Option<u8> = None;
    for g in order {
        match best {
            Some(b) if count(b) <= count(g) => {}
            _ => best = Some(g),
        }
    }
    best
}

fn describe(spell: &Spell, effect: &SpellEffect) -> String {
    match effect {
        SpellEffect::Damage { .. } => format!("{} dealt {} damage", spell.name, effect.total_damage()),
        SpellEffect::Cleared { cells, .. } => format!(
            "{} cleared {} gems for {} damage",
            spell.name,
            cells.len(),
            effect.total_damage()
        ),
        SpellEffect::Healed { healed, .. } => format!("{} restored {healed} HP", spell.name),
        SpellEffect::Delayed { turns, enemies } => {
            format!("{} delayed {enemies} enemies by {turns} turn", spell.name)
        }
        SpellEffect::Transformed { cells, .. } => format!("{} transformed {} gems", spell.name, cells.len()),
        SpellEffect::Shuffled { cells } => format!("{} shuffled {cells} gems", spell.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{BattleMode, Enemy};

    fn spell(kind: SpellKind, base_power: u32) -> Spell {
        Spell {
            id: format!("{kind:?}"),
            name: format!("{kind:?}"),
            kind,
            element: Element::Forge,
            base_power,
            mana_cost: 100,
        }
    }

    fn caster(mana: u32) -> Caster {
        Caster {
            index: 0,
            element: Element::Forge,
            mana,
        }
    }

    fn enemy(hp: u32, element: Element, is_boss: bool) -> Enemy {
        Enemy {
            name: "e".to_string(),
            hp,
            max_hp: hp,
            attack: 100,
            element,
            turn: 3,
            max_turn: 3,
            is_boss,
            defense: 0,
        }
    }

    fn setup() -> (BattleState, MatchGrid, GameRng) {
        let mut state = BattleState::new(1, BattleMode::Moves);
        state.moves_left = 10;
        state.enemies = vec![
            enemy(2000, Element::Sol, false),
            enemy(2000, Element::Tide, true),
            enemy(2000, Element::Life, false),
        ];
        let rows: Vec<Vec<Option<u8>>> = (0..4)
            .map(|r| (0..4).map(|c| Some(((r + c) % 3) as u8)).collect())
            .collect();
        (state, MatchGrid::from_rows(&rows, 6), GameRng::new(1))
    }

    #[test]
    fn test_single_target_ignores_selection_and_hits_boss() {
        let (mut state, mut grid, mut rng) = setup();
        let s = spell(SpellKind::SingleTarget, 200);
        let result = execute(&s, caster(250), Some(SpellTarget::Enemy(2)), &mut state, &mut grid, &mut rng);
        assert!(result.success());
        // 200 * 2.5 = 500, Tide suppresses Forge so 0.85x
        assert_eq!(state.enemies[1].hp, 2000 - 425);
        assert_eq!(state.enemies[2].hp, 2000);
    }

    #[test]
    fn test_all_targets_full_damage_each() {
        let (mut state, mut grid, mut rng) = setup();
        let s = spell(SpellKind::AllTargets, 120);
        execute(&s, caster(100), None, &mut state, &mut grid, &mut rng);
        assert_eq!(state.enemies[0].hp, 2000 - 120);
        assert_eq!(state.enemies[1].hp, 2000 - 102);
        // Forge suppresses Life
        assert_eq!(state.enemies[2].hp, 2000 - 138);
    }

    #[test]
    fn test_select_enemy_rejects_dead_and_out_of_range() {
        let (mut state, mut grid, mut rng) = setup();
        state.enemies[0].hp = 0;
        let s = spell(SpellKind::SelectEnemy, 300);
        let dead = execute(&s, caster(100), Some(SpellTarget::Enemy(0)), &mut state, &mut grid, &mut rng);
        assert!(matches!(dead, CastResult::Rejected(CastRejection::InvalidTarget(_))));
        let oob = execute(&s, caster(100), Some(SpellTarget::Enemy(9)), &mut state, &mut grid, &mut rng);
        assert!(!oob.success());
        let ok = execute(&s, caster(100), Some(SpellTarget::Enemy(2)), &mut state, &mut grid, &mut rng);
        assert!(ok.success());
        assert_eq!(state.enemies[2].hp, 2000 - 345);
    }

    #[test]
    fn test_row_needs_selection_without_mutation() {
        let (mut state, mut grid, mut rng) = setup();
        let before = grid.clone();
        let s = spell(SpellKind::SelectRow, 150);
        let result = execute(&s, caster(100), None, &mut state, &mut grid, &mut rng);
        assert!(result.needs_selection());
        assert_eq!(grid, before);
        assert!(state.enemies.iter().all(|e| e.hp == 2000));
    }

    #[test]
    fn test_row_clear_scores_components() {
        let (mut state, mut grid, mut rng) = setup();
        let s = spell(SpellKind::SelectRow, 150);
        let result = execute(&s, caster(200), Some(SpellTarget::Row(1)), &mut state, &mut grid, &mut rng);
        // Row 1 is 1,2,0,1: four loose gems = 80, times 2.0 mana = 160
        let CastResult::Cast(report) = result else { panic!("expected cast") };
        assert!(report.effect.requires_gravity());
        let SpellEffect::Cleared { cells, score, .. } = &report.effect else { panic!("expected clear") };
        assert_eq!(cells.len(), 4);
        assert_eq!(*score, 160);
        assert!((0..4).all(|c| grid.gem(Pos::new(1, c)).is_none()));
        assert!((0..4).all(|c| grid.gem(Pos::new(0, c)).is_some()));
        // Boss is Tide, which suppresses Forge
        assert_eq!(state.enemies[1].hp, 2000 - 136);
    }

    #[test]
    fn test_row_out_of_range_is_invalid() {
        let (mut state, mut grid, mut rng) = setup();
        let before = grid.clone();
        let s = spell(SpellKind::SelectRow, 150);
        let result = execute(&s, caster(100), Some(SpellTarget::Row(4)), &mut state, &mut grid, &mut rng);
        assert!(matches!(result, CastResult::Rejected(CastRejection::InvalidTarget(_))));
        assert_eq!(grid, before);
    }

    #[test]
    fn test_wrong_target_shape_is_invalid() {
        let (mut state, mut grid, mut rng) = setup();
        let s = spell(SpellKind::SelectColumn, 150);
        let result = execute(&s, caster(100), Some(SpellTarget::Row(0)), &mut state, &mut grid, &mut rng);
        assert!(matches!(result, CastResult::Rejected(CastRejection::InvalidTarget(_))));
    }

    #[test]
    fn test_area_clears_clipped_square() {
        let (mut state, mut grid, mut rng) = setup();
        let s = spell(SpellKind::SelectArea, 200);
        let result = execute(&s, caster(100), Some(SpellTarget::Cell(Pos::new(0, 0))), &mut state, &mut grid, &mut rng);
        let CastResult::Cast(report) = result else { panic!("expected cast") };
        let SpellEffect::Cleared { cells, .. } = &report.effect else { panic!("expected clear") };
        assert_eq!(cells.len(), 4);
        let result = execute(&s, caster(100), Some(SpellTarget::Cell(Pos::new(2, 2))), &mut state, &mut grid, &mut rng);
        let CastResult::Cast(report) = result else { panic!("expected cast") };
        let SpellEffect::Cleared { cells, .. } = &report.effect else { panic!("expected clear") };
        // (1,1) was already empty
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn test_heal_reports_actual_amount() {
        let (mut state, mut grid, mut rng) = setup();
        state.player_hp = 900;
        let s = spell(SpellKind::Heal, 300);
        let result = execute(&s, caster(100), None, &mut state, &mut grid, &mut rng);
        let CastResult::Cast(report) = result else { panic!("expected cast") };
        assert_eq!(report.effect, SpellEffect::Healed { requested: 300, healed: 100 });
    }

    #[test]
    fn test_shield_adds_one_turn_regardless_of_power() {
        let (mut state, mut grid, mut rng) = setup();
        state.enemies[0].hp = 0;
        let s = spell(SpellKind::Shield, 2);
        execute(&s, caster(300), None, &mut state, &mut grid, &mut rng);
        assert_eq!(state.enemies[0].turn, 3);
        assert_eq!(state.enemies[1].turn, 4);
        assert_eq!(state.enemies[2].turn, 4);
    }

    #[test]
    fn test_transform_recolors_to_caster() {
        let (mut state, mut grid, mut rng) = setup();
        let before = grid.count_by_type()[0];
        let s = spell(SpellKind::Transform, 5);
        let result = execute(&s, caster(100), None, &mut state, &mut grid, &mut rng);
        let CastResult::Cast(report) = result else { panic!("expected cast") };
        let SpellEffect::Transformed { cells, gem } = &report.effect else { panic!("expected transform") };
        assert_eq!(*gem, 0);
        assert_eq!(cells.len(), 5);
        assert_eq!(grid.count_by_type()[0], before + 5);
    }

    #[test]
    fn test_transform_minimum_one() {
        let (mut state, mut grid, mut rng) = setup();
        let s = spell(SpellKind::Transform, 5);
        let result = execute(&s, caster(10), None, &mut state, &mut grid, &mut rng);
        let CastResult::Cast(report) = result else { panic!("expected cast") };
        let SpellEffect::Transformed { cells, .. } = &report.effect else { panic!("expected transform") };
        assert_eq!(cells.len(), 1);
    }

    #[test]
    fn test_shuffle_preserves_counts_and_holes() {
        let (mut state, mut grid, mut rng) = setup();
        grid.set_gem(Pos::new(3, 3), None);
        let before = grid.count_by_type();
        let s = spell(SpellKind::Shuffle, 0);
        execute(&s, caster(100), None, &mut state, &mut grid, &mut rng);
        assert_eq!(grid.count_by_type(), before);
        assert!(grid.gem(Pos::new(3, 3)).is_none());
    }

    #[test]
    fn test_purge_rarest_tie_breaks_by_scan_order() {
        let (mut state, mut grid, mut rng) = setup();
        // Counts: 0 -> 6, 1 -> 5, 2 -> 5; type 1 appears first at (0,1)
        let s = spell(SpellKind::PurgeRarest, 100);
        let result = execute(&s, caster(100), None, &mut state, &mut grid, &mut rng);
        assert!(result.success());
        assert_eq!(grid.count_by_type()[1], 0);
        assert_eq!(grid.count_by_type()[2], 5);
    }
}
