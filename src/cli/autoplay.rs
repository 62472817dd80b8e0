//! A simple greedy player used by `battle` and `sweep`.

use gemrail::battle::{Battle, BattleMode, Outcome, Pos, Spirit, SwapOutcome};
use gemrail::spell::{CastResult, SpellTarget, TargetKind};
use serde::Serialize;

/// Seconds the clock runs per swap in time mode.
const SECONDS_PER_SWAP: u32 = 3;

/// What the player did and how it ended.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub(crate) struct PlaySummary {
    /// Final outcome, if decided.
    pub(crate) outcome: Option<Outcome>,
    /// Final score.
    pub(crate) score: u64,
    /// Swaps played.
    pub(crate) swaps: u32,
    /// Swaps that made no match.
    pub(crate) misses: u32,
    /// Spells cast.
    pub(crate) casts: u32,
    /// Cascade steps resolved.
    pub(crate) cascades: u32,
    /// Word pairs crushed.
    pub(crate) words: u32,
    /// Player HP left.
    pub(crate) player_hp: u32,
}

/// Play until the battle is decided or `max_actions` run out.
///
/// Each action casts the first ready spell, or else plays the swap the
/// battle suggests, or else a blind swap in the top-left corner.
pub(crate) fn play(battle: &mut Battle, max_actions: u32) -> PlaySummary {
    let mut summary = PlaySummary::default();
    for _ in 0..max_actions {
        if battle.outcome().is_some() {
            break;
        }
        if try_cast(battle, &mut summary) {
            continue;
        }
        let (a, b) = battle.suggest_swap().unwrap_or((Pos::new(0, 0), Pos::new(0, 1)));
        match battle.play_swap(a, b) {
            SwapOutcome::Played(report) => {
                summary.swaps += 1;
                if !report.matched() {
                    summary.misses += 1;
                }
                summary.cascades += u32::try_from(report.steps.len()).unwrap_or(u32::MAX);
                summary.words += u32::try_from(report.steps.iter().filter(|s| s.crushed.is_some()).count())
                    .unwrap_or(u32::MAX);
            }
            SwapOutcome::Rejected { reason } => {
                log::debug!("swap rejected: {reason:?}");
                break;
            }
        }
        if battle.state().mode == BattleMode::Time {
            battle.tick(SECONDS_PER_SWAP);
        }
    }
    summary.outcome = battle.outcome();
    summary.score = battle.state().score;
    summary.player_hp = battle.state().player_hp;
    summary
}

fn try_cast(battle: &mut Battle, summary: &mut PlaySummary) -> bool {
    let Some(spirit) = battle.state().spirits().iter().position(Spirit::can_cast) else {
        return false;
    };
    let mut outcome = battle.cast_spell(spirit, None);
    if let CastResult::NeedsSelection { target, .. } = outcome.result {
        let Some(choice) = pick_target(battle, target) else {
            battle.cancel_pending();
            return false;
        };
        outcome = battle.complete_pending(choice);
    }
    if outcome.result.success() {
        summary.casts += 1;
        summary.cascades += u32::try_from(outcome.steps.len()).unwrap_or(u32::MAX);
        summary.words += u32::from(outcome.crushed.is_some());
        true
    } else {
        log::debug!("cast by spirit {spirit} failed: {}", outcome.result.message());
        battle.cancel_pending();
        false
    }
}

fn pick_target(battle: &Battle, kind: TargetKind) -> Option<SpellTarget> {
    let grid = battle.grid();
    match kind {
        TargetKind::Auto => None,
        TargetKind::Enemy => battle.state().primary_target().map(SpellTarget::Enemy),
        TargetKind::Row => Some(SpellTarget::Row(grid.rows() / 2)),
        TargetKind::Column => Some(SpellTarget::Column(grid.cols() / 2)),
        TargetKind::Cell => Some(SpellTarget::Cell(Pos::new(grid.rows() / 2, grid.cols() / 2))),
    }
}
