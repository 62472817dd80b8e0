//! The battle orchestrator: player swaps, cascades, the enemy phase and
//! spell casting, one action at a time.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use super::element::Element;
use super::events::{BattleEvent, BattleEvents};
use super::grid::{ClearedCell, GravityMove, Language, MatchGrid, Pos};
use super::level::{LevelConfig, LevelOptions, LevelSetup};
use super::scoring::{MatchScore, calculate_match_score};
use super::state::{BattleState, EnemyHit, EnemyTarget, Outcome};
use super::terrain::TerrainGrid;
use super::words::{WordDeck, WordPair};
use crate::error::ConfigError;
use crate::rng::GameRng;
use crate::spell::{CastResult, SpellEffect, SpellManager, SpellRegistry, SpellTarget};

/// Mana a spirit earns per gem of its element matched.
pub const MANA_PER_GEM: u32 = 10;

/// Cascade steps resolved per action before the board is left as is.
const MAX_CASCADES: u32 = 64;

/// Why a swap was refused. Refused swaps cost nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapRejection {
    /// A cell is off the board.
    OutOfBounds,
    /// The cells do not share an edge.
    NotAdjacent,
    /// The battle is already decided.
    BattleOver,
}

/// One same-type group resolved in a cascade step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchGroup {
    /// Gem type.
    pub gem: u8,
    /// Matched cells.
    pub cells: Vec<Pos>,
    /// Score breakdown.
    pub score: MatchScore,
    /// Damage dealt with the score.
    pub hits: Vec<EnemyHit>,
    /// Mana credited to the matching spirit.
    pub mana: u32,
}

/// One round of match, clear and refill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CascadeStep {
    /// Cascade index, starting at 1.
    pub combo: u32,
    /// Groups scored this round.
    pub groups: Vec<MatchGroup>,
    /// Word pair crushed this round, if any.
    pub crushed: Option<WordPair>,
    /// Gravity log for animation.
    pub gravity: Vec<GravityMove>,
}

impl CascadeStep {
    /// Total score of the step.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.groups.iter().map(|g| g.score.total).sum()
    }
}

/// Result of a swap that went through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReport {
    /// Cascade rounds, empty if the swap made no match.
    pub steps: Vec<CascadeStep>,
    /// True if any enemy attacked in the enemy phase.
    pub enemy_attacked: bool,
    /// Outcome, if the move decided the battle.
    pub outcome: Option<Outcome>,
}

impl MoveReport {
    /// True if the swap made at least one match.
    #[must_use]
    pub fn matched(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Total score gained by the move.
    #[must_use]
    pub fn score(&self) -> u64 {
        self.steps.iter().map(|s| u64::from(s.score())).sum()
    }
}

/// What happened to a swap request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "swap", rename_all = "snake_case")]
pub enum SwapOutcome {
    /// Refused without consuming anything.
    Rejected {
        /// Why.
        reason: SwapRejection,
    },
    /// A move was spent.
    Played(MoveReport),
}

/// Result of a cast request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpellOutcome {
    /// What the spell engine reported.
    pub result: CastResult,
    /// Word pair crushed by the spell's own clearing, if any.
    pub crushed: Option<WordPair>,
    /// Gravity log after a clearing spell.
    pub gravity: Vec<GravityMove>,
    /// Cascades the spell set off.
    pub steps: Vec<CascadeStep>,
}

/// A running battle.
#[derive(Debug)]
pub struct Battle {
    state: BattleState,
    grid: MatchGrid,
    terrain: TerrainGrid,
    deck: WordDeck,
    spells: SpellManager,
    rng: GameRng,
}

impl Battle {
    /// Start a battle from a built level. Words are placed immediately.
    #[must_use]
    pub fn new(setup: LevelSetup, deck: WordDeck, rng: GameRng) -> Self {
        let LevelSetup { state, grid, terrain } = setup;
        let mut battle = Self {
            state,
            grid,
            terrain,
            deck,
            spells: SpellManager::new(),
            rng,
        };
        battle.grid.ensure_words(&mut battle.deck, &mut battle.rng);
        battle
    }

    /// Build a level and start it with a seeded RNG.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the level config is invalid.
    pub fn from_config(
        config: &LevelConfig,
        options: &LevelOptions,
        registry: &SpellRegistry,
        deck: WordDeck,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let mut rng = GameRng::new(seed);
        let setup = config.build(options, registry, &mut rng)?;
        Ok(Self::new(setup, deck, rng))
    }

    /// Route notifications to `events`.
    pub fn set_events(&mut self, events: Box<dyn BattleEvents>) {
        self.state.set_events(events);
    }

    /// Battle bookkeeping.
    #[must_use]
    pub const fn state(&self) -> &BattleState {
        &self.state
    }

    /// The board.
    #[must_use]
    pub const fn grid(&self) -> &MatchGrid {
        &self.grid
    }

    /// Terrain under the board.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// The word deck.
    #[must_use]
    pub const fn deck(&self) -> &WordDeck {
        &self.deck
    }

    /// Spirit whose spell waits for a target.
    #[must_use]
    pub const fn pending_spell(&self) -> Option<usize> {
        self.spells.pending()
    }

    /// The latched outcome, if decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.state.outcome()
    }

    /// Swap two cells and play out the consequences.
    ///
    /// A swap that makes no match is reverted but still costs the move.
    /// After the move the enemies act, then the win condition is checked.
    pub fn play_swap(&mut self, a: Pos, b: Pos) -> SwapOutcome {
        let reason = if self.state.is_over() {
            Some(SwapRejection::BattleOver)
        } else if !self.grid.in_bounds(a) || !self.grid.in_bounds(b) {
            Some(SwapRejection::OutOfBounds)
        } else if !a.is_adjacent(b) {
            Some(SwapRejection::NotAdjacent)
        } else {
            None
        };
        if let Some(reason) = reason {
            return SwapOutcome::Rejected { reason };
        }

        self.grid.swap(a, b);
        let steps = if self.grid.find_matches().is_empty() {
            self.grid.swap(a, b);
            Vec::new()
        } else {
            self.resolve_cascades()
        };
        // Spent after resolution so the move's own damage can still win.
        self.state.spend_move();

        let enemy_attacked = !self.state.is_over() && self.state.process_enemy_turns();
        self.state.check_win_condition();
        SwapOutcome::Played(MoveReport {
            steps,
            enemy_attacked,
            outcome: self.state.outcome(),
        })
    }

    /// Let time pass in time mode. Returns the outcome if time ran out.
    pub fn tick(&mut self, seconds: u32) -> Option<Outcome> {
        if !self.state.is_over() {
            self.state.tick(seconds);
            self.state.check_win_condition();
        }
        self.state.outcome()
    }

    /// Cast a spirit's spell, with a target if it needs one.
    ///
    /// Spells that change the board are followed by gravity, word repair
    /// and any cascades.
    pub fn cast_spell(&mut self, spirit: usize, target: Option<SpellTarget>) -> SpellOutcome {
        let result = self
            .spells
            .cast(&mut self.state, &mut self.grid, spirit, target, &mut self.rng);
        self.after_cast(result)
    }

    /// Resolve the pending spell with a target.
    pub fn complete_pending(&mut self, target: SpellTarget) -> SpellOutcome {
        let result = self
            .spells
            .complete_pending(&mut self.state, &mut self.grid, target, &mut self.rng);
        self.after_cast(result)
    }

    /// Drop the pending spell.
    pub fn cancel_pending(&mut self) -> Option<usize> {
        self.spells.cancel_pending()
    }

    fn after_cast(&mut self, result: CastResult) -> SpellOutcome {
        let mut outcome = SpellOutcome {
            result,
            crushed: None,
            gravity: Vec::new(),
            steps: Vec::new(),
        };
        let effect = match &outcome.result {
            CastResult::Cast(report) => report.effect.clone(),
            _ => return outcome,
        };
        match &effect {
            SpellEffect::Cleared { cells, .. } => {
                outcome.crushed = self.crush_words(cells);
                outcome.gravity = self.grid.apply_gravity(&mut self.rng);
                self.grid.ensure_words(&mut self.deck, &mut self.rng);
            }
            SpellEffect::Transformed { .. } | SpellEffect::Shuffled { .. } => {}
            _ => return outcome,
        }
        outcome.steps = self.resolve_cascades();
        outcome
    }

    /// Match, score, clear and refill until the board settles.
    fn resolve_cascades(&mut self) -> Vec<CascadeStep> {
        let mut steps = Vec::new();
        let mut combo = 1;
        loop {
            let matched = self.grid.find_matches();
            if matched.is_empty() {
                break;
            }
            if combo > MAX_CASCADES {
                debug!("cascade limit reached with {} cells matched", matched.len());
                break;
            }
            self.state.combo = combo;

            let mut by_gem: BTreeMap<u8, Vec<Pos>> = BTreeMap::new();
            for &pos in &matched {
                if let Some(gem) = self.grid.gem(pos) {
                    by_gem.entry(gem).or_default().push(pos);
                }
            }

            let mut groups = Vec::with_capacity(by_gem.len());
            for (gem, cells) in by_gem {
                groups.push(self.score_group(gem, cells, combo));
            }

            let cleared = self.grid.clear(&matched);
            let crushed = self.crush_words(&cleared);
            let gravity = self.grid.apply_gravity(&mut self.rng);
            self.grid.ensure_words(&mut self.deck, &mut self.rng);
            debug!("cascade {combo}: {} cells in {} groups", matched.len(), groups.len());
            steps.push(CascadeStep {
                combo,
                groups,
                crushed,
                gravity,
            });

            if self.state.is_over() {
                break;
            }
            combo += 1;
        }
        self.state.combo = 1;
        steps
    }

    fn score_group(&mut self, gem: u8, cells: Vec<Pos>, combo: u32) -> MatchGroup {
        let element = Element::from_gem(gem);
        let terrain = self.terrain.bonus_for(&self.grid, &cells);
        let score = calculate_match_score(cells.len(), terrain.matching, combo);
        self.state.score = self.state.score.saturating_add(u64::from(score.total));
        self.state.emit(&BattleEvent::GemMatch {
            gem,
            cells: cells.clone(),
            score: score.total,
            combo,
        });
        let hits = self.state.damage_enemy(score.total, element, EnemyTarget::Index(0));
        let earned = MANA_PER_GEM.saturating_mul(u32::try_from(cells.len()).unwrap_or(u32::MAX));
        let mana = self.state.gain_mana(element, earned);
        MatchGroup {
            gem,
            cells,
            score,
            hits,
            mana,
        }
    }

    /// Crush the current pair if its Chinese word was among the cleared cells.
    fn crush_words(&mut self, cleared: &[ClearedCell]) -> Option<WordPair> {
        let current = self.deck.current()?.cn.clone();
        let hit = cleared
            .iter()
            .filter_map(|c| c.word.as_ref())
            .any(|w| w.lang == Language::Cn && w.word == current);
        if !hit {
            return None;
        }
        let pair = self.deck.advance(&mut self.rng)?;
        debug!("word pair {} / {} crushed", pair.cn, pair.en);
        self.state.emit(&BattleEvent::WordMatch { pair: pair.clone() });
        Some(pair)
    }

    /// The adjacent swap that matches the most cells, if any matches at all.
    ///
    /// Ties go to the first swap in row-major order, rightward before
    /// downward.
    #[must_use]
    pub fn suggest_swap(&self) -> Option<(Pos, Pos)> {
        let mut probe = self.grid.clone();
        let mut best: Option<((Pos, Pos), usize)> = None;
        for a in self.grid.positions() {
            for b in [Pos::new(a.r, a.c + 1), Pos::new(a.r + 1, a.c)] {
                if !probe.in_bounds(b) {
                    continue;
                }
                probe.swap(a, b);
                let found = probe.find_matches().len();
                probe.swap(a, b);
                if found > 0 && best.is_none_or(|(_, n)| found > n) {
                    best = Some(((a, b), found));
                }
            }
        }
        best.map(|(swap, _)| swap)
    }
}
