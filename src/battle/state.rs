//! Enemies, spirits and the player's battle resources.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::element::{Element, modified_damage};
use super::events::{BattleEvent, BattleEvents, NullEvents};
use crate::error::ConfigError;
use crate::spell::Spell;

/// Most spirits a roster may bring into battle.
pub const MAX_SPIRITS_IN_BATTLE: usize = 5;

/// How the player's budget is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    /// A fixed number of swaps.
    #[default]
    Moves,
    /// A countdown in seconds.
    Time,
}

/// Who a damage call is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyTarget {
    /// Divide the amount evenly among living enemies.
    Split,
    /// A requested index. Advisory only: the living boss, or else the first
    /// living enemy, always takes the hit.
    Index(usize),
}

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// All enemies defeated.
    Victory,
    /// Player HP reached zero.
    PlayerDefeated,
    /// Move budget exhausted.
    OutOfMoves,
    /// Time budget exhausted.
    OutOfTime,
}

impl Outcome {
    /// True for a win.
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Outcome::Victory)
    }
}

/// An opponent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enemy {
    /// Display name.
    pub name: String,
    /// Current HP, never below 0.
    pub hp: u32,
    /// Starting HP.
    pub max_hp: u32,
    /// Damage per attack before modifiers.
    pub attack: u32,
    /// Elemental affinity.
    pub element: Element,
    /// Ticks until the next attack.
    pub turn: i32,
    /// Value `turn` resets to after attacking.
    pub max_turn: i32,
    /// Boss enemies absorb single-target damage first.
    pub is_boss: bool,
    /// Defense rating, carried for display.
    pub defense: u32,
}

impl Enemy {
    /// True while HP is above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// A player companion that banks mana from matches and casts a spell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spirit {
    /// Display name.
    pub name: String,
    /// Elemental affinity; at most one spirit per element.
    pub element: Element,
    /// Banked mana. Casting spends all of it.
    pub mana: u32,
    /// Mana cap for earning.
    pub max_mana: u32,
    /// Base damage rating, carried for display.
    pub damage: u32,
    /// Defense rating, carried for display.
    pub defense: u32,
    /// Equipped spell, if any.
    pub spell: Option<Spell>,
}

impl Spirit {
    /// A fresh spirit with no mana and no spell.
    #[must_use]
    pub fn new(element: Element, max_mana: u32, damage: u32) -> Self {
        Self {
            name: format!("{} Spirit", element.name()),
            element,
            mana: 0,
            max_mana,
            damage,
            defense: 0,
            spell: None,
        }
    }

    /// Add mana up to the cap. Returns the amount actually gained.
    pub fn gain_mana(&mut self, amount: u32) -> u32 {
        let before = self.mana;
        self.mana = self.mana.saturating_add(amount).min(self.max_mana.max(before));
        self.mana - before
    }

    /// True if the equipped spell's threshold is met.
    #[must_use]
    pub fn can_cast(&self) -> bool {
        self.spell.as_ref().is_some_and(|s| self.mana >= s.mana_cost)
    }
}

/// Damage dealt to one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnemyHit {
    /// Enemy index.
    pub index: usize,
    /// HP removed.
    pub amount: u32,
}

/// Enemy, spirit and player bookkeeping for one battle.
///
/// Terminal states go through a one-shot latch: the first time the battle
/// is decided, the outcome is stored and exactly one terminal event fires.
#[derive(Debug)]
pub struct BattleState {
    /// Level number.
    pub level: u32,
    /// Budget mode.
    pub mode: BattleMode,
    /// Opponents.
    pub enemies: Vec<Enemy>,
    /// Player HP, never above `player_max_hp`.
    pub player_hp: u32,
    /// Player HP cap.
    pub player_max_hp: u32,
    /// Player defense rating, carried for display.
    pub player_defense: u32,
    /// Swaps remaining in moves mode.
    pub moves_left: u32,
    /// Seconds remaining in time mode.
    pub time_left: u32,
    /// Accumulated match score.
    pub score: u64,
    /// Current cascade index, starting at 1.
    pub combo: u32,
    spirits: Vec<Spirit>,
    outcome: Option<Outcome>,
    events: Box<dyn BattleEvents>,
}

impl BattleState {
    /// A battle with no enemies or spirits and a 1000 HP player.
    #[must_use]
    pub fn new(level: u32, mode: BattleMode) -> Self {
        Self {
            level,
            mode,
            enemies: Vec::new(),
            player_hp: 1000,
            player_max_hp: 1000,
            player_defense: 0,
            moves_left: 0,
            time_left: 0,
            score: 0,
            combo: 1,
            spirits: Vec::new(),
            outcome: None,
            events: Box::new(NullEvents),
        }
    }

    /// Route notifications to `events`.
    pub fn set_events(&mut self, events: Box<dyn BattleEvents>) {
        self.events = events;
    }

    pub(crate) fn emit(&mut self, event: &BattleEvent) {
        self.events.notify(event);
    }

    /// The spirit roster.
    #[must_use]
    pub fn spirits(&self) -> &[Spirit] {
        &self.spirits
    }

    /// Mutable access to one spirit.
    pub fn spirit_mut(&mut self, index: usize) -> Option<&mut Spirit> {
        self.spirits.get_mut(index)
    }

    /// Mutable access to the whole roster, for spell equipping.
    pub fn spirits_mut(&mut self) -> &mut [Spirit] {
        &mut self.spirits
    }

    /// Replace the roster.
    ///
    /// # Errors
    ///
    /// Returns an error if there are more than [`MAX_SPIRITS_IN_BATTLE`]
    /// spirits, two share an element, or one has no element.
    pub fn set_spirits(&mut self, spirits: Vec<Spirit>) -> Result<(), ConfigError> {
        if spirits.len() > MAX_SPIRITS_IN_BATTLE {
            return Err(ConfigError::TooManySpirits {
                count: spirits.len(),
                max: MAX_SPIRITS_IN_BATTLE,
            });
        }
        for (i, s) in spirits.iter().enumerate() {
            if s.element == Element::None {
                return Err(ConfigError::UnknownElement(-1));
            }
            if spirits[..i].iter().any(|o| o.element == s.element) {
                return Err(ConfigError::DuplicateSpirit(s.element.name()));
            }
        }
        self.spirits = spirits;
        Ok(())
    }

    /// Index of the spirit with the given element.
    #[must_use]
    pub fn spirit_by_element(&self, element: Element) -> Option<usize> {
        self.spirits.iter().position(|s| s.element == element)
    }

    /// Credit mana to the spirit of `element`, if one is in the roster.
    pub fn gain_mana(&mut self, element: Element, amount: u32) -> u32 {
        match self.spirit_by_element(element) {
            Some(i) => self.spirits[i].gain_mana(amount),
            None => 0,
        }
    }

    /// The enemy single-target damage lands on: the living boss, else the
    /// first living enemy.
    #[must_use]
    pub fn primary_target(&self) -> Option<usize> {
        self.enemies
            .iter()
            .position(|e| e.is_boss && e.is_alive())
            .or_else(|| self.enemies.iter().position(Enemy::is_alive))
    }

    /// Indices of living enemies.
    #[must_use]
    pub fn living_enemies(&self) -> Vec<usize> {
        (0..self.enemies.len()).filter(|&i| self.enemies[i].is_alive()).collect()
    }

    /// Remove `amount` HP from one living enemy with no modifier applied.
    ///
    /// Does not check the win condition; callers do that once their whole
    /// effect has landed.
    pub fn strike_enemy(&mut self, index: usize, amount: u32) -> Option<EnemyHit> {
        let enemy = self.enemies.get_mut(index).filter(|e| e.is_alive())?;
        enemy.hp = enemy.hp.saturating_sub(amount);
        self.emit(&BattleEvent::EnemyDamaged { index, amount });
        Some(EnemyHit { index, amount })
    }

    /// Deal elemental damage to enemies, then check the win condition.
    pub fn damage_enemy(&mut self, amount: u32, attacker: Element, target: EnemyTarget) -> Vec<EnemyHit> {
        if self.enemies.is_empty() {
            return Vec::new();
        }
        let mut hits = Vec::new();
        match target {
            EnemyTarget::Split => {
                let alive = self.living_enemies();
                if alive.is_empty() {
                    return hits;
                }
                let share = amount / u32::try_from(alive.len()).unwrap_or(u32::MAX);
                for i in alive {
                    let dealt = modified_damage(share, attacker, self.enemies[i].element);
                    hits.extend(self.strike_enemy(i, dealt));
                }
            }
            EnemyTarget::Index(_) => {
                if let Some(i) = self.primary_target() {
                    let dealt = modified_damage(amount, attacker, self.enemies[i].element);
                    hits.extend(self.strike_enemy(i, dealt));
                }
            }
        }
        self.check_win_condition();
        hits
    }

    /// Advance every living enemy's attack timer.
    ///
    /// Enemies whose timer runs out attack the player and reset. Returns
    /// true if anyone attacked.
    pub fn process_enemy_turns(&mut self) -> bool {
        let mut attacked = false;
        for index in 0..self.enemies.len() {
            let enemy = &mut self.enemies[index];
            if !enemy.is_alive() {
                continue;
            }
            enemy.turn -= 1;
            if enemy.turn <= 0 {
                let amount = modified_damage(enemy.attack, enemy.element, Element::None);
                enemy.turn = enemy.max_turn;
                self.player_hp = self.player_hp.saturating_sub(amount);
                attacked = true;
                debug!("enemy {index} hits player for {amount}");
                self.emit(&BattleEvent::PlayerDamaged { enemy: index, amount });
            }
        }
        if self.player_hp == 0 {
            self.finish(Outcome::PlayerDefeated);
        }
        attacked
    }

    /// Decide whether the battle is over.
    ///
    /// Checks, in order: all enemies dead, player dead, moves exhausted,
    /// time exhausted. Once decided, further calls return true without
    /// firing anything.
    pub fn check_win_condition(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        let decided = if self.enemies.iter().all(|e| !e.is_alive()) {
            Some(Outcome::Victory)
        } else if self.player_hp == 0 {
            Some(Outcome::PlayerDefeated)
        } else if self.mode == BattleMode::Moves && self.moves_left == 0 {
            Some(Outcome::OutOfMoves)
        } else if self.mode == BattleMode::Time && self.time_left == 0 {
            Some(Outcome::OutOfTime)
        } else {
            None
        };
        match decided {
            Some(outcome) => {
                self.finish(outcome);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        if self.outcome.is_some() {
            return;
        }
        info!("level {} finished: {outcome:?}", self.level);
        self.outcome = Some(outcome);
        let event = if outcome.is_victory() {
            BattleEvent::LevelComplete
        } else {
            BattleEvent::GameOver
        };
        self.emit(&event);
    }

    /// The latched outcome, if the battle is decided.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// True once the battle is decided.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// Use one move in moves mode.
    pub fn spend_move(&mut self) {
        if self.mode == BattleMode::Moves {
            self.moves_left = self.moves_left.saturating_sub(1);
        }
    }

    /// Let time pass in time mode.
    pub fn tick(&mut self, seconds: u32) {
        if self.mode == BattleMode::Time {
            self.time_left = self.time_left.saturating_sub(seconds);
        }
    }

    /// Restore player HP up to the cap. Returns the amount restored.
    pub fn heal_player(&mut self, amount: u32) -> u32 {
        let before = self.player_hp;
        self.player_hp = self.player_hp.saturating_add(amount).min(self.player_max_hp);
        self.player_hp.saturating_sub(before)
    }

    /// Push back every living enemy's attack timer. Returns how many moved.
    pub fn delay_enemies(&mut self, turns: i32) -> usize {
        let mut affected = 0;
        for enemy in self.enemies.iter_mut().filter(|e| e.is_alive()) {
            enemy.turn = enemy.turn.saturating_add(turns);
            affected += 1;
        }
        affected
    }
}
