//! Spell catalogue and the casting manager.

use std::collections::BTreeSet;

use log::debug;

use super::engine::{CastRejection, CastResult, Caster, execute};
use super::kind::{Spell, SpellKind, SpellTarget};
use crate::battle::{BattleEvent, BattleState, Element, MatchGrid, Spirit};
use crate::rng::GameRng;

/// A registry entry: everything about a spell except its element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpellTemplate {
    /// Registry id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Behavior.
    pub kind: SpellKind,
    /// Power before mana scaling.
    pub base_power: u32,
    /// Minimum mana to cast.
    pub mana_cost: u32,
}

impl SpellTemplate {
    /// Create a template.
    #[must_use]
    pub fn new(id: &str, name: &str, kind: SpellKind, base_power: u32, mana_cost: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            base_power,
            mana_cost,
        }
    }

    /// Instantiate for a spirit of `element`.
    #[must_use]
    pub fn instantiate(&self, element: Element) -> Spell {
        Spell {
            id: self.id.clone(),
            name: self.name.clone(),
            kind: self.kind,
            element,
            base_power: self.base_power,
            mana_cost: self.mana_cost,
        }
    }
}

/// The spells available in a session.
///
/// Built once at session start and passed to whatever needs lookups.
#[derive(Debug, Clone, Default)]
pub struct SpellRegistry {
    templates: Vec<SpellTemplate>,
}

impl SpellRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in spell set.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for t in [
            SpellTemplate::new("fireball", "Fireball", SpellKind::SingleTarget, 200, 100),
            SpellTemplate::new("water_wave", "Water Wave", SpellKind::AllTargets, 120, 100),
            SpellTemplate::new("lightning_strike", "Lightning Strike", SpellKind::SelectEnemy, 300, 100),
            SpellTemplate::new("row_clear", "Row Clear", SpellKind::SelectRow, 150, 100),
            SpellTemplate::new("column_clear", "Column Clear", SpellKind::SelectColumn, 150, 100),
            SpellTemplate::new("area_blast", "Area Blast", SpellKind::SelectArea, 200, 100),
            SpellTemplate::new("heal", "Heal", SpellKind::Heal, 300, 100),
            SpellTemplate::new("shield", "Shield", SpellKind::Shield, 2, 100),
            SpellTemplate::new("transform", "Transform", SpellKind::Transform, 5, 100),
            SpellTemplate::new("shuffle", "Shuffle", SpellKind::Shuffle, 0, 100),
            SpellTemplate::new("purge_rarest", "Purge", SpellKind::PurgeRarest, 100, 100),
        ] {
            registry.register(t);
        }
        registry
    }

    /// Add a template, replacing any with the same id.
    pub fn register(&mut self, template: SpellTemplate) {
        match self.templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => *slot = template,
            None => self.templates.push(template),
        }
    }

    /// Look up a template.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&SpellTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Instantiate a spell by id for an element.
    #[must_use]
    pub fn create(&self, id: &str, element: Element) -> Option<Spell> {
        self.get(id).map(|t| t.instantiate(element))
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|t| t.id.as_str())
    }

    /// The signature spell of an element.
    #[must_use]
    pub fn default_for(&self, element: Element) -> Option<Spell> {
        let id = match element {
            Element::Forge => "fireball",
            Element::Tide => "water_wave",
            Element::Life => "heal",
            Element::Sol => "lightning_strike",
            Element::Stone => "row_clear",
            Element::Root => "column_clear",
            Element::None => return None,
        };
        self.create(id, element)
    }

    /// Give each spirit without a spell its element's signature spell.
    pub fn equip_defaults(&self, spirits: &mut [Spirit]) {
        for spirit in spirits.iter_mut().filter(|s| s.spell.is_none()) {
            spirit.spell = self.default_for(spirit.element);
        }
    }

    /// Give each spirit without a spell a random one.
    ///
    /// Spells already equipped are not repeated until every id is in use.
    pub fn equip_random(&self, spirits: &mut [Spirit], rng: &mut GameRng) {
        let mut ids: Vec<&str> = self.ids().collect();
        if ids.is_empty() {
            return;
        }
        rng.shuffle(&mut ids);
        let mut used: BTreeSet<String> = spirits
            .iter()
            .filter_map(|s| s.spell.as_ref().map(|sp| sp.id.clone()))
            .collect();
        for spirit in spirits.iter_mut().filter(|s| s.spell.is_none()) {
            let pick = ids
                .iter()
                .find(|id| !used.contains(**id))
                .or_else(|| rng.choose(&ids))
                .copied();
            if let Some(id) = pick {
                used.insert(id.to_string());
                spirit.spell = self.create(id, spirit.element);
            }
        }
    }
}

/// Gatekeeper for casting: checks thresholds, holds a spell waiting for a
/// target, and spends mana on success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpellManager {
    pending: Option<usize>,
}

impl SpellManager {
    /// A manager with nothing pending.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Spirit whose spell is waiting for a target.
    #[must_use]
    pub const fn pending(&self) -> Option<usize> {
        self.pending
    }

    /// Check whether a spirit may cast now.
    ///
    /// # Errors
    ///
    /// Returns the reason the cast would be refused.
    pub fn can_cast(state: &BattleState, spirit: usize) -> Result<(), CastRejection> {
        if state.is_over() {
            return Err(CastRejection::BattleOver);
        }
        let s = state.spirits().get(spirit).ok_or(CastRejection::UnknownSpirit(spirit))?;
        let spell = s.spell.as_ref().ok_or(CastRejection::NoSpell)?;
        if s.mana < spell.mana_cost {
            return Err(CastRejection::NotEnoughMana {
                have: s.mana,
                need: spell.mana_cost,
            });
        }
        Ok(())
    }

    /// Cast a spirit's spell.
    ///
    /// A selection spell cast without a target becomes pending. On success
    /// the caster's mana drops to zero and a cast event is sent.
    pub fn cast(
        &mut self,
        state: &mut BattleState,
        grid: &mut MatchGrid,
        spirit: usize,
        target: Option<SpellTarget>,
        rng: &mut GameRng,
    ) -> CastResult {
        if let Err(reason) = Self::can_cast(state, spirit) {
            return CastResult::Rejected(reason);
        }
        let s = &state.spirits()[spirit];
        let Some(spell) = s.spell.clone() else {
            return CastResult::Rejected(CastRejection::NoSpell);
        };
        let caster = Caster {
            index: spirit,
            element: s.element,
            mana: s.mana,
        };

        let result = execute(&spell, caster, target, state, grid, rng);
        match &result {
            CastResult::Cast(report) => {
                self.pending = None;
                if let Some(s) = state.spirit_mut(spirit) {
                    s.mana = 0;
                }
                debug!("{}", report.message);
                state.emit(&BattleEvent::SpellCast {
                    spirit,
                    spell: report.spell.clone(),
                    message: report.message.clone(),
                });
            }
            CastResult::NeedsSelection { .. } => self.pending = Some(spirit),
            CastResult::Rejected(_) => {}
        }
        result
    }

    /// Resolve the pending spell with a target.
    pub fn complete_pending(
        &mut self,
        state: &mut BattleState,
        grid: &mut MatchGrid,
        target: SpellTarget,
        rng: &mut GameRng,
    ) -> CastResult {
        match self.pending {
            Some(spirit) => self.cast(state, grid, spirit, Some(target), rng),
            None => CastResult::Rejected(CastRejection::NoPendingSpell),
        }
    }

    /// Drop the pending spell. Returns the spirit it belonged to.
    pub fn cancel_pending(&mut self) -> Option<usize> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::{BattleMode, Enemy, Pos};

    fn battle() -> (BattleState, MatchGrid, GameRng) {
        let registry = SpellRegistry::with_defaults();
        let mut state = BattleState::new(1, BattleMode::Moves);
        state.moves_left = 10;
        state.enemies = vec![Enemy {
            name: "boss".to_string(),
            hp: 5000,
            max_hp: 5000,
            attack: 100,
            element: Element::Sol,
            turn: 3,
            max_turn: 3,
            is_boss: true,
            defense: 0,
        }];
        let mut spirits = vec![Spirit::new(Element::Forge, 300, 150), Spirit::new(Element::Stone, 300, 150)];
        registry.equip_defaults(&mut spirits);
        state.set_spirits(spirits).unwrap();
        let mut rng = GameRng::new(3);
        let grid = MatchGrid::random(8, 8, 6, &mut rng);
        (state, grid, rng)
    }

    #[test]
    fn test_defaults_per_element() {
        let registry = SpellRegistry::with_defaults();
        assert_eq!(registry.ids().count(), 11);
        assert_eq!(registry.default_for(Element::Life).unwrap().kind, SpellKind::Heal);
        assert_eq!(registry.default_for(Element::Root).unwrap().id, "column_clear");
        assert!(registry.default_for(Element::None).is_none());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = SpellRegistry::with_defaults();
        registry.register(SpellTemplate::new("heal", "Big Heal", SpellKind::Heal, 900, 50));
        assert_eq!(registry.ids().count(), 11);
        assert_eq!(registry.get("heal").unwrap().base_power, 900);
    }

    #[test]
    fn test_equip_random_unique_when_possible() {
        let registry = SpellRegistry::with_defaults();
        let mut spirits: Vec<Spirit> = Element::ALL.iter().take(5).map(|&e| Spirit::new(e, 300, 150)).collect();
        let mut rng = GameRng::new(17);
        registry.equip_random(&mut spirits, &mut rng);
        let ids: BTreeSet<String> = spirits.iter().map(|s| s.spell.as_ref().unwrap().id.clone()).collect();
        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_cast_requires_threshold() {
        let (mut state, mut grid, mut rng) = battle();
        let mut manager = SpellManager::new();
        state.spirit_mut(0).unwrap().mana = 99;
        let result = manager.cast(&mut state, &mut grid, 0, None, &mut rng);
        assert_eq!(result, CastResult::Rejected(CastRejection::NotEnoughMana { have: 99, need: 100 }));
        assert_eq!(state.enemies[0].hp, 5000);
    }

    #[test]
    fn test_cast_dumps_all_mana() {
        let (mut state, mut grid, mut rng) = battle();
        let mut manager = SpellManager::new();
        state.spirit_mut(0).unwrap().mana = 250;
        let result = manager.cast(&mut state, &mut grid, 0, None, &mut rng);
        assert!(result.success());
        assert_eq!(state.spirits()[0].mana, 0);
        // Fireball 200 * 2.5, Forge vs Sol is neutral
        assert_eq!(state.enemies[0].hp, 4500);
    }

    #[test]
    fn test_pending_round_trip() {
        let (mut state, mut grid, mut rng) = battle();
        let mut manager = SpellManager::new();
        state.spirit_mut(1).unwrap().mana = 100;
        let before = grid.clone();
        let result = manager.cast(&mut state, &mut grid, 1, None, &mut rng);
        assert!(result.needs_selection());
        assert_eq!(manager.pending(), Some(1));
        assert_eq!(grid, before);
        assert_eq!(state.spirits()[1].mana, 100);

        let result = manager.complete_pending(&mut state, &mut grid, SpellTarget::Row(3), &mut rng);
        assert!(result.success());
        assert_eq!(manager.pending(), None);
        assert!((0..8).all(|c| grid.gem(Pos::new(3, c)).is_none()));
        assert!((0..8).all(|c| grid.gem(Pos::new(2, c)) == before.gem(Pos::new(2, c))));
        assert_eq!(state.spirits()[1].mana, 0);
    }

    #[test]
    fn test_complete_without_pending() {
        let (mut state, mut grid, mut rng) = battle();
        let mut manager = SpellManager::new();
        let result = manager.complete_pending(&mut state, &mut grid, SpellTarget::Row(0), &mut rng);
        assert_eq!(result, CastResult::Rejected(CastRejection::NoPendingSpell));
    }

    #[test]
    fn test_cancel_pending() {
        let (mut state, mut grid, mut rng) = battle();
        let mut manager = SpellManager::new();
        state.spirit_mut(1).unwrap().mana = 100;
        manager.cast(&mut state, &mut grid, 1, None, &mut rng);
        assert_eq!(manager.cancel_pending(), Some(1));
        assert_eq!(manager.pending(), None);
    }

    #[test]
    fn test_no_cast_after_battle_over() {
        let (mut state, mut grid, mut rng) = battle();
        let mut manager = SpellManager::new();
        state.enemies[0].hp = 0;
        state.check_win_condition();
        state.spirit_mut(0).unwrap().mana = 300;
        let result = manager.cast(&mut state, &mut grid, 0, None, &mut rng);
        assert_eq!(result, CastResult::Rejected(CastRejection::BattleOver));
    }
}
