//! Battle notifications for the host.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use super::grid::Pos;
use super::words::WordPair;

/// Something the host may want to show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A group of same-type gems was matched.
    GemMatch {
        /// Gem type matched.
        gem: u8,
        /// Cells removed.
        cells: Vec<Pos>,
        /// Score awarded.
        score: u32,
        /// Cascade index, starting at 1.
        combo: u32,
    },
    /// The current word pair was crushed.
    WordMatch {
        /// The crushed pair.
        pair: WordPair,
    },
    /// An enemy lost HP.
    EnemyDamaged {
        /// Index into the enemy list.
        index: usize,
        /// HP removed.
        amount: u32,
    },
    /// The player lost HP.
    PlayerDamaged {
        /// Attacking enemy.
        enemy: usize,
        /// HP removed.
        amount: u32,
    },
    /// A spirit cast its spell.
    SpellCast {
        /// Casting spirit.
        spirit: usize,
        /// Spell id.
        spell: String,
        /// Result summary.
        message: String,
    },
    /// The battle was lost.
    GameOver,
    /// Every enemy was defeated.
    LevelComplete,
}

impl BattleEvent {
    /// True for the two terminal events.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, BattleEvent::GameOver | BattleEvent::LevelComplete)
    }
}

/// Receiver for battle notifications.
///
/// Delivery is fire-and-forget: the battle never reads anything back.
pub trait BattleEvents: fmt::Debug {
    /// Deliver one event.
    fn notify(&mut self, event: &BattleEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullEvents;

impl BattleEvents for NullEvents {
    fn notify(&mut self, _event: &BattleEvent) {}
}

/// Records events into a shared list.
///
/// Clones share the same list, so a host can keep one clone and hand the
/// other to the battle.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<BattleEvent>>>,
}

impl EventLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<BattleEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far.
    #[must_use]
    pub fn drain(&self) -> Vec<BattleEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded events equal to `event`.
    #[must_use]
    pub fn count(&self, event: &BattleEvent) -> usize {
        self.events.borrow().iter().filter(|e| *e == event).count()
    }
}

impl BattleEvents for EventLog {
    fn notify(&mut self, event: &BattleEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}
