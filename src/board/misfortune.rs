//! The misfortune spirit: a curse that rides one player at a time.
//!
//! It attaches to the player farthest from the destination when someone
//! arrives, jumps between players who share a tile, stays dormant for the
//! turn it attaches, and upgrades to its king form after
//! [`UPGRADE_TURNS`] turns on the same player.

use serde::Serialize;

use super::economy::{Estates, Sale};
use super::player::{Player, PlayerId};
use crate::rng::GameRng;

/// Turns on one player before the spirit upgrades.
pub const UPGRADE_TURNS: u32 = 8;

/// What an effect does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Cash taken.
    LoseMoney,
    /// One building sold at half price.
    SellBuilding,
    /// Every building sold at half price.
    SellAll,
    /// Debt added; cash may go negative.
    Debt,
    /// Nothing happens.
    Nothing,
}

/// An entry in an effect table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectTemplate {
    /// Effect kind.
    pub kind: EffectKind,
    /// Smallest amount, for money effects.
    pub min: u32,
    /// Largest amount, inclusive.
    pub max: u32,
    /// Message shown to players; `{player}` is replaced by a name.
    pub message: &'static str,
}

const fn money(kind: EffectKind, min: u32, max: u32, message: &'static str) -> EffectTemplate {
    EffectTemplate { kind, min, max, message }
}

const fn flat(kind: EffectKind, message: &'static str) -> EffectTemplate {
    EffectTemplate {
        kind,
        min: 0,
        max: 0,
        message,
    }
}

/// Effects of the ordinary spirit.
pub const NORMAL_EFFECTS: [EffectTemplate; 5] = [
    money(EffectKind::LoseMoney, 300, 1500, "穷神偷走了{player}的钱！"),
    money(EffectKind::LoseMoney, 500, 2000, "穷神请客吃饭，用的是{player}的钱！"),
    flat(EffectKind::SellBuilding, "穷神强行半价卖掉了{player}的物件！"),
    flat(EffectKind::Nothing, "穷神今天心情好，放过{player}了~"),
    money(EffectKind::LoseMoney, 200, 800, "穷神打碎了{player}的存钱罐！"),
];

/// Effects of the king form.
pub const KING_EFFECTS: [EffectTemplate; 4] = [
    money(EffectKind::LoseMoney, 2000, 5000, "大魔王穷神疯狂吞噬{player}的财产！"),
    flat(EffectKind::SellAll, "大魔王穷神吞噬了{player}所有的物件！"),
    money(EffectKind::Debt, 3000, 8000, "大魔王穷神让{player}背上巨额债务！"),
    money(EffectKind::LoseMoney, 1500, 4000, "大魔王穷神召开豪华宴会，账单给{player}！"),
];

/// Form of the spirit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Ordinary.
    Normal,
    /// Upgraded.
    King,
}

/// Result of one effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EffectResult {
    /// A shield charm was spent instead.
    Absorbed,
    /// Cash removed.
    Money {
        /// Amount removed.
        amount: i64,
    },
    /// Buildings sold; empty if the player owned none.
    Sold {
        /// Sales made.
        sales: Vec<Sale>,
    },
    /// Nothing.
    Spared,
}

/// What happened at the end of a player's turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MisfortuneOutcome {
    /// The player is not cursed.
    NotHeld,
    /// The spirit arrived this turn and waits.
    Dormant,
    /// The spirit acted.
    Struck {
        /// The spirit became king this turn.
        upgraded: bool,
        /// Effect drawn.
        effect: EffectKind,
        /// Its result.
        result: EffectResult,
    },
}

/// Where the spirit is and how long it has stayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Misfortune {
    holder: Option<PlayerId>,
    turns: u32,
    stage: Stage,
    just_attached: bool,
}

impl Default for Misfortune {
    fn default() -> Self {
        Self::new()
    }
}

impl Misfortune {
    /// A spirit attached to nobody.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            holder: None,
            turns: 0,
            stage: Stage::Normal,
            just_attached: false,
        }
    }

    /// Current victim.
    #[must_use]
    pub const fn holder(self) -> Option<PlayerId> {
        self.holder
    }

    /// Current form.
    #[must_use]
    pub const fn stage(self) -> Stage {
        self.stage
    }

    /// Turns spent on the current holder.
    #[must_use]
    pub const fn turns(self) -> u32 {
        self.turns
    }

    /// Move the spirit to a player, resetting it to its ordinary form.
    pub fn attach(&mut self, player: PlayerId) {
        log::info!("misfortune attaches to player {player}");
        self.holder = Some(player);
        self.turns = 0;
        self.stage = Stage::Normal;
        self.just_attached = true;
    }

    /// Remove the spirit from play.
    pub const fn exorcise(&mut self) {
        *self = Self::new();
    }

    /// Two players ended up on the same tile. The spirit jumps from whichever
    /// holds it to the other. Returns the new holder if it moved.
    pub fn on_meet(&mut self, mover: PlayerId, other: PlayerId) -> Option<PlayerId> {
        let target = match self.holder {
            Some(h) if h == mover => other,
            Some(h) if h == other => mover,
            _ => return None,
        };
        self.attach(target);
        Some(target)
    }

    /// Run the spirit at the end of `player`'s turn.
    pub fn end_turn(&mut self, player: &mut Player, estates: &mut Estates, rng: &mut GameRng) -> MisfortuneOutcome {
        if self.holder != Some(player.id) {
            return MisfortuneOutcome::NotHeld;
        }
        if self.just_attached {
            self.just_attached = false;
            return MisfortuneOutcome::Dormant;
        }
        self.turns += 1;
        let upgraded = self.stage == Stage::Normal && self.turns >= UPGRADE_TURNS;
        if upgraded {
            self.stage = Stage::King;
            log::info!("misfortune on player {} became king", player.id);
        }
        let table: &[EffectTemplate] = match self.stage {
            Stage::Normal => &NORMAL_EFFECTS,
            Stage::King => &KING_EFFECTS,
        };
        let template = table[rng.index(table.len())];
        let result = if player.consume_charm() {
            EffectResult::Absorbed
        } else {
            apply(template, player, estates, rng)
        };
        log::debug!("misfortune {:?} on player {}: {result:?}", template.kind, player.id);
        MisfortuneOutcome::Struck {
            upgraded,
            effect: template.kind,
            result,
        }
    }
}

fn apply(template: EffectTemplate, player: &mut Player, estates: &mut Estates, rng: &mut GameRng) -> EffectResult {
    match template.kind {
        EffectKind::LoseMoney | EffectKind::Debt => {
            let drawn = rng.range_inclusive(u64::from(template.min), u64::from(template.max));
            let amount = i64::try_from(drawn).unwrap_or(i64::MAX);
            player.credit(-amount);
            EffectResult::Money { amount }
        }
        EffectKind::SellBuilding => EffectResult::Sold {
            sales: estates.sell_random(player, rng).into_iter().collect(),
        },
        EffectKind::SellAll => EffectResult::Sold {
            sales: estates.sell_all(player, rng),
        },
        EffectKind::Nothing => EffectResult::Spared,
    }
}
