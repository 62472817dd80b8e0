//! Board player state.

use serde::{Deserialize, Serialize};

/// Unique identifier for a player.
pub type PlayerId = u8;

/// Money every player starts with.
pub const INITIAL_MONEY: i64 = 30_000;

/// Paid to the first player reaching the destination.
pub const DESTINATION_REWARD: i64 = 5_000;

/// State for a single player on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier for this player.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Cash; negative while in debt.
    pub money: i64,
    /// Book value of buildings and homes owned.
    pub assets: i64,
    /// Tile the player stands on.
    pub tile: usize,
    /// Shield charms that absorb one misfortune effect each.
    pub charms: u32,
}

impl Player {
    /// Create a new player on a tile with starting money.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>, tile: usize) -> Self {
        Self {
            id,
            name: name.into(),
            money: INITIAL_MONEY,
            assets: 0,
            tile,
            charms: 0,
        }
    }

    /// Cash plus assets.
    #[must_use]
    pub const fn net_worth(&self) -> i64 {
        self.money.saturating_add(self.assets)
    }

    /// Add (or with a negative amount, remove) cash.
    pub const fn credit(&mut self, amount: i64) {
        self.money = self.money.saturating_add(amount);
    }

    /// Use up a shield charm if one is held.
    pub const fn consume_charm(&mut self) -> bool {
        if self.charms == 0 {
            return false;
        }
        self.charms -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, "com", 4);
        assert_eq!(player.id, 1);
        assert_eq!(player.money, INITIAL_MONEY);
        assert_eq!(player.net_worth(), INITIAL_MONEY);
    }

    #[test]
    fn test_money_can_go_negative() {
        let mut player = Player::new(0, "p1", 0);
        player.credit(-40_000);
        assert_eq!(player.money, -10_000);
    }

    #[test]
    fn test_charm_consumed_once() {
        let mut player = Player::new(0, "p1", 0);
        player.charms = 1;
        assert!(player.consume_charm());
        assert!(!player.consume_charm());
    }
}
