//! Station buildings, home purchases and yearly settlement.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ledger::PropertyStore;
use super::player::{Player, PlayerId};
use crate::error::PurchaseError;
use crate::rng::GameRng;
use crate::world::TileGraph;

/// Price of each building tier.
pub const BUILDING_COSTS: [i64; 3] = [1_000, 5_000, 20_000];
/// Income each tier pays at settlement.
pub const BUILDING_INCOME: [i64; 3] = [200, 800, 4_000];
/// Display names of the tiers.
pub const BUILDING_NAMES: [&str; 3] = ["拉面摊", "商务酒店", "摩天大楼"];

/// Turns in a game year; one turn is one month.
pub const TURNS_PER_YEAR: u8 = 12;
/// Month in which income is paid out.
pub const SETTLEMENT_MONTH: u8 = 3;

/// Buildings on one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Owner of every building here.
    pub owner: PlayerId,
    /// Built tiers, ascending.
    pub buildings: Vec<usize>,
}

impl Holding {
    /// True when all tiers are built, which doubles income.
    #[must_use]
    pub fn is_monopoly(&self) -> bool {
        self.buildings.len() == BUILDING_COSTS.len()
    }

    /// Settlement income of this station.
    #[must_use]
    pub fn income(&self) -> i64 {
        let base: i64 = self.buildings.iter().map(|&t| BUILDING_INCOME[t]).sum();
        if self.is_monopoly() { base * 2 } else { base }
    }
}

/// A building sold off by a misfortune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Sale {
    /// Station tile.
    pub tile: usize,
    /// Tier sold.
    pub tier: usize,
    /// Cash received.
    pub price: i64,
}

/// Station ownership across the board, keyed by tile id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estates {
    holdings: BTreeMap<usize, Holding>,
}

impl Estates {
    /// No buildings anywhere.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buildings on a station.
    #[must_use]
    pub fn holding(&self, tile: usize) -> Option<&Holding> {
        self.holdings.get(&tile)
    }

    /// Stations a player owns.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = (usize, &Holding)> {
        self.holdings
            .iter()
            .filter(move |(_, h)| h.owner == player)
            .map(|(&t, h)| (t, h))
    }

    /// Buy a building tier on the station the player stands on.
    ///
    /// # Errors
    ///
    /// Fails if the tier is unknown, the tile is not a station, another
    /// player owns the station, the tier is already built, or the player
    /// cannot pay.
    pub fn buy_building(&mut self, graph: &TileGraph, player: &mut Player, tier: usize) -> Result<(), PurchaseError> {
        let cost = *BUILDING_COSTS.get(tier).ok_or(PurchaseError::UnknownTier(tier))?;
        let tile = player.tile;
        if !graph.get(tile).is_some_and(|t| t.kind.is_station()) {
            return Err(PurchaseError::NotAStation(tile));
        }
        if let Some(h) = self.holdings.get(&tile) {
            if h.owner != player.id {
                return Err(PurchaseError::OwnedByOther(h.owner));
            }
            if h.buildings.contains(&tier) {
                return Err(PurchaseError::AlreadyBuilt(tier));
            }
        }
        if player.money < cost {
            return Err(PurchaseError::InsufficientFunds {
                need: cost,
                have: player.money,
            });
        }
        player.money -= cost;
        player.assets = player.assets.saturating_add(cost);
        let holding = self.holdings.entry(tile).or_insert_with(|| Holding {
            owner: player.id,
            buildings: Vec::new(),
        });
        holding.buildings.push(tier);
        holding.buildings.sort_unstable();
        log::debug!("player {} built {} on tile {tile}", player.id, BUILDING_NAMES[tier]);
        Ok(())
    }

    /// Settlement income a player is owed.
    #[must_use]
    pub fn income_of(&self, player: PlayerId) -> i64 {
        self.owned_by(player).map(|(_, h)| h.income()).sum()
    }

    /// Pay every player their building income. Returns what each received.
    pub fn settle(&self, players: &mut [Player]) -> Vec<(PlayerId, i64)> {
        players
            .iter_mut()
            .map(|p| {
                let income = self.income_of(p.id);
                p.credit(income);
                (p.id, income)
            })
            .collect()
    }

    /// Sell the highest tier on a random station of the player's at half
    /// price. A station left empty loses its owner.
    pub fn sell_random(&mut self, player: &mut Player, rng: &mut GameRng) -> Option<Sale> {
        let owned: Vec<usize> = self
            .owned_by(player.id)
            .filter(|(_, h)| !h.buildings.is_empty())
            .map(|(t, _)| t)
            .collect();
        let tile = *rng.choose(&owned)?;
        let holding = self.holdings.get_mut(&tile)?;
        let tier = holding.buildings.pop()?;
        if holding.buildings.is_empty() {
            self.holdings.remove(&tile);
        }
        let cost = BUILDING_COSTS[tier];
        let price = cost / 2;
        player.credit(price);
        player.assets = player.assets.saturating_sub(cost);
        Some(Sale { tile, tier, price })
    }

    /// Sell every building the player owns at half price.
    pub fn sell_all(&mut self, player: &mut Player, rng: &mut GameRng) -> Vec<Sale> {
        std::iter::from_fn(|| self.sell_random(player, rng)).collect()
    }
}

/// Buy a home listed in a city.
///
/// # Errors
///
/// Fails if the player cannot pay or the home was already sold.
pub fn purchase_home(
    store: &mut impl PropertyStore,
    player: &mut Player,
    city: &str,
    index: usize,
    price: i64,
) -> Result<(), PurchaseError> {
    if player.money < price {
        return Err(PurchaseError::InsufficientFunds {
            need: price,
            have: player.money,
        });
    }
    store.mark_purchased(city, index, player.id, price)?;
    player.money -= price;
    player.assets = player.assets.saturating_add(price);
    Ok(())
}

/// Game calendar. The game opens in April of year 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    /// Current year, from 1.
    pub year: u32,
    /// Current month, 1 to 12.
    pub month: u8,
    /// Turns played.
    pub total_turns: u32,
}

impl Default for Calendar {
    fn default() -> Self {
        Self {
            year: 1,
            month: 4,
            total_turns: 0,
        }
    }
}

impl Calendar {
    /// Advance one month. Returns true when the new month is settlement.
    pub const fn advance(&mut self) -> bool {
        self.total_turns += 1;
        self.month += 1;
        if self.month > TURNS_PER_YEAR {
            self.month = 1;
            self.year += 1;
        }
        self.month == SETTLEMENT_MONTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::ledger::PropertyLedger;
    use crate::world::{Station, WorldConfig, generate_world};

    fn board() -> TileGraph {
        let stations = vec![
            Station::new("a", 31.0, 120.0).with_population(500),
            Station::new("b", 31.1, 120.1),
        ];
        generate_world(&stations, &WorldConfig::default()).unwrap().tiles().clone()
    }

    #[test]
    fn test_buy_and_settle_monopoly() {
        let graph = board();
        let start = graph.start().unwrap();
        let mut players = vec![Player::new(0, "p1", start), Player::new(1, "com", start)];
        let mut estates = Estates::new();
        for tier in 0..3 {
            estates.buy_building(&graph, &mut players[0], tier).unwrap();
        }
        assert_eq!(players[0].money, 30_000 - 26_000);
        assert_eq!(players[0].assets, 26_000);
        assert!(estates.holding(start).unwrap().is_monopoly());
        assert_eq!(estates.income_of(0), 10_000);

        let paid = estates.settle(&mut players);
        assert_eq!(paid, vec![(0, 10_000), (1, 0)]);
        assert_eq!(players[0].money, 14_000);
    }

    #[test]
    fn test_buy_rejections() {
        let graph = board();
        let start = graph.start().unwrap();
        let mut p1 = Player::new(0, "p1", start);
        let mut com = Player::new(1, "com", start);
        let mut estates = Estates::new();
        assert_eq!(estates.buy_building(&graph, &mut p1, 7), Err(PurchaseError::UnknownTier(7)));
        estates.buy_building(&graph, &mut p1, 1).unwrap();
        assert_eq!(estates.buy_building(&graph, &mut p1, 1), Err(PurchaseError::AlreadyBuilt(1)));
        assert_eq!(estates.buy_building(&graph, &mut com, 0), Err(PurchaseError::OwnedByOther(0)));

        p1.money = 10;
        assert!(matches!(
            estates.buy_building(&graph, &mut p1, 2),
            Err(PurchaseError::InsufficientFunds { need: 20_000, have: 10 })
        ));

        let road = graph.walkable().find(|t| !t.kind.is_station()).map(|t| t.id);
        if let Some(road) = road {
            p1.tile = road;
            p1.money = 100_000;
            assert_eq!(estates.buy_building(&graph, &mut p1, 0), Err(PurchaseError::NotAStation(road)));
        }
    }

    #[test]
    fn test_sell_random_and_all() {
        let graph = board();
        let start = graph.start().unwrap();
        let mut p1 = Player::new(0, "p1", start);
        let mut estates = Estates::new();
        estates.buy_building(&graph, &mut p1, 0).unwrap();
        estates.buy_building(&graph, &mut p1, 2).unwrap();
        let mut rng = GameRng::new(3);

        let sale = estates.sell_random(&mut p1, &mut rng).unwrap();
        assert_eq!((sale.tier, sale.price), (2, 10_000));
        assert_eq!(p1.assets, 1_000);

        let rest = estates.sell_all(&mut p1, &mut rng);
        assert_eq!(rest.len(), 1);
        assert!(estates.holding(start).is_none());
        assert!(estates.sell_random(&mut p1, &mut rng).is_none());
        assert_eq!(p1.money, 30_000 - 21_000 + 10_000 + 500);
    }

    #[test]
    fn test_purchase_home() {
        let mut ledger = PropertyLedger::new();
        let mut p1 = Player::new(0, "p1", 0);
        purchase_home(&mut ledger, &mut p1, "苏州", 1, 5_000).unwrap();
        assert_eq!(p1.money, 25_000);
        assert_eq!(p1.assets, 5_000);
        let mut com = Player::new(1, "com", 0);
        assert!(matches!(
            purchase_home(&mut ledger, &mut com, "苏州", 1, 5_000),
            Err(PurchaseError::AlreadyOwned(_))
        ));
        assert_eq!(com.money, 30_000);
    }

    #[test]
    fn test_calendar_settles_in_march() {
        let mut cal = Calendar::default();
        let mut settlements = Vec::new();
        for _ in 0..24 {
            if cal.advance() {
                settlements.push(cal.total_turns);
            }
        }
        assert_eq!(settlements, vec![11, 23]);
        assert_eq!(cal.year, 3);
        assert_eq!(cal.month, 4);
    }
}
