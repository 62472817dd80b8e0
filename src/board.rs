//! Board-game layer on top of the generated world.
//!
//! This module contains:
//! - `player`: money, assets and position
//! - `ledger`: purchased-home records behind the `PropertyStore` trait
//! - `economy`: station buildings, settlement and the calendar
//! - `travel`: distance in colored tiles
//! - `misfortune`: the curse that follows players around

mod economy;
mod ledger;
mod misfortune;
mod player;
mod travel;

pub use economy::{
    BUILDING_COSTS, BUILDING_INCOME, BUILDING_NAMES, Calendar, Estates, Holding, SETTLEMENT_MONTH, Sale,
    TURNS_PER_YEAR, purchase_home,
};
pub use ledger::{PropertyLedger, PropertyRecord, PropertyStore};
pub use misfortune::{
    EffectKind, EffectResult, EffectTemplate, KING_EFFECTS, Misfortune, MisfortuneOutcome, NORMAL_EFFECTS, Stage,
    UPGRADE_TURNS,
};
pub use player::{DESTINATION_REWARD, INITIAL_MONEY, Player, PlayerId};
pub use travel::{colored_distance, farthest_from};
