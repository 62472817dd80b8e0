//! Purchased-property records keyed by city and property index.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::player::PlayerId;
use crate::error::PurchaseError;

/// Ownership record for one home in a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    /// `"{city}_{index}"`.
    pub id: String,
    /// City the property belongs to.
    pub city: String,
    /// Index within the city's listing.
    pub index: usize,
    /// Buyer, if sold.
    pub purchased_by: Option<PlayerId>,
    /// Price paid, if sold.
    pub purchase_price: Option<i64>,
}

impl PropertyRecord {
    fn new(city: &str, index: usize) -> Self {
        Self {
            id: format!("{city}_{index}"),
            city: city.to_owned(),
            index,
            purchased_by: None,
            purchase_price: None,
        }
    }

    /// True once someone has bought it.
    #[must_use]
    pub const fn is_purchased(&self) -> bool {
        self.purchased_by.is_some()
    }
}

/// Key-value store of property records.
///
/// Constructed once per session and passed to whatever needs lookups.
pub trait PropertyStore {
    /// Fetch a record, creating an unsold one on first access.
    fn get_or_create(&mut self, city: &str, index: usize) -> &PropertyRecord;

    /// Record a sale.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseError::AlreadyOwned`] if the property was sold before.
    fn mark_purchased(
        &mut self,
        city: &str,
        index: usize,
        player: PlayerId,
        price: i64,
    ) -> Result<&PropertyRecord, PurchaseError>;
}

/// In-memory [`PropertyStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLedger {
    homes: BTreeMap<String, BTreeMap<usize, PropertyRecord>>,
}

impl PropertyLedger {
    /// An empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup without creating.
    #[must_use]
    pub fn get(&self, city: &str, index: usize) -> Option<&PropertyRecord> {
        self.homes.get(city).and_then(|c| c.get(&index))
    }

    /// Every sold property of a player.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &PropertyRecord> {
        self.homes
            .values()
            .flat_map(BTreeMap::values)
            .filter(move |r| r.purchased_by == Some(player))
    }
}

impl PropertyStore for PropertyLedger {
    fn get_or_create(&mut self, city: &str, index: usize) -> &PropertyRecord {
        self.homes
            .entry(city.to_owned())
            .or_default()
            .entry(index)
            .or_insert_with(|| PropertyRecord::new(city, index))
    }

    fn mark_purchased(
        &mut self,
        city: &str,
        index: usize,
        player: PlayerId,
        price: i64,
    ) -> Result<&PropertyRecord, PurchaseError> {
        let record = self
            .homes
            .entry(city.to_owned())
            .or_default()
            .entry(index)
            .or_insert_with(|| PropertyRecord::new(city, index));
        if record.is_purchased() {
            return Err(PurchaseError::AlreadyOwned(record.id.clone()));
        }
        record.purchased_by = Some(player);
        record.purchase_price = Some(price);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_stable() {
        let mut ledger = PropertyLedger::new();
        let id = ledger.get_or_create("苏州", 2).id.clone();
        assert_eq!(id, "苏州_2");
        assert!(!ledger.get_or_create("苏州", 2).is_purchased());
        assert!(ledger.get("苏州", 3).is_none());
    }

    #[test]
    fn test_second_purchase_fails() {
        let mut ledger = PropertyLedger::new();
        let rec = ledger.mark_purchased("杭州", 0, 1, 4000).unwrap();
        assert_eq!(rec.purchase_price, Some(4000));
        let err = ledger.mark_purchased("杭州", 0, 0, 9000).unwrap_err();
        assert_eq!(err, PurchaseError::AlreadyOwned("杭州_0".into()));
        assert_eq!(ledger.owned_by(1).count(), 1);
        assert_eq!(ledger.owned_by(0).count(), 0);
    }

    #[test]
    fn test_ledger_serializes() {
        let mut ledger = PropertyLedger::new();
        ledger.mark_purchased("a", 1, 0, 10).unwrap();
        let json = serde_json::to_string(&ledger).unwrap();
        let back: PropertyLedger = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);
    }
}
