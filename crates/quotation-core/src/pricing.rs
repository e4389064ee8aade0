//! Price tables and the built-in electrical catalog.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit price per detection class.
///
/// Classes absent from the table are priced at `0.0`: unknown objects are
/// quoted as free rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, f64>", into = "BTreeMap<u32, f64>")]
pub struct PriceTable {
    prices: BTreeMap<u32, f64>,
}

impl PriceTable {
    /// Build a table, rejecting negative or non-finite prices.
    pub fn new(prices: BTreeMap<u32, f64>) -> Result<Self, ValidationError> {
        for (class_id, price) in &prices {
            if !price.is_finite() || *price < 0.0 {
                return Err(ValidationError::invalid(
                    format!("pricing.{}", class_id),
                    format!("unit price {} must be a non-negative number", price),
                ));
            }
        }
        Ok(Self { prices })
    }

    /// The default catalog: switch, light and electrical outlet.
    pub fn electrical_defaults() -> Self {
        Self {
            prices: BTreeMap::from([
                (SWITCH, 10.0),
                (LIGHT, 20.0),
                (OUTLET, 30.0),
            ]),
        }
    }

    pub fn unit_price(&self, class_id: u32) -> f64 {
        self.prices.get(&class_id).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, class_id: u32) -> bool {
        self.prices.contains_key(&class_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.prices.iter().map(|(id, price)| (*id, *price))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl TryFrom<BTreeMap<u32, f64>> for PriceTable {
    type Error = ValidationError;

    fn try_from(prices: BTreeMap<u32, f64>) -> Result<Self, Self::Error> {
        Self::new(prices)
    }
}

impl From<PriceTable> for BTreeMap<u32, f64> {
    fn from(table: PriceTable) -> Self {
        table.prices
    }
}

impl FromIterator<(u32, f64)> for PriceTable {
    /// Collects without validation; prefer [`PriceTable::new`] for untrusted input.
    fn from_iter<I: IntoIterator<Item = (u32, f64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

pub const SWITCH: u32 = 0;
pub const LIGHT: u32 = 1;
pub const OUTLET: u32 = 2;

/// Display names for the default catalog, as printed on finalized documents.
pub fn electrical_class_names() -> BTreeMap<u32, String> {
    BTreeMap::from([
        (SWITCH, "switches".to_string()),
        (LIGHT, "lights".to_string()),
        (OUTLET, "electrical outlets".to_string()),
    ])
}
