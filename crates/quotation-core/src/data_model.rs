//! Data Model: PricedItems, Quotation, Totals
use crate::pricing::PriceTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hash characters kept in a printed reference
pub const REFERENCE_LEN: usize = 12;

/// Aggregated and priced detections, before any issuance side effects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedItems {
    /// `class_id -> quantity`, every quantity >= 1
    pub items: BTreeMap<u32, u32>,
    pub total_cost: f64,
    /// Price snapshot the total was computed with
    pub unit_prices: PriceTable,
}

/// Rows in ascending class order, priced from `prices`.
pub fn line_items<'a>(
    items: &'a BTreeMap<u32, u32>,
    prices: &'a PriceTable,
) -> impl Iterator<Item = LineItem> + 'a {
    items
        .iter()
        .map(move |(&class_id, &quantity)| LineItem::new(class_id, quantity, prices.unit_price(class_id)))
}

impl PricedItems {
    pub fn lines(&self) -> impl Iterator<Item = LineItem> + '_ {
        line_items(&self.items, &self.unit_prices)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An issued quotation. Immutable once produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub items: BTreeMap<u32, u32>,
    pub total_cost: f64,
    pub unit_prices: PriceTable,
    /// Hex BLAKE3 digest of the canonical `{items, total_cost}` form
    pub quotation_hash: String,
    /// Times this exact content has been issued, including this one
    pub download_count: u64,
}

impl Quotation {
    /// Attach an issuance to priced content.
    pub fn issue(priced: PricedItems, quotation_hash: String, download_count: u64) -> Self {
        Self {
            items: priced.items,
            total_cost: priced.total_cost,
            unit_prices: priced.unit_prices,
            quotation_hash,
            download_count,
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = LineItem> + '_ {
        line_items(&self.items, &self.unit_prices)
    }

    /// Short form of the hash used as a printed reference.
    pub fn reference(&self) -> &str {
        self.quotation_hash
            .get(..REFERENCE_LEN)
            .unwrap_or(&self.quotation_hash)
    }
}

/// One priced row of a bill of materials.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub class_id: u32,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
}

impl LineItem {
    pub fn new(class_id: u32, quantity: u32, unit_price: f64) -> Self {
        Self {
            class_id,
            quantity,
            unit_price,
            line_total: unit_price * f64::from(quantity),
        }
    }
}

/// Final amounts once render-time tax and discount rates are applied.
///
/// Shared by previews and documents so both always agree for the same
/// subtotal and rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub discount_rate: f64,
    pub discount_amount: f64,
    pub total: f64,
}

impl Totals {
    pub fn compute(subtotal: f64, tax_rate: f64, discount_rate: f64) -> Self {
        let tax_amount = subtotal * tax_rate;
        let discount_amount = subtotal * discount_rate;
        Self {
            subtotal,
            tax_rate,
            tax_amount,
            discount_rate,
            discount_amount,
            total: subtotal + tax_amount - discount_amount,
        }
    }

    /// Sum line totals in order, then apply the rates.
    pub fn from_lines(lines: impl IntoIterator<Item = LineItem>, tax_rate: f64, discount_rate: f64) -> Self {
        let subtotal = lines.into_iter().map(|line| line.line_total).sum();
        Self::compute(subtotal, tax_rate, discount_rate)
    }
}
