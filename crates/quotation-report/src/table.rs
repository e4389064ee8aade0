//! Item table: resolved names, formatted cells and render-time totals.
//!
//! The engine's `total_cost` is the pre-tax truth. The table recomputes the
//! subtotal from its own rows, which use the quotation's price snapshot in the
//! same class order, and warns if a hand-built quotation disagrees.

use quotation_core::{LineItem, PricedItems, Quotation, Totals};
use serde::Serialize;
use std::collections::BTreeMap;

pub const HEADER: [&str; 4] = ["Item", "Quantity", "Unit Price", "Total Price"];

/// Largest subtotal drift tolerated before logging a warning.
const SUBTOTAL_TOLERANCE: f64 = 0.005;

/// Label for a class id, falling back to `Class {id}`.
pub fn display_name(class_names: &BTreeMap<u32, String>, class_id: u32) -> String {
    class_names
        .get(&class_id)
        .cloned()
        .unwrap_or_else(|| format!("Class {}", class_id))
}

pub fn money(amount: f64) -> String {
    format!("${:.2}", amount)
}

pub fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// One bill-of-materials row with its display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

impl NamedLine {
    fn new(line: LineItem, class_names: &BTreeMap<u32, String>) -> Self {
        Self {
            name: display_name(class_names, line.class_id),
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.line_total,
        }
    }

    pub fn cells(&self) -> [String; 4] {
        [
            self.name.clone(),
            self.quantity.to_string(),
            money(self.unit_price),
            money(self.total_price),
        ]
    }
}

/// Rows and totals ready for layout or templating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemTable {
    pub lines: Vec<NamedLine>,
    pub totals: Totals,
}

impl ItemTable {
    pub fn from_quotation(
        quotation: &Quotation,
        class_names: &BTreeMap<u32, String>,
        tax_rate: f64,
        discount_rate: f64,
    ) -> Self {
        let table = Self::build(quotation.lines(), class_names, tax_rate, discount_rate);

        if (table.totals.subtotal - quotation.total_cost).abs() > SUBTOTAL_TOLERANCE {
            tracing::warn!(
                hash = %quotation.quotation_hash,
                engine_total = quotation.total_cost,
                table_subtotal = table.totals.subtotal,
                "document subtotal differs from quotation total"
            );
        }
        table
    }

    pub fn from_priced(
        priced: &PricedItems,
        class_names: &BTreeMap<u32, String>,
        tax_rate: f64,
        discount_rate: f64,
    ) -> Self {
        Self::build(priced.lines(), class_names, tax_rate, discount_rate)
    }

    fn build(
        lines: impl Iterator<Item = LineItem>,
        class_names: &BTreeMap<u32, String>,
        tax_rate: f64,
        discount_rate: f64,
    ) -> Self {
        let lines: Vec<LineItem> = lines.collect();
        let totals = Totals::from_lines(lines.iter().copied(), tax_rate, discount_rate);
        Self {
            lines: lines.into_iter().map(|line| NamedLine::new(line, class_names)).collect(),
            totals,
        }
    }

    /// Label/amount pairs printed beneath the item rows.
    pub fn summary_rows(&self) -> [(String, String); 4] {
        let t = &self.totals;
        [
            ("Subtotal:".to_string(), money(t.subtotal)),
            (format!("Tax ({}):", percent(t.tax_rate)), money(t.tax_amount)),
            (
                format!("Discount ({}):", percent(t.discount_rate)),
                format!("-{}", money(t.discount_amount)),
            ),
            ("Total Cost:".to_string(), money(t.total)),
        ]
    }
}
