//! Content fingerprints for quotations.
//!
//! The hashed form is compact JSON with keys in a fixed order:
//!
//! ```text
//! {"items":{"0":3,"1":1},"total_cost":50.0}
//! ```
//!
//! Item keys ascend numerically (they come from a `BTreeMap<u32, _>`),
//! quantities are integers and the total uses serde_json's shortest
//! round-trip float formatting, so the bytes do not depend on detection order
//! or on the platform.

use crate::error::{QuoteError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct Canonical<'a> {
    items: &'a BTreeMap<u32, u32>,
    total_cost: f64,
}

/// Canonical byte form of a quotation's content.
pub fn canonical_bytes(items: &BTreeMap<u32, u32>, total_cost: f64) -> Result<Vec<u8>> {
    // -0.0 and 0.0 must hash the same
    let total_cost = if total_cost == 0.0 { 0.0 } else { total_cost };
    serde_json::to_vec(&Canonical { items, total_cost }).map_err(|e| QuoteError::Serialize(e.to_string()))
}

/// Lowercase hex BLAKE3 digest (64 chars) of the canonical form.
pub fn fingerprint(items: &BTreeMap<u32, u32>, total_cost: f64) -> Result<String> {
    let bytes = canonical_bytes(items, total_cost)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
