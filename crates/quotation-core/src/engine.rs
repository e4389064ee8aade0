//! Quotation Engine: aggregation, pricing and issuance tracking
use crate::data_model::{line_items, PricedItems, Quotation};
use crate::detection::Detection;
use crate::error::Result;
use crate::fingerprint::fingerprint;
use crate::pricing::PriceTable;
use crate::store::CounterStore;
use std::collections::BTreeMap;

pub struct QuotationEngine<S> {
    prices: PriceTable,
    store: S,
}

impl<S: CounterStore> QuotationEngine<S> {
    pub fn new(prices: PriceTable, store: S) -> Self {
        Self { prices, store }
    }

    /// Engine priced with [`PriceTable::electrical_defaults`].
    pub fn with_default_prices(store: S) -> Self {
        Self::new(PriceTable::electrical_defaults(), store)
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Count detections per class and price them. No side effects.
    ///
    /// Confidence and bounding boxes are ignored; callers filter before this.
    pub fn price(&self, detections: &[Detection]) -> PricedItems {
        let mut items: BTreeMap<u32, u32> = BTreeMap::new();
        for detection in detections {
            *items.entry(detection.class_id).or_insert(0) += 1;
        }

        let total_cost = line_items(&items, &self.prices).map(|line| line.line_total).sum();

        PricedItems {
            items,
            total_cost,
            unit_prices: self.prices.clone(),
        }
    }

    /// Price the detections, fingerprint the result and record one issuance.
    ///
    /// Fails if the new count cannot be persisted; no quotation is returned
    /// with a count that was never recorded.
    pub fn generate(&self, detections: &[Detection]) -> Result<Quotation> {
        let priced = self.price(detections);
        let quotation_hash = fingerprint(&priced.items, priced.total_cost)?;
        let download_count = self.store.increment(&quotation_hash)?;

        tracing::info!(
            hash = %quotation_hash,
            download_count,
            classes = priced.items.len(),
            total_cost = priced.total_cost,
            "issued quotation"
        );

        Ok(Quotation::issue(priced, quotation_hash, download_count))
    }

    /// How many times the given content has been issued so far.
    pub fn issued_count(&self, priced: &PricedItems) -> Result<u64> {
        let hash = fingerprint(&priced.items, priced.total_cost)?;
        self.store.get(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCounterStore;

    fn engine() -> QuotationEngine<MemoryCounterStore> {
        let prices = PriceTable::new(BTreeMap::from([(0, 10.0), (1, 20.0)])).unwrap();
        QuotationEngine::new(prices, MemoryCounterStore::new())
    }

    fn det(class_id: u32) -> Detection {
        Detection::new(class_id, 0.9, [0, 0, 10, 10])
    }

    #[test]
    fn test_scenario_counts_and_total() {
        let engine = engine();
        let detections = vec![det(0), det(0), det(1), det(0)];

        let first = engine.generate(&detections).unwrap();
        assert_eq!(first.items, BTreeMap::from([(0, 3), (1, 1)]));
        assert_eq!(first.total_cost, 50.0);
        assert_eq!(first.download_count, 1);

        let second = engine.generate(&detections).unwrap();
        assert_eq!(second.download_count, 2);
        assert_eq!(second.quotation_hash, first.quotation_hash);
    }

    #[test]
    fn test_order_and_confidence_do_not_matter() {
        let engine = engine();
        let a = vec![
            Detection::new(1, 0.3, [0, 0, 1, 1]),
            Detection::new(0, 0.99, [5, 5, 9, 9]),
        ];
        let b = vec![
            Detection::new(0, 0.2, [100, 100, 200, 200]),
            Detection::new(1, 0.8, [7, 7, 8, 8]),
        ];

        let qa = engine.generate(&a).unwrap();
        let qb = engine.generate(&b).unwrap();
        assert_eq!(qa.quotation_hash, qb.quotation_hash);
        assert_eq!(qb.download_count, qa.download_count + 1);
    }

    #[test]
    fn test_unknown_class_is_free() {
        let engine = engine();
        let quotation = engine.generate(&[det(0), det(9), det(9)]).unwrap();
        assert_eq!(quotation.items.get(&9), Some(&2));
        assert_eq!(quotation.total_cost, 10.0);
    }

    #[test]
    fn test_empty_input() {
        let engine = engine();
        let first = engine.generate(&[]).unwrap();
        assert!(first.items.is_empty());
        assert_eq!(first.total_cost, 0.0);
        assert_eq!(first.quotation_hash.len(), 64);

        let second = engine.generate(&[]).unwrap();
        assert_eq!(second.quotation_hash, first.quotation_hash);
        assert_eq!(second.download_count, 2);
    }

    #[test]
    fn test_price_has_no_side_effects() {
        let engine = engine();
        let priced = engine.price(&[det(1)]);
        assert_eq!(priced.total_cost, 20.0);
        assert_eq!(engine.issued_count(&priced).unwrap(), 0);

        engine.generate(&[det(1)]).unwrap();
        assert_eq!(engine.issued_count(&priced).unwrap(), 1);
    }

    #[test]
    fn test_unit_prices_snapshot() {
        let engine = engine();
        let quotation = engine.generate(&[det(0)]).unwrap();
        assert_eq!(&quotation.unit_prices, engine.prices());
    }
}
