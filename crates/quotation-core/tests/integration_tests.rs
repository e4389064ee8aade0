//! Integration tests for quotation-core with detector fixtures and a
//! file-backed counter store.

use quotation_core::{
    parse_detector_output, CounterStore, DetectionFilter, JsonFileCounterStore, PriceTable,
    QuoteError, QuotationEngine, StoreLoadPolicy, ValidationError,
};
use std::collections::BTreeMap;

/// Read a detector fixture from the workspace `testing/fixtures` directory
fn fixture(name: &str) -> String {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = std::path::Path::new(&manifest_dir).parent().unwrap().parent().unwrap();
    std::fs::read_to_string(workspace_root.join("testing/fixtures/detections").join(name)).unwrap()
}

fn scenario_prices() -> PriceTable {
    PriceTable::new(BTreeMap::from([(0, 10.0), (1, 20.0)])).unwrap()
}

// =============================================================================
// Issuance counting
// =============================================================================

#[test]
fn test_fresh_store_counts_one_then_two() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileCounterStore::open(dir.path().join("counts.json"), StoreLoadPolicy::Strict).unwrap();
    let engine = QuotationEngine::new(scenario_prices(), store);

    let detections = parse_detector_output(&fixture("floor_plan.json"), None).unwrap();
    let first = engine.generate(&detections).unwrap();
    let second = engine.generate(&detections).unwrap();

    assert_eq!(first.items, BTreeMap::from([(0, 3), (1, 1)]));
    assert_eq!(first.total_cost, 50.0);
    assert_eq!((first.download_count, second.download_count), (1, 2));
    assert_eq!(first.quotation_hash, second.quotation_hash);
}

#[test]
fn test_counts_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("counts.json");
    let detections = parse_detector_output(&fixture("floor_plan.json"), None).unwrap();

    let hash = {
        let store = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict).unwrap();
        let engine = QuotationEngine::new(scenario_prices(), store);
        engine.generate(&detections).unwrap();
        engine.generate(&detections).unwrap().quotation_hash
    };

    let store = JsonFileCounterStore::open(&path, StoreLoadPolicy::Strict).unwrap();
    assert_eq!(store.get(&hash).unwrap(), 2);

    let engine = QuotationEngine::new(scenario_prices(), store);
    let third = engine.generate(&detections).unwrap();
    assert_eq!(third.quotation_hash, hash);
    assert_eq!(third.download_count, 3);
}

#[test]
fn test_reordered_detections_share_a_counter() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileCounterStore::open(dir.path().join("counts.json"), StoreLoadPolicy::Strict).unwrap();
    let engine = QuotationEngine::new(scenario_prices(), store);

    let original = parse_detector_output(&fixture("floor_plan.json"), None).unwrap();
    let reordered = parse_detector_output(&fixture("floor_plan_reordered.json"), None).unwrap();

    let a = engine.generate(&original).unwrap();
    let b = engine.generate(&reordered).unwrap();
    assert_eq!(a.quotation_hash, b.quotation_hash);
    assert_eq!(b.download_count, 2);
    assert_eq!(engine.store().entries().unwrap().len(), 1);
}

#[test]
fn test_hash_follows_priced_content() {
    let detections = parse_detector_output(&fixture("floor_plan.json"), None).unwrap();

    let cheap = QuotationEngine::new(scenario_prices(), quotation_core::MemoryCounterStore::new());
    let defaults = QuotationEngine::with_default_prices(quotation_core::MemoryCounterStore::new());

    let a = cheap.generate(&detections).unwrap();
    let b = defaults.generate(&detections).unwrap();
    assert_eq!(a.total_cost, b.total_cost);
    assert_eq!(a.quotation_hash, b.quotation_hash);

    let pricier = PriceTable::new(BTreeMap::from([(0, 11.0), (1, 20.0)])).unwrap();
    let c = QuotationEngine::new(pricier, quotation_core::MemoryCounterStore::new())
        .generate(&detections)
        .unwrap();
    assert_ne!(c.quotation_hash, a.quotation_hash);
}

// =============================================================================
// Detector boundary
// =============================================================================

#[test]
fn test_batch_output_with_filter() {
    let detections = parse_detector_output(&fixture("batch.json"), Some("blueprints/ground_floor.png")).unwrap();
    assert_eq!(detections.len(), 3);

    let kept = DetectionFilter::default().with_min_confidence(0.25).apply(detections);
    let engine = QuotationEngine::with_default_prices(quotation_core::MemoryCounterStore::new());
    let quotation = engine.generate(&kept).unwrap();

    assert_eq!(quotation.items, BTreeMap::from([(2, 1), (7, 1)]));
    assert_eq!(quotation.total_cost, 30.0);
}

#[test]
fn test_missing_field_fixture() {
    let err = parse_detector_output(&fixture("missing_class.json"), None).unwrap_err();
    match err {
        QuoteError::Validation(ValidationError::MissingField(field)) => {
            assert_eq!(field, "detections[1].class_id");
        }
        other => panic!("unexpected error: {}", other),
    }
}
