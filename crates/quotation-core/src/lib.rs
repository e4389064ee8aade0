//! Quotation Core: detections in, priced and counted quotations out.
//!
//! # Pipeline Flow
//!
//! ```text
//! detector JSON → Detection → QuotationEngine::generate → Quotation
//!                                   ↓            ↓
//!                              PriceTable   CounterStore
//! ```
//!
//! # Example
//!
//! ```
//! use quotation_core::{Detection, MemoryCounterStore, QuotationEngine};
//!
//! let engine = QuotationEngine::with_default_prices(MemoryCounterStore::new());
//! let detections = vec![
//!     Detection::new(0, 0.9, [0, 0, 10, 10]),
//!     Detection::new(1, 0.8, [20, 20, 40, 40]),
//! ];
//!
//! let quotation = engine.generate(&detections).unwrap();
//! assert_eq!(quotation.total_cost, 30.0);
//! assert_eq!(quotation.download_count, 1);
//! ```

pub mod atomic;
pub mod data_model;
pub mod detection;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod pricing;
pub mod store;

pub use data_model::{LineItem, PricedItems, Quotation, Totals};
pub use detection::{parse_detections, parse_detector_output, Detection, DetectionFilter};
pub use engine::QuotationEngine;
pub use error::{QuoteError, ValidationError};
pub use fingerprint::fingerprint;
pub use pricing::{electrical_class_names, PriceTable};
pub use store::{CounterStore, JsonFileCounterStore, MemoryCounterStore, StoreLoadPolicy};
