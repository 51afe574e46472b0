//! QOF achievement engine.
//!
//! Scores each disease-indicator record against the indicator catalogue for
//! its disease and aggregates scores into a practice summary.

pub mod calculator;
pub mod catalogue;
pub mod error;
pub mod store;
pub mod summary;
pub mod traits;

pub use calculator::{recalculate, recalculate_record, record_metric};
pub use catalogue::{DiseaseIndicators, IndicatorCatalogue, IndicatorDefinition};
pub use error::QofError;
pub use store::SqliteDiseaseIndicatorStore;
pub use summary::{disease_breakdown, summarize, DiseaseCount, PracticeSummary};
pub use traits::DiseaseIndicatorStore;
