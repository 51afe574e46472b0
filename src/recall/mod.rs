//! Clinical recall engine.
//!
//! Scans the active patient register for due and overdue reviews, ranks
//! them by urgency and persists the Due → Overdue transitions it causes.
//!
//! ```text
//! PatientStore → RecallScanner → ScanReport (alerts + save failures)
//! ```
//!
//! Each patient is saved independently; a failed save never blocks or
//! rolls back the others.

pub mod background;
pub mod error;
pub mod scanner;
pub mod store;
pub mod traits;
pub mod types;

pub use background::{start_recall_scheduler, RecallSchedulerHandle};
pub use error::{RecallError, SaveFailure};
pub use scanner::{run_scan, sort_alerts, PatientScan, PatientTransition, RecallScanner};
pub use store::SqlitePatientStore;
pub use traits::PatientStore;
pub use types::*;
