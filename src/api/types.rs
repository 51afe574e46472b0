//! Shared state for the API router.

use std::path::PathBuf;
use std::sync::Arc;

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::db::open_database;
use crate::qof::IndicatorCatalogue;
use crate::recall::{RecallConfig, RecallScanner};

// ═══════════════════════════════════════════════════════════
// API context: shared state for all handlers
// ═══════════════════════════════════════════════════════════

/// Each request opens its own connection; the catalogue and scanner are shared.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: PathBuf,
    pub catalogue: Arc<IndicatorCatalogue>,
    pub scanner: Arc<RecallScanner>,
}

impl ApiContext {
    pub fn new(db_path: PathBuf, catalogue: IndicatorCatalogue, recall: RecallConfig) -> Self {
        Self {
            db_path,
            catalogue: Arc::new(catalogue),
            scanner: Arc::new(RecallScanner::new(recall)),
        }
    }

    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(open_database(&self.db_path)?)
    }
}
