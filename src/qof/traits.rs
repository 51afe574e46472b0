//! Store boundary for disease-indicator records.

use rusqlite::Connection;
use uuid::Uuid;

use super::error::QofError;
use crate::models::{DiseaseIndicatorFilter, DiseaseIndicatorRecord};

pub trait DiseaseIndicatorStore: Send + Sync {
    fn find(
        &self,
        conn: &Connection,
        filter: &DiseaseIndicatorFilter,
    ) -> Result<Vec<DiseaseIndicatorRecord>, QofError>;

    fn get(&self, conn: &Connection, id: &Uuid) -> Result<DiseaseIndicatorRecord, QofError>;

    /// Persist metrics, exceptions and the derived achievement.
    fn save(&self, conn: &Connection, record: &DiseaseIndicatorRecord) -> Result<(), QofError>;
}
