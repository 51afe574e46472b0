//! SQLite-backed patient store.

use rusqlite::Connection;
use uuid::Uuid;

use super::error::RecallError;
use super::traits::PatientStore;
use crate::db::{self, DatabaseError};
use crate::models::Patient;

pub struct SqlitePatientStore;

impl SqlitePatientStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqlitePatientStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientStore for SqlitePatientStore {
    fn find_active_patients(&self, conn: &Connection) -> Result<Vec<Patient>, RecallError> {
        Ok(db::list_active_patients(conn)?)
    }

    fn mark_overdue(
        &self,
        conn: &Connection,
        patient: &Patient,
        review_ids: &[Uuid],
    ) -> Result<(), DatabaseError> {
        let moved = db::mark_reviews_overdue(conn, &patient.id, review_ids, patient.updated_at)?;
        if moved < review_ids.len() {
            tracing::debug!(
                patient_id = %patient.id,
                requested = review_ids.len(),
                moved,
                "Some reviews changed status since the scan read them"
            );
        }
        Ok(())
    }
}
