//! Store boundary for the recall scan.

use rusqlite::Connection;
use uuid::Uuid;

use super::error::RecallError;
use crate::db::DatabaseError;
use crate::models::Patient;

/// Read/write access to the patient register.
pub trait PatientStore: Send + Sync {
    /// Every active patient with embedded reviews loaded.
    fn find_active_patients(&self, conn: &Connection) -> Result<Vec<Patient>, RecallError>;

    /// Persist the scan's Due → Overdue transitions for one patient.
    /// Only the listed reviews are written, and only while still Due.
    fn mark_overdue(
        &self,
        conn: &Connection,
        patient: &Patient,
        review_ids: &[Uuid],
    ) -> Result<(), DatabaseError>;
}
