//! Recall scan error types.

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum RecallError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to persist {} of the scanned patients", .0.len())]
    PartialPersistence(Vec<SaveFailure>),
}

/// One patient whose status transitions could not be written.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SaveFailure {
    pub patient_id: Uuid,
    pub message: String,
}
