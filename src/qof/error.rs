//! QOF calculation error types.

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum QofError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Disease indicator record not found: {0}")]
    NotFound(Uuid),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Indicator catalogue error: {0}")]
    Catalogue(String),
}
