//! Repository layer: entity-scoped database operations.
//!
//! Patients are stored with their reviews and chronic conditions in child
//! tables; disease indicator records with their metrics and exceptions.
//! Indicator saves replace the child rows of one record inside its own
//! transaction. Recall scans only touch the status of the reviews they
//! transition.

mod disease_indicator;
mod patient;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::DatabaseError;

pub use disease_indicator::*;
pub use patient::*;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DatabaseError::InvalidDate {
        field: field.into(),
        value: value.into(),
    })
}

pub(crate) fn parse_optional_date(
    field: &str,
    value: Option<String>,
) -> Result<Option<NaiveDate>, DatabaseError> {
    value.map(|v| parse_date(field, &v)).transpose()
}

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DatabaseError::InvalidDate {
            field: field.into(),
            value: value.into(),
        })
}

pub(crate) fn parse_uuid(value: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}
