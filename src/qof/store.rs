//! SQLite-backed disease-indicator store.

use rusqlite::Connection;
use uuid::Uuid;

use super::error::QofError;
use super::traits::DiseaseIndicatorStore;
use crate::db;
use crate::models::{DiseaseIndicatorFilter, DiseaseIndicatorRecord};

pub struct SqliteDiseaseIndicatorStore;

impl SqliteDiseaseIndicatorStore {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SqliteDiseaseIndicatorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiseaseIndicatorStore for SqliteDiseaseIndicatorStore {
    fn find(
        &self,
        conn: &Connection,
        filter: &DiseaseIndicatorFilter,
    ) -> Result<Vec<DiseaseIndicatorRecord>, QofError> {
        Ok(db::find_indicator_records(conn, filter)?)
    }

    fn get(&self, conn: &Connection, id: &Uuid) -> Result<DiseaseIndicatorRecord, QofError> {
        db::get_indicator_record(conn, id)?.ok_or(QofError::NotFound(*id))
    }

    fn save(&self, conn: &Connection, record: &DiseaseIndicatorRecord) -> Result<(), QofError> {
        Ok(db::save_indicator_record(conn, record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_indicator_record, open_memory_database};
    use crate::models::enums::DiseaseType;

    #[test]
    fn get_missing_record_is_not_found() {
        let conn = open_memory_database().unwrap();
        let store = SqliteDiseaseIndicatorStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get(&conn, &id), Err(QofError::NotFound(missing)) if missing == id));
    }

    #[test]
    fn find_by_disease_through_store() {
        let conn = open_memory_database().unwrap();
        insert_indicator_record(&conn, &DiseaseIndicatorRecord::new(DiseaseType::Copd, None))
            .unwrap();
        let store: Box<dyn DiseaseIndicatorStore> = Box::new(SqliteDiseaseIndicatorStore::new());
        let found = store
            .find(&conn, &DiseaseIndicatorFilter::for_disease(DiseaseType::Copd))
            .unwrap();
        assert_eq!(found.len(), 1);
    }
}
