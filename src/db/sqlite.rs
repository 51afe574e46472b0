use std::path::Path;

use rusqlite::{Connection, OptionalExtension};

use super::DatabaseError;

/// Schema migrations in apply order. Each script records its own version.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    include_str!("../../resources/migrations/001_initial.sql"),
)];

/// Open the register database at `path`, migrating it to the latest schema.
///
/// The scheduler thread and each HTTP request hold their own connection to
/// the same file, so the file runs in WAL mode with a busy timeout.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Migrated in-memory database, used by tests.
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Apply every migration newer than the stored schema version. A failing
/// script is rolled back whole.
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current = schema_version(conn)?;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        tracing::info!(version, "Applying schema migration");
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)
            .map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        tx.commit()?;
    }

    Ok(())
}

/// Latest applied schema version, 0 for a fresh database.
pub fn schema_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(0);
    }

    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<String>, _>>()
            .unwrap();
        names
    }

    #[test]
    fn register_schema_is_created() {
        let conn = open_memory_database().unwrap();
        assert_eq!(
            table_names(&conn),
            vec![
                "chronic_conditions",
                "disease_indicator_records",
                "indicator_exceptions",
                "metric_records",
                "patients",
                "reviews",
                "schema_version",
            ]
        );
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }

    #[test]
    fn fresh_database_reports_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);
    }

    #[test]
    fn rerunning_migrations_is_a_no_op() {
        let conn = open_memory_database().unwrap();
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn review_status_outside_lifecycle_is_rejected() {
        let conn = open_memory_database().unwrap();
        conn.execute(
            "INSERT INTO patients (id, nhs_number, first_name, last_name, date_of_birth, gender,
             active, created_at, updated_at)
             VALUES ('p1', '1234567890', 'Ada', 'Lovelace', '1950-06-15', 'female', 1,
             '2026-01-01T00:00:00+00:00', '2026-01-01T00:00:00+00:00')",
            [],
        )
        .unwrap();
        let result = conn.execute(
            "INSERT INTO reviews (id, patient_id, position, review_type, status)
             VALUES ('r1', 'p1', 0, 'COPD review', 'lapsed')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn reviews_require_a_registered_patient() {
        let conn = open_memory_database().unwrap();
        let result = conn.execute(
            "INSERT INTO reviews (id, patient_id, position, review_type)
             VALUES ('r1', 'nobody', 0, 'COPD review')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn on_disk_database_uses_wal_and_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recall.db");
        drop(open_database(&path).unwrap());

        let conn = open_database(&path).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");
        assert_eq!(schema_version(&conn).unwrap(), 1);
    }
}
