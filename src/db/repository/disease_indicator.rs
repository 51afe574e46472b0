use std::str::FromStr;

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_date, parse_date, parse_optional_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const RECORD_COLUMNS: &str = "id, patient_id, disease_type, snomed_code, snomed_display,
     snomed_system, total_points_available, points_achieved, achievement_percentage,
     last_calculated, created_at, updated_at";

pub fn insert_indicator_record(
    conn: &Connection,
    record: &DiseaseIndicatorRecord,
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let achievement = record.qof_achievement;
    let snomed = record.snomed_code.as_ref();

    tx.execute(
        "INSERT INTO disease_indicator_records (id, patient_id, disease_type, snomed_code,
         snomed_display, snomed_system, total_points_available, points_achieved,
         achievement_percentage, last_calculated, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            record.id.to_string(),
            record.patient_id.map(|id| id.to_string()),
            record.disease_type.as_str(),
            snomed.map(|s| s.code.clone()),
            snomed.and_then(|s| s.display.clone()),
            snomed.map(|s| s.system.clone()),
            achievement.map(|a| a.total_points_available),
            achievement.map(|a| a.points_achieved),
            achievement.map(|a| a.achievement_percentage),
            achievement.map(|a| a.last_calculated.to_rfc3339()),
            record.created_at.to_rfc3339(),
            record.updated_at.to_rfc3339(),
        ],
    )?;
    write_record_children(&tx, record)?;

    tx.commit()?;
    Ok(())
}

/// Persist a record, replacing its metrics and exceptions.
pub fn save_indicator_record(
    conn: &Connection,
    record: &DiseaseIndicatorRecord,
) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let achievement = record.qof_achievement;
    let snomed = record.snomed_code.as_ref();

    let updated = tx.execute(
        "UPDATE disease_indicator_records SET patient_id = ?2, disease_type = ?3,
         snomed_code = ?4, snomed_display = ?5, snomed_system = ?6,
         total_points_available = ?7, points_achieved = ?8, achievement_percentage = ?9,
         last_calculated = ?10, updated_at = ?11
         WHERE id = ?1",
        params![
            record.id.to_string(),
            record.patient_id.map(|id| id.to_string()),
            record.disease_type.as_str(),
            snomed.map(|s| s.code.clone()),
            snomed.and_then(|s| s.display.clone()),
            snomed.map(|s| s.system.clone()),
            achievement.map(|a| a.total_points_available),
            achievement.map(|a| a.points_achieved),
            achievement.map(|a| a.achievement_percentage),
            achievement.map(|a| a.last_calculated.to_rfc3339()),
            record.updated_at.to_rfc3339(),
        ],
    )?;

    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "disease_indicator_record".into(),
            id: record.id.to_string(),
        });
    }

    tx.execute(
        "DELETE FROM metric_records WHERE record_id = ?1",
        params![record.id.to_string()],
    )?;
    tx.execute(
        "DELETE FROM indicator_exceptions WHERE record_id = ?1",
        params![record.id.to_string()],
    )?;
    write_record_children(&tx, record)?;

    tx.commit()?;
    Ok(())
}

fn write_record_children(
    conn: &Connection,
    record: &DiseaseIndicatorRecord,
) -> Result<(), DatabaseError> {
    let record_id = record.id.to_string();

    for (position, metric) in record.current_metrics.iter().enumerate() {
        conn.execute(
            "INSERT INTO metric_records (record_id, position, metric_name, value, unit, target,
             achievement_status, recorded_date, next_review_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record_id,
                position as i64,
                metric.metric_name,
                metric.value,
                metric.unit,
                metric.target,
                metric.achievement_status.as_str(),
                metric.recorded_date.to_rfc3339(),
                metric.next_review_date.map(format_date),
            ],
        )?;
    }

    for (position, exception) in record.exceptions.iter().enumerate() {
        conn.execute(
            "INSERT INTO indicator_exceptions (record_id, position, reason, snomed_code,
             date_recorded, review_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record_id,
                position as i64,
                exception.reason,
                exception.snomed_code,
                format_date(exception.date_recorded),
                exception.review_date.map(format_date),
            ],
        )?;
    }

    Ok(())
}

pub fn get_indicator_record(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<DiseaseIndicatorRecord>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM disease_indicator_records WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], record_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(record_from_row(conn, row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Records matching the filter, oldest first unless `newest_first` is set.
pub fn find_indicator_records(
    conn: &Connection,
    filter: &DiseaseIndicatorFilter,
) -> Result<Vec<DiseaseIndicatorRecord>, DatabaseError> {
    let mut sql = format!("SELECT {RECORD_COLUMNS} FROM disease_indicator_records WHERE 1=1");
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(disease_type) = filter.disease_type {
        param_values.push(Box::new(disease_type.as_str().to_string()));
        sql.push_str(&format!(" AND disease_type = ?{}", param_values.len()));
    }
    if let Some(patient_id) = filter.patient_id {
        param_values.push(Box::new(patient_id.to_string()));
        sql.push_str(&format!(" AND patient_id = ?{}", param_values.len()));
    }

    if filter.newest_first {
        sql.push_str(" ORDER BY created_at DESC");
    } else {
        sql.push_str(" ORDER BY created_at ASC");
    }

    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_ref.as_slice(), record_row_from_rusqlite)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(record_from_row(conn, row?)?);
    }
    Ok(records)
}

fn load_metrics(conn: &Connection, record_id: &str) -> Result<Vec<MetricRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT metric_name, value, unit, target, achievement_status, recorded_date,
         next_review_date
         FROM metric_records WHERE record_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![record_id], |row| {
        Ok(MetricRow {
            metric_name: row.get(0)?,
            value: row.get(1)?,
            unit: row.get(2)?,
            target: row.get(3)?,
            achievement_status: row.get(4)?,
            recorded_date: row.get(5)?,
            next_review_date: row.get(6)?,
        })
    })?;

    let mut metrics = Vec::new();
    for row in rows {
        let row = row?;
        metrics.push(MetricRecord {
            metric_name: row.metric_name,
            value: row.value,
            unit: row.unit,
            target: row.target,
            achievement_status: AchievementStatus::from_str(&row.achievement_status)?,
            recorded_date: parse_timestamp("metric_records.recorded_date", &row.recorded_date)?,
            next_review_date: parse_optional_date(
                "metric_records.next_review_date",
                row.next_review_date,
            )?,
        });
    }
    Ok(metrics)
}

fn load_exceptions(
    conn: &Connection,
    record_id: &str,
) -> Result<Vec<IndicatorException>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT reason, snomed_code, date_recorded, review_date
         FROM indicator_exceptions WHERE record_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![record_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
        ))
    })?;

    let mut exceptions = Vec::new();
    for row in rows {
        let (reason, snomed_code, date_recorded, review_date) = row?;
        exceptions.push(IndicatorException {
            reason,
            snomed_code,
            date_recorded: parse_date("indicator_exceptions.date_recorded", &date_recorded)?,
            review_date: parse_optional_date("indicator_exceptions.review_date", review_date)?,
        });
    }
    Ok(exceptions)
}

struct RecordRow {
    id: String,
    patient_id: Option<String>,
    disease_type: String,
    snomed_code: Option<String>,
    snomed_display: Option<String>,
    snomed_system: Option<String>,
    total_points_available: Option<f64>,
    points_achieved: Option<f64>,
    achievement_percentage: Option<f64>,
    last_calculated: Option<String>,
    created_at: String,
    updated_at: String,
}

struct MetricRow {
    metric_name: String,
    value: Option<f64>,
    unit: Option<String>,
    target: Option<f64>,
    achievement_status: String,
    recorded_date: String,
    next_review_date: Option<String>,
}

fn record_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<RecordRow, rusqlite::Error> {
    Ok(RecordRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        disease_type: row.get(2)?,
        snomed_code: row.get(3)?,
        snomed_display: row.get(4)?,
        snomed_system: row.get(5)?,
        total_points_available: row.get(6)?,
        points_achieved: row.get(7)?,
        achievement_percentage: row.get(8)?,
        last_calculated: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn record_from_row(
    conn: &Connection,
    row: RecordRow,
) -> Result<DiseaseIndicatorRecord, DatabaseError> {
    let current_metrics = load_metrics(conn, &row.id)?;
    let exceptions = load_exceptions(conn, &row.id)?;

    let snomed_code = row.snomed_code.map(|code| SnomedCode {
        code,
        display: row.snomed_display,
        system: row
            .snomed_system
            .unwrap_or_else(|| SNOMED_SYSTEM.to_string()),
    });

    let qof_achievement = match (
        row.total_points_available,
        row.points_achieved,
        row.achievement_percentage,
        row.last_calculated,
    ) {
        (Some(total), Some(achieved), Some(percentage), Some(calculated)) => Some(QofAchievement {
            total_points_available: total,
            points_achieved: achieved,
            achievement_percentage: percentage,
            last_calculated: parse_timestamp(
                "disease_indicator_records.last_calculated",
                &calculated,
            )?,
        }),
        _ => None,
    };

    Ok(DiseaseIndicatorRecord {
        id: parse_uuid(&row.id)?,
        patient_id: row.patient_id.as_deref().map(parse_uuid).transpose()?,
        disease_type: DiseaseType::from_str(&row.disease_type)?,
        snomed_code,
        current_metrics,
        qof_achievement,
        exceptions,
        created_at: parse_timestamp("disease_indicator_records.created_at", &row.created_at)?,
        updated_at: parse_timestamp("disease_indicator_records.updated_at", &row.updated_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn metric(name: &str, status: AchievementStatus) -> MetricRecord {
        MetricRecord {
            metric_name: name.into(),
            value: Some(52.0),
            unit: Some("mmol/mol".into()),
            target: Some(58.0),
            achievement_status: status,
            recorded_date: Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap(),
            next_review_date: NaiveDate::from_ymd_opt(2026, 9, 1),
        }
    }

    fn make_record(disease: DiseaseType) -> DiseaseIndicatorRecord {
        let mut record = DiseaseIndicatorRecord::new(disease, None);
        record.snomed_code = Some(SnomedCode {
            code: "44054006".into(),
            display: Some("Diabetes mellitus type 2".into()),
            system: SNOMED_SYSTEM.into(),
        });
        record.current_metrics.push(metric("hba1c", AchievementStatus::Achieved));
        record.current_metrics.push(metric("cholesterol", AchievementStatus::NotAchieved));
        record
    }

    #[test]
    fn insert_and_get_preserves_metrics_in_order() {
        let conn = open_memory_database().unwrap();
        let record = make_record(DiseaseType::Diabetes);
        insert_indicator_record(&conn, &record).unwrap();

        let loaded = get_indicator_record(&conn, &record.id).unwrap().unwrap();
        assert_eq!(loaded.current_metrics.len(), 2);
        assert_eq!(loaded.current_metrics[0].metric_name, "hba1c");
        assert_eq!(loaded.current_metrics[1].achievement_status, AchievementStatus::NotAchieved);
        assert_eq!(loaded.snomed_code.unwrap().code, "44054006");
        assert!(loaded.qof_achievement.is_none());
    }

    #[test]
    fn save_persists_achievement_and_exceptions() {
        let conn = open_memory_database().unwrap();
        let mut record = make_record(DiseaseType::Diabetes);
        insert_indicator_record(&conn, &record).unwrap();

        record.qof_achievement = Some(QofAchievement {
            total_points_available: 10.0,
            points_achieved: 5.0,
            achievement_percentage: 50.0,
            last_calculated: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
        });
        record.exceptions.push(IndicatorException {
            reason: "Patient declined".into(),
            snomed_code: None,
            date_recorded: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            review_date: None,
        });
        save_indicator_record(&conn, &record).unwrap();

        let loaded = get_indicator_record(&conn, &record.id).unwrap().unwrap();
        let achievement = loaded.qof_achievement.unwrap();
        assert_eq!(achievement.points_achieved, 5.0);
        assert_eq!(achievement.achievement_percentage, 50.0);
        assert_eq!(loaded.exceptions.len(), 1);
        assert_eq!(loaded.current_metrics.len(), 2);
    }

    #[test]
    fn find_filters_by_disease() {
        let conn = open_memory_database().unwrap();
        insert_indicator_record(&conn, &make_record(DiseaseType::Diabetes)).unwrap();
        insert_indicator_record(&conn, &make_record(DiseaseType::Copd)).unwrap();

        let diabetes =
            find_indicator_records(&conn, &DiseaseIndicatorFilter::for_disease(DiseaseType::Diabetes))
                .unwrap();
        assert_eq!(diabetes.len(), 1);
        assert_eq!(diabetes[0].disease_type, DiseaseType::Diabetes);

        let all = find_indicator_records(&conn, &DiseaseIndicatorFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn find_respects_limit() {
        let conn = open_memory_database().unwrap();
        for _ in 0..3 {
            insert_indicator_record(&conn, &make_record(DiseaseType::Ckd)).unwrap();
        }
        let filter = DiseaseIndicatorFilter {
            limit: Some(2),
            ..DiseaseIndicatorFilter::default()
        };
        assert_eq!(find_indicator_records(&conn, &filter).unwrap().len(), 2);
    }

    #[test]
    fn latest_returns_newest_first() {
        let conn = open_memory_database().unwrap();
        let mut older = make_record(DiseaseType::Copd);
        older.created_at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut newer = make_record(DiseaseType::Cad);
        newer.created_at = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        insert_indicator_record(&conn, &older).unwrap();
        insert_indicator_record(&conn, &newer).unwrap();

        let latest = find_indicator_records(&conn, &DiseaseIndicatorFilter::latest(1)).unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].id, newer.id);
    }

    #[test]
    fn save_unknown_record_is_not_found() {
        let conn = open_memory_database().unwrap();
        let record = make_record(DiseaseType::Cad);
        assert!(matches!(
            save_indicator_record(&conn, &record).unwrap_err(),
            DatabaseError::NotFound { .. }
        ));
    }
}
