use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{format_date, parse_date, parse_optional_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, nhs_number, first_name, last_name, date_of_birth, gender,
     phone, email, active, created_at, updated_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO patients (id, nhs_number, first_name, last_name, date_of_birth, gender,
         phone, email, active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient.id.to_string(),
            patient.nhs_number,
            patient.first_name,
            patient.last_name,
            format_date(patient.date_of_birth),
            patient.gender.as_str(),
            patient.contact.phone,
            patient.contact.email,
            patient.active as i32,
            patient.created_at.to_rfc3339(),
            patient.updated_at.to_rfc3339(),
        ],
    )?;
    write_patient_children(&tx, patient)?;

    tx.commit()?;
    Ok(())
}

/// Move the given reviews from Due to Overdue and stamp the patient.
/// Reviews whose stored status is no longer Due are left untouched, as are
/// all other reviews and conditions. One transaction per patient.
pub fn mark_reviews_overdue(
    conn: &Connection,
    patient_id: &Uuid,
    review_ids: &[Uuid],
    updated_at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;

    let updated = tx.execute(
        "UPDATE patients SET updated_at = ?2 WHERE id = ?1",
        params![patient_id.to_string(), updated_at.to_rfc3339()],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: patient_id.to_string(),
        });
    }

    let mut stmt = tx.prepare(
        "UPDATE reviews SET status = ?3
         WHERE id = ?1 AND patient_id = ?2 AND status = ?4",
    )?;
    let mut transitioned = 0;
    for review_id in review_ids {
        transitioned += stmt.execute(params![
            review_id.to_string(),
            patient_id.to_string(),
            ReviewStatus::Overdue.as_str(),
            ReviewStatus::Due.as_str(),
        ])?;
    }
    drop(stmt);

    tx.commit()?;
    Ok(transitioned)
}

fn write_patient_children(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let patient_id = patient.id.to_string();

    for (position, review) in patient.reviews.iter().enumerate() {
        conn.execute(
            "INSERT INTO reviews (id, patient_id, position, review_type, due_date, status,
             completed_date, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                review.id.to_string(),
                patient_id,
                position as i64,
                review.review_type,
                review.due_date.map(format_date),
                review.status.as_str(),
                review.completed_date.map(format_date),
                review.notes,
            ],
        )?;
    }

    for (position, condition) in patient.chronic_conditions.iter().enumerate() {
        conn.execute(
            "INSERT INTO chronic_conditions (patient_id, position, disease_type, diagnosis_date,
             snomed_code, active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                patient_id,
                position as i64,
                condition.disease_type.as_str(),
                condition.diagnosis_date.map(format_date),
                condition.snomed_code,
                condition.active as i32,
            ],
        )?;
    }

    Ok(())
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id.to_string()], patient_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(patient_from_row(conn, row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All active patients with their reviews and conditions loaded.
pub fn list_active_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE active = 1
         ORDER BY last_name, first_name"
    ))?;

    let rows = stmt.query_map([], patient_row_from_rusqlite)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(conn, row?)?);
    }
    Ok(patients)
}

pub fn count_active_patients(conn: &Connection) -> Result<u32, DatabaseError> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM patients WHERE active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn load_reviews(conn: &Connection, patient_id: &str) -> Result<Vec<Review>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, review_type, due_date, status, completed_date, notes
         FROM reviews WHERE patient_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| {
        Ok(ReviewRow {
            id: row.get(0)?,
            review_type: row.get(1)?,
            due_date: row.get(2)?,
            status: row.get(3)?,
            completed_date: row.get(4)?,
            notes: row.get(5)?,
        })
    })?;

    let mut reviews = Vec::new();
    for row in rows {
        let row = row?;
        reviews.push(Review {
            id: parse_uuid(&row.id)?,
            review_type: row.review_type,
            due_date: parse_optional_date("reviews.due_date", row.due_date)?,
            status: ReviewStatus::from_str(&row.status)?,
            completed_date: parse_optional_date("reviews.completed_date", row.completed_date)?,
            notes: row.notes,
        });
    }
    Ok(reviews)
}

fn load_conditions(
    conn: &Connection,
    patient_id: &str,
) -> Result<Vec<ChronicCondition>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT disease_type, diagnosis_date, snomed_code, active
         FROM chronic_conditions WHERE patient_id = ?1 ORDER BY position ASC",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, i32>(3)?,
        ))
    })?;

    let mut conditions = Vec::new();
    for row in rows {
        let (disease_type, diagnosis_date, snomed_code, active) = row?;
        conditions.push(ChronicCondition {
            disease_type: DiseaseType::from_str(&disease_type)?,
            diagnosis_date: parse_optional_date("chronic_conditions.diagnosis_date", diagnosis_date)?,
            snomed_code,
            active: active != 0,
        });
    }
    Ok(conditions)
}

struct PatientRow {
    id: String,
    nhs_number: String,
    first_name: String,
    last_name: String,
    date_of_birth: String,
    gender: String,
    phone: Option<String>,
    email: Option<String>,
    active: i32,
    created_at: String,
    updated_at: String,
}

struct ReviewRow {
    id: String,
    review_type: String,
    due_date: Option<String>,
    status: String,
    completed_date: Option<String>,
    notes: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        nhs_number: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        date_of_birth: row.get(4)?,
        gender: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        active: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn patient_from_row(conn: &Connection, row: PatientRow) -> Result<Patient, DatabaseError> {
    let reviews = load_reviews(conn, &row.id)?;
    let chronic_conditions = load_conditions(conn, &row.id)?;

    Ok(Patient {
        id: parse_uuid(&row.id)?,
        nhs_number: row.nhs_number,
        first_name: row.first_name,
        last_name: row.last_name,
        date_of_birth: parse_date("patients.date_of_birth", &row.date_of_birth)?,
        gender: Gender::from_str(&row.gender)?,
        contact: ContactDetails {
            phone: row.phone,
            email: row.email,
        },
        chronic_conditions,
        reviews,
        active: row.active != 0,
        created_at: parse_timestamp("patients.created_at", &row.created_at)?,
        updated_at: parse_timestamp("patients.updated_at", &row.updated_at)?,
    })
}
