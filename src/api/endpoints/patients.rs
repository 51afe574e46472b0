//! `POST /api/patients`: register a patient with their scheduled reviews.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::Gender;
use crate::models::*;
use crate::validation::validate_patient;

#[derive(Deserialize)]
pub struct RegisterPatientRequest {
    pub nhs_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub contact: ContactDetails,
    #[serde(default)]
    pub chronic_conditions: Vec<ChronicCondition>,
    #[serde(default)]
    pub reviews: Vec<ReviewRequest>,
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub review_type: String,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize)]
pub struct RegisteredPatient {
    #[serde(flatten)]
    pub patient: Patient,
    pub age: u32,
}

pub async fn register(
    State(ctx): State<ApiContext>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<RegisteredPatient>), ApiError> {
    let mut patient = Patient::new(
        request.nhs_number,
        request.first_name,
        request.last_name,
        request.date_of_birth,
        request.gender,
    );
    patient.contact = request.contact;
    patient.chronic_conditions = request.chronic_conditions;
    patient.reviews = request
        .reviews
        .into_iter()
        .map(|r| {
            let mut review = Review::new(r.review_type, r.due_date);
            review.notes = r.notes;
            review
        })
        .collect();

    let today = Utc::now().date_naive();
    validate_patient(&patient, today)
        .into_result()
        .map_err(ApiError::Validation)?;

    let conn = ctx.open_db()?;
    db::insert_patient(&conn, &patient)?;

    tracing::info!(patient_id = %patient.id, reviews = patient.reviews.len(), "Patient registered");

    let age = patient.age_on(today);
    Ok((StatusCode::CREATED, Json(RegisteredPatient { patient, age })))
}
