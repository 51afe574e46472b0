//! QOF endpoints.
//!
//! - `GET  /api/qof/summary`: practice achievement summary
//! - `GET  /api/qof/disease/:type`: records for one disease, newest first
//! - `POST /api/qof/records`: store a new record (scored on the way in)
//! - `POST /api/qof/records/:id/metrics`: append a metric and rescore
//! - `POST /api/qof/records/:id/recalculate`: rescore on demand

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::enums::{AchievementStatus, DiseaseType};
use crate::models::*;
use crate::qof::{self, PracticeSummary, SqliteDiseaseIndicatorStore};
use crate::validation::validate_indicator_record;

#[derive(Deserialize)]
pub struct CreateRecordRequest {
    pub patient_id: Option<Uuid>,
    pub disease_type: DiseaseType,
    pub snomed_code: Option<SnomedCode>,
    #[serde(default)]
    pub current_metrics: Vec<MetricRequest>,
    #[serde(default)]
    pub exceptions: Vec<IndicatorException>,
}

#[derive(Deserialize)]
pub struct MetricRequest {
    pub metric_name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub target: Option<f64>,
    pub achievement_status: AchievementStatus,
    /// Defaults to the time of the request.
    pub recorded_date: Option<DateTime<Utc>>,
    pub next_review_date: Option<NaiveDate>,
}

impl MetricRequest {
    fn into_metric(self, now: DateTime<Utc>) -> MetricRecord {
        MetricRecord {
            metric_name: self.metric_name,
            value: self.value,
            unit: self.unit,
            target: self.target,
            achievement_status: self.achievement_status,
            recorded_date: self.recorded_date.unwrap_or(now),
            next_review_date: self.next_review_date,
        }
    }
}

fn parse_record_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid ID format".into()))
}

/// `GET /api/qof/summary`
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<PracticeSummary>, ApiError> {
    let conn = ctx.open_db()?;
    let total_patients = db::count_active_patients(&conn)?;
    let records = db::find_indicator_records(&conn, &DiseaseIndicatorFilter::default())?;

    Ok(Json(qof::summarize(total_patients, &records)))
}

/// `GET /api/qof/disease/:type`
pub async fn by_disease(
    State(ctx): State<ApiContext>,
    Path(disease): Path<String>,
) -> Result<Json<Vec<DiseaseIndicatorRecord>>, ApiError> {
    let disease_type = DiseaseType::from_str(&disease)
        .map_err(|_| ApiError::BadRequest(format!("Unknown disease type: {disease}")))?;

    let conn = ctx.open_db()?;
    let filter = DiseaseIndicatorFilter {
        newest_first: true,
        ..DiseaseIndicatorFilter::for_disease(disease_type)
    };
    let records = db::find_indicator_records(&conn, &filter)?;

    Ok(Json(records))
}

/// `POST /api/qof/records`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(request): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<DiseaseIndicatorRecord>), ApiError> {
    let now = Utc::now();

    let mut record = DiseaseIndicatorRecord::new(request.disease_type, request.patient_id);
    record.snomed_code = request.snomed_code;
    record.current_metrics = request
        .current_metrics
        .into_iter()
        .map(|m| m.into_metric(now))
        .collect();
    record.exceptions = request.exceptions;

    validate_indicator_record(&record)
        .into_result()
        .map_err(ApiError::Validation)?;

    let conn = ctx.open_db()?;
    if let Some(patient_id) = record.patient_id {
        if db::get_patient(&conn, &patient_id)?.is_none() {
            return Err(ApiError::BadRequest(format!("Unknown patient: {patient_id}")));
        }
    }

    qof::recalculate(&mut record, &ctx.catalogue, now);
    db::insert_indicator_record(&conn, &record)?;

    tracing::info!(record_id = %record.id, disease = %record.disease_type, "Disease indicator record created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// `POST /api/qof/records/:id/metrics`
pub async fn add_metric(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(request): Json<MetricRequest>,
) -> Result<Json<DiseaseIndicatorRecord>, ApiError> {
    let record_id = parse_record_id(&id)?;
    let now = Utc::now();
    let conn = ctx.open_db()?;

    let record = qof::record_metric(
        &conn,
        &SqliteDiseaseIndicatorStore::new(),
        &ctx.catalogue,
        &record_id,
        request.into_metric(now),
        now,
    )?;

    Ok(Json(record))
}

/// `POST /api/qof/records/:id/recalculate`
pub async fn recalculate(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<DiseaseIndicatorRecord>, ApiError> {
    let record_id = parse_record_id(&id)?;
    let conn = ctx.open_db()?;

    let record = qof::recalculate_record(
        &conn,
        &SqliteDiseaseIndicatorStore::new(),
        &ctx.catalogue,
        &record_id,
        Utc::now(),
    )?;

    Ok(Json(record))
}
