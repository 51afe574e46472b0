//! `GET /api/dashboard/overview`: register size, condition mix, latest records.

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db;
use crate::models::{DiseaseIndicatorFilter, DiseaseIndicatorRecord};
use crate::qof::{disease_breakdown, DiseaseCount};

const LATEST_RECORDS: u32 = 10;

#[derive(Serialize)]
pub struct OverviewResponse {
    pub total_patients: u32,
    pub disease_breakdown: Vec<DiseaseCount>,
    pub latest_records: Vec<DiseaseIndicatorRecord>,
    pub timestamp: DateTime<Utc>,
}

pub async fn overview(State(ctx): State<ApiContext>) -> Result<Json<OverviewResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let patients = db::list_active_patients(&conn)?;
    let latest_records =
        db::find_indicator_records(&conn, &DiseaseIndicatorFilter::latest(LATEST_RECORDS))?;

    Ok(Json(OverviewResponse {
        total_patients: patients.len() as u32,
        disease_breakdown: disease_breakdown(&patients),
        latest_records,
        timestamp: Utc::now(),
    }))
}
