//! Recall endpoints.
//!
//! - `GET /api/recalls`: run a scan, return every alert
//! - `GET /api/recalls/priority/:level`: run a scan, return one priority

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::recall::{self, filter_by_priority, Priority, RecallAlert, SqlitePatientStore};

#[derive(Serialize)]
pub struct RecallsResponse {
    pub generated_at: DateTime<Utc>,
    pub count: usize,
    pub transitioned_reviews: u32,
    pub alerts: Vec<RecallAlert>,
}

fn scan(ctx: &ApiContext) -> Result<recall::ScanReport, ApiError> {
    let conn = ctx.open_db()?;
    let report = recall::run_scan(&conn, &SqlitePatientStore::new(), &ctx.scanner, Utc::now())?;
    Ok(report.into_result()?)
}

/// `GET /api/recalls`: ranked alerts for all due and overdue reviews.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<RecallsResponse>, ApiError> {
    let report = scan(&ctx)?;

    Ok(Json(RecallsResponse {
        generated_at: report.generated_at,
        count: report.alerts.len(),
        transitioned_reviews: report.transitioned_reviews,
        alerts: report.alerts,
    }))
}

/// `GET /api/recalls/priority/:level`
pub async fn by_priority(
    State(ctx): State<ApiContext>,
    Path(level): Path<String>,
) -> Result<Json<RecallsResponse>, ApiError> {
    let priority = Priority::parse(&level)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown priority: {level}")))?;

    let report = scan(&ctx)?;
    let alerts = filter_by_priority(&report.alerts, priority);

    Ok(Json(RecallsResponse {
        generated_at: report.generated_at,
        count: alerts.len(),
        transitioned_reviews: report.transitioned_reviews,
        alerts,
    }))
}
