//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{count_active_patients, schema_version};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub schema_version: i64,
    pub active_patients: u32,
    pub catalogue_diseases: usize,
}

/// `GET /api/health`: database reachable and catalogue loaded.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let active_patients = count_active_patients(&conn)?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: crate::config::APP_VERSION,
        schema_version: schema_version(&conn)?,
        active_patients,
        catalogue_diseases: ctx.catalogue.disease_types().count(),
    }))
}
