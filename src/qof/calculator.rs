//! QOF achievement calculator.
//!
//! Each achieved metric earns an equal share of the disease's total points,
//! whichever indicator it represents. Exceptions are kept on the record but
//! do not change the numerator or the denominator.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::catalogue::IndicatorCatalogue;
use super::error::QofError;
use super::traits::DiseaseIndicatorStore;
use crate::models::{DiseaseIndicatorRecord, MetricRecord, QofAchievement};
use crate::validation::{describe, validate_metric};

/// Recompute the record's achievement from its metrics and overwrite it.
/// A disease with no configured indicators scores zero.
pub fn recalculate(
    record: &mut DiseaseIndicatorRecord,
    catalogue: &IndicatorCatalogue,
    now: DateTime<Utc>,
) -> QofAchievement {
    let (total, indicator_count) = catalogue
        .disease(record.disease_type)
        .map(|d| (d.total_points(), d.indicator_count()))
        .unwrap_or((0.0, 0));

    let achieved = record.achieved_metric_count();

    let points_achieved = if indicator_count == 0 {
        0.0
    } else {
        achieved as f64 * (total / indicator_count as f64)
    };

    let achievement_percentage = if total > 0.0 {
        points_achieved / total * 100.0
    } else {
        0.0
    };

    let achievement = QofAchievement {
        total_points_available: total,
        points_achieved,
        achievement_percentage,
        last_calculated: now,
    };

    record.qof_achievement = Some(achievement);
    record.updated_at = now;
    achievement
}

/// One read-compute-write cycle for a stored record.
pub fn recalculate_record(
    conn: &Connection,
    store: &dyn DiseaseIndicatorStore,
    catalogue: &IndicatorCatalogue,
    record_id: &Uuid,
    now: DateTime<Utc>,
) -> Result<DiseaseIndicatorRecord, QofError> {
    let mut record = store.get(conn, record_id)?;
    let achievement = recalculate(&mut record, catalogue, now);
    store.save(conn, &record)?;

    tracing::debug!(
        record_id = %record.id,
        disease = %record.disease_type,
        percentage = achievement.achievement_percentage,
        "QOF achievement recalculated"
    );

    Ok(record)
}

/// Append a metric to a stored record and recalculate in the same write.
pub fn record_metric(
    conn: &Connection,
    store: &dyn DiseaseIndicatorStore,
    catalogue: &IndicatorCatalogue,
    record_id: &Uuid,
    metric: MetricRecord,
    now: DateTime<Utc>,
) -> Result<DiseaseIndicatorRecord, QofError> {
    validate_metric(&metric)
        .into_result()
        .map_err(|errors| QofError::Validation(describe(&errors)))?;

    let mut record = store.get(conn, record_id)?;
    record.current_metrics.push(metric);
    let achievement = recalculate(&mut record, catalogue, now);
    store.save(conn, &record)?;

    tracing::info!(
        record_id = %record.id,
        metrics = record.current_metrics.len(),
        percentage = achievement.achievement_percentage,
        "Metric recorded"
    );

    Ok(record)
}
