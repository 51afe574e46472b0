//! Core types for the due-review recall scan.
//!
//! Patients → ReviewEvaluation → RecallAlert, collected into a ScanReport.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{RecallError, SaveFailure};
use crate::models::enums::ReviewStatus;

// ═══════════════════════════════════════════
// Priority
// ═══════════════════════════════════════════

/// Recall urgency. Declaration order is sort order: High first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ═══════════════════════════════════════════
// Alerts
// ═══════════════════════════════════════════

/// A review needing attention. Derived on every scan, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecallAlert {
    pub patient_id: Uuid,
    pub patient_name: String,
    pub nhs_number: String,
    pub review_type: String,
    pub due_date: Option<NaiveDate>,
    pub status: ReviewStatus,
    pub days_overdue: i64,
    pub priority: Priority,
}

/// Outcome of evaluating a single review against the scan instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewEvaluation {
    pub is_overdue: bool,
    pub days_overdue: i64,
    pub priority: Priority,
}

/// Alerts of one priority, order preserved.
pub fn filter_by_priority(alerts: &[RecallAlert], priority: Priority) -> Vec<RecallAlert> {
    alerts
        .iter()
        .filter(|a| a.priority == priority)
        .cloned()
        .collect()
}

// ═══════════════════════════════════════════
// Scan Report
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<RecallAlert>,
    pub transitioned_reviews: u32,
    pub patients_saved: u32,
    pub save_failures: Vec<SaveFailure>,
}

impl ScanReport {
    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            alerts: Vec::new(),
            transitioned_reviews: 0,
            patients_saved: 0,
            save_failures: Vec::new(),
        }
    }

    /// Strict view: any failed save turns the report into an error.
    pub fn into_result(self) -> Result<Self, RecallError> {
        if self.save_failures.is_empty() {
            Ok(self)
        } else {
            Err(RecallError::PartialPersistence(self.save_failures))
        }
    }
}

// ═══════════════════════════════════════════
// Configuration
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    /// Overdue by more than this many days → High.
    pub high_priority_after_days: i64,
    /// Overdue by more than this many days (and not High) → Medium.
    pub medium_priority_after_days: i64,
    /// UTC hour from which the daily background scan may run.
    pub scan_hour_utc: u32,
    pub check_interval_secs: u64,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            high_priority_after_days: 30,
            medium_priority_after_days: 14,
            scan_hour_utc: 8,
            check_interval_secs: 15 * 60,
        }
    }
}
