use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{AchievementStatus, DiseaseType};

pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnomedCode {
    pub code: String,
    pub display: Option<String>,
    #[serde(default = "default_snomed_system")]
    pub system: String,
}

fn default_snomed_system() -> String {
    SNOMED_SYSTEM.to_string()
}

/// Per-patient tracking of one chronic disease's indicators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiseaseIndicatorRecord {
    pub id: Uuid,
    pub patient_id: Option<Uuid>,
    pub disease_type: DiseaseType,
    pub snomed_code: Option<SnomedCode>,
    #[serde(default)]
    pub current_metrics: Vec<MetricRecord>,
    /// Derived. Written only by the QOF calculator.
    pub qof_achievement: Option<QofAchievement>,
    #[serde(default)]
    pub exceptions: Vec<IndicatorException>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DiseaseIndicatorRecord {
    pub fn new(disease_type: DiseaseType, patient_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            patient_id,
            disease_type,
            snomed_code: None,
            current_metrics: Vec::new(),
            qof_achievement: None,
            exceptions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn achieved_metric_count(&self) -> usize {
        self.current_metrics
            .iter()
            .filter(|m| m.achievement_status == AchievementStatus::Achieved)
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricRecord {
    pub metric_name: String,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub target: Option<f64>,
    pub achievement_status: AchievementStatus,
    pub recorded_date: DateTime<Utc>,
    pub next_review_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QofAchievement {
    pub total_points_available: f64,
    pub points_achieved: f64,
    pub achievement_percentage: f64,
    pub last_calculated: DateTime<Utc>,
}

/// Exception-reported justification for excluding the patient from an indicator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorException {
    pub reason: String,
    pub snomed_code: Option<String>,
    pub date_recorded: NaiveDate,
    pub review_date: Option<NaiveDate>,
}
