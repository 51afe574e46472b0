//! Practice-level aggregates over an explicit snapshot of records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::enums::DiseaseType;
use crate::models::{DiseaseIndicatorRecord, Patient};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSummary {
    pub total_patients: u32,
    pub by_disease: BTreeMap<DiseaseType, DiseaseSummary>,
    pub qof_achievement: OverallAchievement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiseaseSummary {
    pub count: u32,
    /// Mean record percentage, 2 dp. Records never calculated count as 0.
    pub average_achievement: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallAchievement {
    pub total_points: f64,
    pub achieved_points: f64,
    pub achievement_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiseaseCount {
    pub disease_type: DiseaseType,
    pub count: u32,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn summarize(total_patients: u32, records: &[DiseaseIndicatorRecord]) -> PracticeSummary {
    let mut sums: BTreeMap<DiseaseType, (u32, f64)> = BTreeMap::new();
    let mut total_points = 0.0;
    let mut achieved_points = 0.0;

    for record in records {
        let entry = sums.entry(record.disease_type).or_insert((0, 0.0));
        entry.0 += 1;
        if let Some(achievement) = &record.qof_achievement {
            entry.1 += achievement.achievement_percentage;
            total_points += achievement.total_points_available;
            achieved_points += achievement.points_achieved;
        }
    }

    let by_disease = sums
        .into_iter()
        .map(|(disease, (count, sum))| {
            (
                disease,
                DiseaseSummary {
                    count,
                    average_achievement: round2(sum / count as f64),
                },
            )
        })
        .collect();

    let achievement_percentage = if total_points > 0.0 {
        round2(achieved_points / total_points * 100.0)
    } else {
        0.0
    };

    PracticeSummary {
        total_patients,
        by_disease,
        qof_achievement: OverallAchievement {
            total_points,
            achieved_points,
            achievement_percentage,
        },
    }
}

/// Chronic condition counts across active patients, most common first.
pub fn disease_breakdown(patients: &[Patient]) -> Vec<DiseaseCount> {
    let mut counts: BTreeMap<DiseaseType, u32> = BTreeMap::new();
    for condition in patients
        .iter()
        .filter(|p| p.active)
        .flat_map(|p| p.chronic_conditions.iter())
    {
        *counts.entry(condition.disease_type).or_insert(0) += 1;
    }

    let mut breakdown: Vec<DiseaseCount> = counts
        .into_iter()
        .map(|(disease_type, count)| DiseaseCount { disease_type, count })
        .collect();
    breakdown.sort_by(|a, b| b.count.cmp(&a.count));
    breakdown
}
