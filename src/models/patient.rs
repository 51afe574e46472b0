use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DiseaseType, Gender, ReviewStatus};

/// A registered patient with embedded reviews.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    pub id: Uuid,
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
    pub reviews: Vec<Review>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactDetails {
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChronicCondition {
    pub disease_type: DiseaseType,
    pub diagnosis_date: Option<NaiveDate>,
    pub snomed_code: Option<String>,
    pub active: bool,
}

/// A scheduled clinical review. Owned by its patient, no identity outside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub review_type: String,
    pub due_date: Option<NaiveDate>,
    pub status: ReviewStatus,
    pub completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl Review {
    pub fn new(review_type: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            review_type: review_type.into(),
            due_date,
            status: ReviewStatus::Due,
            completed_date: None,
            notes: String::new(),
        }
    }

    /// The instant a review falls due: UTC midnight at the start of its due date.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        self.due_date.map(|d| d.and_time(NaiveTime::MIN).and_utc())
    }

    /// Past its due instant. Undated reviews are never overdue.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        self.due_instant().is_some_and(|due| due < now)
    }
}

impl Patient {
    pub fn new(
        nhs_number: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        gender: Gender,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            nhs_number: nhs_number.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            gender,
            contact: ContactDetails::default(),
            chronic_conditions: Vec::new(),
            reviews: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    /// Age in whole years on the given date.
    pub fn age_on(&self, on: NaiveDate) -> u32 {
        on.years_since(self.date_of_birth).unwrap_or(0)
    }

    /// Reviews still marked due whose due date has passed. These are the
    /// ones a recall scan moves to Overdue.
    pub fn overdue_reviews(&self, now: DateTime<Utc>) -> Vec<&Review> {
        self.reviews
            .iter()
            .filter(|r| r.status == ReviewStatus::Due && r.is_overdue_at(now))
            .collect()
    }
}
