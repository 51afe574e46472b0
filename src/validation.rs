//! Boundary validation.
//!
//! Runs before any domain logic. Every rule is checked and every failure is
//! reported, so callers can show the full list at once.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::models::{DiseaseIndicatorRecord, IndicatorException, MetricRecord, Patient};

static NHS_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{10}$").unwrap());

static PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9\s\+\-\(\)]+$").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidField {
    pub field: String,
    pub reason: String,
}

impl InvalidField {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for InvalidField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(Vec<InvalidField>),
}

impl Validation {
    fn from_errors(errors: Vec<InvalidField>) -> Self {
        if errors.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn into_result(self) -> Result<(), Vec<InvalidField>> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// Join field errors into a single message.
pub fn describe(errors: &[InvalidField]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn validate_patient(patient: &Patient, today: NaiveDate) -> Validation {
    let mut errors = Vec::new();

    if !NHS_NUMBER.is_match(&patient.nhs_number) {
        errors.push(InvalidField::new("nhs_number", "must be exactly 10 digits"));
    }
    if patient.first_name.trim().is_empty() {
        errors.push(InvalidField::new("first_name", "must not be blank"));
    }
    if patient.last_name.trim().is_empty() {
        errors.push(InvalidField::new("last_name", "must not be blank"));
    }
    if patient.date_of_birth > today {
        errors.push(InvalidField::new("date_of_birth", "must not be in the future"));
    }
    if let Some(phone) = &patient.contact.phone {
        if !PHONE.is_match(phone) {
            errors.push(InvalidField::new("contact.phone", "invalid phone number"));
        }
    }
    if let Some(email) = &patient.contact.email {
        if !EMAIL.is_match(email) {
            errors.push(InvalidField::new("contact.email", "invalid email address"));
        }
    }
    for (i, review) in patient.reviews.iter().enumerate() {
        if review.review_type.trim().is_empty() {
            errors.push(InvalidField::new(
                format!("reviews[{i}].review_type"),
                "must not be blank",
            ));
        }
    }

    Validation::from_errors(errors)
}

pub fn validate_metric(metric: &MetricRecord) -> Validation {
    let mut errors = Vec::new();
    check_metric("metric", metric, &mut errors);
    Validation::from_errors(errors)
}

pub fn validate_indicator_record(record: &DiseaseIndicatorRecord) -> Validation {
    let mut errors = Vec::new();

    for (i, metric) in record.current_metrics.iter().enumerate() {
        check_metric(&format!("current_metrics[{i}]"), metric, &mut errors);
    }
    for (i, exception) in record.exceptions.iter().enumerate() {
        check_exception(&format!("exceptions[{i}]"), exception, &mut errors);
    }
    if let Some(snomed) = &record.snomed_code {
        if snomed.code.trim().is_empty() {
            errors.push(InvalidField::new("snomed_code.code", "must not be blank"));
        }
    }

    Validation::from_errors(errors)
}

fn check_metric(prefix: &str, metric: &MetricRecord, errors: &mut Vec<InvalidField>) {
    if metric.metric_name.trim().is_empty() {
        errors.push(InvalidField::new(
            format!("{prefix}.metric_name"),
            "must not be blank",
        ));
    }
    if metric.value.is_some_and(|v| !v.is_finite()) {
        errors.push(InvalidField::new(format!("{prefix}.value"), "must be a finite number"));
    }
    if metric.target.is_some_and(|v| !v.is_finite()) {
        errors.push(InvalidField::new(format!("{prefix}.target"), "must be a finite number"));
    }
}

fn check_exception(prefix: &str, exception: &IndicatorException, errors: &mut Vec<InvalidField>) {
    if exception.reason.trim().is_empty() {
        errors.push(InvalidField::new(format!("{prefix}.reason"), "must not be blank"));
    }
}
