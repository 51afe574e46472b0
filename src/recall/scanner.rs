//! Due-review scanner: evaluates pending reviews, ranks alerts, and
//! persists the Due → Overdue transitions it causes.

use std::time::Instant;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use super::error::{RecallError, SaveFailure};
use super::traits::PatientStore;
use super::types::*;
use crate::models::enums::ReviewStatus;
use crate::models::{Patient, Review};

/// Stateless evaluator configured with the priority thresholds.
pub struct RecallScanner {
    config: RecallConfig,
}

/// In-memory result of scanning a patient slice.
#[derive(Debug, Default)]
pub struct PatientScan {
    pub alerts: Vec<RecallAlert>,
    /// One entry per patient with at least one review moved to Overdue.
    pub transitions: Vec<PatientTransition>,
    pub transitioned: u32,
}

/// Reviews of one patient (by slice index) that a scan moved Due → Overdue.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientTransition {
    pub index: usize,
    pub review_ids: Vec<Uuid>,
}

impl RecallScanner {
    pub fn new(config: RecallConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    pub fn evaluate_review(&self, review: &Review, now: DateTime<Utc>) -> ReviewEvaluation {
        let is_overdue = review.is_overdue_at(now);
        let days_overdue = match review.due_instant() {
            Some(d) if is_overdue => (now - d).num_days().max(0),
            _ => 0,
        };

        ReviewEvaluation {
            is_overdue,
            days_overdue,
            priority: self.classify(is_overdue, days_overdue),
        }
    }

    pub fn classify(&self, is_overdue: bool, days_overdue: i64) -> Priority {
        if !is_overdue {
            Priority::Low
        } else if days_overdue > self.config.high_priority_after_days {
            Priority::High
        } else if days_overdue > self.config.medium_priority_after_days {
            Priority::Medium
        } else {
            Priority::Low
        }
    }

    /// Evaluate every pending review, transitioning late Due reviews to
    /// Overdue in place. Alerts come back sorted.
    pub fn scan_patients(&self, patients: &mut [Patient], now: DateTime<Utc>) -> PatientScan {
        let mut scan = PatientScan::default();

        for (idx, patient) in patients.iter_mut().enumerate() {
            let patient_name = patient.full_name();
            let newly_overdue: Vec<Uuid> = patient
                .overdue_reviews(now)
                .into_iter()
                .map(|r| r.id)
                .collect();

            for review in patient.reviews.iter_mut() {
                if !review.status.is_pending() {
                    continue;
                }

                let eval = self.evaluate_review(review, now);
                if review.status != ReviewStatus::Due && !eval.is_overdue {
                    continue;
                }

                scan.alerts.push(RecallAlert {
                    patient_id: patient.id,
                    patient_name: patient_name.clone(),
                    nhs_number: patient.nhs_number.clone(),
                    review_type: review.review_type.clone(),
                    due_date: review.due_date,
                    status: if eval.is_overdue {
                        ReviewStatus::Overdue
                    } else {
                        review.status
                    },
                    days_overdue: eval.days_overdue,
                    priority: eval.priority,
                });

                if newly_overdue.contains(&review.id) {
                    tracing::debug!(
                        patient_id = %patient.id,
                        review_id = %review.id,
                        days_overdue = eval.days_overdue,
                        "Review transitioned to overdue"
                    );
                    review.status = ReviewStatus::Overdue;
                    scan.transitioned += 1;
                }
            }

            if !newly_overdue.is_empty() {
                patient.updated_at = now;
                scan.transitions.push(PatientTransition {
                    index: idx,
                    review_ids: newly_overdue,
                });
            }
        }

        sort_alerts(&mut scan.alerts);
        scan
    }
}

impl Default for RecallScanner {
    fn default() -> Self {
        Self::new(RecallConfig::default())
    }
}

/// Priority first, then oldest due date. Undated reviews sort first.
pub fn sort_alerts(alerts: &mut [RecallAlert]) {
    alerts.sort_by_key(|a| (a.priority, a.due_date));
}

/// Run a full scan: store read → evaluation → per-patient save of the
/// Due → Overdue transitions only. A read failure aborts; save failures are
/// collected into the report.
pub fn run_scan(
    conn: &Connection,
    store: &dyn PatientStore,
    scanner: &RecallScanner,
    now: DateTime<Utc>,
) -> Result<ScanReport, RecallError> {
    let start = Instant::now();

    let mut patients = store.find_active_patients(conn)?;
    let scan = scanner.scan_patients(&mut patients, now);

    let mut report = ScanReport::empty(now);
    report.transitioned_reviews = scan.transitioned;

    for transition in &scan.transitions {
        let patient = &patients[transition.index];
        match store.mark_overdue(conn, patient, &transition.review_ids) {
            Ok(()) => report.patients_saved += 1,
            Err(e) => {
                tracing::error!(patient_id = %patient.id, error = %e, "Failed to save recall transitions");
                report.save_failures.push(SaveFailure {
                    patient_id: patient.id,
                    message: e.to_string(),
                });
            }
        }
    }

    report.alerts = scan.alerts;

    tracing::info!(
        patients = patients.len(),
        alerts = report.alerts.len(),
        transitioned = report.transitioned_reviews,
        failures = report.save_failures.len(),
        elapsed = ?start.elapsed(),
        "Recall scan completed"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseError;
    use crate::models::enums::Gender;
    use chrono::{Duration, NaiveDate, TimeZone};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> Option<NaiveDate> {
        Some(now().date_naive() - Duration::days(days))
    }

    fn patient(last: &str, reviews: Vec<Review>) -> Patient {
        let mut p = Patient::new(
            "1234567890",
            "Test",
            last,
            NaiveDate::from_ymd_opt(1960, 1, 1).unwrap(),
            Gender::NotSpecified,
        );
        p.reviews = reviews;
        p
    }

    fn review(review_type: &str, due: Option<NaiveDate>, status: ReviewStatus) -> Review {
        let mut r = Review::new(review_type, due);
        r.status = status;
        r
    }

    /// In-memory store recording saves; can fail reads or one patient's save.
    struct MockStore {
        patients: Mutex<Vec<Patient>>,
        fail_read: bool,
        fail_save_for: Option<Uuid>,
        saves: Mutex<Vec<Uuid>>,
    }

    impl MockStore {
        fn new(patients: Vec<Patient>) -> Self {
            Self {
                patients: Mutex::new(patients),
                fail_read: false,
                fail_save_for: None,
                saves: Mutex::new(vec![]),
            }
        }
    }

    impl PatientStore for MockStore {
        fn find_active_patients(&self, _: &Connection) -> Result<Vec<Patient>, RecallError> {
            if self.fail_read {
                return Err(DatabaseError::ConstraintViolation("store offline".into()).into());
            }
            Ok(self.patients.lock().unwrap().clone())
        }

        fn mark_overdue(
            &self,
            _: &Connection,
            patient: &Patient,
            review_ids: &[Uuid],
        ) -> Result<(), DatabaseError> {
            if self.fail_save_for == Some(patient.id) {
                return Err(DatabaseError::ConstraintViolation("write refused".into()));
            }
            self.saves.lock().unwrap().push(patient.id);
            let mut stored = self.patients.lock().unwrap();
            if let Some(slot) = stored.iter_mut().find(|p| p.id == patient.id) {
                for review in slot.reviews.iter_mut() {
                    if review_ids.contains(&review.id) && review.status == ReviewStatus::Due {
                        review.status = ReviewStatus::Overdue;
                    }
                }
                slot.updated_at = patient.updated_at;
            }
            Ok(())
        }
    }

    fn conn() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn forty_twenty_five_days_rank_high_medium_low() {
        let store = MockStore::new(vec![patient(
            "Smith",
            vec![
                review("five", days_ago(5), ReviewStatus::Due),
                review("forty", days_ago(40), ReviewStatus::Due),
                review("twenty", days_ago(20), ReviewStatus::Due),
            ],
        )]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        let summary: Vec<(&str, Priority, i64)> = report
            .alerts
            .iter()
            .map(|a| (a.review_type.as_str(), a.priority, a.days_overdue))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("forty", Priority::High, 40),
                ("twenty", Priority::Medium, 20),
                ("five", Priority::Low, 5),
            ]
        );
        assert!(report.alerts.iter().all(|a| a.status == ReviewStatus::Overdue));
        assert_eq!(report.transitioned_reviews, 3);
        assert_eq!(report.patients_saved, 1);
    }

    #[test]
    fn threshold_boundaries_are_exclusive() {
        let scanner = RecallScanner::default();
        assert_eq!(scanner.classify(true, 31), Priority::High);
        assert_eq!(scanner.classify(true, 30), Priority::Medium);
        assert_eq!(scanner.classify(true, 15), Priority::Medium);
        assert_eq!(scanner.classify(true, 14), Priority::Low);
        assert_eq!(scanner.classify(false, 100), Priority::Low);
    }

    #[test]
    fn custom_thresholds_are_honoured() {
        let scanner = RecallScanner::new(RecallConfig {
            high_priority_after_days: 7,
            medium_priority_after_days: 3,
            ..RecallConfig::default()
        });
        assert_eq!(scanner.classify(true, 8), Priority::High);
        assert_eq!(scanner.classify(true, 4), Priority::Medium);
    }

    #[test]
    fn second_scan_is_idempotent_and_still_alerts() {
        let store = MockStore::new(vec![patient(
            "Jones",
            vec![review("asthma", days_ago(40), ReviewStatus::Due)],
        )]);
        let scanner = RecallScanner::default();

        let first = run_scan(&conn(), &store, &scanner, now()).unwrap();
        let second = run_scan(&conn(), &store, &scanner, now()).unwrap();

        assert_eq!(first.transitioned_reviews, 1);
        assert_eq!(second.transitioned_reviews, 0);
        assert_eq!(second.patients_saved, 0);
        assert_eq!(first.alerts, second.alerts);
        assert_eq!(store.saves.lock().unwrap().len(), 1);
        let stored = store.patients.lock().unwrap();
        assert_eq!(stored[0].reviews[0].status, ReviewStatus::Overdue);
    }

    #[test]
    fn future_due_review_alerts_low_without_mutation() {
        let future = Some(now().date_naive() + Duration::days(10));
        let store = MockStore::new(vec![patient(
            "Future",
            vec![review("diabetes", future, ReviewStatus::Due)],
        )]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].priority, Priority::Low);
        assert_eq!(report.alerts[0].days_overdue, 0);
        assert_eq!(report.alerts[0].status, ReviewStatus::Due);
        assert_eq!(report.transitioned_reviews, 0);
        assert!(store.saves.lock().unwrap().is_empty());
    }

    #[test]
    fn completed_and_cancelled_reviews_are_ignored() {
        let store = MockStore::new(vec![patient(
            "Closed",
            vec![
                review("done", days_ago(90), ReviewStatus::Completed),
                review("dropped", days_ago(90), ReviewStatus::Cancelled),
            ],
        )]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        assert!(report.alerts.is_empty());
        let stored = store.patients.lock().unwrap();
        assert_eq!(stored[0].reviews[0].status, ReviewStatus::Completed);
        assert_eq!(stored[0].reviews[1].status, ReviewStatus::Cancelled);
    }

    #[test]
    fn undated_review_alerts_low_and_sorts_first() {
        let store = MockStore::new(vec![patient(
            "Undated",
            vec![
                review("dated", days_ago(3), ReviewStatus::Due),
                review("undated", None, ReviewStatus::Due),
            ],
        )]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.alerts[0].review_type, "undated");
        assert_eq!(report.alerts[0].priority, Priority::Low);
        assert_eq!(report.alerts[0].days_overdue, 0);
        assert_eq!(report.alerts[0].status, ReviewStatus::Due);
    }

    #[test]
    fn stored_overdue_with_future_date_is_not_alerted() {
        let future = Some(now().date_naive() + Duration::days(5));
        let store = MockStore::new(vec![patient(
            "Moved",
            vec![review("rescheduled", future, ReviewStatus::Overdue)],
        )]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn review_due_today_is_overdue_by_zero_days() {
        let store = MockStore::new(vec![patient(
            "Today",
            vec![review("today", Some(now().date_naive()), ReviewStatus::Due)],
        )]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        assert_eq!(report.alerts[0].status, ReviewStatus::Overdue);
        assert_eq!(report.alerts[0].days_overdue, 0);
        assert_eq!(report.alerts[0].priority, Priority::Low);
    }

    #[test]
    fn alerts_sort_across_patients() {
        let store = MockStore::new(vec![
            patient("A", vec![review("a-low", days_ago(2), ReviewStatus::Due)]),
            patient("B", vec![review("b-high-newer", days_ago(35), ReviewStatus::Due)]),
            patient("C", vec![review("c-high-older", days_ago(60), ReviewStatus::Overdue)]),
        ]);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        let order: Vec<&str> = report.alerts.iter().map(|a| a.review_type.as_str()).collect();
        assert_eq!(order, vec!["c-high-older", "b-high-newer", "a-low"]);
    }

    #[test]
    fn save_failure_is_isolated_and_collected() {
        let failing = patient("Fail", vec![review("x", days_ago(20), ReviewStatus::Due)]);
        let failing_id = failing.id;
        let ok = patient("Ok", vec![review("y", days_ago(20), ReviewStatus::Due)]);
        let ok_id = ok.id;

        let mut store = MockStore::new(vec![failing, ok]);
        store.fail_save_for = Some(failing_id);

        let report = run_scan(&conn(), &store, &RecallScanner::default(), now()).unwrap();
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.patients_saved, 1);
        assert_eq!(report.save_failures.len(), 1);
        assert_eq!(report.save_failures[0].patient_id, failing_id);
        assert_eq!(*store.saves.lock().unwrap(), vec![ok_id]);

        assert!(matches!(
            report.into_result(),
            Err(RecallError::PartialPersistence(_))
        ));
    }

    #[test]
    fn read_failure_aborts_the_scan() {
        let mut store = MockStore::new(vec![]);
        store.fail_read = true;
        let result = run_scan(&conn(), &store, &RecallScanner::default(), now());
        assert!(matches!(result, Err(RecallError::Database(_))));
    }

    #[test]
    fn alert_carries_patient_identity() {
        let mut p = patient("Lovelace", vec![review("ckd", days_ago(1), ReviewStatus::Due)]);
        p.first_name = "Ada".into();
        p.nhs_number = "9434765919".into();
        let mut patients = vec![p];

        let scan = RecallScanner::default().scan_patients(&mut patients, now());
        assert_eq!(scan.alerts[0].patient_name, "Ada Lovelace");
        assert_eq!(scan.alerts[0].nhs_number, "9434765919");
        assert_eq!(
            scan.transitions,
            vec![PatientTransition {
                index: 0,
                review_ids: vec![patients[0].reviews[0].id],
            }]
        );
        assert_eq!(patients[0].updated_at, now());
    }
}
