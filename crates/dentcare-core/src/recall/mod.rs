//! Recall lifecycle.
//!
//! A patient either has a pending recall or has none. Completing a recall is
//! the only transition that writes to the completed-recall history;
//! scheduling, rescheduling and clearing only touch the pending fields.

mod board;

pub use board::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::models::Patient;

/// Result of a completion attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecallOutcome {
    /// The pending recall was recorded in the history
    Completed { recall_date: String },
    /// Nothing was pending; the patient is unchanged
    NoPendingRecall,
    /// No patient with the requested ID
    PatientNotFound,
}

impl RecallOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RecallOutcome::Completed { .. })
    }
}

/// Mark the pending recall as done on `today`.
pub fn complete_recall(patient: &mut Patient, today: NaiveDate) -> RecallOutcome {
    let Some(recall_date) = patient.pending_recall().map(str::to_string) else {
        return RecallOutcome::NoPendingRecall;
    };

    patient.completed_recall_dates.push(recall_date.clone());
    patient.last_visit = dates::format_date(today);
    patient.next_recall_date = None;
    patient.next_recall_note.clear();

    tracing::info!(
        patient_id = %patient.id,
        recall_date = %recall_date,
        "Recall completed"
    );
    RecallOutcome::Completed { recall_date }
}

/// Set or move the pending recall. History is left alone.
pub fn schedule_recall(patient: &mut Patient, date: NaiveDate, note: impl Into<String>) {
    patient.next_recall_date = Some(dates::format_date(date));
    patient.next_recall_note = note.into();
}

/// Drop the pending recall without recording it as done.
pub fn clear_recall(patient: &mut Patient) -> bool {
    let had_pending = patient.has_pending_recall();
    patient.next_recall_date = None;
    patient.next_recall_note.clear();
    had_pending
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use proptest::prelude::*;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn make_patient() -> Patient {
        Patient::new("A1".into(), "김민수".into(), d("2025-01-10"))
    }

    #[test]
    fn test_complete_pending_recall() {
        let mut patient = make_patient();
        patient.completed_recall_dates = vec!["2024-09-01".into()];
        schedule_recall(&mut patient, d("2025-03-01"), "정기검진");

        let outcome = complete_recall(&mut patient, d("2025-03-05"));

        assert_eq!(
            outcome,
            RecallOutcome::Completed {
                recall_date: "2025-03-01".into()
            }
        );
        assert_eq!(patient.completed_recall_dates, vec!["2024-09-01", "2025-03-01"]);
        assert_eq!(patient.last_visit, "2025-03-05");
        assert!(patient.next_recall_date.is_none());
        assert!(patient.next_recall_note.is_empty());
    }

    #[test]
    fn test_complete_without_pending_is_noop() {
        let mut patient = make_patient();
        patient.completed_recall_dates = vec!["2024-09-01".into()];
        patient.next_recall_date = Some("".into());
        let before = patient.clone();

        let outcome = complete_recall(&mut patient, d("2025-03-05"));

        assert_eq!(outcome, RecallOutcome::NoPendingRecall);
        assert_eq!(patient, before);
    }

    #[test]
    fn test_reschedule_does_not_touch_history() {
        let mut patient = make_patient();
        schedule_recall(&mut patient, d("2025-03-01"), "정기검진");
        schedule_recall(&mut patient, d("2025-04-01"), "스케일링");

        assert_eq!(patient.pending_recall(), Some("2025-04-01"));
        assert_eq!(patient.next_recall_note, "스케일링");
        assert!(patient.completed_recall_dates.is_empty());
    }

    #[test]
    fn test_complete_then_schedule_again() {
        let mut patient = make_patient();
        schedule_recall(&mut patient, d("2025-03-01"), "");
        assert!(complete_recall(&mut patient, d("2025-03-01")).is_completed());

        schedule_recall(&mut patient, d("2025-09-01"), "6개월 검진");
        assert!(patient.has_pending_recall());
        assert_eq!(patient.completed_recall_dates, vec!["2025-03-01"]);
    }

    #[test]
    fn test_clear_recall() {
        let mut patient = make_patient();
        assert!(!clear_recall(&mut patient));

        schedule_recall(&mut patient, d("2025-03-01"), "정기검진");
        assert!(clear_recall(&mut patient));
        assert!(!patient.has_pending_recall());
        assert!(patient.completed_recall_dates.is_empty());
    }

    proptest! {
        #[test]
        fn prop_completion_appends_exactly_the_pending_date(
            history in proptest::collection::vec("20[0-9]{2}-0[1-9]-1[0-9]", 0..5),
            day in 1u32..=28,
        ) {
            let mut patient = make_patient();
            patient.completed_recall_dates = history.clone();
            let recall = NaiveDate::from_ymd_opt(2025, 2, day).unwrap();
            schedule_recall(&mut patient, recall, "note");

            let outcome = complete_recall(&mut patient, d("2025-03-05"));

            let mut expected = history;
            expected.push(dates::format_date(recall));
            prop_assert!(outcome.is_completed());
            prop_assert_eq!(&patient.completed_recall_dates, &expected);
            prop_assert!(!patient.has_pending_recall());
            prop_assert_eq!(patient.last_visit.as_str(), "2025-03-05");
        }

        #[test]
        fn prop_history_never_shrinks(
            history in proptest::collection::vec("20[0-9]{2}-0[1-9]-1[0-9]", 0..5),
            pending in proptest::option::of("20[0-9]{2}-0[1-9]-1[0-9]"),
        ) {
            let mut patient = make_patient();
            patient.completed_recall_dates = history.clone();
            patient.next_recall_date = pending;

            complete_recall(&mut patient, d("2025-03-05"));
            prop_assert!(patient.completed_recall_dates.starts_with(&history));
        }
    }
}
