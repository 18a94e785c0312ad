//! Partial patient records awaiting validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::patient::{Gender, Patient};

/// Reasons a draft cannot become a patient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Patient name is required")]
    MissingName,

    #[error("Chart number is required")]
    MissingChartNumber,
}

/// Where a draft came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftSource {
    /// Typed in by staff
    Manual,
    /// A spreadsheet import row
    Spreadsheet,
    /// Best-effort extraction from a scanned form
    Extraction,
}

/// A patient record that has not been validated yet.
///
/// Only `name` and `chart_number` are required; everything else falls back
/// to the defaults of [`Patient::new`] on promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientDraft {
    pub source: DraftSource,
    pub chart_number: String,
    pub name: String,
    pub phone: String,
    pub birth_date: String,
    pub gender: Option<Gender>,
    pub last_visit: Option<String>,
    pub next_recall_date: Option<String>,
    pub next_recall_note: String,
    pub visit_path: Option<String>,
    pub visit_path_detail: Option<String>,
}

impl PatientDraft {
    /// Create an empty draft.
    pub fn new(source: DraftSource) -> Self {
        Self {
            source,
            chart_number: String::new(),
            name: String::new(),
            phone: String::new(),
            birth_date: String::new(),
            gender: None,
            last_visit: None,
            next_recall_date: None,
            next_recall_note: String::new(),
            visit_path: None,
            visit_path_detail: None,
        }
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.chart_number.trim().is_empty() {
            return Err(ValidationError::MissingChartNumber);
        }
        Ok(())
    }

    /// Promote to a full patient registered on `today`.
    pub fn into_patient(self, today: NaiveDate) -> Result<Patient, ValidationError> {
        self.validate()?;

        let mut patient = Patient::new(
            self.chart_number.trim().to_string(),
            self.name.trim().to_string(),
            today,
        );
        patient.phone = self.phone;
        patient.birth_date = self.birth_date;
        patient.gender = self.gender;
        if let Some(last_visit) = self.last_visit.filter(|d| !d.trim().is_empty()) {
            patient.last_visit = last_visit;
        }
        patient.next_recall_date = self.next_recall_date.filter(|d| !d.trim().is_empty());
        patient.next_recall_note = self.next_recall_note;
        patient.visit_path = self.visit_path;
        patient.visit_path_detail = self.visit_path_detail;
        Ok(patient)
    }
}

/// Check the required fields of an already-built patient before saving it.
pub fn validate_patient(patient: &Patient) -> Result<(), ValidationError> {
    if patient.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if patient.chart_number.trim().is_empty() {
        return Err(ValidationError::MissingChartNumber);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn today() -> NaiveDate {
        parse_date("2025-03-05").unwrap()
    }

    fn make_draft() -> PatientDraft {
        let mut draft = PatientDraft::new(DraftSource::Manual);
        draft.chart_number = " A1 ".into();
        draft.name = "김민수".into();
        draft.phone = "010-1234-5678".into();
        draft
    }

    #[test]
    fn test_validate_required_fields() {
        let mut draft = make_draft();
        assert!(draft.validate().is_ok());

        draft.name = "  ".into();
        assert_eq!(draft.validate(), Err(ValidationError::MissingName));

        let mut draft = make_draft();
        draft.chart_number.clear();
        assert_eq!(draft.validate(), Err(ValidationError::MissingChartNumber));
    }

    #[test]
    fn test_into_patient_defaults() {
        let patient = make_draft().into_patient(today()).unwrap();
        assert_eq!(patient.chart_number, "A1");
        assert_eq!(patient.phone, "010-1234-5678");
        assert_eq!(patient.last_visit, "2025-03-05");
        assert_eq!(patient.registration_date.as_deref(), Some("2025-03-05"));
        assert!(patient.next_recall_date.is_none());
        assert!(patient.completed_recall_dates.is_empty());
    }

    #[test]
    fn test_into_patient_keeps_supplied_dates() {
        let mut draft = make_draft();
        draft.last_visit = Some("2025-01-10".into());
        draft.next_recall_date = Some("".into());
        let patient = draft.into_patient(today()).unwrap();
        assert_eq!(patient.last_visit, "2025-01-10");
        assert!(patient.next_recall_date.is_none());
    }

    #[test]
    fn test_invalid_draft_is_not_promoted() {
        let draft = PatientDraft::new(DraftSource::Spreadsheet);
        assert!(draft.into_patient(today()).is_err());
    }
}
