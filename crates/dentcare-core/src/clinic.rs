//! Clinic service: the application state handed to every view.
//!
//! Each mutating call reads the whole collection from the store, changes it
//! in memory and writes the whole collection back.

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::ClinicConfig;
use crate::db::{DbError, PatientStore};
use crate::models::{validate_patient, NotificationFeed, Patient, PatientDraft, Treatment, ValidationError};
use crate::recall::{self, RecallBoard, RecallOutcome};
use crate::search;
use crate::sheet::{self, ImportReport, SheetRow};
use crate::stats::{self, DashboardSummary, StatsMode, StatsReport};

/// Service errors.
#[derive(Error, Debug)]
pub enum ClinicError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

pub type ClinicResult<T> = Result<T, ClinicError>;

pub struct Clinic<S: PatientStore> {
    store: S,
    config: ClinicConfig,
}

impl<S: PatientStore> Clinic<S> {
    pub fn new(store: S, config: ClinicConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ClinicConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Records
    // =========================================================================

    /// Full patient collection.
    pub fn patients(&self) -> ClinicResult<Vec<Patient>> {
        Ok(self.store.load()?)
    }

    pub fn find_patient(&self, id: &str) -> ClinicResult<Option<Patient>> {
        Ok(self.store.load()?.into_iter().find(|p| p.id == id))
    }

    /// The record to edit for `id`; unknown IDs get a blank record.
    pub fn patient_or_blank(&self, id: &str, today: NaiveDate) -> ClinicResult<Patient> {
        match self.find_patient(id)? {
            Some(patient) => Ok(patient),
            None => {
                tracing::warn!(patient_id = %id, "Patient not found, handing out blank record");
                Ok(Patient::blank(today))
            }
        }
    }

    /// Validate and store a new patient.
    pub fn register(&mut self, draft: PatientDraft, today: NaiveDate) -> ClinicResult<Patient> {
        let patient = draft.into_patient(today)?;
        let mut patients = self.store.load()?;
        patients.push(patient.clone());
        self.store.save_all(&patients)?;
        tracing::info!(patient_id = %patient.id, chart_number = %patient.chart_number, "Registered patient");
        Ok(patient)
    }

    /// Replace a stored patient. Returns false if the ID is unknown.
    ///
    /// The stored completed-recall history is kept; only
    /// [`Clinic::complete_recall`] extends it.
    pub fn update(&mut self, patient: Patient) -> ClinicResult<bool> {
        validate_patient(&patient)?;
        let id = patient.id.clone();
        self.modify(&id, move |slot| {
            let history = std::mem::take(&mut slot.completed_recall_dates);
            if patient.completed_recall_dates != history {
                tracing::warn!(patient_id = %patient.id, "Ignoring edited recall history");
            }
            *slot = patient;
            slot.completed_recall_dates = history;
            true
        })
    }

    /// Delete a patient and, with it, all of their treatments.
    pub fn delete(&mut self, id: &str) -> ClinicResult<bool> {
        let mut patients = self.store.load()?;
        let before = patients.len();
        patients.retain(|p| p.id != id);
        if patients.len() == before {
            tracing::warn!(patient_id = %id, "Delete requested for unknown patient");
            return Ok(false);
        }
        self.store.save_all(&patients)?;
        tracing::info!(patient_id = %id, "Deleted patient");
        Ok(true)
    }

    // =========================================================================
    // Recalls
    // =========================================================================

    pub fn complete_recall(&mut self, id: &str, today: NaiveDate) -> ClinicResult<RecallOutcome> {
        let mut patients = self.store.load()?;
        let Some(patient) = patients.iter_mut().find(|p| p.id == id) else {
            tracing::warn!(patient_id = %id, "Recall completion for unknown patient");
            return Ok(RecallOutcome::PatientNotFound);
        };

        let outcome = recall::complete_recall(patient, today);
        if outcome.is_completed() {
            self.store.save_all(&patients)?;
        }
        Ok(outcome)
    }

    pub fn schedule_recall(&mut self, id: &str, date: NaiveDate, note: &str) -> ClinicResult<bool> {
        self.modify(id, |patient| {
            recall::schedule_recall(patient, date, note);
            true
        })
    }

    pub fn clear_recall(&mut self, id: &str) -> ClinicResult<bool> {
        self.modify(id, recall::clear_recall)
    }

    pub fn recall_board(&self, today: NaiveDate) -> ClinicResult<RecallBoard> {
        Ok(RecallBoard::build(&self.store.load()?, today))
    }

    /// Notifications for a session starting on `today`.
    pub fn notifications(&self, today: NaiveDate) -> ClinicResult<NotificationFeed> {
        Ok(NotificationFeed::derive(&self.store.load()?, today))
    }

    // =========================================================================
    // Treatments
    // =========================================================================

    /// A blank treatment dated today for the configured default doctor.
    pub fn new_treatment(&self, today: NaiveDate) -> Treatment {
        Treatment::new(today, self.config.default_doctor.clone())
    }

    pub fn add_treatment(&mut self, patient_id: &str, treatment: Treatment) -> ClinicResult<bool> {
        self.modify(patient_id, move |patient| {
            patient.add_treatment(treatment);
            true
        })
    }

    pub fn remove_treatment(&mut self, patient_id: &str, treatment_id: &str) -> ClinicResult<bool> {
        self.modify(patient_id, |patient| patient.remove_treatment(treatment_id))
    }

    // =========================================================================
    // Spreadsheet exchange
    // =========================================================================

    pub fn import_rows(&mut self, rows: &[SheetRow], today: NaiveDate) -> ClinicResult<ImportReport> {
        let drafts = rows.iter().map(sheet::draft_from_row).collect();
        let mut patients = self.store.load()?;
        let report = sheet::merge_imported(&mut patients, drafts, today);
        if report.added > 0 {
            self.store.save_all(&patients)?;
        }
        tracing::info!(
            added = report.added,
            duplicates = report.duplicates,
            invalid = report.invalid,
            "Imported spreadsheet rows"
        );
        Ok(report)
    }

    pub fn export_rows(&self) -> ClinicResult<Vec<SheetRow>> {
        Ok(sheet::export_rows(&self.store.load()?))
    }

    // =========================================================================
    // Views
    // =========================================================================

    pub fn statistics(&self, mode: StatsMode, today: NaiveDate) -> ClinicResult<StatsReport> {
        Ok(stats::aggregate(&self.store.load()?, mode, today))
    }

    pub fn dashboard(&self, today: NaiveDate) -> ClinicResult<DashboardSummary> {
        Ok(DashboardSummary::build(
            &self.store.load()?,
            today,
            self.config.upcoming_limit,
        ))
    }

    pub fn search(&self, query: &str) -> ClinicResult<Vec<Patient>> {
        let patients = self.store.load()?;
        Ok(search::search_patients(&patients, query)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Load, apply `change` to the patient with `id`, and save when `change`
    /// reports a modification.
    fn modify<F>(&mut self, id: &str, change: F) -> ClinicResult<bool>
    where
        F: FnOnce(&mut Patient) -> bool,
    {
        let mut patients = self.store.load()?;
        let Some(patient) = patients.iter_mut().find(|p| p.id == id) else {
            tracing::warn!(patient_id = %id, "Edit requested for unknown patient");
            return Ok(false);
        };
        if !change(patient) {
            return Ok(false);
        }
        self.store.save_all(&patients)?;
        Ok(true)
    }
}
