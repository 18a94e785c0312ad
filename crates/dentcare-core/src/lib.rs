//! DentCare Core Library
//!
//! Local-first patient records, recall tracking and dashboard statistics for
//! a small dental clinic.
//!
//! # Architecture
//!
//! ```text
//!   UI host (forms, charts, spreadsheet codec)
//!                     │  FFI
//!             ┌───────▼────────┐
//!             │     Clinic     │  load all → mutate in memory → save all
//!             └───┬────┬────┬──┘
//!                 │    │    │
//!         ┌───────┘    │    └────────┐
//!         ▼            ▼             ▼
//!      recall        stats         sheet
//!   (lifecycle,   (weekly/monthly  (row contract,
//!    board,        buckets,         chart-number
//!    calendar)     dashboard)       dedup)
//!                      │
//!             ┌────────▼────────┐
//!             │  PatientStore   │  SQLite / in-memory
//!             └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`]: Domain types (Patient, Treatment, PatientDraft, notifications)
//! - [`db`]: Patient store trait, SQLite and in-memory implementations
//! - [`recall`]: Recall lifecycle and recall views
//! - [`stats`]: Weekly/monthly aggregation and dashboard summary
//! - [`sheet`]: Spreadsheet row contract and import merge
//! - [`clinic`]: Application service tying the above to a store

pub mod clinic;
pub mod config;
pub mod dates;
pub mod db;
pub mod models;
pub mod recall;
pub mod search;
pub mod sheet;
pub mod stats;

// Re-export commonly used types
pub use clinic::{Clinic, ClinicError, ClinicResult};
pub use config::ClinicConfig;
pub use db::{Database, MemoryStore, PatientStore};
pub use models::{
    Agreement, DraftSource, Gender, NotificationFeed, Patient, PatientDraft, PatientStatus,
    RecallNotification, Treatment, ValidationError,
};
pub use recall::{RecallBoard, RecallOutcome};
pub use sheet::{ImportReport, SheetRow};
pub use stats::{DashboardSummary, StatsMode, StatsReport, StatsRow};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum DentCareError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for DentCareError {
    fn from(e: db::DbError) -> Self {
        DentCareError::DatabaseError(e.to_string())
    }
}

impl From<ValidationError> for DentCareError {
    fn from(e: ValidationError) -> Self {
        DentCareError::ValidationError(e.to_string())
    }
}

impl From<ClinicError> for DentCareError {
    fn from(e: ClinicError) -> Self {
        match e {
            ClinicError::Validation(v) => v.into(),
            ClinicError::Store(s) => s.into(),
        }
    }
}

impl From<serde_json::Error> for DentCareError {
    fn from(e: serde_json::Error) -> Self {
        DentCareError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for DentCareError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        DentCareError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_ffi_date(value: &str) -> Result<NaiveDate, DentCareError> {
    dates::parse_date(value)
        .ok_or_else(|| DentCareError::InvalidInput(format!("Not a YYYY-MM-DD date: {}", value)))
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install a `tracing` subscriber. Later calls are ignored.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) {
    let filter = filter
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<DentCareCore>, DentCareError> {
    let config = ClinicConfig {
        database_path: path.into(),
        ..ClinicConfig::from_env()
    };
    DentCareCore::open(config)
}

/// Open the database named by the environment configuration.
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<DentCareCore>, DentCareError> {
    DentCareCore::open(ClinicConfig::from_env())
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<DentCareCore>, DentCareError> {
    let db = Database::open_in_memory()?;
    DentCareCore::with_clinic(Clinic::new(db, ClinicConfig::default()), dates::today())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe clinic wrapper for FFI.
///
/// The notification feed is derived when the core is opened and kept for the
/// lifetime of the object, so read marks persist until the host reopens.
#[derive(uniffi::Object)]
pub struct DentCareCore {
    clinic: Mutex<Clinic<Database>>,
    notifications: Mutex<NotificationFeed>,
}

impl DentCareCore {
    fn open(config: ClinicConfig) -> Result<Arc<Self>, DentCareError> {
        let db = Database::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "DentCare core opened");
        Self::with_clinic(Clinic::new(db, config), dates::today())
    }

    fn with_clinic(clinic: Clinic<Database>, today: NaiveDate) -> Result<Arc<Self>, DentCareError> {
        let feed = clinic.notifications(today)?;
        tracing::debug!(entries = feed.entries.len(), "Derived session notifications");
        Ok(Arc::new(Self {
            clinic: Mutex::new(clinic),
            notifications: Mutex::new(feed),
        }))
    }
}

#[uniffi::export]
impl DentCareCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// All patients in stored order.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.patients()?.into_iter().map(Into::into).collect())
    }

    /// Patient for the edit form; unknown IDs yield a blank record.
    pub fn get_patient(&self, id: String) -> Result<FfiPatient, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.patient_or_blank(&id, dates::today())?.into())
    }

    /// Validate and register a new patient.
    pub fn register_patient(&self, draft: FfiPatientDraft) -> Result<FfiPatient, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        let patient = clinic.register(draft.into(), dates::today())?;
        Ok(patient.into())
    }

    /// Save edits to an existing patient.
    pub fn update_patient(&self, patient: FfiPatient) -> Result<bool, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.update(patient.try_into()?)?)
    }

    /// Delete a patient together with their treatments.
    pub fn delete_patient(&self, id: String) -> Result<bool, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.delete(&id)?)
    }

    /// Search by name, chart number or phone.
    pub fn search_patients(&self, query: String) -> Result<Vec<FfiPatient>, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.search(&query)?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Recall Operations
    // =========================================================================

    pub fn complete_recall(&self, id: String) -> Result<FfiRecallOutcome, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.complete_recall(&id, dates::today())?.into())
    }

    pub fn schedule_recall(
        &self,
        id: String,
        date: String,
        note: String,
    ) -> Result<bool, DentCareError> {
        let date = parse_ffi_date(&date)?;
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.schedule_recall(&id, date, &note)?)
    }

    pub fn clear_recall(&self, id: String) -> Result<bool, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.clear_recall(&id)?)
    }

    pub fn recall_board(&self) -> Result<FfiRecallBoard, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.recall_board(dates::today())?.into())
    }

    /// Patients with a recall pending on `date` (calendar view).
    pub fn recalls_on(&self, date: String) -> Result<Vec<FfiPatient>, DentCareError> {
        let date = parse_ffi_date(&date)?;
        let clinic = self.clinic.lock()?;
        let patients = clinic.patients()?;
        Ok(recall::recalls_on(&patients, date)
            .into_iter()
            .cloned()
            .map(Into::into)
            .collect())
    }

    /// Session notification feed, as derived when the core was opened.
    pub fn notifications(&self) -> Result<Vec<FfiNotification>, DentCareError> {
        let feed = self.notifications.lock()?;
        Ok(feed.entries.iter().cloned().map(Into::into).collect())
    }

    pub fn unread_notification_count(&self) -> Result<u32, DentCareError> {
        Ok(self.notifications.lock()?.unread_count() as u32)
    }

    /// Mark one notification read. Returns false for unknown IDs.
    pub fn mark_notification_read(&self, id: String) -> Result<bool, DentCareError> {
        Ok(self.notifications.lock()?.mark_read(&id))
    }

    pub fn mark_all_notifications_read(&self) -> Result<(), DentCareError> {
        self.notifications.lock()?.mark_all_read();
        Ok(())
    }

    // =========================================================================
    // Treatment Operations
    // =========================================================================

    /// Blank treatment dated today for the default doctor.
    pub fn new_treatment(&self) -> Result<FfiTreatment, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.new_treatment(dates::today()).into())
    }

    pub fn add_treatment(
        &self,
        patient_id: String,
        treatment: FfiTreatment,
    ) -> Result<bool, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.add_treatment(&patient_id, treatment.into())?)
    }

    pub fn remove_treatment(
        &self,
        patient_id: String,
        treatment_id: String,
    ) -> Result<bool, DentCareError> {
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.remove_treatment(&patient_id, &treatment_id)?)
    }

    // =========================================================================
    // Spreadsheet Operations
    // =========================================================================

    /// Merge decoded spreadsheet rows; duplicate chart numbers are dropped.
    pub fn import_rows(
        &self,
        rows: Vec<HashMap<String, String>>,
    ) -> Result<FfiImportReport, DentCareError> {
        let rows: Vec<SheetRow> = rows.into_iter().map(|r| r.into_iter().collect()).collect();
        let mut clinic = self.clinic.lock()?;
        Ok(clinic.import_rows(&rows, dates::today())?.into())
    }

    /// Rows for the spreadsheet codec, one per patient.
    pub fn export_rows(&self) -> Result<Vec<HashMap<String, String>>, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic
            .export_rows()?
            .into_iter()
            .map(|r| r.into_iter().collect())
            .collect())
    }

    /// Full collection as JSON, for backups.
    pub fn export_json(&self) -> Result<String, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(serde_json::to_string_pretty(&clinic.patients()?)?)
    }

    // =========================================================================
    // Statistics Operations
    // =========================================================================

    pub fn statistics(&self, mode: FfiStatsMode) -> Result<FfiStatsReport, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.statistics(mode.into(), dates::today())?.into())
    }

    pub fn dashboard(&self) -> Result<FfiDashboard, DentCareError> {
        let clinic = self.clinic.lock()?;
        Ok(clinic.dashboard(dates::today())?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: String,
    pub date: String,
    pub content: String,
    pub doctor: String,
    pub notes: Option<String>,
    pub estimated_amount: String,
    /// `None` while undecided
    pub is_agreed: Option<bool>,
}

impl From<Treatment> for FfiTreatment {
    fn from(t: Treatment) -> Self {
        Self {
            id: t.id,
            date: t.date,
            content: t.content,
            doctor: t.doctor,
            notes: t.notes,
            estimated_amount: t.estimated_amount,
            is_agreed: t.agreement.as_flag(),
        }
    }
}

impl From<FfiTreatment> for Treatment {
    fn from(t: FfiTreatment) -> Self {
        Treatment {
            id: t.id,
            date: t.date,
            content: t.content,
            doctor: t.doctor,
            notes: t.notes,
            estimated_amount: t.estimated_amount,
            agreement: Agreement::from_flag(t.is_agreed),
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub chart_number: String,
    pub name: String,
    pub phone: String,
    pub birth_date: String,
    /// "남" / "여"
    pub gender: Option<String>,
    pub age: Option<u32>,
    pub registration_date: Option<String>,
    pub last_visit: String,
    pub next_recall_date: Option<String>,
    pub next_recall_note: String,
    pub visit_path: Option<String>,
    pub visit_path_detail: Option<String>,
    pub treatments: Vec<FfiTreatment>,
    pub is_active: bool,
    pub completed_recall_dates: Vec<String>,
    pub external_id: Option<String>,
    pub is_linked: bool,
}

impl From<Patient> for FfiPatient {
    fn from(p: Patient) -> Self {
        let age = p.age_on(dates::today());
        Self {
            id: p.id,
            chart_number: p.chart_number,
            name: p.name,
            phone: p.phone,
            birth_date: p.birth_date,
            gender: p.gender.map(|g| g.label().to_string()),
            age,
            registration_date: p.registration_date,
            last_visit: p.last_visit,
            next_recall_date: p.next_recall_date,
            next_recall_note: p.next_recall_note,
            visit_path: p.visit_path,
            visit_path_detail: p.visit_path_detail,
            treatments: p.treatments.into_iter().map(Into::into).collect(),
            is_active: p.status == PatientStatus::Active,
            completed_recall_dates: p.completed_recall_dates,
            external_id: p.external_id,
            is_linked: p.is_linked,
        }
    }
}

impl TryFrom<FfiPatient> for Patient {
    type Error = DentCareError;

    fn try_from(p: FfiPatient) -> Result<Self, Self::Error> {
        let gender = match p.gender.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(Gender::from_label(label).ok_or_else(|| {
                DentCareError::InvalidInput(format!("Unknown gender: {}", label))
            })?),
        };

        Ok(Patient {
            id: p.id,
            chart_number: p.chart_number,
            name: p.name,
            phone: p.phone,
            birth_date: p.birth_date,
            gender,
            registration_date: p.registration_date,
            last_visit: p.last_visit,
            next_recall_date: p.next_recall_date,
            next_recall_note: p.next_recall_note,
            visit_path: p.visit_path,
            visit_path_detail: p.visit_path_detail,
            treatments: p.treatments.into_iter().map(Into::into).collect(),
            status: if p.is_active {
                PatientStatus::Active
            } else {
                PatientStatus::Inactive
            },
            completed_recall_dates: p.completed_recall_dates,
            external_id: p.external_id,
            is_linked: p.is_linked,
        })
    }
}

/// FFI-safe new-patient form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientDraft {
    pub chart_number: String,
    pub name: String,
    pub phone: String,
    pub birth_date: String,
    pub gender: Option<String>,
    pub next_recall_date: Option<String>,
    pub next_recall_note: String,
    pub visit_path: Option<String>,
    pub visit_path_detail: Option<String>,
}

impl From<FfiPatientDraft> for PatientDraft {
    fn from(d: FfiPatientDraft) -> Self {
        let mut draft = PatientDraft::new(DraftSource::Manual);
        draft.chart_number = d.chart_number;
        draft.name = d.name;
        draft.phone = d.phone;
        draft.birth_date = d.birth_date;
        draft.gender = d.gender.as_deref().and_then(Gender::from_label);
        draft.next_recall_date = d.next_recall_date;
        draft.next_recall_note = d.next_recall_note;
        draft.visit_path = d.visit_path;
        draft.visit_path_detail = d.visit_path_detail;
        draft
    }
}

/// FFI-safe recall completion result.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiRecallOutcome {
    Completed { recall_date: String },
    NoPendingRecall,
    PatientNotFound,
}

impl From<RecallOutcome> for FfiRecallOutcome {
    fn from(outcome: RecallOutcome) -> Self {
        match outcome {
            RecallOutcome::Completed { recall_date } => FfiRecallOutcome::Completed { recall_date },
            RecallOutcome::NoPendingRecall => FfiRecallOutcome::NoPendingRecall,
            RecallOutcome::PatientNotFound => FfiRecallOutcome::PatientNotFound,
        }
    }
}

/// FFI-safe recall board.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecallBoard {
    pub overdue: Vec<FfiPatient>,
    pub due_today: Vec<FfiPatient>,
    pub upcoming: Vec<FfiPatient>,
}

impl From<RecallBoard> for FfiRecallBoard {
    fn from(board: RecallBoard) -> Self {
        Self {
            overdue: board.overdue.into_iter().map(Into::into).collect(),
            due_today: board.due_today.into_iter().map(Into::into).collect(),
            upcoming: board.upcoming.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub chart_number: String,
    pub recall_date: String,
    pub is_read: bool,
}

impl From<RecallNotification> for FfiNotification {
    fn from(n: RecallNotification) -> Self {
        Self {
            id: n.id,
            patient_id: n.patient_id,
            patient_name: n.patient_name,
            chart_number: n.chart_number,
            recall_date: n.recall_date,
            is_read: n.is_read,
        }
    }
}

/// FFI-safe import result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportReport {
    pub added: u32,
    pub duplicates: u32,
    pub invalid: u32,
}

impl From<ImportReport> for FfiImportReport {
    fn from(r: ImportReport) -> Self {
        Self {
            added: r.added as u32,
            duplicates: r.duplicates as u32,
            invalid: r.invalid as u32,
        }
    }
}

/// FFI-safe reporting period.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiStatsMode {
    Weekly,
    Monthly,
}

impl From<FfiStatsMode> for StatsMode {
    fn from(mode: FfiStatsMode) -> Self {
        match mode {
            FfiStatsMode::Weekly => StatsMode::Weekly,
            FfiStatsMode::Monthly => StatsMode::Monthly,
        }
    }
}

/// FFI-safe chart row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatsRow {
    pub label: String,
    pub period_start: String,
    /// Charted visit figure for the requested mode
    pub visit_count: u32,
    pub patient_visit_count: u32,
    pub treatment_count: u32,
    pub new_patient_count: u32,
    pub revenue_total: f64,
    pub agreement_rate: u32,
}

impl FfiStatsRow {
    fn from_row(row: StatsRow, mode: StatsMode) -> Self {
        Self {
            visit_count: row.visit_count(mode),
            label: row.label,
            period_start: dates::format_date(row.period_start),
            patient_visit_count: row.patient_visit_count,
            treatment_count: row.treatment_count,
            new_patient_count: row.new_patient_count,
            revenue_total: row.revenue_total,
            agreement_rate: row.agreement_rate,
        }
    }
}

/// FFI-safe statistics for one period, with the headline totals.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatsReport {
    pub rows: Vec<FfiStatsRow>,
    pub total_new_patients: u32,
    /// 만원
    pub total_revenue: f64,
    pub average_agreement_rate: u32,
}

impl From<StatsReport> for FfiStatsReport {
    fn from(report: StatsReport) -> Self {
        let total_new_patients = report.total_new_patients();
        let total_revenue = report.total_revenue();
        let average_agreement_rate = report.average_agreement_rate();
        let mode = report.mode;
        Self {
            rows: report
                .rows
                .into_iter()
                .map(|row| FfiStatsRow::from_row(row, mode))
                .collect(),
            total_new_patients,
            total_revenue,
            average_agreement_rate,
        }
    }
}

/// FFI-safe dashboard summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDashboard {
    pub total_patients: u32,
    pub today_visits: u32,
    pub recalls_due_today: u32,
    pub recalls_this_week: u32,
    pub completed_recalls: u32,
    pub patients_with_completed_recalls: u32,
    pub upcoming: Vec<FfiPatient>,
}

impl From<DashboardSummary> for FfiDashboard {
    fn from(s: DashboardSummary) -> Self {
        Self {
            total_patients: s.total_patients as u32,
            today_visits: s.today_visits as u32,
            recalls_due_today: s.recalls_due_today as u32,
            recalls_this_week: s.recalls_this_week as u32,
            completed_recalls: s.completed_recalls as u32,
            patients_with_completed_recalls: s.patients_with_completed_recalls as u32,
            upcoming: s.upcoming.into_iter().map(Into::into).collect(),
        }
    }
}
