//! Spreadsheet row contract.
//!
//! The spreadsheet codec lives in the UI host; it hands the core one
//! [`SheetRow`] per line keyed by the fixed column labels below, and receives
//! the same shape back on export.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DraftSource, Patient, PatientDraft};

pub const COL_CHART_NUMBER: &str = "차트번호";
pub const COL_NAME: &str = "이름";
pub const COL_PHONE: &str = "연락처";
pub const COL_BIRTH_DATE: &str = "생년월일";
pub const COL_LAST_VISIT: &str = "최근방문일";
pub const COL_NEXT_RECALL: &str = "다음리콜일";
pub const COL_RECALL_NOTE: &str = "예약내용";
/// Export only.
pub const COL_TREATMENT_COUNT: &str = "진료내역개수";

/// Column order on export.
pub const EXPORT_COLUMNS: [&str; 8] = [
    COL_CHART_NUMBER,
    COL_NAME,
    COL_PHONE,
    COL_BIRTH_DATE,
    COL_LAST_VISIT,
    COL_NEXT_RECALL,
    COL_RECALL_NOTE,
    COL_TREATMENT_COUNT,
];

/// One spreadsheet line, keyed by column label.
pub type SheetRow = BTreeMap<String, String>;

/// Outcome of merging imported rows into the collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows appended as new patients
    pub added: usize,
    /// Rows dropped because the chart number already exists
    pub duplicates: usize,
    /// Rows dropped for missing name or chart number
    pub invalid: usize,
}

/// Flatten a patient into an export row.
pub fn patient_to_row(patient: &Patient) -> SheetRow {
    let mut row = SheetRow::new();
    row.insert(COL_CHART_NUMBER.into(), patient.chart_number.clone());
    row.insert(COL_NAME.into(), patient.name.clone());
    row.insert(COL_PHONE.into(), patient.phone.clone());
    row.insert(COL_BIRTH_DATE.into(), patient.birth_date.clone());
    row.insert(COL_LAST_VISIT.into(), patient.last_visit.clone());
    row.insert(
        COL_NEXT_RECALL.into(),
        patient.pending_recall().unwrap_or_default().to_string(),
    );
    row.insert(COL_RECALL_NOTE.into(), patient.next_recall_note.clone());
    row.insert(COL_TREATMENT_COUNT.into(), patient.treatments.len().to_string());
    row
}

pub fn export_rows(patients: &[Patient]) -> Vec<SheetRow> {
    patients.iter().map(patient_to_row).collect()
}

/// Read a draft out of an import row. Missing cells become empty.
pub fn draft_from_row(row: &SheetRow) -> PatientDraft {
    let cell = |label: &str| {
        row.get(label)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };
    let optional = |label: &str| Some(cell(label)).filter(|v| !v.is_empty());

    let mut draft = PatientDraft::new(DraftSource::Spreadsheet);
    draft.chart_number = cell(COL_CHART_NUMBER);
    draft.name = cell(COL_NAME);
    draft.phone = cell(COL_PHONE);
    draft.birth_date = cell(COL_BIRTH_DATE);
    draft.last_visit = optional(COL_LAST_VISIT);
    draft.next_recall_date = optional(COL_NEXT_RECALL);
    draft.next_recall_note = cell(COL_RECALL_NOTE);
    draft
}

/// Append imported drafts whose chart number is new.
///
/// A chart number already in `existing`, or seen earlier in the same batch,
/// drops the row. Nothing already stored is modified.
pub fn merge_imported(
    existing: &mut Vec<Patient>,
    drafts: Vec<PatientDraft>,
    today: NaiveDate,
) -> ImportReport {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|p| p.chart_number.trim().to_string())
        .collect();
    let mut report = ImportReport::default();

    for draft in drafts {
        let chart_number = draft.chart_number.trim().to_string();
        if seen.contains(&chart_number) {
            report.duplicates += 1;
            continue;
        }
        match draft.into_patient(today) {
            Ok(patient) => {
                seen.insert(chart_number);
                existing.push(patient);
                report.added += 1;
            }
            Err(err) => {
                tracing::debug!(chart_number = %chart_number, error = %err, "Skipping import row");
                report.invalid += 1;
            }
        }
    }
    report
}
