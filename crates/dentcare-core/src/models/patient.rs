//! Patient models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::treatment::Treatment;
use crate::dates;

/// Patient gender as recorded at registration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse the Korean labels used on reception forms and spreadsheets.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "남" | "M" | "m" | "male" => Some(Gender::Male),
            "여" | "F" | "f" | "female" => Some(Gender::Female),
            _ => None,
        }
    }

    /// Label shown to clinic staff.
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "남",
            Gender::Female => "여",
        }
    }
}

/// Advisory record status.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    #[default]
    Active,
    Inactive,
}

/// A patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Internal UUID
    pub id: String,
    /// Clinic-assigned chart number
    pub chart_number: String,
    /// Patient name
    pub name: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
    /// Birth date (ISO, may be empty)
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Registration date (ISO)
    #[serde(default)]
    pub registration_date: Option<String>,
    /// Most recent visit (ISO)
    #[serde(default)]
    pub last_visit: String,
    /// Pending recall date (ISO); `None` or empty means nothing scheduled
    #[serde(default)]
    pub next_recall_date: Option<String>,
    /// What the pending recall is for
    #[serde(default)]
    pub next_recall_note: String,
    /// Referral channel (company, apartment, referral, family, ...)
    #[serde(default)]
    pub visit_path: Option<String>,
    #[serde(default)]
    pub visit_path_detail: Option<String>,
    /// Treatments in entry order
    #[serde(default)]
    pub treatments: Vec<Treatment>,
    #[serde(default)]
    pub status: PatientStatus,
    /// Dates of recalls already carried out (append-only)
    #[serde(default)]
    pub completed_recall_dates: Vec<String>,
    /// ID in an external clinic system, if linked
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub is_linked: bool,
}

impl Patient {
    /// Create a patient registered on `today`.
    pub fn new(chart_number: String, name: String, today: NaiveDate) -> Self {
        let today = dates::format_date(today);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chart_number,
            name,
            phone: String::new(),
            birth_date: String::new(),
            gender: None,
            registration_date: Some(today.clone()),
            last_visit: today,
            next_recall_date: None,
            next_recall_note: String::new(),
            visit_path: None,
            visit_path_detail: None,
            treatments: Vec::new(),
            status: PatientStatus::Active,
            completed_recall_dates: Vec::new(),
            external_id: None,
            is_linked: false,
        }
    }

    /// Blank record handed out when an edit targets an unknown ID.
    pub fn blank(today: NaiveDate) -> Self {
        Self::new(String::new(), String::new(), today)
    }

    /// The pending recall date, ignoring empty strings.
    pub fn pending_recall(&self) -> Option<&str> {
        self.next_recall_date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Check if a recall is scheduled.
    pub fn has_pending_recall(&self) -> bool {
        self.pending_recall().is_some()
    }

    /// Parsed pending recall date, if scheduled and well-formed.
    pub fn pending_recall_on(&self) -> Option<NaiveDate> {
        self.pending_recall().and_then(dates::parse_date)
    }

    pub fn last_visit_on(&self) -> Option<NaiveDate> {
        dates::parse_date(&self.last_visit)
    }

    pub fn registered_on(&self) -> Option<NaiveDate> {
        self.registration_date.as_deref().and_then(dates::parse_date)
    }

    /// Age in full years on `today`, if the birth date parses.
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        let birth = dates::parse_date(&self.birth_date)?;
        if birth > today {
            return None;
        }
        let mut age = today.year() - birth.year();
        if (today.month(), today.day()) < (birth.month(), birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    /// Append a treatment.
    pub fn add_treatment(&mut self, treatment: Treatment) {
        self.treatments.push(treatment);
    }

    /// Remove a treatment by ID. Returns whether one was removed.
    pub fn remove_treatment(&mut self, treatment_id: &str) -> bool {
        let before = self.treatments.len();
        self.treatments.retain(|t| t.id != treatment_id);
        self.treatments.len() != before
    }
}
