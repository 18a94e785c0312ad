//! Headline figures shown above the dashboard charts.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Patient;
use crate::recall;

/// Snapshot summary for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub total_patients: usize,
    /// Patients whose last visit is today
    pub today_visits: usize,
    pub recalls_due_today: usize,
    /// Pending recalls Monday..Sunday of this week
    pub recalls_this_week: usize,
    /// Recalls completed over all time
    pub completed_recalls: usize,
    /// Patients with at least one completed recall
    pub patients_with_completed_recalls: usize,
    /// Next pending recalls, soonest first
    pub upcoming: Vec<Patient>,
}

impl DashboardSummary {
    pub fn build(patients: &[Patient], today: NaiveDate, upcoming_limit: usize) -> Self {
        Self {
            total_patients: patients.len(),
            today_visits: patients
                .iter()
                .filter(|p| p.last_visit_on() == Some(today))
                .count(),
            recalls_due_today: recall::recalls_on(patients, today).len(),
            recalls_this_week: recall::recalls_this_week(patients, today).len(),
            completed_recalls: recall::completed_recall_total(patients),
            patients_with_completed_recalls: patients
                .iter()
                .filter(|p| !p.completed_recall_dates.is_empty())
                .count(),
            upcoming: recall::upcoming_recalls(patients, today, upcoming_limit)
                .into_iter()
                .cloned()
                .collect(),
        }
    }
}
