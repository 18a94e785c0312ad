//! Statistics aggregation for the dashboard charts.
//!
//! [`aggregate`] buckets a patient snapshot into weekly (Monday..Saturday of
//! the current week) or monthly (January..December of the current year)
//! rows. It never fails: unparseable dates are skipped and unparseable
//! amounts count as zero so that a partly broken record cannot take the
//! dashboard down.

mod dashboard;

pub use dashboard::*;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::models::{Agreement, Patient};

/// Revenue is reported in units of 10,000 won (만원).
pub const REVENUE_UNIT_WON: u64 = 10_000;

const WEEKDAY_LABELS: [&str; 6] = ["월", "화", "수", "목", "금", "토"];
const MONTH_LABELS: [&str; 12] = [
    "1월", "2월", "3월", "4월", "5월", "6월", "7월", "8월", "9월", "10월", "11월", "12월",
];

/// Reporting period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatsMode {
    Weekly,
    Monthly,
}

/// One chart bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsRow {
    /// Axis label (weekday or month name)
    pub label: String,
    /// First day covered by the bucket
    pub period_start: NaiveDate,
    /// Patients whose last visit falls in the bucket
    pub patient_visit_count: u32,
    /// Treatments dated in the bucket
    pub treatment_count: u32,
    /// Patients registered in the bucket
    pub new_patient_count: u32,
    /// Estimated revenue in 만원
    pub revenue_total: f64,
    /// Percentage of decided consults that were agreed (0 when none decided)
    pub agreement_rate: u32,
}

impl StatsRow {
    /// The visit figure charted for `mode`.
    ///
    /// Weekly charts count patients by last visit; monthly charts count
    /// treatments. The two are different metrics and are kept apart.
    pub fn visit_count(&self, mode: StatsMode) -> u32 {
        match mode {
            StatsMode::Weekly => self.patient_visit_count,
            StatsMode::Monthly => self.treatment_count,
        }
    }
}

/// Rows for one reporting period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsReport {
    pub mode: StatsMode,
    pub rows: Vec<StatsRow>,
}

impl StatsReport {
    pub fn total_new_patients(&self) -> u32 {
        self.rows.iter().map(|r| r.new_patient_count).sum()
    }

    /// Period revenue in 만원.
    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue_total).sum()
    }

    /// Headline agreement rate: the sum of bucket rates over the number of
    /// buckets with a non-zero rate (at least 1).
    pub fn average_agreement_rate(&self) -> u32 {
        let sum: u32 = self.rows.iter().map(|r| r.agreement_rate).sum();
        let rated = self.rows.iter().filter(|r| r.agreement_rate > 0).count().max(1);
        (sum as f64 / rated as f64).round() as u32
    }

    /// Visit figures in row order, per [`StatsRow::visit_count`].
    pub fn visit_series(&self) -> Vec<u32> {
        self.rows.iter().map(|r| r.visit_count(self.mode)).collect()
    }
}

/// Bucket `patients` for the period containing `today`.
pub fn aggregate(patients: &[Patient], mode: StatsMode, today: NaiveDate) -> StatsReport {
    let rows = match mode {
        StatsMode::Weekly => weekly_rows(patients, today),
        StatsMode::Monthly => monthly_rows(patients, today.year()),
    };
    tracing::debug!(?mode, rows = rows.len(), patients = patients.len(), "Aggregated statistics");
    StatsReport { mode, rows }
}

fn weekly_rows(patients: &[Patient], today: NaiveDate) -> Vec<StatsRow> {
    let monday = dates::week_start(today);
    WEEKDAY_LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let day = monday + Duration::days(i as i64);
            let mut bucket = Bucket::default();
            for patient in patients {
                if patient.last_visit_on() == Some(day) {
                    bucket.patient_visits += 1;
                }
                if patient.registered_on() == Some(day) {
                    bucket.new_patients += 1;
                }
                for treatment in &patient.treatments {
                    if treatment.parsed_date() == Some(day) {
                        bucket.add_treatment(treatment.estimated_won(), treatment.agreement);
                    }
                }
            }
            bucket.into_row(label, day)
        })
        .collect()
}

fn monthly_rows(patients: &[Patient], year: i32) -> Vec<StatsRow> {
    MONTH_LABELS
        .iter()
        .zip(1u32..)
        .filter_map(|(label, month)| {
            let first = NaiveDate::from_ymd_opt(year, month, 1)?;
            let in_month = |date: Option<NaiveDate>| {
                date.is_some_and(|d| d.year() == year && d.month() == month)
            };

            let mut bucket = Bucket::default();
            for patient in patients {
                if in_month(patient.last_visit_on()) {
                    bucket.patient_visits += 1;
                }
                if in_month(patient.registered_on()) {
                    bucket.new_patients += 1;
                }
                for treatment in &patient.treatments {
                    if in_month(treatment.parsed_date()) {
                        bucket.add_treatment(treatment.estimated_won(), treatment.agreement);
                    }
                }
            }
            Some(bucket.into_row(label, first))
        })
        .collect()
}

/// Running totals for a single bucket.
#[derive(Default)]
struct Bucket {
    patient_visits: u32,
    treatments: u32,
    new_patients: u32,
    amount_won: u64,
    agreed: u32,
    decided: u32,
}

impl Bucket {
    fn add_treatment(&mut self, amount_won: u64, agreement: Agreement) {
        self.treatments += 1;
        self.amount_won = self.amount_won.saturating_add(amount_won);
        if agreement.is_decided() {
            self.decided += 1;
            if agreement == Agreement::Agreed {
                self.agreed += 1;
            }
        }
    }

    fn into_row(self, label: &str, period_start: NaiveDate) -> StatsRow {
        StatsRow {
            label: label.to_string(),
            period_start,
            patient_visit_count: self.patient_visits,
            treatment_count: self.treatments,
            new_patient_count: self.new_patients,
            revenue_total: self.amount_won as f64 / REVENUE_UNIT_WON as f64,
            agreement_rate: agreement_rate(self.agreed, self.decided),
        }
    }
}

/// `round(100 * agreed / decided)`, or 0 with nothing decided.
pub fn agreement_rate(agreed: u32, decided: u32) -> u32 {
    if decided == 0 {
        return 0;
    }
    (100.0 * agreed as f64 / decided as f64).round() as u32
}
