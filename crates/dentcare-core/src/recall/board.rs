//! Read-only recall views: overdue/today/upcoming lists, weekly window and
//! month calendar.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::models::Patient;

/// Pending recalls split around a reference day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecallBoard {
    /// Recall date already passed without completion
    pub overdue: Vec<Patient>,
    /// Recall due today
    pub due_today: Vec<Patient>,
    /// Recall still ahead, soonest first
    pub upcoming: Vec<Patient>,
}

impl RecallBoard {
    /// Sort every patient with a well-formed pending recall into a column.
    pub fn build(patients: &[Patient], today: NaiveDate) -> Self {
        let mut board = Self::default();
        for patient in patients {
            let Some(date) = patient.pending_recall_on() else {
                continue;
            };
            let column = match date.cmp(&today) {
                std::cmp::Ordering::Less => &mut board.overdue,
                std::cmp::Ordering::Equal => &mut board.due_today,
                std::cmp::Ordering::Greater => &mut board.upcoming,
            };
            column.push(patient.clone());
        }
        board.overdue.sort_by_key(|p| p.pending_recall_on());
        board.upcoming.sort_by_key(|p| p.pending_recall_on());
        board
    }

    pub fn total(&self) -> usize {
        self.overdue.len() + self.due_today.len() + self.upcoming.len()
    }
}

/// Patients with a recall between Monday and Sunday of `today`'s week.
pub fn recalls_this_week(patients: &[Patient], today: NaiveDate) -> Vec<&Patient> {
    let start = dates::week_start(today);
    let end = dates::week_end(today);
    patients
        .iter()
        .filter(|p| {
            p.pending_recall_on()
                .is_some_and(|date| date >= start && date <= end)
        })
        .collect()
}

/// The next `limit` recalls on or after `today`, soonest first.
pub fn upcoming_recalls(patients: &[Patient], today: NaiveDate, limit: usize) -> Vec<&Patient> {
    let mut upcoming: Vec<&Patient> = patients
        .iter()
        .filter(|p| p.pending_recall_on().is_some_and(|date| date >= today))
        .collect();
    upcoming.sort_by_key(|p| p.pending_recall_on());
    upcoming.truncate(limit);
    upcoming
}

/// Total number of recalls ever completed across all patients.
pub fn completed_recall_total(patients: &[Patient]) -> usize {
    patients.iter().map(|p| p.completed_recall_dates.len()).sum()
}

/// Patients with a recall pending on exactly `date`.
pub fn recalls_on(patients: &[Patient], date: NaiveDate) -> Vec<&Patient> {
    patients
        .iter()
        .filter(|p| p.pending_recall_on() == Some(date))
        .collect()
}

/// Pending recalls for each day of a month that has any.
///
/// Returns an empty map for an invalid `month`.
pub fn month_schedule(
    patients: &[Patient],
    year: i32,
    month: u32,
) -> BTreeMap<NaiveDate, Vec<&Patient>> {
    let mut schedule: BTreeMap<NaiveDate, Vec<&Patient>> = BTreeMap::new();
    for patient in patients {
        if let Some(date) = patient.pending_recall_on() {
            if date.year() == year && date.month() == month {
                schedule.entry(date).or_default().push(patient);
            }
        }
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn d(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn patient(chart: &str, recall: Option<&str>) -> Patient {
        let mut p = Patient::new(chart.into(), format!("환자 {}", chart), d("2025-01-01"));
        p.next_recall_date = recall.map(Into::into);
        p
    }

    fn charts(patients: &[&Patient]) -> Vec<String> {
        patients.iter().map(|p| p.chart_number.clone()).collect()
    }

    #[test]
    fn test_board_columns() {
        let today = d("2025-03-05");
        let patients = vec![
            patient("late2", Some("2025-03-01")),
            patient("late1", Some("2025-02-01")),
            patient("now", Some("2025-03-05")),
            patient("soon2", Some("2025-04-01")),
            patient("soon1", Some("2025-03-06")),
            patient("none", None),
            patient("junk", Some("someday")),
        ];

        let board = RecallBoard::build(&patients, today);

        let names = |list: &[Patient]| -> Vec<String> {
            list.iter().map(|p| p.chart_number.clone()).collect()
        };
        assert_eq!(names(&board.overdue), vec!["late1", "late2"]);
        assert_eq!(names(&board.due_today), vec!["now"]);
        assert_eq!(names(&board.upcoming), vec!["soon1", "soon2"]);
        assert_eq!(board.total(), 5);
    }

    #[test]
    fn test_this_week_includes_sunday() {
        // Week of Monday 2025-03-03 .. Sunday 2025-03-09
        let today = d("2025-03-05");
        let patients = vec![
            patient("mon", Some("2025-03-03")),
            patient("sun", Some("2025-03-09")),
            patient("prev-sun", Some("2025-03-02")),
            patient("next-mon", Some("2025-03-10")),
        ];

        let week = recalls_this_week(&patients, today);
        assert_eq!(charts(&week), vec!["mon", "sun"]);
    }

    #[test]
    fn test_upcoming_limit_and_order() {
        let today = d("2025-03-05");
        let patients: Vec<Patient> = (1..=8)
            .rev()
            .map(|day| patient(&format!("P{}", day), Some(&format!("2025-03-{:02}", day))))
            .collect();

        let upcoming = upcoming_recalls(&patients, today, 3);
        assert_eq!(charts(&upcoming), vec!["P5", "P6", "P7"]);
    }

    #[test]
    fn test_completed_total() {
        let mut a = patient("A", None);
        a.completed_recall_dates = vec!["2024-01-01".into(), "2024-07-01".into()];
        let mut b = patient("B", None);
        b.completed_recall_dates = vec!["2024-03-01".into()];
        assert_eq!(completed_recall_total(&[a, b, patient("C", None)]), 3);
    }

    #[test]
    fn test_month_schedule() {
        let patients = vec![
            patient("A", Some("2025-03-05")),
            patient("B", Some("2025-03-05")),
            patient("C", Some("2025-03-20")),
            patient("D", Some("2025-04-05")),
        ];

        let schedule = month_schedule(&patients, 2025, 3);
        assert_eq!(schedule.len(), 2);
        assert_eq!(charts(&schedule[&d("2025-03-05")]), vec!["A", "B"]);
        assert_eq!(charts(&recalls_on(&patients, d("2025-03-20"))), vec!["C"]);
        assert!(month_schedule(&patients, 2025, 13).is_empty());
    }
}
