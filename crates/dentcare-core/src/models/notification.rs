//! Recall notifications.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::patient::Patient;

/// A reminder that a patient's recall falls due today.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecallNotification {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub chart_number: String,
    pub recall_date: String,
    pub is_read: bool,
}

/// Notifications for a session.
///
/// The feed is a snapshot: it is derived once and does not follow recalls
/// edited or days changing afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationFeed {
    pub entries: Vec<RecallNotification>,
}

impl NotificationFeed {
    /// One unread entry per patient whose recall is due on `today`.
    pub fn derive(patients: &[Patient], today: NaiveDate) -> Self {
        let entries = patients
            .iter()
            .filter(|p| p.pending_recall_on() == Some(today))
            .map(|p| RecallNotification {
                id: uuid::Uuid::new_v4().to_string(),
                patient_id: p.id.clone(),
                patient_name: p.name.clone(),
                chart_number: p.chart_number.clone(),
                recall_date: p.pending_recall().unwrap_or_default().to_string(),
                is_read: false,
            })
            .collect();
        Self { entries }
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|n| !n.is_read).count()
    }

    /// Mark one entry read. Returns false for unknown IDs.
    pub fn mark_read(&mut self, notification_id: &str) -> bool {
        match self.entries.iter_mut().find(|n| n.id == notification_id) {
            Some(entry) => {
                entry.is_read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.is_read = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn patient(chart: &str, recall: Option<&str>) -> Patient {
        let mut p = Patient::new(chart.into(), format!("환자 {}", chart), parse_date("2025-01-01").unwrap());
        p.next_recall_date = recall.map(Into::into);
        p
    }

    #[test]
    fn test_derive_only_today() {
        let today = parse_date("2025-03-05").unwrap();
        let patients = vec![
            patient("A1", Some("2025-03-05")),
            patient("A2", Some("2025-03-06")),
            patient("A3", None),
            patient("A4", Some("2025-03-05")),
        ];

        let feed = NotificationFeed::derive(&patients, today);
        assert_eq!(feed.entries.len(), 2);
        assert_eq!(feed.unread_count(), 2);
        assert_eq!(feed.entries[0].chart_number, "A1");
        assert_eq!(feed.entries[1].recall_date, "2025-03-05");
    }

    #[test]
    fn test_mark_read() {
        let today = parse_date("2025-03-05").unwrap();
        let patients = vec![patient("A1", Some("2025-03-05")), patient("A2", Some("2025-03-05"))];
        let mut feed = NotificationFeed::derive(&patients, today);

        let first = feed.entries[0].id.clone();
        assert!(feed.mark_read(&first));
        assert!(!feed.mark_read("missing"));
        assert_eq!(feed.unread_count(), 1);

        feed.mark_all_read();
        assert_eq!(feed.unread_count(), 0);
    }
}
