//! Treatment models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates;

/// Consult outcome for a proposed treatment estimate.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Agreement {
    /// Patient accepted the estimate
    Agreed,
    /// Patient declined the estimate
    Declined,
    /// No outcome recorded yet
    #[default]
    Undecided,
}

impl Agreement {
    /// Whether an outcome has been recorded.
    pub fn is_decided(&self) -> bool {
        !matches!(self, Agreement::Undecided)
    }

    /// Map the optional-boolean form used by UI hosts.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => Agreement::Agreed,
            Some(false) => Agreement::Declined,
            None => Agreement::Undecided,
        }
    }

    /// Inverse of [`Agreement::from_flag`].
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Agreement::Agreed => Some(true),
            Agreement::Declined => Some(false),
            Agreement::Undecided => None,
        }
    }
}

/// A single clinical encounter logged against a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Treatment {
    /// Unique treatment ID
    pub id: String,
    /// Encounter date (ISO)
    pub date: String,
    /// Free-text description of the work done or proposed
    pub content: String,
    /// Attending doctor (display name, not a foreign key)
    pub doctor: String,
    /// Additional notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Estimated cost as entered, e.g. "150,000원"
    #[serde(default)]
    pub estimated_amount: String,
    /// Consult outcome
    #[serde(default)]
    pub agreement: Agreement,
}

impl Treatment {
    /// Create an empty treatment dated `date` for `doctor`.
    pub fn new(date: NaiveDate, doctor: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: dates::format_date(date),
            content: String::new(),
            doctor: doctor.into(),
            notes: None,
            estimated_amount: String::new(),
            agreement: Agreement::Undecided,
        }
    }

    /// Parsed treatment date, if well-formed.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        dates::parse_date(&self.date)
    }

    /// Estimated amount in won; malformed input counts as zero.
    pub fn estimated_won(&self) -> u64 {
        parse_amount(&self.estimated_amount)
    }
}

/// Parse a display currency string by keeping only its digits.
///
/// Anything that does not leave a parseable number yields 0. That includes
/// digit runs too long for `u64`, which are treated as malformed input rather
/// than clamped or approximated.
pub fn parse_amount(amount: &str) -> u64 {
    let digits: String = amount.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("150,000원"), 150_000);
        assert_eq!(parse_amount("150000"), 150_000);
        assert_eq!(parse_amount("₩ 1,200,000"), 1_200_000);
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("abc"), 0);
        assert_eq!(parse_amount("99999999999999999999999"), 0);
    }

    #[test]
    fn test_agreement_flags() {
        assert_eq!(Agreement::from_flag(Some(true)), Agreement::Agreed);
        assert_eq!(Agreement::from_flag(Some(false)), Agreement::Declined);
        assert_eq!(Agreement::from_flag(None), Agreement::Undecided);
        assert!(!Agreement::Undecided.is_decided());
        assert!(Agreement::Declined.is_decided());
        assert_eq!(Agreement::Declined.as_flag(), Some(false));
    }

    #[test]
    fn test_new_treatment() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let treatment = Treatment::new(date, "대표원장");
        assert_eq!(treatment.date, "2025-03-05");
        assert_eq!(treatment.doctor, "대표원장");
        assert_eq!(treatment.agreement, Agreement::Undecided);
        assert_eq!(treatment.estimated_won(), 0);
        assert_eq!(treatment.id.len(), 36);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let json = r#"{"id":"t1","date":"2025-03-05","content":"scaling","doctor":"Dr. Kim"}"#;
        let treatment: Treatment = serde_json::from_str(json).unwrap();
        assert_eq!(treatment.agreement, Agreement::Undecided);
        assert!(treatment.estimated_amount.is_empty());
        assert!(treatment.notes.is_none());
    }

    proptest! {
        #[test]
        fn prop_formatted_amount_parses_back(n in 0u64..1_000_000_000) {
            let display = format!("{}원", n);
            prop_assert_eq!(parse_amount(&display), n);
        }

        #[test]
        fn prop_digitless_input_is_zero(s in "[^0-9]*") {
            prop_assert_eq!(parse_amount(&s), 0);
        }
    }
}
