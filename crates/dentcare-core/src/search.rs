//! Patient lookup by name, chart number or phone.

use crate::models::Patient;

/// Case-insensitive substring search. A blank query matches nothing.
pub fn search_patients<'a>(patients: &'a [Patient], query: &str) -> Vec<&'a Patient> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    patients
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query)
                || p.chart_number.to_lowercase().contains(&query)
                || p.phone.contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;

    fn patients() -> Vec<Patient> {
        let today = parse_date("2025-03-05").unwrap();
        let mut a = Patient::new("AB-100".into(), "김민수".into(), today);
        a.phone = "010-1111-2222".into();
        let mut b = Patient::new("cd-200".into(), "Lee Younghee".into(), today);
        b.phone = "010-3333-4444".into();
        vec![a, b]
    }

    #[test]
    fn test_search_by_each_field() {
        let patients = patients();
        assert_eq!(search_patients(&patients, "민수")[0].chart_number, "AB-100");
        assert_eq!(search_patients(&patients, "ab-1")[0].name, "김민수");
        assert_eq!(search_patients(&patients, "CD")[0].name, "Lee Younghee");
        assert_eq!(search_patients(&patients, "younghee").len(), 1);
        assert_eq!(search_patients(&patients, "3333")[0].chart_number, "cd-200");
        assert_eq!(search_patients(&patients, "010").len(), 2);
    }

    #[test]
    fn test_blank_query() {
        assert!(search_patients(&patients(), "   ").is_empty());
    }
}
