//! SQLite schema definition.

/// Complete database schema for dentcare.
pub const SCHEMA: &str = r#"
-- Enable foreign keys (treatments cascade with their patient)
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id TEXT PRIMARY KEY,
    position INTEGER NOT NULL,                   -- order within the collection
    chart_number TEXT NOT NULL DEFAULT '',
    name TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    birth_date TEXT NOT NULL DEFAULT '',
    gender TEXT CHECK (gender IS NULL OR gender IN ('male', 'female')),
    registration_date TEXT,
    last_visit TEXT NOT NULL DEFAULT '',
    next_recall_date TEXT,                       -- NULL when no recall pending
    next_recall_note TEXT NOT NULL DEFAULT '',
    visit_path TEXT,
    visit_path_detail TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'inactive')),
    completed_recall_dates TEXT NOT NULL DEFAULT '[]', -- JSON array of ISO dates
    external_id TEXT,
    is_linked INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_patients_chart_number ON patients(chart_number);
CREATE INDEX IF NOT EXISTS idx_patients_next_recall ON patients(next_recall_date);

-- ============================================================================
-- Treatments
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatments (
    id TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES patients(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,                   -- entry order within the patient
    date TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    doctor TEXT NOT NULL DEFAULT '',
    notes TEXT,
    estimated_amount TEXT NOT NULL DEFAULT '',
    agreement TEXT NOT NULL DEFAULT 'undecided'
        CHECK (agreement IN ('agreed', 'declined', 'undecided')),
    PRIMARY KEY (patient_id, id)
);

CREATE INDEX IF NOT EXISTS idx_treatments_date ON treatments(date);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_treatments_cascade() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute(
            "INSERT INTO patients (id, position, chart_number, name) VALUES ('p1', 0, 'A1', 'Kim')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO treatments (id, patient_id, position, date) VALUES ('t1', 'p1', 0, '2025-03-05')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE id = 'p1'", []).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM treatments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_orphan_treatment_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO treatments (id, patient_id, position) VALUES ('t1', 'missing', 0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_agreement_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO patients (id, position) VALUES ('p1', 0)",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO treatments (id, patient_id, position, agreement) VALUES ('t1', 'p1', 0, 'maybe')",
            [],
        );
        assert!(result.is_err());
    }
}
