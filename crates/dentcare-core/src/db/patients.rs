//! Patient database operations.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Agreement, Gender, Patient, PatientStatus, Treatment};

const PATIENT_COLUMNS: &str = r#"
    id, chart_number, name, phone, birth_date, gender, registration_date,
    last_visit, next_recall_date, next_recall_note, visit_path,
    visit_path_detail, status, completed_recall_dates, external_id, is_linked
"#;

impl Database {
    /// Load every patient with their treatments, in collection order.
    pub fn load_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients ORDER BY position",
            PATIENT_COLUMNS
        ))?;
        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut treatments = load_all_treatments(&self.conn)?;
        let mut patients = Vec::new();
        for row in rows {
            let mut patient: Patient = row?.try_into()?;
            patient.treatments = treatments.remove(&patient.id).unwrap_or_default();
            patients.push(patient);
        }
        Ok(patients)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: &str) -> DbResult<Option<Patient>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                PatientRow::from_row,
            )
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut patient: Patient = row.try_into()?;
        patient.treatments = load_treatments_for(&self.conn, id)?;
        Ok(Some(patient))
    }

    /// Count stored patients.
    pub fn patient_count(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM patients", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Replace the whole collection in one transaction.
    ///
    /// Deleting the old patients cascades to their treatments, so anything
    /// missing from `patients` disappears with all of its treatments.
    pub fn replace_patients(&mut self, patients: &[Patient]) -> DbResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM patients", [])?;

        {
            let mut insert_patient = tx.prepare(
                r#"
                INSERT INTO patients (
                    id, position, chart_number, name, phone, birth_date, gender,
                    registration_date, last_visit, next_recall_date, next_recall_note,
                    visit_path, visit_path_detail, status, completed_recall_dates,
                    external_id, is_linked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
                "#,
            )?;
            let mut insert_treatment = tx.prepare(
                r#"
                INSERT INTO treatments (
                    id, patient_id, position, date, content, doctor, notes,
                    estimated_amount, agreement
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;

            for (position, patient) in patients.iter().enumerate() {
                let completed_json = serde_json::to_string(&patient.completed_recall_dates)?;
                let result = insert_patient.execute(params![
                    patient.id,
                    position as i64,
                    patient.chart_number,
                    patient.name,
                    patient.phone,
                    patient.birth_date,
                    patient.gender.as_ref().map(gender_to_string),
                    patient.registration_date,
                    patient.last_visit,
                    patient.pending_recall(),
                    patient.next_recall_note,
                    patient.visit_path,
                    patient.visit_path_detail,
                    status_to_string(&patient.status),
                    completed_json,
                    patient.external_id,
                    patient.is_linked,
                ]);
                if let Err(rusqlite::Error::SqliteFailure(err, _)) = &result {
                    if err.code == rusqlite::ErrorCode::ConstraintViolation {
                        return Err(DbError::Constraint(format!(
                            "Duplicate patient id: {}",
                            patient.id
                        )));
                    }
                }
                result?;

                for (t_position, treatment) in patient.treatments.iter().enumerate() {
                    insert_treatment.execute(params![
                        treatment.id,
                        patient.id,
                        t_position as i64,
                        treatment.date,
                        treatment.content,
                        treatment.doctor,
                        treatment.notes,
                        treatment.estimated_amount,
                        agreement_to_string(&treatment.agreement),
                    ])?;
                }
            }
        }

        tx.commit()?;
        tracing::debug!(count = patients.len(), "Saved patient collection");
        Ok(())
    }
}

fn load_all_treatments(conn: &Connection) -> DbResult<HashMap<String, Vec<Treatment>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT patient_id, id, date, content, doctor, notes, estimated_amount, agreement
        FROM treatments
        ORDER BY patient_id, position
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, TreatmentRow::from_row_at(row, 1)?))
    })?;

    let mut by_patient: HashMap<String, Vec<Treatment>> = HashMap::new();
    for row in rows {
        let (patient_id, treatment) = row?;
        by_patient
            .entry(patient_id)
            .or_default()
            .push(treatment.try_into()?);
    }
    Ok(by_patient)
}

fn load_treatments_for(conn: &Connection, patient_id: &str) -> DbResult<Vec<Treatment>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, date, content, doctor, notes, estimated_amount, agreement
        FROM treatments
        WHERE patient_id = ?
        ORDER BY position
        "#,
    )?;
    let rows = stmt.query_map([patient_id], |row| TreatmentRow::from_row_at(row, 0))?;

    let mut treatments = Vec::new();
    for row in rows {
        treatments.push(row?.try_into()?);
    }
    Ok(treatments)
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: String,
    chart_number: String,
    name: String,
    phone: String,
    birth_date: String,
    gender: Option<String>,
    registration_date: Option<String>,
    last_visit: String,
    next_recall_date: Option<String>,
    next_recall_note: String,
    visit_path: Option<String>,
    visit_path_detail: Option<String>,
    status: String,
    completed_recall_dates: String,
    external_id: Option<String>,
    is_linked: bool,
}

impl PatientRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            chart_number: row.get(1)?,
            name: row.get(2)?,
            phone: row.get(3)?,
            birth_date: row.get(4)?,
            gender: row.get(5)?,
            registration_date: row.get(6)?,
            last_visit: row.get(7)?,
            next_recall_date: row.get(8)?,
            next_recall_note: row.get(9)?,
            visit_path: row.get(10)?,
            visit_path_detail: row.get(11)?,
            status: row.get(12)?,
            completed_recall_dates: row.get(13)?,
            external_id: row.get(14)?,
            is_linked: row.get(15)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let completed_recall_dates: Vec<String> =
            serde_json::from_str(&row.completed_recall_dates)?;
        let gender = row.gender.as_deref().map(string_to_gender).transpose()?;

        Ok(Patient {
            id: row.id,
            chart_number: row.chart_number,
            name: row.name,
            phone: row.phone,
            birth_date: row.birth_date,
            gender,
            registration_date: row.registration_date,
            last_visit: row.last_visit,
            next_recall_date: row.next_recall_date,
            next_recall_note: row.next_recall_note,
            visit_path: row.visit_path,
            visit_path_detail: row.visit_path_detail,
            treatments: Vec::new(),
            status: string_to_status(&row.status)?,
            completed_recall_dates,
            external_id: row.external_id,
            is_linked: row.is_linked,
        })
    }
}

struct TreatmentRow {
    id: String,
    date: String,
    content: String,
    doctor: String,
    notes: Option<String>,
    estimated_amount: String,
    agreement: String,
}

impl TreatmentRow {
    fn from_row_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            date: row.get(offset + 1)?,
            content: row.get(offset + 2)?,
            doctor: row.get(offset + 3)?,
            notes: row.get(offset + 4)?,
            estimated_amount: row.get(offset + 5)?,
            agreement: row.get(offset + 6)?,
        })
    }
}

impl TryFrom<TreatmentRow> for Treatment {
    type Error = DbError;

    fn try_from(row: TreatmentRow) -> Result<Self, Self::Error> {
        Ok(Treatment {
            id: row.id,
            date: row.date,
            content: row.content,
            doctor: row.doctor,
            notes: row.notes,
            estimated_amount: row.estimated_amount,
            agreement: string_to_agreement(&row.agreement)?,
        })
    }
}

fn gender_to_string(gender: &Gender) -> &'static str {
    match gender {
        Gender::Male => "male",
        Gender::Female => "female",
    }
}

fn string_to_gender(s: &str) -> Result<Gender, DbError> {
    match s {
        "male" => Ok(Gender::Male),
        "female" => Ok(Gender::Female),
        _ => Err(DbError::Constraint(format!("Unknown gender: {}", s))),
    }
}

fn status_to_string(status: &PatientStatus) -> &'static str {
    match status {
        PatientStatus::Active => "active",
        PatientStatus::Inactive => "inactive",
    }
}

fn string_to_status(s: &str) -> Result<PatientStatus, DbError> {
    match s {
        "active" => Ok(PatientStatus::Active),
        "inactive" => Ok(PatientStatus::Inactive),
        _ => Err(DbError::Constraint(format!("Unknown patient status: {}", s))),
    }
}

fn agreement_to_string(agreement: &Agreement) -> &'static str {
    match agreement {
        Agreement::Agreed => "agreed",
        Agreement::Declined => "declined",
        Agreement::Undecided => "undecided",
    }
}

fn string_to_agreement(s: &str) -> Result<Agreement, DbError> {
    match s {
        "agreed" => Ok(Agreement::Agreed),
        "declined" => Ok(Agreement::Declined),
        "undecided" => Ok(Agreement::Undecided),
        _ => Err(DbError::Constraint(format!("Unknown agreement: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::db::PatientStore;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn make_patient(chart: &str) -> Patient {
        let today = parse_date("2025-03-05").unwrap();
        let mut patient = Patient::new(chart.into(), format!("환자 {}", chart), today);
        patient.gender = Some(Gender::Female);

        let mut scaling = Treatment::new(today, "대표원장");
        scaling.content = "스케일링".into();
        scaling.estimated_amount = "50,000원".into();
        scaling.agreement = Agreement::Agreed;
        patient.add_treatment(scaling);

        let mut implant = Treatment::new(today, "김원장");
        implant.content = "임플란트 상담".into();
        implant.estimated_amount = "1,500,000원".into();
        patient.add_treatment(implant);
        patient
    }

    #[test]
    fn test_save_and_load() {
        let mut db = setup_db();
        let mut patient = make_patient("A1");
        patient.next_recall_date = Some("2025-06-01".into());
        patient.completed_recall_dates = vec!["2024-12-01".into()];

        db.save_all(&[patient.clone()]).unwrap();

        let loaded = db.load().unwrap();
        assert_eq!(loaded, vec![patient]);
    }

    #[test]
    fn test_treatment_order_preserved() {
        let mut db = setup_db();
        let patient = make_patient("A1");
        db.save_all(&[patient.clone()]).unwrap();

        let loaded = db.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(loaded.treatments[0].content, "스케일링");
        assert_eq!(loaded.treatments[1].content, "임플란트 상담");
        assert_eq!(loaded.treatments[1].agreement, Agreement::Undecided);
    }

    #[test]
    fn test_collection_order_preserved() {
        let mut db = setup_db();
        let patients = vec![make_patient("C3"), make_patient("A1"), make_patient("B2")];
        db.save_all(&patients).unwrap();

        let charts: Vec<String> = db
            .load()
            .unwrap()
            .into_iter()
            .map(|p| p.chart_number)
            .collect();
        assert_eq!(charts, vec!["C3", "A1", "B2"]);
    }

    #[test]
    fn test_save_all_replaces_and_cascades() {
        let mut db = setup_db();
        let keep = make_patient("A1");
        let drop = make_patient("A2");
        db.save_all(&[keep.clone(), drop.clone()]).unwrap();

        db.save_all(&[keep.clone()]).unwrap();

        assert_eq!(db.patient_count().unwrap(), 1);
        assert!(db.get_patient(&drop.id).unwrap().is_none());

        let orphaned: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM treatments WHERE patient_id = ?",
                [&drop.id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[test]
    fn test_empty_recall_stored_as_null() {
        let mut db = setup_db();
        let mut patient = make_patient("A1");
        patient.next_recall_date = Some("".into());
        db.save_all(&[patient.clone()]).unwrap();

        let loaded = db.get_patient(&patient.id).unwrap().unwrap();
        assert!(loaded.next_recall_date.is_none());
    }

    #[test]
    fn test_duplicate_id_rejected_without_partial_write() {
        let mut db = setup_db();
        let original = make_patient("A1");
        db.save_all(&[original.clone()]).unwrap();

        let mut twin = make_patient("A2");
        twin.id = original.id.clone();
        let result = db.save_all(&[original.clone(), twin]);
        assert!(matches!(result, Err(DbError::Constraint(_))));

        // Transaction rolled back: previous collection intact
        let loaded = db.load().unwrap();
        assert_eq!(loaded, vec![original]);
    }

    #[test]
    fn test_get_missing_patient() {
        let db = setup_db();
        assert!(db.get_patient("nope").unwrap().is_none());
    }
}
