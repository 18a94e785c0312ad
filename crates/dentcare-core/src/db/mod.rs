//! Database layer for dentcare.
//!
//! The rest of the crate only sees [`PatientStore`]: read the whole
//! collection, write the whole collection. There are no partial updates.

mod memory;
mod patients;
mod schema;

pub use memory::*;
pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::Patient;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Persistent patient collection.
pub trait PatientStore {
    /// Read every patient, in collection order.
    fn load(&self) -> DbResult<Vec<Patient>>;

    /// Replace the stored collection with `patients`.
    fn save_all(&mut self, patients: &[Patient]) -> DbResult<()>;
}

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        let db = Self { conn };
        db.initialize()?;
        tracing::debug!(path = %path.as_ref().display(), "Opened patient database");
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl PatientStore for Database {
    fn load(&self) -> DbResult<Vec<Patient>> {
        self.load_patients()
    }

    fn save_all(&mut self, patients: &[Patient]) -> DbResult<()> {
        self.replace_patients(patients)
    }
}
