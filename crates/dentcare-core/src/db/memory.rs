//! In-process patient store.

use super::{DbResult, PatientStore};
use crate::models::Patient;

/// Store that keeps the collection as a serialized JSON document, the same
/// shape a browser key-value store would hold.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing JSON document.
    pub fn from_json(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
        }
    }

    /// The raw stored document, if anything has been saved.
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl PatientStore for MemoryStore {
    fn load(&self) -> DbResult<Vec<Patient>> {
        match &self.document {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&mut self, patients: &[Patient]) -> DbResult<()> {
        self.document = Some(serde_json::to_string(patients)?);
        Ok(())
    }
}
