//! Runtime configuration.

use std::env;
use std::path::PathBuf;

use tracing::warn;

pub const DEFAULT_DATABASE_FILE: &str = "dentcare.db";
pub const DEFAULT_DOCTOR: &str = "대표원장";
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ClinicConfig {
    /// SQLite file holding the patient collection
    pub database_path: PathBuf,
    /// Doctor pre-filled on new treatments
    pub default_doctor: String,
    /// Length of the dashboard's upcoming-recall list
    pub upcoming_limit: usize,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            default_doctor: DEFAULT_DOCTOR.to_string(),
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
        }
    }
}

impl ClinicConfig {
    /// Read `DENTCARE_DB_PATH`, `DENTCARE_DEFAULT_DOCTOR` and
    /// `DENTCARE_UPCOMING_LIMIT`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let database_path = lookup("DENTCARE_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                warn!(
                    "DENTCARE_DB_PATH not set, using {}",
                    defaults.database_path.display()
                );
                defaults.database_path.clone()
            });

        let default_doctor = lookup("DENTCARE_DEFAULT_DOCTOR")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_doctor);

        let upcoming_limit = match lookup("DENTCARE_UPCOMING_LIMIT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "DENTCARE_UPCOMING_LIMIT is not a number, using default");
                defaults.upcoming_limit
            }),
            None => defaults.upcoming_limit,
        };

        Self {
            database_path,
            default_doctor,
            upcoming_limit,
        }
    }
}
