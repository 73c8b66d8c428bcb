use std::fmt::Debug;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::scoring::EligibilityTier;

/// One appended row: when, who, how they scored, where the report went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeLogRow {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub company: String,
    pub email: String,
    pub score: u32,
    #[serde(serialize_with = "serialize_tier")]
    pub tier: EligibilityTier,
    pub recipient: String,
}

fn serialize_timestamp<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn serialize_tier<S>(value: &EligibilityTier, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(value.label())
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeLogError {
    #[error("intake log unavailable: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write intake log row: {0}")]
    Csv(#[from] csv::Error),
    #[error("intake log lock poisoned")]
    Poisoned,
}

/// Append-only record of completed assessments.
pub trait IntakeLog: Debug + Send + Sync {
    fn append(&self, row: &IntakeLogRow) -> Result<(), IntakeLogError>;
}

#[derive(Debug)]
pub struct CsvIntakeLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvIntakeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IntakeLog for CsvIntakeLog {
    fn append(&self, row: &IntakeLogRow) -> Result<(), IntakeLogError> {
        let _guard = self.lock.lock().map_err(|_| IntakeLogError::Poisoned)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let is_empty = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}
