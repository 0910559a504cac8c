use std::path::PathBuf;

use tracing::debug;

use crate::error::QueryError;
use crate::models::PatientRecord;

/// Read-only access to the patient record file.
///
/// The record is reloaded on every `load` call so each query sees the
/// current contents of the backing file. Nothing is cached or mutated.
#[derive(Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<PatientRecord, QueryError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            QueryError::DataUnavailable(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let record: PatientRecord = serde_json::from_str(&raw).map_err(|e| {
            QueryError::DataUnavailable(format!("failed to parse {}: {}", self.path.display(), e))
        })?;

        debug!(
            medications = record.medications.len(),
            test_results = record.test_results.len(),
            visits = record.visits.len(),
            "patient record loaded"
        );

        Ok(record)
    }
}
