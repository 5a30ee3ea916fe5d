//! Outbox adapter: Implementation of SyncGateway backed by a local JSON-lines file.
//!
//! Each submitted payload becomes one line `{"collection": ..., "document": {...}}`.
//! A separate replicator ships the outbox to the remote document store; this
//! process never talks to the network.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Serialize;

use crate::domain::SyncPayload;
use crate::ports::{SyncError, SyncGateway};

/// Remote collection the documents belong to.
pub const COLLECTION: &str = "pph_predictions";

#[derive(Serialize)]
struct OutboxEntry<'a> {
    collection: &'static str,
    document: &'a SyncPayload,
}

/// Appends sync payloads to an outbox file.
pub struct OutboxGateway {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl OutboxGateway {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncGateway for OutboxGateway {
    fn submit(&self, payload: &SyncPayload) -> Result<(), SyncError> {
        let mut line = serde_json::to_vec(&OutboxEntry {
            collection: COLLECTION,
            document: payload,
        })?;
        line.push(b'\n');

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SyncError::Transport("outbox lock poisoned".to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(&line)?;

        tracing::debug!("Queued prediction for {} in outbox", COLLECTION);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalInputs, DeliveryMode, PredictionRecord, RiskLabel};
    use tempfile::tempdir;

    fn payload(age: u32) -> SyncPayload {
        let record = PredictionRecord {
            id: 1,
            inputs: ClinicalInputs {
                age,
                parity: 0,
                delivery_mode: DeliveryMode::Vaginal,
                haemoglobin: 12.0,
                previous_pph: false,
                prolonged_labor: false,
            },
            label: RiskLabel::Low,
            score: Some(0.1),
        };
        SyncPayload::at(&record, 42)
    }

    #[test]
    fn test_submit_appends_one_line_per_payload() {
        let temp = tempdir().expect("tempdir");
        let gateway = OutboxGateway::new(temp.path().join("sync").join("outbox.jsonl"));

        gateway.submit(&payload(24)).expect("Should submit");
        gateway.submit(&payload(31)).expect("Should submit");

        let content = std::fs::read_to_string(gateway.path()).expect("read outbox");
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid json"))
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["collection"], COLLECTION);
        assert_eq!(lines[0]["document"]["age"], 24);
        assert_eq!(lines[1]["document"]["age"], 31);
        assert_eq!(lines[1]["document"]["timestamp"], 42);
    }

    #[test]
    fn test_unwritable_outbox_reports_io_error() {
        let temp = tempdir().expect("tempdir");
        // A directory cannot be opened for appending.
        let gateway = OutboxGateway::new(temp.path());

        let err = gateway.submit(&payload(24)).expect_err("must fail");
        assert!(matches!(err, SyncError::Io(_)));
    }
}
