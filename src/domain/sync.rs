//! Payload handed to the remote sync collaborator.

use serde::{Deserialize, Serialize};

use super::prediction::PredictionRecord;

/// Flat key/value document replicated once per stored prediction.
///
/// Flags are sent as 0/1 integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub age: u32,
    pub parity: u32,
    pub mode: u8,
    pub haemoglobin: f64,
    #[serde(rename = "previousPPH")]
    pub previous_pph: u8,
    pub prolonged_labor: u8,
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Epoch milliseconds
    pub timestamp: i64,
}

impl SyncPayload {
    /// Build the payload for a stored record, stamped with the current time.
    #[must_use]
    pub fn from_record(record: &PredictionRecord) -> Self {
        Self::at(record, chrono::Utc::now().timestamp_millis())
    }

    #[must_use]
    pub fn at(record: &PredictionRecord, timestamp: i64) -> Self {
        let i = &record.inputs;
        Self {
            age: i.age,
            parity: i.parity,
            mode: i.delivery_mode.code(),
            haemoglobin: i.haemoglobin,
            previous_pph: u8::from(i.previous_pph),
            prolonged_labor: u8::from(i.prolonged_labor),
            result: record.label.as_str().to_string(),
            score: record.score,
            timestamp,
        }
    }
}
