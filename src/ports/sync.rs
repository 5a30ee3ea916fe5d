//! Sync port: Trait for best-effort remote replication.
//!
//! The remote document store is an external collaborator; the application only
//! submits finished records and never waits on the outcome.

use crate::domain::SyncPayload;

/// Errors that can occur while replicating a record.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sync transport failed: {0}")]
    Transport(String),

    #[error("Sync payload could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Sync IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sync worker is not running")]
    WorkerStopped,
}

/// Receiver of finished prediction records.
pub trait SyncGateway: Send + Sync {
    /// Submit one payload.
    ///
    /// # Errors
    /// Returns `SyncError` if the payload could not be handed off. Callers log
    /// the failure and move on.
    fn submit(&self, payload: &SyncPayload) -> Result<(), SyncError>;
}
