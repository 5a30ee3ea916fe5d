//! Storage port: Trait for the local prediction history.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.

use crate::domain::{NewPrediction, PredictionRecord};

/// Append-only store of prediction records.
///
/// All data is stored locally on the device.
pub trait PredictionStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create the table if needed, upgrading older schema versions.
    ///
    /// Idempotent for a store already at the current version. An upgrade from an
    /// older version drops every stored record.
    ///
    /// # Errors
    /// Returns error if the schema cannot be read or written.
    fn create_schema(&self) -> Result<(), Self::Error>;

    /// Persist a prediction and return the id assigned to it.
    ///
    /// Ids are strictly increasing and never reused.
    ///
    /// # Errors
    /// Returns error if the write fails; nothing is stored in that case.
    fn insert(&self, prediction: &NewPrediction) -> Result<i64, Self::Error>;

    /// Load every record, newest (highest id) first.
    ///
    /// # Errors
    /// Returns error if the read fails or a row is corrupt.
    fn list_all(&self) -> Result<Vec<PredictionRecord>, Self::Error>;

    /// Number of stored records.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count(&self) -> Result<usize, Self::Error>;
}
