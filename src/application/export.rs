//! Export service: writes the prediction history to disk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::export::{to_csv, to_pdf};
use crate::adapters::{ExportError, PersistenceError};
use crate::domain::PredictionRecord;
use crate::ports::PredictionStore;
use crate::PphError;

pub const CSV_FILE_NAME: &str = "predictions.csv";
pub const PDF_FILE_NAME: &str = "predictions.pdf";

/// Renders the stored history as CSV or PDF into an export directory.
pub struct ExportService<S: PredictionStore> {
    store: Arc<S>,
    export_dir: PathBuf,
}

impl<S> ExportService<S>
where
    S: PredictionStore,
    S::Error: Into<PersistenceError>,
{
    pub fn new(store: Arc<S>, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            export_dir: export_dir.into(),
        }
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Write `predictions.csv` and return its path.
    ///
    /// # Errors
    /// Returns `PphError::Persistence` if the history cannot be read, or
    /// `PphError::Export` if the file cannot be written.
    pub fn export_csv(&self) -> Result<PathBuf, PphError> {
        let records = self.records()?;
        let path = self.write(CSV_FILE_NAME, to_csv(&records).as_bytes())?;
        tracing::info!("Exported {} predictions as CSV", records.len());
        Ok(path)
    }

    /// Write `predictions.pdf` and return its path.
    ///
    /// # Errors
    /// Returns `PphError::Persistence` if the history cannot be read, or
    /// `PphError::Export` if rendering or writing fails.
    pub fn export_pdf(&self) -> Result<PathBuf, PphError> {
        let records = self.records()?;
        let bytes = to_pdf(&records)?;
        let path = self.write(PDF_FILE_NAME, &bytes)?;
        tracing::info!("Exported {} predictions as PDF", records.len());
        Ok(path)
    }

    fn records(&self) -> Result<Vec<PredictionRecord>, PphError> {
        self.store
            .list_all()
            .map_err(|e| PphError::Persistence(e.into()))
    }

    fn write(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.export_dir).map_err(|source| ExportError::Io {
            path: self.export_dir.clone(),
            source,
        })?;

        let path = self.export_dir.join(file_name);
        fs::write(&path, content).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}
