//! Export adapters: CSV and PDF renderings of the prediction history.
//!
//! Both renderers are pure functions over a record slice; writing the result to
//! disk is left to [`crate::application::ExportService`].

use std::path::PathBuf;

pub mod csv;
pub mod pdf;

pub use self::csv::{to_csv, CSV_HEADER};
pub use self::pdf::{paginate, to_pdf, PdfLayout, PdfLine, PdfPage};

/// Error type for export operations.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot write export to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}
