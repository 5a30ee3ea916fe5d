//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod context;
mod export;
mod prediction;
mod sync;

pub use context::AppContext;
pub use export::{ExportService, CSV_FILE_NAME, PDF_FILE_NAME};
pub use prediction::PredictionService;
pub use sync::SyncDispatcher;
