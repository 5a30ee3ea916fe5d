//! # PPH Predictor
//!
//! Postpartum haemorrhage risk screening from six clinical inputs.
//!
//! This crate provides:
//! - Validation of raw form input into typed clinical factors
//! - Two interchangeable risk scorers (fixed rules, logistic model)
//! - A local SQLite history of every prediction
//! - CSV and PDF export of the history
//! - Fire-and-forget replication of each stored prediction
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (ClinicalInputs, RiskLabel, PredictionRecord)
//! - `ports`: Trait definitions for scoring, storage and sync
//! - `adapters`: Concrete implementations (rules, model, SQLite, export, outbox)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Process-wide settings resolved from the environment

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use config::AppConfig;
pub use domain::{ClinicalInputs, PredictionRecord, RiskLabel};

/// Result type for PPH predictor operations
pub type Result<T> = std::result::Result<T, PphError>;

/// Main error type for the PPH predictor
#[derive(Debug, thiserror::Error)]
pub enum PphError {
    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Storage operation failed: {0}")]
    Persistence(#[from] adapters::PersistenceError),

    #[error("Export failed: {0}")]
    Export(#[from] adapters::ExportError),

    #[error("Model not loaded: {0}")]
    Model(#[from] adapters::ModelError),

    #[error("Sync unavailable: {0}")]
    Sync(#[from] ports::SyncError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
