//! Domain layer: Core business types and logic.
//!
//! Plain data types with validation; no storage, file or network access.

mod patient;
mod prediction;
mod sync;

pub use patient::{
    ClinicalInputs, DeliveryMode, RawInputs, ValidationError, FEATURE_COUNT, FEATURE_NAMES,
};
pub use prediction::{Assessment, NewPrediction, PredictionRecord, RiskLabel};
pub use sync::SyncPayload;
