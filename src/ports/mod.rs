//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and the scorers, the local store and the sync target.

mod scorer;
mod storage;
mod sync;

pub use scorer::{RiskScorer, ScoringStrategy};
pub use storage::PredictionStore;
pub use sync::{SyncError, SyncGateway};
