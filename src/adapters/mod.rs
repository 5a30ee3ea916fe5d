//! Adapters layer: Concrete implementations of ports.
//!
//! - `rules`: closed-form weighted-sum scorer
//! - `model`: logistic-model scorer loaded from a JSON asset
//! - `sqlite`: SQLite prediction store
//! - `export`: CSV and PDF renderers
//! - `outbox`: JSON-lines sync gateway
//! - `sanitize`: log filtering for clinical values and secrets

pub mod export;
pub mod model;
pub mod outbox;
pub mod rules;
pub mod sanitize;
pub mod sqlite;

pub use export::ExportError;
pub use model::{ModelError, ModelScorer};
pub use outbox::OutboxGateway;
pub use rules::RuleBasedScorer;
pub use sqlite::{PersistenceError, SqliteStore};

use crate::domain::{Assessment, ClinicalInputs, ValidationError};
use crate::ports::{RiskScorer, ScoringStrategy};

/// The scorer chosen by configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredScorer {
    Rules(RuleBasedScorer),
    Model(ModelScorer),
}

impl RiskScorer for ConfiguredScorer {
    fn strategy(&self) -> ScoringStrategy {
        match self {
            Self::Rules(s) => s.strategy(),
            Self::Model(s) => s.strategy(),
        }
    }

    fn score(&self, inputs: &ClinicalInputs) -> Result<Assessment, ValidationError> {
        match self {
            Self::Rules(s) => s.score(inputs),
            Self::Model(s) => s.score(inputs),
        }
    }
}
