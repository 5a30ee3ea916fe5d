//! Scorer port: Trait for PPH risk classification.

use crate::domain::{Assessment, ClinicalInputs, ValidationError};

/// Which scoring strategy is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringStrategy {
    /// Fixed weighted sum of the six inputs
    #[default]
    Rules,
    /// Pre-trained classifier loaded from a model asset
    Model,
}

impl std::str::FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule" => Ok(Self::Rules),
            "model" => Ok(Self::Model),
            other => Err(format!("unknown scoring strategy {other:?} (expected rules or model)")),
        }
    }
}

impl std::fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rules => write!(f, "rules"),
            Self::Model => write!(f, "model"),
        }
    }
}

/// Trait for risk scoring.
///
/// Implementations are deterministic and side-effect free: the same inputs
/// always give the same assessment.
pub trait RiskScorer: Send + Sync {
    /// Strategy implemented by this scorer.
    fn strategy(&self) -> ScoringStrategy;

    /// Classify one set of clinical inputs.
    ///
    /// # Errors
    /// Returns `ValidationError::NonFinite` if an input is NaN or infinite.
    fn score(&self, inputs: &ClinicalInputs) -> Result<Assessment, ValidationError>;
}
