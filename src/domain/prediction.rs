//! Prediction result types.
//!
//! Represents the output of a risk scorer and the records kept in the local
//! history.

use serde::{Deserialize, Serialize};

use super::patient::ClinicalInputs;

/// Two-valued PPH risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLabel {
    High,
    Low,
}

impl RiskLabel {
    /// Exact label text, as stored and exported.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High Risk of PPH",
            Self::Low => "Low Risk of PPH",
        }
    }

    /// Read a label back from its stored text.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "High Risk of PPH" => Some(Self::High),
            "Low Risk of PPH" => Some(Self::Low),
            _ => None,
        }
    }

    /// Classify a value against an inclusive threshold.
    #[must_use]
    pub fn from_threshold(value: f64, threshold: f64) -> Self {
        if value >= threshold {
            Self::High
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub label: RiskLabel,

    /// Model probability in [0, 1]; `None` for the rule-based strategy
    pub score: Option<f64>,
}

/// A scored prediction that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewPrediction {
    pub inputs: ClinicalInputs,
    pub assessment: Assessment,
}

impl NewPrediction {
    #[must_use]
    pub fn new(inputs: ClinicalInputs, assessment: Assessment) -> Self {
        Self { inputs, assessment }
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn into_record(self, id: i64) -> PredictionRecord {
        PredictionRecord {
            id,
            inputs: self.inputs,
            label: self.assessment.label,
            score: self.assessment.score,
        }
    }
}

/// A stored prediction. Immutable once the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: i64,
    pub inputs: ClinicalInputs,
    pub label: RiskLabel,
    pub score: Option<f64>,
}

impl PredictionRecord {
    /// Multi-line summary for the history listing.
    #[must_use]
    pub fn summary(&self) -> String {
        let i = &self.inputs;
        format!(
            "Age: {}, Parity: {}, Mode: {}\nHb: {}, Prev PPH: {}, Prolonged: {}\nResult: {}",
            i.age,
            i.parity,
            i.delivery_mode,
            i.haemoglobin,
            u8::from(i.previous_pph),
            u8::from(i.prolonged_labor),
            self.label
        )
    }
}
