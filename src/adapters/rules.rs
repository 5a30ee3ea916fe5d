//! Rule-based scorer: closed-form weighted sum of the six inputs.

use crate::domain::{Assessment, ClinicalInputs, RiskLabel, ValidationError};
use crate::ports::{RiskScorer, ScoringStrategy};

const AGE_WEIGHT: f64 = 0.2;
const PARITY_WEIGHT: f64 = 0.3;
const CESAREAN_WEIGHT: f64 = 1.5;
const HAEMOGLOBIN_WEIGHT: f64 = -0.4;
const PREVIOUS_PPH_WEIGHT: f64 = 2.0;
const PROLONGED_LABOR_WEIGHT: f64 = 1.5;

/// Scores at or above this value are high risk.
pub const RULE_THRESHOLD: f64 = 5.0;

/// Weighted risk score for the given inputs.
#[must_use]
pub fn rule_risk_score(inputs: &ClinicalInputs) -> f64 {
    let [age, parity, mode, haemoglobin, previous_pph, prolonged_labor] = inputs.to_features();

    AGE_WEIGHT * age
        + PARITY_WEIGHT * parity
        + CESAREAN_WEIGHT * mode
        + HAEMOGLOBIN_WEIGHT * haemoglobin
        + PREVIOUS_PPH_WEIGHT * previous_pph
        + PROLONGED_LABOR_WEIGHT * prolonged_labor
}

/// Rule-based implementation of [`RiskScorer`]. Produces no probability.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedScorer;

impl RuleBasedScorer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl RiskScorer for RuleBasedScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Rules
    }

    fn score(&self, inputs: &ClinicalInputs) -> Result<Assessment, ValidationError> {
        inputs.ensure_finite()?;
        let risk_score = rule_risk_score(inputs);
        tracing::debug!(risk_score, "rule-based score computed");

        Ok(Assessment {
            label: RiskLabel::from_threshold(risk_score, RULE_THRESHOLD),
            score: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DeliveryMode;
    use proptest::prelude::*;

    fn inputs(
        age: u32,
        parity: u32,
        mode: DeliveryMode,
        haemoglobin: f64,
        previous_pph: bool,
        prolonged_labor: bool,
    ) -> ClinicalInputs {
        ClinicalInputs {
            age,
            parity,
            delivery_mode: mode,
            haemoglobin,
            previous_pph,
            prolonged_labor,
        }
    }

    #[test]
    fn test_high_risk_example() {
        let i = inputs(30, 2, DeliveryMode::Cesarean, 10.0, true, false);
        assert!((rule_risk_score(&i) - 6.1).abs() < 1e-9);

        let assessment = RuleBasedScorer::new().score(&i).expect("Should score");
        assert_eq!(assessment.label, RiskLabel::High);
        assert_eq!(assessment.label.as_str(), "High Risk of PPH");
        assert!(assessment.score.is_none());
    }

    #[test]
    fn test_low_risk_example() {
        let i = inputs(25, 1, DeliveryMode::Vaginal, 13.0, false, false);
        assert!((rule_risk_score(&i) - 0.1).abs() < 1e-9);

        let assessment = RuleBasedScorer::new().score(&i).expect("Should score");
        assert_eq!(assessment.label, RiskLabel::Low);
    }

    #[test]
    fn test_score_exactly_at_threshold_is_high() {
        // 0.2 * 30 - 0.4 * 2.5 == 5.0 exactly in f64
        let i = inputs(30, 0, DeliveryMode::Vaginal, 2.5, false, false);
        assert_eq!(rule_risk_score(&i), RULE_THRESHOLD);

        let assessment = RuleBasedScorer::new().score(&i).expect("Should score");
        assert_eq!(assessment.label, RiskLabel::High);
    }

    #[test]
    fn test_non_finite_haemoglobin_is_rejected() {
        let i = inputs(30, 0, DeliveryMode::Vaginal, f64::INFINITY, false, false);
        let err = RuleBasedScorer::new().score(&i).expect_err("must fail");
        assert_eq!(err, ValidationError::NonFinite { field: "haemoglobin" });
    }

    proptest! {
        /// Identical inputs always yield the identical label
        #[test]
        fn scoring_is_deterministic(
            age in 1u32..80,
            parity in 0u32..15,
            cesarean in any::<bool>(),
            haemoglobin in 3.0..20.0f64,
            previous_pph in any::<bool>(),
            prolonged_labor in any::<bool>(),
        ) {
            let mode = if cesarean { DeliveryMode::Cesarean } else { DeliveryMode::Vaginal };
            let i = inputs(age, parity, mode, haemoglobin, previous_pph, prolonged_labor);
            let scorer = RuleBasedScorer::new();

            let first = scorer.score(&i).expect("Should score");
            let second = scorer.score(&i).expect("Should score");
            prop_assert_eq!(first, second);
        }

        /// The label agrees with the weighted sum and the inclusive threshold
        #[test]
        fn label_matches_threshold(
            age in 1u32..80,
            parity in 0u32..15,
            haemoglobin in 3.0..20.0f64,
            previous_pph in any::<bool>(),
        ) {
            let i = inputs(age, parity, DeliveryMode::Vaginal, haemoglobin, previous_pph, false);
            let expected = if rule_risk_score(&i) >= RULE_THRESHOLD {
                RiskLabel::High
            } else {
                RiskLabel::Low
            };
            let assessment = RuleBasedScorer::new().score(&i).expect("Should score");
            prop_assert_eq!(assessment.label, expected);
        }
    }
}
