//! Model scorer: Implementation of RiskScorer backed by a pre-trained classifier.
//!
//! The classifier is a logistic model exported as JSON next to the binary
//! (`models/pph_model.json` by default). It is loaded once at startup.
//!
//! # Integrity
//!
//! A sidecar file `<model>.sha256` holding the hex SHA-256 of the model file is
//! checked when present. Release builds refuse to load a model without one; debug
//! builds log a warning and continue.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{
    Assessment, ClinicalInputs, RiskLabel, ValidationError, FEATURE_COUNT, FEATURE_NAMES,
};
use crate::ports::{RiskScorer, ScoringStrategy};

/// Probabilities at or above this value are high risk.
pub const MODEL_THRESHOLD: f64 = 0.5;

/// Only supported asset layout.
const FORMAT_VERSION: u32 = 1;

/// Errors raised while loading a model asset.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model asset not readable at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model asset is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Unsupported model format version {0}")]
    UnsupportedVersion(u32),

    #[error("Model features {found:?} do not match expected order {expected:?}")]
    FeatureMismatch {
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Model parameter {name} has {found} values, expected {FEATURE_COUNT}")]
    ParameterLength { name: &'static str, found: usize },

    #[error("Model parameter {0} is not usable (non-finite or non-positive scale)")]
    InvalidParameter(&'static str),

    #[error("Model digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch { expected: String, computed: String },

    #[error("Model digest required in release builds: {0:?} not found")]
    DigestMissing(PathBuf),
}

/// Logistic model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedModel {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub scaler_mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scaler_std: Option<Vec<f64>>,
}

impl ExportedModel {
    fn validate(&self) -> Result<(), ModelError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(self.format_version));
        }
        if self.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ModelError::FeatureMismatch {
                found: self.feature_names.clone(),
                expected: FEATURE_NAMES.iter().map(ToString::to_string).collect(),
            });
        }

        check_vector("coefficients", &self.coefficients)?;
        if !self.intercept.is_finite() {
            return Err(ModelError::InvalidParameter("intercept"));
        }
        if let Some(mean) = &self.scaler_mean {
            check_vector("scaler_mean", mean)?;
        }
        if let Some(std) = &self.scaler_std {
            check_vector("scaler_std", std)?;
            if std.iter().any(|s| *s <= 0.0) {
                return Err(ModelError::InvalidParameter("scaler_std"));
            }
        }
        Ok(())
    }
}

fn check_vector(name: &'static str, values: &[f64]) -> Result<(), ModelError> {
    if values.len() != FEATURE_COUNT {
        return Err(ModelError::ParameterLength {
            name,
            found: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidParameter(name));
    }
    Ok(())
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn digest_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Check the model bytes against the sidecar digest, if any.
fn verify_digest(model_path: &Path, content: &[u8]) -> Result<(), ModelError> {
    let sidecar = digest_path(model_path);
    if !sidecar.exists() {
        if cfg!(debug_assertions) {
            tracing::warn!(
                "Loading model without digest ({:?} not found). Release builds refuse this.",
                sidecar
            );
            return Ok(());
        }
        return Err(ModelError::DigestMissing(sidecar));
    }

    let expected = std::fs::read_to_string(&sidecar).map_err(|source| ModelError::Io {
        path: sidecar.clone(),
        source,
    })?;
    // sha256sum format: "<hex>  <file name>"
    let expected = expected
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let computed = sha256_hex_bytes(content);

    if expected != computed {
        return Err(ModelError::DigestMismatch { expected, computed });
    }
    Ok(())
}

/// Logistic-model implementation of [`RiskScorer`].
#[derive(Debug, Clone)]
pub struct ModelScorer {
    model: ExportedModel,
}

impl ModelScorer {
    /// Load and check a model asset from disk.
    ///
    /// # Errors
    /// Returns `ModelError` if the file is missing, malformed, inconsistent with
    /// the fixed feature order, or fails its digest check.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        verify_digest(path, &content)?;

        let model: ExportedModel = serde_json::from_slice(&content)?;
        let scorer = Self::from_model(model)?;

        tracing::info!(
            "Loaded model from {:?} (format_version={}, n_features={})",
            path,
            scorer.model.format_version,
            scorer.model.feature_names.len()
        );
        Ok(scorer)
    }

    /// Wrap already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError` if the parameters are inconsistent.
    pub fn from_model(model: ExportedModel) -> Result<Self, ModelError> {
        model.validate()?;
        Ok(Self { model })
    }

    /// Probability of PPH for the given inputs, in [0, 1].
    #[must_use]
    pub fn probability(&self, inputs: &ClinicalInputs) -> f64 {
        let features = inputs.to_features();
        let m = &self.model;

        let logit = features
            .iter()
            .enumerate()
            .fold(m.intercept, |acc, (i, x)| {
                let mean = m.scaler_mean.as_ref().map_or(0.0, |v| v[i]);
                let std = m.scaler_std.as_ref().map_or(1.0, |v| v[i]);
                acc + m.coefficients[i] * (x - mean) / std
            });

        sigmoid(logit)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl RiskScorer for ModelScorer {
    fn strategy(&self) -> ScoringStrategy {
        ScoringStrategy::Model
    }

    fn score(&self, inputs: &ClinicalInputs) -> Result<Assessment, ValidationError> {
        inputs.ensure_finite()?;
        let probability = self.probability(inputs);
        tracing::debug!(probability, "model score computed");

        Ok(Assessment {
            label: RiskLabel::from_threshold(probability, MODEL_THRESHOLD),
            score: Some(probability),
        })
    }
}
