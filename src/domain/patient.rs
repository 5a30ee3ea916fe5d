//! Clinical inputs for postpartum-haemorrhage risk prediction.
//!
//! Six factors are collected per patient. They are entered as text, parsed and
//! validated here, and only then handed to a scorer.

use serde::{Deserialize, Serialize};

/// Number of features fed to a scorer.
pub const FEATURE_COUNT: usize = 6;

/// Feature names in the fixed order used by every scorer and model asset.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "parity",
    "mode",
    "haemoglobin",
    "previous_pph",
    "prolonged_labor",
];

/// Errors raised while turning user input into [`ClinicalInputs`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} {value} out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("delivery mode must be 0 (vaginal) or 1 (cesarean), got {0}")]
    InvalidDeliveryMode(i64),

    #[error("{field} must be a finite value")]
    NonFinite { field: &'static str },

    #[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Mode of delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryMode {
    Vaginal,
    Cesarean,
}

impl DeliveryMode {
    /// Numeric code used by the scorers, the store and the exports.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Vaginal => 0,
            Self::Cesarean => 1,
        }
    }

    /// Decode a stored or entered mode.
    ///
    /// # Errors
    /// Returns `InvalidDeliveryMode` for anything but 0 or 1.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            0 => Ok(Self::Vaginal),
            1 => Ok(Self::Cesarean),
            other => Err(ValidationError::InvalidDeliveryMode(other)),
        }
    }
}

impl std::fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vaginal => write!(f, "Vaginal"),
            Self::Cesarean => write!(f, "C/S"),
        }
    }
}

/// Raw form input, one string per field, exactly as typed.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub age: String,
    pub parity: String,
    pub mode: String,
    pub haemoglobin: String,
    pub previous_pph: String,
    pub prolonged_labor: String,
}

/// Validated clinical risk factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInputs {
    /// Age in years
    pub age: u32,

    /// Number of prior births
    pub parity: u32,

    pub delivery_mode: DeliveryMode,

    /// Haemoglobin in g/dL
    pub haemoglobin: f64,

    /// History of PPH in an earlier delivery
    pub previous_pph: bool,

    pub prolonged_labor: bool,
}

impl ClinicalInputs {
    /// Parse and validate raw form input.
    ///
    /// Every field is checked; all problems are reported together.
    ///
    /// # Errors
    /// Returns a single `ValidationError` when one field fails, or
    /// `ValidationError::Multiple` when several do.
    pub fn parse(raw: &RawInputs) -> Result<Self, ValidationError> {
        let mut errors = Vec::new();

        let age = collect(&mut errors, parse_int("age", &raw.age).and_then(|v| {
            if v >= 1 && v <= i64::from(u32::MAX) {
                Ok(v as u32)
            } else {
                Err(out_of_range("age", v, "must be at least 1"))
            }
        }));
        let parity = collect(&mut errors, parse_int("parity", &raw.parity).and_then(|v| {
            if v >= 0 && v <= i64::from(u32::MAX) {
                Ok(v as u32)
            } else {
                Err(out_of_range("parity", v, "must be 0 or more"))
            }
        }));
        let delivery_mode = collect(
            &mut errors,
            parse_int("mode", &raw.mode).and_then(DeliveryMode::from_code),
        );
        let haemoglobin = collect(&mut errors, parse_haemoglobin(&raw.haemoglobin));
        let previous_pph = collect(&mut errors, parse_flag("previous_pph", &raw.previous_pph));
        let prolonged_labor =
            collect(&mut errors, parse_flag("prolonged_labor", &raw.prolonged_labor));

        match (age, parity, delivery_mode, haemoglobin, previous_pph, prolonged_labor) {
            (Some(age), Some(parity), Some(delivery_mode), Some(haemoglobin), Some(previous_pph), Some(prolonged_labor))
                if errors.is_empty() =>
            {
                Ok(Self {
                    age,
                    parity,
                    delivery_mode,
                    haemoglobin,
                    previous_pph,
                    prolonged_labor,
                })
            }
            _ if errors.len() == 1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// Feature vector in the fixed model order.
    #[must_use]
    pub fn to_features(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.age),
            f64::from(self.parity),
            f64::from(self.delivery_mode.code()),
            self.haemoglobin,
            f64::from(u8::from(self.previous_pph)),
            f64::from(u8::from(self.prolonged_labor)),
        ]
    }

    /// Check the precondition every scorer relies on.
    ///
    /// # Errors
    /// Returns `NonFinite` when haemoglobin is NaN or infinite.
    pub fn ensure_finite(&self) -> Result<(), ValidationError> {
        if self.haemoglobin.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NonFinite {
                field: "haemoglobin",
            })
        }
    }
}

fn collect<T>(errors: &mut Vec<ValidationError>, result: Result<T, ValidationError>) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

fn out_of_range(field: &'static str, value: impl ToString, expected: &'static str) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        value: value.to_string(),
        expected,
    }
}

fn non_empty<'a>(field: &'static str, text: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Missing(field))
    } else {
        Ok(trimmed)
    }
}

fn parse_int(field: &'static str, text: &str) -> Result<i64, ValidationError> {
    let trimmed = non_empty(field, text)?;
    trimmed.parse::<i64>().map_err(|_| ValidationError::NotANumber {
        field,
        value: trimmed.to_string(),
    })
}

fn parse_flag(field: &'static str, text: &str) -> Result<bool, ValidationError> {
    match parse_int(field, text)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(out_of_range(field, other, "must be 0 or 1")),
    }
}

fn parse_haemoglobin(text: &str) -> Result<f64, ValidationError> {
    let field = "haemoglobin";
    let trimmed = non_empty(field, text)?;
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ValidationError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(out_of_range(field, value, "must be greater than 0"));
    }
    Ok(value)
}
