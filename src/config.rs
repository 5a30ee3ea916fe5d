//! Process-wide configuration.
//!
//! Resolved once at startup from `PPH_*` environment variables; the binary
//! then applies command-line overrides before handing it to
//! [`crate::application::AppContext::init`].

use std::path::PathBuf;

use crate::adapters::sqlite::DEFAULT_DB_FILE;
use crate::ports::ScoringStrategy;
use crate::PphError;

pub const DEFAULT_MODEL_PATH: &str = "models/pph_model.json";
pub const DEFAULT_EXPORT_DIR: &str = "exports";
pub const DEFAULT_LOG_FILE: &str = "pph_predictor.log";

/// Where formatted log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Stderr,
    File,
}

impl std::str::FromStr for LogMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            other => Err(format!("unknown log mode {other:?} (expected stderr or file)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub scoring: ScoringStrategy,
    pub model_path: PathBuf,
    pub export_dir: PathBuf,
    /// Outbox file for replication; `None` disables sync.
    pub sync_outbox: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            scoring: ScoringStrategy::default(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            sync_outbox: None,
            log_mode: LogMode::default(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read the process environment.
    ///
    /// # Errors
    /// Returns `PphError::Config` if `PPH_SCORING` or `PPH_LOG_MODE` hold an
    /// unknown value.
    pub fn from_env() -> Result<Self, PphError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    ///
    /// # Errors
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PphError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let scoring = match get("PPH_SCORING") {
            Some(v) => v.parse().map_err(PphError::Config)?,
            None => defaults.scoring,
        };
        let log_mode = match get("PPH_LOG_MODE") {
            Some(v) => v.parse().map_err(PphError::Config)?,
            None => defaults.log_mode,
        };

        Ok(Self {
            db_path: get("PPH_DB_PATH").map_or(defaults.db_path, PathBuf::from),
            scoring,
            model_path: get("PPH_MODEL_PATH").map_or(defaults.model_path, PathBuf::from),
            export_dir: get("PPH_EXPORT_DIR").map_or(defaults.export_dir, PathBuf::from),
            sync_outbox: get("PPH_SYNC_OUTBOX").map(PathBuf::from),
            log_mode,
            log_file: get("PPH_LOG_FILE").map_or(defaults.log_file, PathBuf::from),
        })
    }
}
