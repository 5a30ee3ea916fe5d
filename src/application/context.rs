//! Application context: wires adapters to services from an [`AppConfig`].

use std::sync::Arc;

use crate::adapters::{ConfiguredScorer, ModelScorer, OutboxGateway, RuleBasedScorer, SqliteStore};
use crate::application::{ExportService, PredictionService, SyncDispatcher};
use crate::config::AppConfig;
use crate::ports::ScoringStrategy;
use crate::PphError;

/// Everything a command needs, built once per process.
pub struct AppContext {
    config: AppConfig,
    pub predictions: PredictionService<ConfiguredScorer, SqliteStore>,
    pub exports: ExportService<SqliteStore>,
}

impl AppContext {
    /// Open the store, load the scorer and start replication if configured.
    ///
    /// # Errors
    /// Returns `PphError::Persistence` if the database cannot be opened,
    /// `PphError::Model` if the model asset is unusable, or `PphError::Sync`
    /// if the sync worker cannot start.
    pub fn init(config: AppConfig) -> Result<Self, PphError> {
        tracing::info!("Opening prediction store at {:?}", config.db_path);
        let store = Arc::new(SqliteStore::open(&config.db_path)?);

        let scorer = match config.scoring {
            ScoringStrategy::Rules => ConfiguredScorer::Rules(RuleBasedScorer::new()),
            ScoringStrategy::Model => {
                tracing::info!("Loading model from {:?}", config.model_path);
                ConfiguredScorer::Model(ModelScorer::load(&config.model_path)?)
            }
        };
        tracing::info!("Scoring strategy: {}", config.scoring);

        let mut predictions = PredictionService::new(Arc::new(scorer), Arc::clone(&store));
        if let Some(outbox) = &config.sync_outbox {
            tracing::info!("Sync enabled, outbox {:?}", outbox);
            let gateway = Arc::new(OutboxGateway::new(outbox.clone()));
            predictions = predictions.with_sync(SyncDispatcher::spawn(gateway)?);
        }

        let exports = ExportService::new(store, config.export_dir.clone());

        Ok(Self {
            config,
            predictions,
            exports,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Flush pending replication and release resources.
    pub fn shutdown(self) {
        self.predictions.shutdown();
        tracing::info!("Shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RawInputs, RiskLabel};
    use crate::ports::RiskScorer;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn config(dir: &Path) -> AppConfig {
        AppConfig {
            db_path: dir.join("history.db"),
            export_dir: dir.join("exports"),
            ..AppConfig::default()
        }
    }

    fn raw() -> RawInputs {
        RawInputs {
            age: "30".to_string(),
            parity: "2".to_string(),
            mode: "1".to_string(),
            haemoglobin: "10".to_string(),
            previous_pph: "1".to_string(),
            prolonged_labor: "0".to_string(),
        }
    }

    #[test]
    fn test_rules_context_predicts_and_exports() {
        let temp = tempdir().expect("tempdir");
        let ctx = AppContext::init(config(temp.path())).expect("Should init");

        let record = ctx.predictions.predict_raw(&raw()).expect("Should predict");
        assert_eq!(record.label, RiskLabel::High);
        assert!(record.score.is_none());

        let csv = ctx.exports.export_csv().expect("Should export");
        assert!(csv.starts_with(temp.path().join("exports")));
        ctx.shutdown();
    }

    #[test]
    fn test_history_survives_restart() {
        let temp = tempdir().expect("tempdir");

        let ctx = AppContext::init(config(temp.path())).expect("Should init");
        ctx.predictions.predict_raw(&raw()).expect("Should predict");
        ctx.shutdown();

        let ctx = AppContext::init(config(temp.path())).expect("Should reopen");
        assert_eq!(ctx.predictions.history().expect("history").len(), 1);
        ctx.shutdown();
    }

    #[test]
    fn test_model_context_uses_bundled_model() {
        let temp = tempdir().expect("tempdir");
        let config = AppConfig {
            scoring: ScoringStrategy::Model,
            model_path: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models/pph_model.json"),
            ..config(temp.path())
        };
        let ctx = AppContext::init(config).expect("Should init");

        assert_eq!(ctx.predictions.scorer().strategy(), ScoringStrategy::Model);
        let record = ctx.predictions.predict_raw(&raw()).expect("Should predict");
        assert_eq!(record.label, RiskLabel::High);
        assert!(record.score.is_some());
        ctx.shutdown();
    }

    #[test]
    fn test_missing_model_fails_init() {
        let temp = tempdir().expect("tempdir");
        let config = AppConfig {
            scoring: ScoringStrategy::Model,
            model_path: temp.path().join("absent.json"),
            ..config(temp.path())
        };

        let err = AppContext::init(config).err().expect("must fail");
        assert!(matches!(err, PphError::Model(_)));
    }

    #[test]
    fn test_outbox_receives_prediction() {
        let temp = tempdir().expect("tempdir");
        let outbox = temp.path().join("outbox.jsonl");
        let config = AppConfig {
            sync_outbox: Some(outbox.clone()),
            ..config(temp.path())
        };

        let ctx = AppContext::init(config).expect("Should init");
        ctx.predictions.predict_raw(&raw()).expect("Should predict");
        ctx.shutdown();

        let content = std::fs::read_to_string(outbox).expect("read outbox");
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"previousPPH\":1"));
    }
}
