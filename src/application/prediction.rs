//! Prediction service: validate, score, persist, replicate.
//!
//! One call runs the whole pipeline for a single patient:
//! - Parse and validate raw input
//! - Classify with the configured scorer
//! - Persist the record and take the assigned id
//! - Hand the stored record to the sync dispatcher (if any)
//!
//! Nothing is stored when validation or scoring fails, and a sync failure never
//! affects the returned record.

use std::sync::Arc;

use crate::adapters::PersistenceError;
use crate::application::SyncDispatcher;
use crate::domain::{ClinicalInputs, NewPrediction, PredictionRecord, RawInputs, SyncPayload};
use crate::ports::{PredictionStore, RiskScorer};
use crate::PphError;

/// Service for scoring and recording predictions.
pub struct PredictionService<R, S>
where
    R: RiskScorer,
    S: PredictionStore,
{
    scorer: Arc<R>,
    store: Arc<S>,
    sync: Option<SyncDispatcher>,
}

impl<R, S> PredictionService<R, S>
where
    R: RiskScorer,
    S: PredictionStore,
    S::Error: Into<PersistenceError>,
{
    pub fn new(scorer: Arc<R>, store: Arc<S>) -> Self {
        Self {
            scorer,
            store,
            sync: None,
        }
    }

    /// Replicate every stored prediction through `dispatcher`.
    #[must_use]
    pub fn with_sync(mut self, dispatcher: SyncDispatcher) -> Self {
        self.sync = Some(dispatcher);
        self
    }

    pub fn scorer(&self) -> &R {
        &self.scorer
    }

    /// Validate raw form input, then run [`PredictionService::predict`].
    ///
    /// # Errors
    /// Returns `PphError::Validation` listing every invalid field, or any
    /// error from [`PredictionService::predict`].
    pub fn predict_raw(&self, raw: &RawInputs) -> Result<PredictionRecord, PphError> {
        let inputs = ClinicalInputs::parse(raw)?;
        self.predict(inputs)
    }

    /// Score and store one prediction.
    ///
    /// # Errors
    /// Returns `PphError::Validation` if the scorer rejects the inputs, or
    /// `PphError::Persistence` if the record cannot be stored.
    pub fn predict(&self, inputs: ClinicalInputs) -> Result<PredictionRecord, PphError> {
        tracing::debug!("Scoring with {} strategy", self.scorer.strategy());
        let assessment = self.scorer.score(&inputs)?;

        let prediction = NewPrediction::new(inputs, assessment);
        let id = self
            .store
            .insert(&prediction)
            .map_err(|e| PphError::Persistence(e.into()))?;
        let record = prediction.into_record(id);
        tracing::info!("Prediction {} stored ({})", id, record.label);

        if let Some(sync) = &self.sync {
            sync.dispatch(SyncPayload::from_record(&record));
        }

        Ok(record)
    }

    /// Every stored record, newest first.
    ///
    /// # Errors
    /// Returns `PphError::Persistence` if the history cannot be read.
    pub fn history(&self) -> Result<Vec<PredictionRecord>, PphError> {
        self.store
            .list_all()
            .map_err(|e| PphError::Persistence(e.into()))
    }

    /// Stop replication, waiting for queued payloads.
    pub fn shutdown(self) {
        if let Some(sync) = self.sync {
            sync.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{RuleBasedScorer, SqliteStore};
    use crate::domain::{DeliveryMode, RiskLabel, ValidationError};
    use crate::ports::{SyncError, SyncGateway};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingGateway {
        seen: Mutex<Vec<SyncPayload>>,
    }

    impl SyncGateway for RecordingGateway {
        fn submit(&self, payload: &SyncPayload) -> Result<(), SyncError> {
            self.seen.lock().expect("lock").push(payload.clone());
            Ok(())
        }
    }

    struct FailingGateway;

    impl SyncGateway for FailingGateway {
        fn submit(&self, _payload: &SyncPayload) -> Result<(), SyncError> {
            Err(SyncError::Transport("remote unreachable".to_string()))
        }
    }

    fn service() -> (PredictionService<RuleBasedScorer, SqliteStore>, Arc<SqliteStore>) {
        let store = Arc::new(SqliteStore::in_memory().expect("Should open store"));
        let service = PredictionService::new(Arc::new(RuleBasedScorer::new()), Arc::clone(&store));
        (service, store)
    }

    fn raw(age: &str, parity: &str, mode: &str, hb: &str, prev: &str, prolonged: &str) -> RawInputs {
        RawInputs {
            age: age.to_string(),
            parity: parity.to_string(),
            mode: mode.to_string(),
            haemoglobin: hb.to_string(),
            previous_pph: prev.to_string(),
            prolonged_labor: prolonged.to_string(),
        }
    }

    #[test]
    fn test_high_risk_patient_is_stored() {
        let (service, store) = service();

        let record = service
            .predict_raw(&raw("30", "2", "1", "10.0", "1", "0"))
            .expect("Should predict");

        assert_eq!(record.label, RiskLabel::High);
        assert_eq!(record.inputs.delivery_mode, DeliveryMode::Cesarean);
        assert_eq!(store.count().expect("count"), 1);
        assert_eq!(service.history().expect("history"), vec![record]);
    }

    #[test]
    fn test_history_is_newest_first() {
        let (service, _store) = service();

        let first = service
            .predict_raw(&raw("25", "1", "0", "13.0", "0", "0"))
            .expect("Should predict");
        let second = service
            .predict_raw(&raw("30", "2", "1", "10.0", "1", "0"))
            .expect("Should predict");

        assert!(second.id > first.id);
        let history = service.history().expect("history");
        assert_eq!(history, vec![second, first]);
    }

    #[test]
    fn test_invalid_input_stores_nothing() {
        let (service, store) = service();

        let err = service
            .predict_raw(&raw("", "1", "2", "abc", "0", "0"))
            .expect_err("must fail");

        match err {
            PphError::Validation(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.count().expect("count"), 0);
    }

    #[test]
    fn test_stored_prediction_is_replicated() {
        let (service, _store) = service();
        let gateway = Arc::new(RecordingGateway::default());
        let service = service
            .with_sync(SyncDispatcher::spawn(Arc::clone(&gateway)).expect("Should spawn"));

        let record = service
            .predict_raw(&raw("25", "1", "0", "13.0", "0", "1"))
            .expect("Should predict");
        service.shutdown();

        let seen = gateway.seen.lock().expect("lock");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].age, 25);
        assert_eq!(seen[0].prolonged_labor, 1);
        assert_eq!(seen[0].result, record.label.as_str());
    }

    #[test]
    fn test_sync_failure_keeps_local_record() {
        let (service, store) = service();
        let service = service
            .with_sync(SyncDispatcher::spawn(Arc::new(FailingGateway)).expect("Should spawn"));

        let record = service
            .predict_raw(&raw("25", "1", "0", "13.0", "0", "0"))
            .expect("sync failure must not surface");
        service.shutdown();

        assert_eq!(record.label, RiskLabel::Low);
        assert_eq!(store.count().expect("count"), 1);
    }
}
