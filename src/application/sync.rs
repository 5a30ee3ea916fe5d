//! Background sync dispatcher.
//!
//! Stored predictions are handed to a worker thread through a channel, so the
//! caller never waits on the remote collaborator. Failures are logged by the
//! worker and never reach the caller.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::domain::SyncPayload;
use crate::ports::{SyncError, SyncGateway};

/// Fire-and-forget queue in front of a [`SyncGateway`].
pub struct SyncDispatcher {
    tx: Option<Sender<SyncPayload>>,
    handle: Option<JoinHandle<()>>,
}

impl SyncDispatcher {
    /// Spawn the worker thread for `gateway`.
    ///
    /// # Errors
    /// Returns `SyncError::Io` if the thread cannot be spawned.
    pub fn spawn<G>(gateway: Arc<G>) -> Result<Self, SyncError>
    where
        G: SyncGateway + ?Sized + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("pph-sync".to_string())
            .spawn(move || Self::run(gateway.as_ref(), rx))?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
        })
    }

    fn run<G>(gateway: &G, rx: Receiver<SyncPayload>)
    where
        G: SyncGateway + ?Sized,
    {
        tracing::debug!("Sync worker started");
        for payload in rx {
            match gateway.submit(&payload) {
                Ok(()) => tracing::info!("Prediction synced ({})", payload.result),
                Err(e) => tracing::warn!("Sync failed, not retried: {}", e),
            }
        }
        tracing::debug!("Sync worker stopped");
    }

    /// Queue a payload. Never blocks; a stopped worker is logged and ignored.
    pub fn dispatch(&self, payload: SyncPayload) {
        let sent = self
            .tx
            .as_ref()
            .map(|tx| tx.send(payload).is_ok())
            .unwrap_or(false);
        if !sent {
            tracing::warn!("{}", SyncError::WorkerStopped);
        }
    }

    /// Close the queue and wait for queued payloads to be submitted.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        drop(self.tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Sync worker panicked");
            }
        }
    }
}

impl Drop for SyncDispatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClinicalInputs, DeliveryMode, PredictionRecord, RiskLabel};
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
            Err(SyncError::Transport("offline".to_string()))
        }
    }

    fn payload(age: u32) -> SyncPayload {
        let record = PredictionRecord {
            id: i64::from(age),
            inputs: ClinicalInputs {
                age,
                parity: 0,
                delivery_mode: DeliveryMode::Vaginal,
                haemoglobin: 12.0,
                previous_pph: false,
                prolonged_labor: false,
            },
            label: RiskLabel::Low,
            score: None,
        };
        SyncPayload::at(&record, 0)
    }

    #[test]
    fn test_payloads_reach_gateway_in_order() {
        let gateway = Arc::new(RecordingGateway::default());
        let dispatcher = SyncDispatcher::spawn(Arc::clone(&gateway)).expect("Should spawn");

        dispatcher.dispatch(payload(21));
        dispatcher.dispatch(payload(22));
        dispatcher.shutdown();

        let seen = gateway.seen.lock().expect("lock");
        let ages: Vec<u32> = seen.iter().map(|p| p.age).collect();
        assert_eq!(ages, vec![21, 22]);
    }

    #[test]
    fn test_failing_gateway_does_not_reach_caller() {
        let dispatcher = SyncDispatcher::spawn(Arc::new(FailingGateway)).expect("Should spawn");
        dispatcher.dispatch(payload(30));
        dispatcher.shutdown();
    }

    #[test]
    fn test_dispatch_after_stop_is_ignored() {
        let mut dispatcher = SyncDispatcher::spawn(Arc::new(FailingGateway)).expect("Should spawn");
        dispatcher.stop();
        dispatcher.dispatch(payload(30));
    }
}
