//! Background retraining coordinator
//!
//! Runs one retraining job at a time: admission is a single atomic flag,
//! so concurrent triggers are rejected without disturbing the status of
//! the job already in flight. Training and publication happen on a
//! blocking thread; the live store is swapped only after both succeed,
//! so a failed run leaves the active bundle untouched.

use crate::errors::ServiceError;
use edu2job_core::ArtifactStore;
use edu2job_trainer::{publish_bundle, train_bundle_from_csv, TrainConfig, TrainError};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Observable lifecycle of the retraining pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum RetrainStatus {
    /// No job has run yet
    Idle,
    /// A job is in flight
    Running,
    /// The last job published a new bundle
    Completed { fingerprint: String },
    /// The last job failed; the previous bundle is still active
    Failed { error: String },
}

/// Serializes retraining jobs and publishes their status
pub struct RetrainingCoordinator {
    store: Arc<ArtifactStore>,
    artifact_dir: PathBuf,
    config: TrainConfig,
    status_tx: watch::Sender<RetrainStatus>,
    running: AtomicBool,
}

impl RetrainingCoordinator {
    pub fn new(store: Arc<ArtifactStore>, artifact_dir: PathBuf, config: TrainConfig) -> Self {
        let (status_tx, _) = watch::channel(RetrainStatus::Idle);
        Self {
            store,
            artifact_dir,
            config,
            status_tx,
            running: AtomicBool::new(false),
        }
    }

    /// Current status of the pipeline
    pub fn status(&self) -> RetrainStatus {
        self.status_tx.borrow().clone()
    }

    /// Subscribe to status transitions
    pub fn subscribe(&self) -> watch::Receiver<RetrainStatus> {
        self.status_tx.subscribe()
    }

    /// Run one retraining job to completion.
    ///
    /// Rejects with [`ServiceError::RetrainInProgress`] if a job is already
    /// in flight, without touching that job's status. The job itself runs
    /// on a supervised task that owns all bookkeeping (store swap, status
    /// transition, admission flag reset), so a caller whose future is
    /// dropped mid-await cannot leave the coordinator stuck at Running; the
    /// orphaned job still completes and publishes.
    pub async fn run(self: &Arc<Self>, dataset_path: PathBuf) -> Result<String, ServiceError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TrainError::AlreadyRunning.into());
        }

        self.status_tx.send_replace(RetrainStatus::Running);
        info!("retraining started from {}", dataset_path.display());

        let coordinator = Arc::clone(self);
        let job = tokio::spawn(async move { coordinator.execute(dataset_path).await });
        job.await
            .map_err(|e| ServiceError::Internal(format!("retraining task failed: {e}")))?
    }

    /// The job body; runs on the supervised task, never on the caller
    async fn execute(&self, dataset_path: PathBuf) -> Result<String, ServiceError> {
        let config = self.config.clone();
        let artifact_dir = self.artifact_dir.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let (bundle, report) = train_bundle_from_csv(&dataset_path, &config)?;
            let fingerprint = publish_bundle(&bundle, &artifact_dir)?;
            Ok::<_, ServiceError>((bundle, report, fingerprint))
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("retraining task panicked: {e}")))
        .and_then(|r| r);

        let result = match outcome {
            Ok((bundle, report, fingerprint)) => {
                self.store.swap(bundle);
                info!(
                    fingerprint = %fingerprint,
                    samples = report.samples,
                    classes = report.classes,
                    training_accuracy = report.training_accuracy,
                    "retraining completed"
                );
                self.status_tx.send_replace(RetrainStatus::Completed {
                    fingerprint: fingerprint.clone(),
                });
                Ok(fingerprint)
            }
            Err(err) => {
                error!("retraining failed: {err}");
                self.status_tx.send_replace(RetrainStatus::Failed {
                    error: err.to_string(),
                });
                Err(err)
            }
        };

        self.running.store(false, Ordering::Release);
        result
    }

    /// Launch a retraining job in the background
    pub fn spawn(self: &Arc<Self>, dataset_path: PathBuf) -> JoinHandle<Result<String, ServiceError>> {
        let coordinator = Arc::clone(self);
        tokio::spawn(async move { coordinator.run(dataset_path).await })
    }
}
