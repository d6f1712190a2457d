//! Service-layer error types

use edu2job_core::{CoreError, LoadError};
use edu2job_trainer::TrainError;
use thiserror::Error;

/// Errors surfaced by the application service layer
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No trained model is available yet
    #[error("no trained model is available; train the model first")]
    ModelUnavailable,

    /// A submitted value failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller does not own the referenced entity
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A retraining job is already in flight
    #[error("a retraining job is already running")]
    RetrainInProgress,

    /// Training or artifact publication failed
    #[error("training error: {0}")]
    Train(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ModelUnavailable => ServiceError::ModelUnavailable,
            CoreError::InvalidInput(msg) => ServiceError::InvalidInput(msg),
            CoreError::Load(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<LoadError> for ServiceError {
    fn from(err: LoadError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<TrainError> for ServiceError {
    fn from(err: TrainError) -> Self {
        match err {
            TrainError::AlreadyRunning => ServiceError::RetrainInProgress,
            other => ServiceError::Train(other.to_string()),
        }
    }
}
