//! Error types for the offline trainer

use thiserror::Error;

/// Errors raised while validating a dataset or fitting a new bundle.
///
/// None of these ever corrupt a live bundle: publication and store swap
/// only happen after fitting succeeds end to end.
#[derive(Error, Debug)]
pub enum TrainError {
    /// The uploaded dataset lacks required columns
    #[error("dataset is missing required columns: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// The dataset parsed but contains no usable rows
    #[error("dataset is empty")]
    EmptyDataset,

    /// The dataset file is structurally unusable
    #[error("dataset error: {0}")]
    Dataset(String),

    /// The fitting procedure itself failed
    #[error("training failed: {0}")]
    Fit(String),

    /// The fitted artifact set could not be written/published
    #[error("artifact publication failed: {0}")]
    Publish(String),

    /// A retraining job is already in flight
    #[error("a retraining job is already running")]
    AlreadyRunning,

    /// I/O failure reading the dataset
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
