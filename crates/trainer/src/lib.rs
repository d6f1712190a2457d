//! edu2job trainer - Offline dataset validation and model fitting
//!
//! Turns an uploaded CSV of labeled student profiles into a complete
//! artifact bundle: fitted encoders, scaler, skill vocabulary, canonical
//! feature names, UI metadata, and a multi-class boosted-tree model.
//! Fitting is deterministic for a given dataset, and publication replaces
//! the live artifact directory atomically with a timestamped backup of
//! the previous snapshot.

pub mod cart;
pub mod dataset;
pub mod errors;
pub mod fit;
pub mod publish;

use edu2job_core::Bundle;
use std::path::Path;

pub use cart::{CartBuilder, TreeConfig};
pub use dataset::{Dataset, TrainingRow, REQUIRED_COLUMNS};
pub use errors::TrainError;
pub use fit::{fit, TrainConfig, TrainReport};
pub use publish::{publish_bundle, BACKUPS_DIR};

/// Fit a complete bundle directly from a CSV dataset file.
pub fn train_bundle_from_csv(
    path: &Path,
    config: &TrainConfig,
) -> Result<(Bundle, TrainReport), TrainError> {
    let dataset = Dataset::from_csv(path)?;
    fit(&dataset, config)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
