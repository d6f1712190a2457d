//! edu2job service layer
//!
//! Application-facing coordination around the prediction pipeline:
//! - `service`: profile validation, cached snapshots, prediction, history
//! - `storage`: async persistence seams with in-memory implementations
//! - `retrain`: single-flight background retraining with status reporting
//! - `errors`: service error taxonomy

pub mod errors;
pub mod retrain;
pub mod service;
pub mod storage;

pub use errors::ServiceError;
pub use retrain::{RetrainStatus, RetrainingCoordinator};
pub use service::{validate_profile, CareerService};
pub use storage::{
    HistoryRecord, HistoryStore, InMemoryHistoryStore, InMemoryProfileStore, ProfileStore,
    StoredProfile,
};

/// Crate version string for logs and reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
