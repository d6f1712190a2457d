//! Pipeline core for the edu2job career-guidance system
//!
//! Provides the deterministic transformation from a raw, partially-untrusted
//! user profile to a fixed-width numeric feature vector consistent with a
//! previously fitted encoding scheme, plus scoring and ranked result
//! formatting.
//!
//! Modules:
//! - `profile`: Raw profile records and lenient value coercion
//! - `bundle`: The fitted encoding schema, loaded/saved as a unit
//! - `encoder`: Profile -> canonical feature record (never fails)
//! - `model`: Multi-class boosted-tree classifier
//! - `store`: Atomically swappable holder of the active bundle
//! - `inference`: Ranked top-K prediction with confidence scores
//! - `errors`: Typed error taxonomy

pub mod bundle;
pub mod encoder;
pub mod errors;
pub mod inference;
pub mod model;
pub mod profile;
pub mod store;

pub use bundle::{Bundle, BundleMetadata, CategoryEncoder, FeatureSelector, FieldScaler, Scaler};
pub use encoder::{
    encode, filter_skills, reindex, snapshot, EducationSnapshot, FeatureRecord, SkillMatch,
    SKILL_STOP_WORDS,
};
pub use errors::{CoreError, LoadError};
pub use inference::{
    predict_with_bundle, InferenceEngine, PredictionResult, RankedRole, TOP_K, UNCERTAIN_ROLE,
};
pub use model::{CareerModel, Node, Tree};
pub use profile::Profile;
pub use store::ArtifactStore;

/// Crate version string for logs and reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
