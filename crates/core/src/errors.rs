//! Error taxonomy for the pipeline core

use thiserror::Error;

/// Failures while loading or validating an artifact bundle.
///
/// Loading is all-or-nothing: any of these rejects the whole bundle and
/// leaves the previously active one (if any) in effect.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A required artifact file is absent
    #[error("required artifact file missing: {name}")]
    MissingFile { name: String },

    /// An artifact file exists but does not parse
    #[error("artifact file {name} failed to parse: {source}")]
    Parse {
        name: String,
        source: serde_json::Error,
    },

    /// The artifact files parse but are mutually inconsistent
    #[error("invalid artifact bundle: {0}")]
    Invalid(String),

    /// I/O failure reading or writing artifact files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by the core pipeline
#[derive(Error, Debug)]
pub enum CoreError {
    /// No bundle has ever been loaded into the store
    #[error("no trained model is available; train the model first")]
    ModelUnavailable,

    /// A request field is structurally or policy invalid. Reserved for
    /// callers layering validation on top of the core API; the encoder
    /// itself substitutes malformed values instead of erring.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Bundle loading failed
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Convenience alias for core results
pub type Result<T> = std::result::Result<T, CoreError>;
