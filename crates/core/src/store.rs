//! Artifact store: the single point of synchronization between serving
//! and training
//!
//! Holds the currently active bundle behind an atomically swappable
//! reference. Readers clone the `Arc` and keep using their bundle even if a
//! swap happens mid-request; the swap itself is a single pointer
//! replacement under a short write lock.

use crate::bundle::Bundle;
use crate::errors::{CoreError, LoadError};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Holds the latest successfully loaded bundle
#[derive(Debug, Default)]
pub struct ArtifactStore {
    current: RwLock<Option<Arc<Bundle>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest successfully loaded bundle.
    ///
    /// Fails with [`CoreError::ModelUnavailable`] if no bundle has ever
    /// loaded; dependent operations surface this instead of crashing.
    pub fn current(&self) -> Result<Arc<Bundle>, CoreError> {
        self.current
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(CoreError::ModelUnavailable)
    }

    /// Whether any bundle has ever been loaded
    pub fn is_loaded(&self) -> bool {
        self.current
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Atomically replace the active bundle. In-flight holders of the old
    /// `Arc` finish unaffected.
    pub fn swap(&self, bundle: Bundle) -> Arc<Bundle> {
        let bundle = Arc::new(bundle);
        match self.current.write() {
            Ok(mut guard) => {
                let previous = guard.replace(Arc::clone(&bundle));
                info!(
                    new = %bundle.fingerprint(),
                    old = previous.as_deref().map(Bundle::fingerprint).unwrap_or("none"),
                    "artifact bundle swapped"
                );
            }
            Err(_) => warn!("artifact store lock poisoned; swap skipped"),
        }
        bundle
    }

    /// Load a bundle directory and swap it in. On failure the previously
    /// active bundle (if any) remains in effect.
    pub fn reload(&self, dir: &Path) -> Result<Arc<Bundle>, LoadError> {
        let bundle = Bundle::load(dir)?;
        Ok(self.swap(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::test_fixtures::fitted_bundle;
    use crate::bundle::SCALER_FILE;

    #[test]
    fn current_fails_until_first_load() {
        let store = ArtifactStore::new();
        assert!(!store.is_loaded());
        assert!(matches!(store.current(), Err(CoreError::ModelUnavailable)));
    }

    #[test]
    fn swap_publishes_and_old_reference_survives() {
        let store = ArtifactStore::new();
        let first = store.swap(fitted_bundle());
        let held = store.current().unwrap();
        assert_eq!(held.fingerprint(), first.fingerprint());

        // Swap in a new bundle while `held` is still in flight
        let mut next = fitted_bundle();
        next.model.biases[0] += 1.0;
        let second = store.swap(
            crate::bundle::Bundle::new(
                next.model.clone(),
                next.encoders.clone(),
                next.scaler.clone(),
                next.skills_vocabulary.clone(),
                next.feature_names.clone(),
                None,
                None,
            )
            .unwrap(),
        );

        assert_ne!(second.fingerprint(), first.fingerprint());
        assert_eq!(store.current().unwrap().fingerprint(), second.fingerprint());
        // The old reference is still fully usable
        assert_eq!(held.fingerprint(), first.fingerprint());
        assert!(!held.canonical_columns().is_empty());
    }

    #[test]
    fn failed_reload_leaves_prior_bundle_active() {
        let dir = tempfile::tempdir().unwrap();
        fitted_bundle().save(dir.path()).unwrap();

        let store = ArtifactStore::new();
        let active = store.reload(dir.path()).unwrap();

        // Corrupt the directory and try again
        std::fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        assert!(store.reload(dir.path()).is_err());
        assert_eq!(store.current().unwrap().fingerprint(), active.fingerprint());
    }
}
