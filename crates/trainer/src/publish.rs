//! Atomic artifact publication
//!
//! Writes a fitted bundle into the live artifact directory without ever
//! exposing a partially-written snapshot: the bundle is staged into a
//! sibling directory first, the previous snapshot is backed up, and the
//! staging directory is renamed into place.

use crate::errors::TrainError;
use chrono::Local;
use edu2job_core::Bundle;
use std::path::Path;
use tracing::{info, warn};

/// Name of the backup directory kept next to the artifact directory
pub const BACKUPS_DIR: &str = "backups";

/// Publish a fitted bundle into `artifact_dir`, returning its fingerprint.
///
/// The previous snapshot (if any) is copied to
/// `<parent>/backups/<YYYYmmdd_HHMMSS>` before being replaced. Backup
/// failures are logged and do not block publication.
pub fn publish_bundle(bundle: &Bundle, artifact_dir: &Path) -> Result<String, TrainError> {
    let staging = staging_path(artifact_dir);
    if staging.exists() {
        std::fs::remove_dir_all(&staging)?;
    }
    bundle
        .save(&staging)
        .map_err(|e| TrainError::Publish(e.to_string()))?;

    if artifact_dir.exists() {
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        if let Err(e) = backup_snapshot(artifact_dir, &stamp) {
            warn!("could not back up previous artifacts: {e}");
        }
        std::fs::remove_dir_all(artifact_dir)?;
    }
    std::fs::rename(&staging, artifact_dir)?;

    let fingerprint = bundle.fingerprint().to_string();
    info!(
        fingerprint = %fingerprint,
        "published artifact bundle to {}",
        artifact_dir.display()
    );
    Ok(fingerprint)
}

fn staging_path(artifact_dir: &Path) -> std::path::PathBuf {
    let mut name = artifact_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifacts".to_string());
    name.push_str(".staging");
    match artifact_dir.parent() {
        Some(parent) => parent.join(name),
        None => std::path::PathBuf::from(name),
    }
}

fn backup_snapshot(artifact_dir: &Path, stamp: &str) -> std::io::Result<()> {
    let parent = artifact_dir.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent.join(BACKUPS_DIR).join(stamp);
    std::fs::create_dir_all(&backup_dir)?;
    for entry in std::fs::read_dir(artifact_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::copy(entry.path(), backup_dir.join(entry.file_name()))?;
        }
    }
    info!("previous artifacts backed up to {}", backup_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::fit::{fit, TrainConfig};
    use edu2job_core::bundle::MODEL_FILE;

    fn tiny_bundle() -> Bundle {
        let csv = "\
degree,specialization,cgpa,graduation_year,skills,job_role
B.Tech,CS,8.0,2025,Python,Data Scientist
B.Tech,CS,7.0,2024,Java,Backend Developer
B.Sc,IT,6.5,2024,Python,Data Scientist
B.Sc,IT,7.5,2025,Java,Backend Developer
";
        let dataset = Dataset::from_csv_str(csv).unwrap();
        let config = TrainConfig {
            rounds: 3,
            max_depth: 2,
            min_samples_leaf: 1,
            learning_rate: 0.3,
        };
        fit(&dataset, &config).unwrap().0
    }

    #[test]
    fn publishes_into_a_fresh_directory() {
        let root = tempfile::tempdir().unwrap();
        let artifact_dir = root.path().join("artifacts");
        let bundle = tiny_bundle();

        let fingerprint = publish_bundle(&bundle, &artifact_dir).unwrap();
        assert_eq!(fingerprint, bundle.fingerprint());
        assert!(artifact_dir.join(MODEL_FILE).exists());
        assert!(!root.path().join("artifacts.staging").exists());

        let loaded = Bundle::load(&artifact_dir).unwrap();
        assert_eq!(loaded.fingerprint(), bundle.fingerprint());
    }

    #[test]
    fn replacing_a_snapshot_backs_up_the_old_one() {
        let root = tempfile::tempdir().unwrap();
        let artifact_dir = root.path().join("artifacts");
        let bundle = tiny_bundle();

        publish_bundle(&bundle, &artifact_dir).unwrap();
        publish_bundle(&bundle, &artifact_dir).unwrap();

        let backups = root.path().join(BACKUPS_DIR);
        let stamps: Vec<_> = std::fs::read_dir(&backups).unwrap().collect();
        assert_eq!(stamps.len(), 1);
        let stamp_dir = stamps[0].as_ref().unwrap().path();
        assert!(stamp_dir.join(MODEL_FILE).exists());
    }

    #[test]
    fn replaced_directory_still_loads() {
        let root = tempfile::tempdir().unwrap();
        let artifact_dir = root.path().join("artifacts");
        let bundle = tiny_bundle();

        publish_bundle(&bundle, &artifact_dir).unwrap();
        publish_bundle(&bundle, &artifact_dir).unwrap();

        let loaded = Bundle::load(&artifact_dir).unwrap();
        assert_eq!(loaded.fingerprint(), bundle.fingerprint());
    }
}
