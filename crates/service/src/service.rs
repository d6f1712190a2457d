//! Career service facade
//!
//! Coordinates profile persistence, cached encoded snapshots, prediction,
//! and prediction history around the shared artifact store. Snapshot
//! refresh is lazy: a stored snapshot carries the fingerprint of the
//! bundle it was encoded against, and is recomputed on read whenever the
//! active bundle's fingerprint differs.

use crate::errors::ServiceError;
use crate::storage::{HistoryRecord, HistoryStore, ProfileStore, StoredProfile};
use edu2job_core::profile::lenient_f64;
use edu2job_core::{snapshot, ArtifactStore, InferenceEngine, PredictionResult, Profile};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Policy bounds for submitted profile values
const CGPA_RANGE: (f64, f64) = (0.0, 10.0);
const GRADUATION_YEAR_RANGE: (f64, f64) = (2020.0, 2030.0);

/// Feedback ratings accepted from users
const FEEDBACK_RANGE: (i32, i32) = (1, 5);

/// Application-facing facade over the prediction pipeline
pub struct CareerService {
    store: Arc<ArtifactStore>,
    engine: InferenceEngine,
    profiles: Arc<dyn ProfileStore>,
    history: Arc<dyn HistoryStore>,
}

impl CareerService {
    pub fn new(
        store: Arc<ArtifactStore>,
        profiles: Arc<dyn ProfileStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let engine = InferenceEngine::new(Arc::clone(&store));
        Self {
            store,
            engine,
            profiles,
            history,
        }
    }

    /// The shared artifact store this service serves from
    pub fn artifact_store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Validate and persist a profile, caching its encoded snapshot when a
    /// bundle is active. Without a bundle the snapshot stays `None` and is
    /// filled in lazily on the first read after training.
    pub async fn update_profile(
        &self,
        user_id: &str,
        profile: Profile,
    ) -> Result<StoredProfile, ServiceError> {
        validate_profile(&profile)?;

        let education_processed = self
            .store
            .current()
            .ok()
            .map(|bundle| snapshot(&profile, &bundle));
        let stored = StoredProfile {
            user_id: user_id.to_string(),
            profile,
            education_processed,
        };
        self.profiles.upsert(stored.clone()).await?;
        debug!(user_id, "profile updated");
        Ok(stored)
    }

    /// Fetch a profile, refreshing its encoded snapshot if it was produced
    /// against a bundle other than the active one
    pub async fn get_profile(&self, user_id: &str) -> Result<StoredProfile, ServiceError> {
        let mut stored = self
            .profiles
            .get(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile for {user_id}")))?;

        if let Ok(bundle) = self.store.current() {
            let stale = stored
                .education_processed
                .as_ref()
                .map(|snap| snap.schema_fingerprint != bundle.fingerprint())
                .unwrap_or(true);
            if stale {
                info!(user_id, "re-encoding profile snapshot against active bundle");
                stored.education_processed = Some(snapshot(&stored.profile, &bundle));
                self.profiles.upsert(stored.clone()).await?;
            }
        }

        Ok(stored)
    }

    /// Predict for a stored profile and append the outcome to history
    pub async fn predict_for_user(
        &self,
        user_id: &str,
    ) -> Result<(HistoryRecord, PredictionResult), ServiceError> {
        let stored = self
            .profiles
            .get(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("profile for {user_id}")))?;

        let result = self.engine.predict(&stored.profile)?;
        let top = &result.top_predictions[0];
        let record = self
            .history
            .append(
                user_id,
                top.job_role.clone(),
                top.confidence,
                result.top_predictions.clone(),
            )
            .await?;
        info!(
            user_id,
            prediction = %record.prediction,
            confidence = record.confidence,
            "prediction recorded"
        );
        Ok((record, result))
    }

    /// Predict for an ad-hoc profile without touching storage
    pub fn predict(&self, profile: &Profile) -> Result<PredictionResult, ServiceError> {
        validate_profile(profile)?;
        Ok(self.engine.predict(profile)?)
    }

    /// A user's prediction history, newest first
    pub async fn history(&self, user_id: &str) -> Result<Vec<HistoryRecord>, ServiceError> {
        self.history.list(user_id).await
    }

    /// Attach a rating to one of the caller's own predictions
    pub async fn submit_feedback(
        &self,
        user_id: &str,
        record_id: u64,
        rating: i32,
    ) -> Result<(), ServiceError> {
        if rating < FEEDBACK_RANGE.0 || rating > FEEDBACK_RANGE.1 {
            return Err(ServiceError::InvalidInput(format!(
                "feedback rating must be between {} and {}",
                FEEDBACK_RANGE.0, FEEDBACK_RANGE.1
            )));
        }
        self.owned_record(user_id, record_id).await?;
        self.history.set_feedback(record_id, rating).await
    }

    /// Flag a prediction for review. Admin-scoped; role enforcement lives
    /// at the interface boundary, not here.
    pub async fn flag_prediction(&self, record_id: u64) -> Result<(), ServiceError> {
        self.history.set_flagged(record_id, true).await
    }

    async fn owned_record(&self, user_id: &str, record_id: u64) -> Result<(), ServiceError> {
        let record = self
            .history
            .get(record_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("history record {record_id}")))?;
        if record.user_id != user_id {
            return Err(ServiceError::Forbidden(format!(
                "history record {record_id} belongs to another user"
            )));
        }
        Ok(())
    }
}

/// Reject out-of-policy values up front. Values the encoder would merely
/// substitute (absent or unparseable) are allowed through; values that
/// parse but land outside the policy domain are not.
pub fn validate_profile(profile: &Profile) -> Result<(), ServiceError> {
    if profile.degree.trim().is_empty() {
        return Err(ServiceError::InvalidInput("degree must not be empty".into()));
    }
    check_range(&profile.cgpa, "cgpa", CGPA_RANGE)?;
    check_range(
        &profile.graduation_year,
        "graduation_year",
        GRADUATION_YEAR_RANGE,
    )?;
    Ok(())
}

fn check_range(value: &Value, field: &str, (lo, hi): (f64, f64)) -> Result<(), ServiceError> {
    if let Some(parsed) = lenient_f64(value) {
        if parsed < lo || parsed > hi {
            return Err(ServiceError::InvalidInput(format!(
                "{field} must be between {lo} and {hi}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_profile() -> Profile {
        Profile {
            degree: "B.Tech".into(),
            specialization: "Computer Science".into(),
            certifications: "None".into(),
            cgpa: json!(8.0),
            graduation_year: json!(2025),
            skills: vec!["Python".into()],
            internships: json!("yes"),
        }
    }

    #[test]
    fn accepts_a_valid_profile() {
        assert!(validate_profile(&valid_profile()).is_ok());
    }

    #[test]
    fn rejects_empty_degree() {
        let mut profile = valid_profile();
        profile.degree = "  ".into();
        assert!(matches!(
            validate_profile(&profile),
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_cgpa_and_year() {
        let mut profile = valid_profile();
        profile.cgpa = json!(11.5);
        assert!(validate_profile(&profile).is_err());

        let mut profile = valid_profile();
        profile.graduation_year = json!("2019");
        assert!(validate_profile(&profile).is_err());
    }

    #[test]
    fn unparseable_values_pass_validation() {
        // The encoder substitutes these; validation only polices values
        // that actually parse
        let mut profile = valid_profile();
        profile.cgpa = json!("not-a-number");
        profile.graduation_year = Value::Null;
        assert!(validate_profile(&profile).is_ok());
    }
}
