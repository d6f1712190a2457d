//! Inference engine: encoded profile -> ranked job-role predictions

use crate::bundle::Bundle;
use crate::encoder::{self, reindex};
use crate::errors::CoreError;
use crate::profile::Profile;
use crate::store::ArtifactStore;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// Maximum number of ranked roles returned per prediction
pub const TOP_K: usize = 3;

/// Sentinel role returned when the ranking comes back empty
pub const UNCERTAIN_ROLE: &str = "Uncertain";

/// One ranked job-role entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedRole {
    pub job_role: String,
    /// Confidence percentage in [0, 100], rounded to 1 decimal
    pub confidence: f64,
}

/// Ranked prediction for one profile against one bundle
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionResult {
    /// At most [`TOP_K`] entries, probability descending
    pub top_predictions: Vec<RankedRole>,
    /// Skills that matched the fitted vocabulary
    pub matched_skills: Vec<String>,
    /// Filtered skills outside the vocabulary, for user feedback
    pub unrecognized_skills: Vec<String>,
    /// Human-readable justification listing the matched skills
    pub justification: String,
}

/// Score a profile against a specific bundle.
///
/// Pure: persistence of the resulting history record is the caller's
/// responsibility. Encoding never fails, so neither does this given a
/// validated bundle.
pub fn predict_with_bundle(profile: &Profile, bundle: &Bundle) -> PredictionResult {
    let (record, skills) = encoder::encode(profile, bundle);
    // Guarantees the model always sees the exact width/order it was fitted
    // on, even if the record came from an older schema snapshot
    let canonical = reindex(&record, bundle.canonical_columns());
    let vector = canonical.to_vector(bundle.canonical_columns());

    let probs = bundle.model.predict_proba(&vector);
    let target = bundle.target_encoder();

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|&a, &b| {
        probs[b]
            .partial_cmp(&probs[a])
            .unwrap_or(Ordering::Equal)
            // Probability ties resolve by fitted index order
            .then_with(|| a.cmp(&b))
    });

    let mut top_predictions = Vec::with_capacity(TOP_K);
    for idx in order.into_iter().take(TOP_K) {
        let Some(label) = target.inverse(idx) else {
            continue;
        };
        top_predictions.push(RankedRole {
            job_role: presentation_label(label),
            confidence: round_confidence(probs[idx]),
        });
    }

    if top_predictions.is_empty() {
        top_predictions.push(RankedRole {
            job_role: UNCERTAIN_ROLE.to_string(),
            confidence: 0.0,
        });
    }

    let justification = format!("Based on your skills: {}", skills.matched.join(", "));
    PredictionResult {
        top_predictions,
        matched_skills: skills.matched,
        unrecognized_skills: skills.unrecognized,
        justification,
    }
}

/// Inference against whichever bundle the store currently holds
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    store: Arc<ArtifactStore>,
}

impl InferenceEngine {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Predict with the active bundle; fails fast with
    /// [`CoreError::ModelUnavailable`] if none has ever loaded
    pub fn predict(&self, profile: &Profile) -> Result<PredictionResult, CoreError> {
        let bundle = self.store.current()?;
        Ok(predict_with_bundle(profile, &bundle))
    }
}

/// Strip path-unsafe characters from a fitted label for presentation
fn presentation_label(label: &str) -> String {
    label.replace('/', " ")
}

/// Probability -> percentage with 1-decimal rounding
fn round_confidence(probability: f64) -> f64 {
    (probability * 1000.0).round() / 10.0
}
