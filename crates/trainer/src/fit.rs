//! Fitting: dataset -> artifact bundle
//!
//! Fits every artifact from scratch (no incremental update): categorical
//! encoders over sorted unique values, a standard scaler for the numeric
//! fields, the skill vocabulary, the canonical feature-name list, the
//! multi-class boosted-tree model, and the derived UI metadata maps.

use crate::cart::{CartBuilder, TreeConfig};
use crate::dataset::{Dataset, NO_CERTIFICATION};
use crate::errors::TrainError;
use edu2job_core::encoder::{
    COL_CERTIFICATIONS, COL_CGPA, COL_DEGREE, COL_GRADUATION_YEAR, COL_INTERNSHIP,
    COL_SPECIALIZATION,
};
use edu2job_core::model::{softmax, CareerModel, Tree};
use edu2job_core::{Bundle, BundleMetadata, CategoryEncoder, FieldScaler, Scaler};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Training configuration
#[derive(Clone, Debug)]
pub struct TrainConfig {
    /// Boosting rounds; each round adds one tree per class
    pub rounds: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            rounds: 40,
            max_depth: 4,
            min_samples_leaf: 2,
            learning_rate: 0.1,
        }
    }
}

/// Summary of one completed fit
#[derive(Clone, Debug)]
pub struct TrainReport {
    pub samples: usize,
    pub classes: usize,
    pub features: usize,
    /// Accuracy of the fitted model on its own training data
    pub training_accuracy: f64,
}

/// Fit a complete artifact bundle from a cleaned dataset
pub fn fit(dataset: &Dataset, config: &TrainConfig) -> Result<(Bundle, TrainReport), TrainError> {
    if dataset.is_empty() {
        return Err(TrainError::EmptyDataset);
    }
    let rows = &dataset.rows;

    // Categorical encoders over sorted unique seen values
    let mut encoders = BTreeMap::new();
    encoders.insert(
        COL_DEGREE.to_string(),
        CategoryEncoder::new(rows.iter().map(|r| r.degree.clone()).collect()),
    );
    encoders.insert(
        COL_SPECIALIZATION.to_string(),
        CategoryEncoder::new(rows.iter().map(|r| r.specialization.clone()).collect()),
    );
    encoders.insert(
        COL_CERTIFICATIONS.to_string(),
        CategoryEncoder::new(rows.iter().map(|r| r.certifications.clone()).collect()),
    );
    let target = CategoryEncoder::new(rows.iter().map(|r| r.job_role.clone()).collect());
    encoders.insert("job_role".to_string(), target.clone());

    // Standard scaler for the numeric fields
    let mut scaler_fields = BTreeMap::new();
    scaler_fields.insert(
        COL_CGPA.to_string(),
        standardizer(rows.iter().map(|r| r.cgpa)),
    );
    scaler_fields.insert(
        COL_GRADUATION_YEAR.to_string(),
        standardizer(rows.iter().map(|r| r.graduation_year)),
    );
    let scaler = Scaler {
        fields: scaler_fields,
    };

    // Skill vocabulary: sorted unique tokens (already stop-word filtered)
    let vocabulary: Vec<String> = rows
        .iter()
        .flat_map(|r| r.skills.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    // Canonical column order: scalar features, then one column per skill
    let mut feature_names: Vec<String> = [
        COL_CGPA,
        COL_GRADUATION_YEAR,
        COL_INTERNSHIP,
        COL_DEGREE,
        COL_SPECIALIZATION,
        COL_CERTIFICATIONS,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    feature_names.extend(vocabulary.iter().cloned());

    // Design matrix and targets
    let vocab_index: BTreeMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(idx, skill)| (skill.as_str(), 6 + idx))
        .collect();
    let features: Vec<Vec<f64>> = rows
        .iter()
        .map(|r| {
            let mut x = vec![0.0; feature_names.len()];
            x[0] = scaler.transform(COL_CGPA, r.cgpa);
            x[1] = scaler.transform(COL_GRADUATION_YEAR, r.graduation_year);
            x[2] = r.internship as f64;
            x[3] = encoders[COL_DEGREE].transform_or_fallback(&r.degree) as f64;
            x[4] = encoders[COL_SPECIALIZATION].transform_or_fallback(&r.specialization) as f64;
            x[5] = encoders[COL_CERTIFICATIONS].transform_or_fallback(&r.certifications) as f64;
            for skill in &r.skills {
                if let Some(&idx) = vocab_index.get(skill.as_str()) {
                    x[idx] = 1.0;
                }
            }
            x
        })
        .collect();
    let targets: Vec<usize> = rows
        .iter()
        .map(|r| {
            target.transform(&r.job_role).ok_or_else(|| {
                TrainError::Fit(format!("target label {} not in fitted classes", r.job_role))
            })
        })
        .collect::<Result<_, _>>()?;

    let model = boost(&features, &targets, target.len(), config);
    let training_accuracy = accuracy(&model, &features, &targets);

    let report = TrainReport {
        samples: rows.len(),
        classes: target.len(),
        features: feature_names.len(),
        training_accuracy,
    };
    info!(
        samples = report.samples,
        classes = report.classes,
        features = report.features,
        training_accuracy = report.training_accuracy,
        "model fitted"
    );

    let metadata = derive_metadata(dataset, &vocabulary);
    let bundle = Bundle::new(
        model,
        encoders,
        scaler,
        vocabulary,
        feature_names,
        None, // selector is a fitted no-op, written as null
        Some(metadata),
    )
    .map_err(|e| TrainError::Fit(e.to_string()))?;

    Ok((bundle, report))
}

/// Mean and population standard deviation; a constant column gets scale 1
/// so standardization degrades to centering
fn standardizer<I: IntoIterator<Item = f64>>(values: I) -> FieldScaler {
    let values: Vec<f64> = values.into_iter().collect();
    let n = values.len().max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = variance.sqrt();
    FieldScaler {
        mean,
        scale: if std == 0.0 { 1.0 } else { std },
    }
}

/// Multi-class gradient boosting with a softmax objective:
/// gradient `p_k - y_k`, hessian `p_k (1 - p_k)`
fn boost(features: &[Vec<f64>], targets: &[usize], classes: usize, config: &TrainConfig) -> CareerModel {
    let n = features.len();

    // Per-class bias: log prior
    let mut counts = vec![0usize; classes];
    for &t in targets {
        counts[t] += 1;
    }
    let biases: Vec<f64> = counts
        .iter()
        .map(|&c| ((c.max(1)) as f64 / n as f64).ln())
        .collect();

    let mut scores: Vec<Vec<f64>> = vec![biases.clone(); n];
    let mut ensembles: Vec<Vec<Tree>> = vec![Vec::with_capacity(config.rounds); classes];
    let tree_config = TreeConfig {
        max_depth: config.max_depth,
        min_samples_leaf: config.min_samples_leaf,
        leaf_shrinkage: config.learning_rate,
    };

    let mut gradients = vec![0.0; n];
    let mut hessians = vec![0.0; n];
    for round in 0..config.rounds {
        let probs: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();
        for k in 0..classes {
            for i in 0..n {
                let p = probs[i][k];
                let y = if targets[i] == k { 1.0 } else { 0.0 };
                gradients[i] = p - y;
                hessians[i] = (p * (1.0 - p)).max(1e-6);
            }
            let tree = CartBuilder::new(features, &gradients, &hessians, tree_config.clone()).build();
            for (i, x) in features.iter().enumerate() {
                scores[i][k] += tree.evaluate(x);
            }
            ensembles[k].push(tree);
        }
        debug!(round = round + 1, "boosting round complete");
    }

    CareerModel { biases, ensembles }
}

fn accuracy(model: &CareerModel, features: &[Vec<f64>], targets: &[usize]) -> f64 {
    if features.is_empty() {
        return 0.0;
    }
    let mut correct = 0usize;
    for (x, &target) in features.iter().zip(targets) {
        let probs = model.predict_proba(x);
        let best = probs
            .iter()
            .enumerate()
            .max_by(|(a_idx, a), (b_idx, b)| {
                a.partial_cmp(b)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b_idx.cmp(a_idx))
            })
            .map(|(idx, _)| idx);
        if best == Some(target) {
            correct += 1;
        }
    }
    correct as f64 / features.len() as f64
}

/// Derived lookup maps for profile-editing UIs
fn derive_metadata(dataset: &Dataset, vocabulary: &[String]) -> BundleMetadata {
    const DISCARDED_CERTS: [&str; 4] = ["", NO_CERTIFICATION, "nan", "[object Object]"];

    let mut degree_map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut cert_map: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for row in &dataset.rows {
        degree_map
            .entry(row.degree.clone())
            .or_default()
            .insert(row.specialization.clone());
        if !DISCARDED_CERTS.contains(&row.certifications.as_str()) {
            cert_map
                .entry(row.specialization.clone())
                .or_default()
                .insert(row.certifications.clone());
        }
    }

    BundleMetadata {
        degree_map: degree_map
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
        cert_map: cert_map
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect(),
        skills: vocabulary.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TrainingRow;
    use edu2job_core::{predict_with_bundle, Profile};
    use serde_json::json;

    fn row(cgpa: f64, skills: &[&str], role: &str) -> TrainingRow {
        TrainingRow {
            degree: "B.Tech".into(),
            specialization: "Computer Science".into(),
            certifications: "None".into(),
            cgpa,
            graduation_year: 2025.0,
            internship: 0,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            job_role: role.into(),
        }
    }

    fn separable_dataset() -> Dataset {
        let mut rows = Vec::new();
        for i in 0..12 {
            let cgpa = 7.0 + (i % 3) as f64 * 0.5;
            rows.push(row(cgpa, &["Python", "SQL"], "Data Scientist"));
            rows.push(row(cgpa, &["Java", "Spring"], "Backend Developer"));
        }
        Dataset { rows }
    }

    fn quick_config() -> TrainConfig {
        TrainConfig {
            rounds: 8,
            max_depth: 3,
            min_samples_leaf: 1,
            learning_rate: 0.3,
        }
    }

    #[test]
    fn fits_a_separable_dataset_to_high_accuracy() {
        let (bundle, report) = fit(&separable_dataset(), &quick_config()).unwrap();
        assert_eq!(report.classes, 2);
        assert_eq!(report.samples, 24);
        assert!(report.training_accuracy > 0.9, "{}", report.training_accuracy);
        assert_eq!(bundle.target_encoder().classes(), [
            "Backend Developer",
            "Data Scientist"
        ]);
    }

    #[test]
    fn feature_names_lead_with_scalars_then_vocabulary() {
        let (bundle, _) = fit(&separable_dataset(), &quick_config()).unwrap();
        assert_eq!(
            &bundle.feature_names[..6],
            &[
                "cgpa",
                "graduation_year",
                "internship_experience",
                "degree",
                "specialization",
                "certifications"
            ]
        );
        // Vocabulary is sorted and stop-word free
        assert_eq!(&bundle.feature_names[6..], &["Java", "Python", "SQL", "Spring"]);
    }

    #[test]
    fn fitted_bundle_predicts_the_separating_skills() {
        let (bundle, _) = fit(&separable_dataset(), &quick_config()).unwrap();

        let profile = Profile {
            degree: "B.Tech".into(),
            specialization: "Computer Science".into(),
            certifications: "None".into(),
            cgpa: json!(8.0),
            graduation_year: json!(2025),
            skills: vec!["Python".into(), "SQL".into()],
            internships: json!(0),
        };
        let result = predict_with_bundle(&profile, &bundle);
        assert_eq!(result.top_predictions[0].job_role, "Data Scientist");
        assert_eq!(result.top_predictions.len(), 2);
    }

    #[test]
    fn metadata_maps_are_derived_from_the_dataset() {
        let mut dataset = separable_dataset();
        dataset.rows[0].certifications = "AWS Certified".into();
        let (bundle, _) = fit(&dataset, &quick_config()).unwrap();

        let metadata = bundle.metadata.as_ref().unwrap();
        assert_eq!(metadata.degree_map["B.Tech"], vec!["Computer Science"]);
        assert_eq!(metadata.cert_map["Computer Science"], vec!["AWS Certified"]);
        assert_eq!(metadata.skills, bundle.skills_vocabulary);
    }

    #[test]
    fn refitting_identical_data_is_deterministic() {
        let (b1, _) = fit(&separable_dataset(), &quick_config()).unwrap();
        let (b2, _) = fit(&separable_dataset(), &quick_config()).unwrap();
        assert_eq!(b1.fingerprint(), b2.fingerprint());
    }
}
