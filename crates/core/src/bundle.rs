//! Fitted encoding schema: the artifact bundle
//!
//! One bundle is the complete output of a single training run: categorical
//! encoders, numeric scaler, skill vocabulary, canonical feature-name list,
//! optional feature selector, optional UI metadata, and the scoring model.
//! A bundle is immutable once constructed; retraining produces a wholly new
//! bundle, which is what makes the store's hot swap safe for in-flight
//! readers.
//!
//! On disk a bundle is one directory snapshot, one JSON file per artifact.
//! Loading is all-or-nothing: if any required file is missing or corrupt the
//! load is rejected with a [`LoadError`] and no partial state is exposed.

use crate::errors::LoadError;
use crate::model::CareerModel;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Required artifact files
pub const MODEL_FILE: &str = "model.json";
pub const LABEL_ENCODERS_FILE: &str = "label_encoders.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const SKILLS_VOCABULARY_FILE: &str = "skills_vocabulary.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";

/// Optional artifact files
pub const FEATURE_SELECTOR_FILE: &str = "feature_selector.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Categorical fields that must carry a fitted encoder, target included
pub const ENCODED_FIELDS: [&str; 4] = ["degree", "specialization", "certifications", "job_role"];

/// Target field name
pub const TARGET_FIELD: &str = "job_role";

/// Bijection from seen category string to a small integer index.
///
/// Classes are stored sorted, matching the fit procedure; the designated
/// fallback for unseen values is the first fitted class (index 0).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryEncoder {
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Build an encoder from fitted classes; sorts and dedups them
    pub fn new(mut classes: Vec<String>) -> Self {
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Index of a seen category, or None for an unseen one
    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(value)).ok()
    }

    /// Index of a seen category, or the fallback index (0) for an unseen one
    pub fn transform_or_fallback(&self, value: &str) -> usize {
        self.transform(value).unwrap_or(0)
    }

    /// Category string for a fitted index
    pub fn inverse(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}

/// Per-field standardization parameters, applied as `(x - mean) / scale`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldScaler {
    pub mean: f64,
    pub scale: f64,
}

impl FieldScaler {
    pub fn transform(&self, value: f64) -> f64 {
        if self.scale == 0.0 {
            value - self.mean
        } else {
            (value - self.mean) / self.scale
        }
    }
}

/// Fitted numeric scaler covering the standardized fields
/// (`cgpa` and `graduation_year`); other fields pass through untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Scaler {
    pub fields: BTreeMap<String, FieldScaler>,
}

impl Scaler {
    pub fn transform(&self, field: &str, value: f64) -> f64 {
        match self.fields.get(field) {
            Some(f) => f.transform(value),
            None => value,
        }
    }
}

/// Optional column-subset selector; absent or empty means no-op
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSelector {
    pub columns: Vec<String>,
}

/// Derived lookup maps used to populate profile-editing UIs
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BundleMetadata {
    /// degree -> specializations seen with it
    pub degree_map: BTreeMap<String, Vec<String>>,
    /// specialization -> certifications seen with it
    pub cert_map: BTreeMap<String, Vec<String>>,
    /// Full fitted skill vocabulary
    pub skills: Vec<String>,
}

/// The fitted transformation state of one training run, versioned as a unit
#[derive(Debug, Clone)]
pub struct Bundle {
    pub model: CareerModel,
    pub encoders: BTreeMap<String, CategoryEncoder>,
    pub scaler: Scaler,
    pub skills_vocabulary: Vec<String>,
    pub feature_names: Vec<String>,
    pub feature_selector: Option<FeatureSelector>,
    pub metadata: Option<BundleMetadata>,
    /// Blake3 hex of the serialized model; the bundle's version identity
    fingerprint: String,
    /// Canonical column list after applying the selector (if any)
    canonical: Vec<String>,
}

impl Bundle {
    /// Assemble a bundle from fitted parts, validating coherence
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model: CareerModel,
        encoders: BTreeMap<String, CategoryEncoder>,
        scaler: Scaler,
        skills_vocabulary: Vec<String>,
        feature_names: Vec<String>,
        feature_selector: Option<FeatureSelector>,
        metadata: Option<BundleMetadata>,
    ) -> Result<Self, LoadError> {
        for field in ENCODED_FIELDS {
            let encoder = encoders
                .get(field)
                .ok_or_else(|| LoadError::Invalid(format!("no encoder fitted for {field}")))?;
            if encoder.is_empty() {
                return Err(LoadError::Invalid(format!("encoder for {field} has no classes")));
            }
        }
        if feature_names.is_empty() {
            return Err(LoadError::Invalid("feature name list is empty".into()));
        }
        if model.biases.len() != model.ensembles.len() {
            return Err(LoadError::Invalid(
                "model bias/ensemble class counts disagree".into(),
            ));
        }
        let target_classes = encoders[TARGET_FIELD].len();
        if model.num_classes() != target_classes {
            return Err(LoadError::Invalid(format!(
                "model predicts {} classes but {} job roles were fitted",
                model.num_classes(),
                target_classes
            )));
        }

        let canonical = match &feature_selector {
            Some(selector) if !selector.columns.is_empty() => feature_names
                .iter()
                .filter(|name| selector.columns.contains(name))
                .cloned()
                .collect(),
            _ => feature_names.clone(),
        };
        let fingerprint = model.fingerprint();

        Ok(Self {
            model,
            encoders,
            scaler,
            skills_vocabulary,
            feature_names,
            feature_selector,
            metadata,
            fingerprint,
            canonical,
        })
    }

    /// Read a bundle directory; all-or-nothing
    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        let model: CareerModel = read_required(dir, MODEL_FILE)?;
        let encoders: BTreeMap<String, CategoryEncoder> = read_required(dir, LABEL_ENCODERS_FILE)?;
        let scaler: Scaler = read_required(dir, SCALER_FILE)?;
        let skills_vocabulary: Vec<String> = read_required(dir, SKILLS_VOCABULARY_FILE)?;
        let feature_names: Vec<String> = read_required(dir, FEATURE_NAMES_FILE)?;
        let feature_selector: Option<FeatureSelector> = read_optional(dir, FEATURE_SELECTOR_FILE)?;
        let metadata: Option<BundleMetadata> = read_optional(dir, METADATA_FILE)?;

        let bundle = Self::new(
            model,
            encoders,
            scaler,
            skills_vocabulary,
            feature_names,
            feature_selector,
            metadata,
        )?;
        info!(
            fingerprint = %bundle.fingerprint(),
            features = bundle.feature_names.len(),
            roles = bundle.target_encoder().len(),
            "artifact bundle loaded from {}",
            dir.display()
        );
        Ok(bundle)
    }

    /// Write the bundle as one directory snapshot
    pub fn save(&self, dir: &Path) -> Result<(), LoadError> {
        std::fs::create_dir_all(dir)?;
        write_file(dir, MODEL_FILE, &self.model)?;
        write_file(dir, LABEL_ENCODERS_FILE, &self.encoders)?;
        write_file(dir, SCALER_FILE, &self.scaler)?;
        write_file(dir, SKILLS_VOCABULARY_FILE, &self.skills_vocabulary)?;
        write_file(dir, FEATURE_NAMES_FILE, &self.feature_names)?;
        write_file(dir, FEATURE_SELECTOR_FILE, &self.feature_selector)?;
        if self.metadata.is_some() {
            write_file(dir, METADATA_FILE, &self.metadata)?;
        }
        debug!(
            fingerprint = %self.fingerprint(),
            "artifact bundle written to {}",
            dir.display()
        );
        Ok(())
    }

    /// The bundle's version identity
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Canonical ordered column list the model consumes, selector applied
    pub fn canonical_columns(&self) -> &[String] {
        &self.canonical
    }

    /// Encoder fitted for a categorical field
    pub fn encoder(&self, field: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(field)
    }

    /// Encoder for the target field; presence is validated at construction
    pub fn target_encoder(&self) -> &CategoryEncoder {
        &self.encoders[TARGET_FIELD]
    }
}

fn read_required<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T, LoadError> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(LoadError::MissingFile { name: name.into() });
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        name: name.into(),
        source,
    })
}

fn read_optional<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Option<T>, LoadError> {
    let path = dir.join(name);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)?;
    // The file may legitimately contain `null` (a fitted no-op)
    serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        name: name.into(),
        source,
    })
}

fn write_file<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(), LoadError> {
    let contents = serde_json::to_string(value).map_err(|source| LoadError::Parse {
        name: name.into(),
        source,
    })?;
    std::fs::write(dir.join(name), contents)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use crate::model::{Node, Tree};

    /// A small fitted bundle: three roles, two vocabulary skills.
    ///
    /// The model favors "Data Scientist" when the Python column is set,
    /// "Backend Developer" when SQL alone is set, otherwise "QA Engineer".
    pub fn fitted_bundle() -> Bundle {
        let mut encoders = BTreeMap::new();
        encoders.insert(
            "degree".into(),
            CategoryEncoder::new(vec!["B.Sc".into(), "B.Tech".into(), "M.Tech".into()]),
        );
        encoders.insert(
            "specialization".into(),
            CategoryEncoder::new(vec!["Computer Science".into(), "Electronics".into()]),
        );
        encoders.insert(
            "certifications".into(),
            CategoryEncoder::new(vec!["AWS Certified".into(), "None".into()]),
        );
        encoders.insert(
            "job_role".into(),
            CategoryEncoder::new(vec![
                "Backend Developer".into(),
                "Data Scientist".into(),
                "QA Engineer".into(),
            ]),
        );

        let mut fields = BTreeMap::new();
        fields.insert("cgpa".into(), FieldScaler { mean: 7.0, scale: 1.5 });
        fields.insert(
            "graduation_year".into(),
            FieldScaler { mean: 2024.0, scale: 2.0 },
        );

        let feature_names: Vec<String> = [
            "cgpa",
            "graduation_year",
            "internship_experience",
            "degree",
            "specialization",
            "certifications",
            "Python",
            "SQL",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        // Column 6 is Python, column 7 is SQL
        let python_stump = Tree {
            nodes: vec![
                Node::internal(6, 0.5, 1, 2),
                Node::leaf(-1.0),
                Node::leaf(2.0),
            ],
        };
        let sql_stump = Tree {
            nodes: vec![
                Node::internal(7, 0.5, 1, 2),
                Node::leaf(-0.5),
                Node::leaf(1.0),
            ],
        };
        let model = CareerModel {
            biases: vec![0.0, 0.0, 0.2],
            ensembles: vec![vec![sql_stump], vec![python_stump], vec![]],
        };

        Bundle::new(
            model,
            encoders,
            Scaler { fields },
            vec!["Python".into(), "SQL".into()],
            feature_names,
            None,
            None,
        )
        .expect("fixture bundle is coherent")
    }
}
