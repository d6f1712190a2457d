//! Feature encoder: raw profile -> canonical numeric feature record
//!
//! This transformation is designed to never fail. Malformed values degrade
//! to fixed substitutes, unseen categories take the encoder's fallback
//! index, and out-of-vocabulary skills are dropped from the vector (but
//! reported back to the caller as unrecognized). The same stop-word filter
//! runs here and in the trainer, so train-time and serve-time skill
//! handling cannot drift.

use crate::bundle::Bundle;
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic soft-skill tokens excluded from the skill vocabulary and from
/// matching, compared lowercase
pub const SKILL_STOP_WORDS: [&str; 5] = [
    "communication",
    "problem solving",
    "critical thinking",
    "teamwork",
    "leadership",
];

/// Scalar columns, in the canonical order the fit procedure assembles them
pub const COL_CGPA: &str = "cgpa";
pub const COL_GRADUATION_YEAR: &str = "graduation_year";
pub const COL_INTERNSHIP: &str = "internship_experience";
pub const COL_DEGREE: &str = "degree";
pub const COL_SPECIALIZATION: &str = "specialization";
pub const COL_CERTIFICATIONS: &str = "certifications";

/// Trim skill tokens, drop empties and stop-words
pub fn filter_skills<'a, I>(skills: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    skills
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !SKILL_STOP_WORDS.contains(&s.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// How a profile's skill list intersected the fitted vocabulary
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SkillMatch {
    /// Skills present in the vocabulary; these drive the binary columns
    pub matched: Vec<String>,
    /// Skills that survived filtering but are outside the vocabulary;
    /// silently dropped from the vector, surfaced for user feedback
    pub unrecognized: Vec<String>,
}

/// A named feature record; column values keyed by canonical column name
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureRecord {
    values: BTreeMap<String, f64>,
}

impl FeatureRecord {
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Dense vector in the given column order; columns this record never
    /// produced are filled with 0, extras are dropped
    pub fn to_vector(&self, feature_names: &[String]) -> Vec<f64> {
        feature_names
            .iter()
            .map(|name| self.get(name).unwrap_or(0.0))
            .collect()
    }
}

/// Reindex a record to a canonical column list: missing columns become 0,
/// extra columns are dropped. Idempotent by construction.
pub fn reindex(record: &FeatureRecord, feature_names: &[String]) -> FeatureRecord {
    let mut out = FeatureRecord::default();
    for name in feature_names {
        out.set(name.clone(), record.get(name).unwrap_or(0.0));
    }
    out
}

/// Cached encoded-education snapshot persisted alongside a profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EducationSnapshot {
    pub cgpa_scaled: f64,
    pub graduation_year_scaled: f64,
    pub internship_encoded: u8,
    pub degree_encoded: usize,
    pub specialization_encoded: usize,
    pub certifications_encoded: usize,
    pub skills_encoded_count: usize,
    /// Fingerprint of the bundle this snapshot was encoded against;
    /// a mismatch with the active bundle marks the snapshot stale
    pub schema_fingerprint: String,
}

/// Encode one profile against a fitted bundle. Never fails: every malformed
/// or unseen value degrades per the substitution policy.
pub fn encode(profile: &Profile, bundle: &Bundle) -> (FeatureRecord, SkillMatch) {
    let clean = filter_skills(profile.skills.iter().map(String::as_str));
    let mut matched = Vec::new();
    let mut unrecognized = Vec::new();
    for skill in clean {
        if bundle.skills_vocabulary.contains(&skill) {
            matched.push(skill);
        } else {
            unrecognized.push(skill);
        }
    }

    let encode_cat = |field: &str, value: &str| -> usize {
        bundle
            .encoder(field)
            .map(|e| e.transform_or_fallback(value))
            .unwrap_or(0)
    };

    let mut record = FeatureRecord::default();
    record.set(
        COL_CGPA,
        bundle.scaler.transform(COL_CGPA, profile.cgpa_or_default()),
    );
    record.set(
        COL_GRADUATION_YEAR,
        bundle
            .scaler
            .transform(COL_GRADUATION_YEAR, profile.graduation_year_or_default()),
    );
    record.set(COL_INTERNSHIP, profile.internship_flag() as f64);
    record.set(COL_DEGREE, encode_cat(COL_DEGREE, &profile.degree) as f64);
    record.set(
        COL_SPECIALIZATION,
        encode_cat(COL_SPECIALIZATION, &profile.specialization) as f64,
    );
    record.set(
        COL_CERTIFICATIONS,
        encode_cat(COL_CERTIFICATIONS, &profile.certifications) as f64,
    );
    for skill in &matched {
        record.set(skill.clone(), 1.0);
    }

    (record, SkillMatch { matched, unrecognized })
}

/// Encode a profile into the compact snapshot cached on the profile record
pub fn snapshot(profile: &Profile, bundle: &Bundle) -> EducationSnapshot {
    let (record, skills) = encode(profile, bundle);
    EducationSnapshot {
        cgpa_scaled: record.get(COL_CGPA).unwrap_or(0.0),
        graduation_year_scaled: record.get(COL_GRADUATION_YEAR).unwrap_or(0.0),
        internship_encoded: record.get(COL_INTERNSHIP).unwrap_or(0.0) as u8,
        degree_encoded: record.get(COL_DEGREE).unwrap_or(0.0) as usize,
        specialization_encoded: record.get(COL_SPECIALIZATION).unwrap_or(0.0) as usize,
        certifications_encoded: record.get(COL_CERTIFICATIONS).unwrap_or(0.0) as usize,
        skills_encoded_count: skills.matched.len(),
        schema_fingerprint: bundle.fingerprint().to_string(),
    }
}
