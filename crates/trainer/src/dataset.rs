//! Training dataset loading, validation, and imputation
//!
//! Reads the uploaded delimited-text dataset, validates the required
//! column set up front (rejecting with the missing names), and cleans
//! rows the way the serving encoder expects: truthy internship
//! normalization, stop-word filtered skills, mean/mode imputation for
//! missing values. Skills cells are comma-joined strings, so cells are
//! parsed with quoted-field support.

use crate::errors::TrainError;
use edu2job_core::filter_skills;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Columns a dataset must carry to be trainable
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "degree",
    "specialization",
    "cgpa",
    "graduation_year",
    "skills",
    "job_role",
];

/// Recognized optional columns
pub const CERTIFICATIONS_COLUMN: &str = "certifications";
pub const INTERNSHIP_COLUMN: &str = "internship_experience";

/// Sentinel certification value for rows without one
pub const NO_CERTIFICATION: &str = "None";

/// One cleaned training example
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub degree: String,
    pub specialization: String,
    pub certifications: String,
    pub cgpa: f64,
    pub graduation_year: f64,
    pub internship: u8,
    /// Already trimmed and stop-word filtered
    pub skills: Vec<String>,
    pub job_role: String,
}

/// Validated, imputed training dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    pub rows: Vec<TrainingRow>,
}

impl Dataset {
    /// Load and clean a CSV dataset.
    ///
    /// Fails with [`TrainError::MissingColumns`] naming every absent
    /// required column; extra columns are ignored.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, TrainError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_csv_str(&content)
    }

    pub fn from_csv_str(content: &str) -> Result<Self, TrainError> {
        let mut lines = content.lines().enumerate();
        let header = loop {
            match lines.next() {
                Some((_, line)) if line.trim().is_empty() => continue,
                Some((_, line)) => break split_record(line),
                None => return Err(TrainError::Dataset("dataset has no header row".into())),
            }
        };

        let columns: BTreeMap<&str, usize> = header
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim(), idx))
            .collect();

        let mut missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !columns.contains_key(**name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(TrainError::MissingColumns { columns: missing });
        }

        let cell = |record: &[String], name: &str| -> String {
            columns
                .get(name)
                .and_then(|&idx| record.get(idx))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        // First pass: collect raw rows, dropping blank lines and rows
        // without a usable target label
        let mut raw = Vec::new();
        for (line_idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let record = split_record(line);
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            let job_role = cell(&record, "job_role");
            if job_role.is_empty() {
                warn!("dropping row {}: no job_role label", line_idx + 1);
                continue;
            }
            raw.push(RawRow {
                degree: non_empty(cell(&record, "degree")),
                specialization: non_empty(cell(&record, "specialization")),
                certifications: non_empty(cell(&record, CERTIFICATIONS_COLUMN)),
                cgpa: cell(&record, "cgpa").parse::<f64>().ok(),
                graduation_year: cell(&record, "graduation_year").parse::<f64>().ok(),
                internship: truthy_cell(&cell(&record, INTERNSHIP_COLUMN)),
                skills: filter_skills(cell(&record, "skills").split(',')),
                job_role,
            });
        }

        if raw.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        // Imputation values from the present data
        let cgpa_mean = mean(raw.iter().filter_map(|r| r.cgpa)).unwrap_or(0.0);
        let year_mean = mean(raw.iter().filter_map(|r| r.graduation_year)).unwrap_or(2024.0);
        let degree_mode = mode(raw.iter().filter_map(|r| r.degree.as_deref()));
        let spec_mode = mode(raw.iter().filter_map(|r| r.specialization.as_deref()));
        let cert_mode = mode(raw.iter().filter_map(|r| r.certifications.as_deref()))
            .unwrap_or_else(|| NO_CERTIFICATION.to_string());

        let rows = raw
            .into_iter()
            .map(|r| TrainingRow {
                degree: r.degree.or_else(|| degree_mode.clone()).unwrap_or_default(),
                specialization: r
                    .specialization
                    .or_else(|| spec_mode.clone())
                    .unwrap_or_default(),
                certifications: r.certifications.unwrap_or_else(|| cert_mode.clone()),
                cgpa: r.cgpa.unwrap_or(cgpa_mean),
                graduation_year: r.graduation_year.unwrap_or(year_mean),
                internship: r.internship,
                skills: r.skills,
                job_role: r.job_role,
            })
            .collect();

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct RawRow {
    degree: Option<String>,
    specialization: Option<String>,
    certifications: Option<String>,
    cgpa: Option<f64>,
    graduation_year: Option<f64>,
    internship: u8,
    skills: Vec<String>,
    job_role: String,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Same truthy rule the serving encoder applies to profile payloads
fn truthy_cell(value: &str) -> u8 {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => 1,
        _ => 0,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Most frequent value; frequency ties resolve to the lexicographically
/// smallest so imputation is deterministic
fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(value, _)| value.to_string())
}

/// Split one CSV record, honoring double-quoted cells ("" escapes a quote)
fn split_record(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}
