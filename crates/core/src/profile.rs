//! Raw profile records and lenient value parsing
//!
//! Profile payloads arrive from untrusted clients, so numeric and boolean
//! fields are carried as loosely typed JSON values and coerced at encode
//! time. Coercion never fails; unparseable values fall back to fixed
//! substitutes so that encoding always produces a full-width vector.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Substitute used when `cgpa` cannot be parsed
pub const DEFAULT_CGPA: f64 = 0.0;

/// Substitute used when `graduation_year` cannot be parsed
pub const DEFAULT_GRADUATION_YEAR: f64 = 2024.0;

/// A user's declared education/skill state, as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub specialization: String,
    /// Single token; "None" is the fitted sentinel for no certification
    #[serde(default)]
    pub certifications: String,
    /// Accepted as a number or a numeric string; policy domain [0, 10]
    #[serde(default)]
    pub cgpa: Value,
    /// Accepted as a number or a numeric string; policy domain [2020, 2030]
    #[serde(default)]
    pub graduation_year: Value,
    /// Free-text skill tokens, order-insensitive
    #[serde(default)]
    pub skills: Vec<String>,
    /// Accepted as 0/1, true/false, or "yes"/"true"/"1" variants
    #[serde(default)]
    pub internships: Value,
}

impl Profile {
    /// CGPA coerced to a float, substituting [`DEFAULT_CGPA`] when unparseable
    pub fn cgpa_or_default(&self) -> f64 {
        lenient_f64(&self.cgpa).unwrap_or(DEFAULT_CGPA)
    }

    /// Graduation year coerced to a float, substituting
    /// [`DEFAULT_GRADUATION_YEAR`] when unparseable
    pub fn graduation_year_or_default(&self) -> f64 {
        lenient_f64(&self.graduation_year)
            .map(f64::trunc)
            .unwrap_or(DEFAULT_GRADUATION_YEAR)
    }

    /// Internship flag: 1 for the truthy variants, 0 for everything else
    pub fn internship_flag(&self) -> u8 {
        if truthy(&self.internships) {
            1
        } else {
            0
        }
    }
}

/// Coerce a JSON value to a float, accepting numbers and numeric strings
pub fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Truthy test for the internship field: {"1", "true", "yes"},
/// case-insensitive, applied to the value's string form
pub fn truthy(value: &Value) -> bool {
    let text = match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return false,
    };
    matches!(text.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cgpa_parses_numbers_and_strings() {
        let mut profile = Profile {
            cgpa: json!(8.5),
            ..Default::default()
        };
        assert_eq!(profile.cgpa_or_default(), 8.5);

        profile.cgpa = json!("7.25");
        assert_eq!(profile.cgpa_or_default(), 7.25);
    }

    #[test]
    fn unparseable_cgpa_substitutes_default() {
        let profile = Profile {
            cgpa: json!("not-a-number"),
            ..Default::default()
        };
        assert_eq!(profile.cgpa_or_default(), DEFAULT_CGPA);
    }

    #[test]
    fn missing_graduation_year_substitutes_default() {
        let profile = Profile::default();
        assert_eq!(profile.graduation_year_or_default(), DEFAULT_GRADUATION_YEAR);
    }

    #[test]
    fn graduation_year_truncates_fractional_input() {
        let profile = Profile {
            graduation_year: json!("2025.9"),
            ..Default::default()
        };
        assert_eq!(profile.graduation_year_or_default(), 2025.0);
    }

    #[test]
    fn internship_truthy_variants() {
        for value in [json!(1), json!("1"), json!("true"), json!("YES"), json!(true)] {
            let profile = Profile {
                internships: value.clone(),
                ..Default::default()
            };
            assert_eq!(profile.internship_flag(), 1, "value: {value}");
        }
        for value in [json!(0), json!("no"), json!("maybe"), Value::Null] {
            let profile = Profile {
                internships: value.clone(),
                ..Default::default()
            };
            assert_eq!(profile.internship_flag(), 0, "value: {value}");
        }
    }
}
