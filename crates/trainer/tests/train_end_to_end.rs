//! End-to-end trainer test: CSV -> fit -> publish -> load -> predict

use edu2job_core::{predict_with_bundle, Bundle, Profile};
use edu2job_trainer::{publish_bundle, train_bundle_from_csv, TrainConfig};
use serde_json::json;
use std::io::Write;

const DATASET: &str = "\
degree,specialization,certifications,cgpa,graduation_year,internship_experience,skills,job_role
B.Tech,Computer Science,AWS Certified,8.5,2025,yes,\"Python, SQL\",Data Scientist
B.Tech,Computer Science,None,8.0,2024,no,\"Python, SQL\",Data Scientist
M.Tech,Data Science,None,9.0,2025,yes,\"Python, SQL\",Data Scientist
B.Sc,Computer Science,None,7.5,2024,no,\"Python, SQL\",Data Scientist
B.Tech,Computer Science,None,7.0,2024,yes,\"Java, Spring\",Backend Developer
B.Tech,Information Technology,None,7.5,2025,no,\"Java, Spring\",Backend Developer
B.Sc,Information Technology,None,6.5,2023,no,\"Java, Spring\",Backend Developer
M.Tech,Computer Science,None,8.0,2025,yes,\"Java, Spring\",Backend Developer
B.Tech,Computer Science,None,6.0,2024,no,\"Selenium, Manual Testing\",QA Engineer
B.Sc,Information Technology,None,6.5,2023,no,\"Selenium, Manual Testing\",QA Engineer
B.Tech,Electronics,None,7.0,2024,yes,\"Selenium, Manual Testing\",QA Engineer
B.Sc,Computer Science,None,6.0,2023,no,\"Selenium, Manual Testing\",QA Engineer
";

fn quick_config() -> TrainConfig {
    TrainConfig {
        rounds: 10,
        max_depth: 3,
        min_samples_leaf: 1,
        learning_rate: 0.3,
    }
}

#[test]
fn csv_to_published_bundle_to_prediction() {
    let root = tempfile::tempdir().unwrap();
    let csv_path = root.path().join("students.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    file.write_all(DATASET.as_bytes()).unwrap();

    let (bundle, report) = train_bundle_from_csv(&csv_path, &quick_config()).unwrap();
    assert_eq!(report.samples, 12);
    assert_eq!(report.classes, 3);
    assert!(report.training_accuracy > 0.9);

    let artifact_dir = root.path().join("artifacts");
    let fingerprint = publish_bundle(&bundle, &artifact_dir).unwrap();

    let loaded = Bundle::load(&artifact_dir).unwrap();
    assert_eq!(loaded.fingerprint(), fingerprint);

    let profile = Profile {
        degree: "B.Tech".into(),
        specialization: "Computer Science".into(),
        certifications: "None".into(),
        cgpa: json!(8.2),
        graduation_year: json!(2025),
        skills: vec![
            "Python".into(),
            "SQL".into(),
            "Rust".into(),
            "Leadership".into(),
        ],
        internships: json!("yes"),
    };
    let result = predict_with_bundle(&profile, &loaded);

    assert_eq!(result.top_predictions[0].job_role, "Data Scientist");
    assert_eq!(result.top_predictions.len(), 3);
    assert_eq!(result.matched_skills, vec!["Python", "SQL"]);
    // Rust is outside the fitted vocabulary; Leadership is a stop word
    // and is dropped before matching
    assert_eq!(result.unrecognized_skills, vec!["Rust"]);

    // Confidences are percentages rounded to one decimal
    let total: f64 = result.top_predictions.iter().map(|p| p.confidence).sum();
    assert!(total <= 100.2);
    for p in &result.top_predictions {
        assert!((p.confidence * 10.0).fract().abs() < 1e-9);
    }
}

#[test]
fn identical_datasets_produce_identical_fingerprints() {
    let root = tempfile::tempdir().unwrap();
    let csv_path = root.path().join("students.csv");
    std::fs::write(&csv_path, DATASET).unwrap();

    let (b1, _) = train_bundle_from_csv(&csv_path, &quick_config()).unwrap();
    let (b2, _) = train_bundle_from_csv(&csv_path, &quick_config()).unwrap();
    assert_eq!(b1.fingerprint(), b2.fingerprint());
}
