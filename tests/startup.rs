use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const FEATURE_COUNT: usize = 78;

fn write_artifacts(dir: &Path) {
    let scaler = serde_json::json!({
        "kind": "standard",
        "mean": vec![0.0; FEATURE_COUNT],
        "scale": vec![1.0; FEATURE_COUNT],
    });
    let model = serde_json::json!({
        "kind": "logistic",
        "coefficients": vec![0.0; FEATURE_COUNT],
        "intercept": 0.0,
    });
    fs::write(dir.join("router_scaler.json"), scaler.to_string()).unwrap();
    fs::write(dir.join("router_model.json"), model.to_string()).unwrap();
}

fn run_router(dir: &Path, dataset: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flow-router-sim"))
        .arg("--transformer")
        .arg(dir.join("router_scaler.json"))
        .arg("--classifier")
        .arg(dir.join("router_model.json"))
        .arg("--dataset")
        .arg(dataset)
        .args(extra)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_missing_label_column_is_fatal() {
    let dir = tempdir().unwrap();
    write_artifacts(dir.path());

    let dataset = dir.path().join("cleaned_data.csv");
    fs::write(&dataset, "Destination Port,Flow Duration\n80,120\n").unwrap();

    let output = run_router(dir.path(), &dataset, &[]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Label"));
    assert!(!stderr.contains("FLOW ID"));
}

#[test]
fn test_missing_artifact_is_fatal() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("cleaned_data.csv");
    fs::write(&dataset, "Label\nBENIGN\n").unwrap();

    let output = run_router(dir.path(), &dataset, &[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_threshold_is_config_error() {
    let dir = tempdir().unwrap();
    write_artifacts(dir.path());
    let dataset = dir.path().join("cleaned_data.csv");

    let output = run_router(dir.path(), &dataset, &["--threshold", "1.5"]);
    assert_eq!(output.status.code(), Some(2));
}
