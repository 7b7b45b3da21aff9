//! CLI integration tests

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "la-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Learning Advisor"), "Should show app name");
    assert!(stdout.contains("models"), "Should show models command");
    assert!(stdout.contains("recommend"), "Should show recommend command");
    assert!(stdout.contains("analyze"), "Should show analyze command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("inspect"), "Should show inspect command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("la"), "Should show binary name");
}

/// Test recommend subcommand help
#[test]
fn test_recommend_help() {
    let output = run_cli(&["recommend", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Recommend help should succeed");
    assert!(stdout.contains("--features"), "Should show features option");
}

/// Test analyze subcommand help
#[test]
fn test_analyze_help() {
    let output = run_cli(&["analyze", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Analyze help should succeed");
    assert!(stdout.contains("--session"), "Should show session option");
}

/// Test that the global options are documented
#[test]
fn test_global_options() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("--api-url"), "Should show api-url option");
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("LA_API_URL"), "Should show env var");
}

/// Test invalid format value is rejected
#[test]
fn test_invalid_format() {
    let output = run_cli(&["--format", "yaml", "models"]);
    assert!(!output.status.success(), "Invalid format should fail");
}

/// Test that a command is required
#[test]
fn test_missing_subcommand() {
    let output = run_cli(&[]);
    assert!(!output.status.success(), "Missing subcommand should fail");
}

/// Test offline inspection of an artifact file
#[test]
fn test_inspect_artifact_as_json() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("learner_classification_rf.json");
    std::fs::write(
        &path,
        r#"{"pipeline": {"classifier": {"kind": "logistic_regression",
             "classes": ["advanced", "moderate", "struggling"],
             "coef": [[1.0], [0.0], [-1.0]], "intercept": [0.0, 0.0, 0.0]}},
            "feature_names": ["accuracy"], "accuracy": 0.9}"#,
    )
    .unwrap();

    let output = run_cli(&[
        "--format",
        "json",
        "inspect",
        path.to_str().unwrap(),
        "--name",
        "learner-classification",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Inspect should succeed");
    let summary: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(summary["name"], "learner-classification");
    assert_eq!(summary["feature_names"][0], "accuracy");
    assert_eq!(summary["input_width"], 1);
}

/// Test inspecting a missing artifact reports failure
#[test]
fn test_inspect_missing_artifact() {
    let output = run_cli(&["inspect", "/no/such/artifact.json"]);
    assert!(!output.status.success(), "Missing artifact should fail");
}
