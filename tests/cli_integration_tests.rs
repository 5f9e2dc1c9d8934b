//! CLI Integration Tests
//!
//! Runs the `survey-dash` binary with assert_cmd against the JSON fixture in
//! test-data/.
//!
//! Skipped during coverage builds, where the binaries are not instrumented.
#![cfg(not(coverage))]
#![allow(deprecated)] // Command::cargo_bin deprecation - no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SURVEY: &str = "test-data/survey.json";

fn survey_dash() -> Command {
    let mut cmd = Command::cargo_bin("survey-dash").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

// ═══════════════════════════════════════════════════════════════════════════
// HELP AND VERSION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_cli_help() {
    survey_dash()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("survey-dash"))
        .stdout(predicate::str::contains("COMMANDS"));
}

#[test]
fn test_cli_version() {
    survey_dash()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_summarize_help_lists_view_options() {
    survey_dash()
        .args(["summarize", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--filter"))
        .stdout(predicate::str::contains("--range"))
        .stdout(predicate::str::contains("--one-of"));
}

// ═══════════════════════════════════════════════════════════════════════════
// COLUMNS AND SUMMARIZE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_columns_lists_header() {
    survey_dash()
        .args(["columns", SURVEY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Satisfaction"))
        .stdout(predicate::str::contains("5 columns, 6 data rows"));
}

#[test]
fn test_summarize_table() {
    survey_dash()
        .args(["summarize", SURVEY])
        .assert()
        .success()
        .stdout(predicate::str::contains("Standard Deviation"))
        .stdout(predicate::str::contains("Quartile 3"))
        .stdout(predicate::str::contains("194"));
}

#[test]
fn test_summarize_json_with_filter() {
    let output = survey_dash()
        .args([
            "summarize",
            SURVEY,
            "--y",
            "Satisfaction",
            "--filter",
            "Region=north",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["Satisfaction"]["Sum"], 21.5);
    assert_eq!(json["Satisfaction"]["Max"], 9.0);
}

#[test]
fn test_summarize_one_of_and_range() {
    let output = survey_dash()
        .args([
            "summarize",
            SURVEY,
            "--one-of",
            "Region=South|West",
            "--range",
            "Age=..45",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["Age"]["Sum"], 41.0);
}

#[test]
fn test_summarize_unknown_axis_fails() {
    survey_dash()
        .args(["summarize", SURVEY, "--y", "Height"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Height"));
}

#[test]
fn test_summarize_bad_range_fails() {
    survey_dash()
        .args(["summarize", SURVEY, "--range", "Age=old..young"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid range bound"));
}

#[test]
fn test_summarize_missing_file_fails() {
    survey_dash()
        .args(["summarize", "nonexistent.xlsx"])
        .assert()
        .failure();
}

// ═══════════════════════════════════════════════════════════════════════════
// CHART, EXPORT AND PROMPT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_chart_to_stdout() {
    let output = survey_dash()
        .args(["chart", SURVEY, "--x", "Region", "--kind", "radial-bar"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "radial_bar");
    assert_eq!(json["category_axis"], "Region");
    assert_eq!(json["rows"].as_array().unwrap().len(), 6);
}

#[test]
fn test_chart_unknown_kind_fails() {
    survey_dash()
        .args(["chart", SURVEY, "--kind", "hologram"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown chart kind"));
}

#[test]
fn test_chart_to_file() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("chart.json");
    survey_dash()
        .args(["chart", SURVEY, "-o", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chart data written to"));
    assert!(out.exists());
}

#[test]
fn test_export_report() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("report.xlsx");
    survey_dash()
        .args([
            "export",
            SURVEY,
            out.to_str().unwrap(),
            "--y",
            "Satisfaction",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Export Complete"));
    assert!(out.exists());
}

#[test]
fn test_prompt_includes_validation_sum() {
    survey_dash()
        .args([
            "prompt",
            SURVEY,
            "--query",
            "What is the sum of Visits?",
            "--y",
            "Visits",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("What is the sum of Visits?"))
        .stdout(predicate::str::contains("precomputed sum of Visits is 15"));
}

#[test]
fn test_prompt_blank_query_fails() {
    survey_dash()
        .args(["prompt", SURVEY, "--query", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("EmptyQuery"));
}
