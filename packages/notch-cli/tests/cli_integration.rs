use assert_cmd::Command;
use predicates::prelude::*;

fn meg_notch() -> Command {
    Command::cargo_bin("meg-notch").unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    meg_notch()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    meg_notch()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("meg-notch"));
}

#[test]
fn test_help_flag() {
    meg_notch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("notch filter"));
}

// =============================================================================
// RUN SUBCOMMAND
// =============================================================================

#[test]
fn test_run_missing_config_is_input_error() {
    meg_notch()
        .arg("run")
        .arg("--config")
        .arg("/nonexistent/config.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_run_invalid_config_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    // A missing start frequency is only allowed with spectrum_fit.
    std::fs::write(
        &config,
        r#"{"fif": "meg.fif", "param_freqs_specific_or_start": "", "param_method": "fir"}"#,
    )
    .unwrap();

    meg_notch()
        .arg("run")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("spectrum_fit"));
}

#[test]
fn test_run_unparseable_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, "{not json").unwrap();

    meg_notch()
        .arg("run")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

// =============================================================================
// BATCH SUBCOMMAND
// =============================================================================

#[test]
fn test_batch_requires_pattern_or_files() {
    meg_notch()
        .arg("batch")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--pattern or --files"));
}

#[test]
fn test_batch_no_matches_is_input_error() {
    meg_notch()
        .arg("batch")
        .arg("--pattern")
        .arg("/nonexistent/**/*.fif")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn test_batch_dry_run_lists_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.fif"), b"x").unwrap();
    std::fs::write(dir.path().join("b.fif"), b"x").unwrap();

    meg_notch()
        .arg("batch")
        .arg("--pattern")
        .arg(format!("{}/*.fif", dir.path().display()))
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.fif"))
        .stdout(predicate::str::contains("b.fif"));
}

// =============================================================================
// INFO SUBCOMMAND
// =============================================================================

#[test]
fn test_info_missing_file() {
    meg_notch()
        .arg("info")
        .arg("--file")
        .arg("/nonexistent/meg.fif")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_info_rejects_non_fif() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("not_a_fif.fif");
    std::fs::write(&file, b"plain text, not a FIF tag stream").unwrap();

    meg_notch()
        .arg("info")
        .arg("--file")
        .arg(file.to_str().unwrap())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("FIF"));
}

// =============================================================================
// VALIDATE SUBCOMMAND
// =============================================================================

#[test]
fn test_validate_missing_config() {
    meg_notch()
        .arg("validate")
        .arg("--config")
        .arg("/nonexistent/config.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_validate_json_reports_invalid_params() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        r#"{"fif": "meg.fif", "param_freqs_specific_or_start": 60, "param_method": "bandstop"}"#,
    )
    .unwrap();

    let output = meg_notch()
        .arg("validate")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .arg("--json")
        .assert()
        .code(2);

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["exists"], true);
    assert_eq!(parsed["parseable"], true);
    assert_eq!(parsed["valid"], false);
    assert!(parsed["error"].as_str().unwrap().contains("bandstop"));
}

#[test]
fn test_validate_json_missing_input_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(
        &config,
        format!(
            r#"{{"fif": "{}", "param_freqs_specific_or_start": 60}}"#,
            dir.path().join("missing.fif").display()
        ),
    )
    .unwrap();

    let output = meg_notch()
        .arg("validate")
        .arg("--config")
        .arg(config.to_str().unwrap())
        .arg("--json")
        .assert()
        .code(2);

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["parseable"], true);
    assert_eq!(parsed["method"], "fir");
    assert_eq!(parsed["input_file_exists"], false);
    assert_eq!(parsed["valid"], false);
}

// =============================================================================
// REPORT SUBCOMMAND
// =============================================================================

#[test]
fn test_report_missing_config() {
    meg_notch()
        .arg("report")
        .arg("--config")
        .arg("/nonexistent/config.json")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}
