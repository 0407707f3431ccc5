//! Black-box CLI coverage, grounded on the teacher's `tests/e2e_cli.rs`
//! (`assert_cmd` + `predicates`, driving the built binary as a subprocess
//! rather than calling library code directly).

use assert_cmd::{cargo, prelude::*};
use predicates::prelude::*;
use std::process::Command;
use tempfile::TempDir;

#[test]
fn extract_on_empty_staging_dir_reports_zero_files_no_color_when_piped() {
    // No archives match the range, so `success_count` stays 0 and
    // `ExtractionResult::success()` is false (success requires at least one
    // processed file, per domain::extraction_result); the CLI surfaces that
    // as a non-zero exit with the failure-shaped message.
    let staging = TempDir::new().expect("failed to create staging dir");
    let out = TempDir::new().expect("failed to create output dir");

    let mut cmd = Command::new(cargo::cargo_bin!("datafin"));
    cmd.arg("--no-color")
        .arg("extract")
        .arg(staging.path())
        .arg(out.path())
        .arg("--classes")
        .arg("ações")
        .arg("--from")
        .arg("2023")
        .arg("--to")
        .arg("2023");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("0/0 file(s) failed"))
        .stdout(predicate::str::contains("\u{001b}[").not());
}

#[test]
fn extract_rejects_unknown_instrument_class() {
    let staging = TempDir::new().expect("failed to create staging dir");
    let out = TempDir::new().expect("failed to create output dir");

    let mut cmd = Command::new(cargo::cargo_bin!("datafin"));
    cmd.arg("--no-color")
        .arg("extract")
        .arg(staging.path())
        .arg(out.path())
        .arg("--classes")
        .arg("not_a_real_class")
        .arg("--from")
        .arg("2023")
        .arg("--to")
        .arg("2023");

    cmd.assert().failure();
}

#[test]
fn download_rejects_forbidden_destination_before_any_network_call() {
    let mut cmd = Command::new(cargo::cargo_bin!("datafin"));
    cmd.arg("--no-color")
        .arg("download")
        .arg("/etc/datafin-e2e-test")
        .arg("DFP")
        .arg("--from")
        .arg("2023")
        .arg("--to")
        .arg("2023");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("security error").or(predicate::str::contains("Security")));
}
