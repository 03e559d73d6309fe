// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end tests for the `wcs` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

const ZERO_REPORT: &str = "\
[G54: 0.000,0.000,0.000,0.000]
[G55: 0.000,0.000,0.000,0.000]
[G56: 0.000,0.000,0.000,0.000]
[G57: 0.000,0.000,0.000,0.000]
[G58: 0.000,0.000,0.000,0.000]
[G59: 0.000,0.000,0.000,0.000]
";

fn wcs(state_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wcs").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--state-dir")
        .arg(state_dir);
    cmd
}

#[test]
fn fresh_state_lists_six_zero_offsets() {
    let dir = tempfile::tempdir().unwrap();
    wcs(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(ZERO_REPORT);
    assert!(dir.path().join("work_offsets.json").exists());
}

#[test]
fn define_select_suspend_and_report() {
    let dir = tempfile::tempdir().unwrap();
    wcs(dir.path())
        .args(["exec", "G10 L2 P2 X10 Y5", "G55", "WORK_OFFSETS", "G53", "WORK_OFFSETS"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "G55 offset set to X10.000 Y5.000 Z0.000 E0.000\n\
             coordinate system 2 (G55) selected\n",
        ))
        .stdout(predicate::str::contains("[G55: 10.000,5.000,0.000,0.000]*\n"))
        .stdout(predicate::str::contains("machine coordinates active\n"))
        .stdout(predicate::str::ends_with(
            "[G55: 10.000,5.000,0.000,0.000]\n\
             [G56: 0.000,0.000,0.000,0.000]\n\
             [G57: 0.000,0.000,0.000,0.000]\n\
             [G58: 0.000,0.000,0.000,0.000]\n\
             [G59: 0.000,0.000,0.000,0.000]\n",
        ));
}

#[test]
fn offsets_persist_but_active_slot_does_not() {
    let dir = tempfile::tempdir().unwrap();
    wcs(dir.path())
        .args(["exec", "G10 L2 P3 X-1.25 Z4", "G56"])
        .assert()
        .success();

    wcs(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("[G56: -1.250,0.000,4.000,0.000]\n"))
        .stdout(predicate::str::contains("*").not());
}

#[test]
fn p0_in_machine_space_fails_and_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    wcs(dir.path()).arg("list").assert().success();
    let before = fs::read(dir.path().join("work_offsets.json")).unwrap();

    wcs(dir.path())
        .args(["exec", "G10 L2 P0 X5"])
        .assert()
        .code(2)
        .stdout("!! Offsets in machine space are not supported\n");

    let after = fs::read(dir.path().join("work_offsets.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn run_reads_stdin_and_honours_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    wcs(dir.path())
        .args(["run", "--fail-fast"])
        .write_stdin("G54\nG10 L1 P1 X1\nG55\n")
        .assert()
        .code(2)
        .stdout("coordinate system 1 (G54) selected\n!! L2 must be specified\n");
}

#[test]
fn run_reads_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("setup.nc");
    fs::write(&script, "; fixture plate\nG10 L2 P1 X100 Y50\nG54\nG10 L2 P0 Z-2\n").unwrap();
    wcs(dir.path())
        .arg("run")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::ends_with(
            "G54 offset set to X0.000 Y0.000 Z-2.000 E0.000\n",
        ));
}

#[test]
fn corrupt_state_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("work_offsets.json"), "not json").unwrap();
    wcs(dir.path())
        .arg("list")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("loading work offsets"));
    assert_eq!(
        fs::read_to_string(dir.path().join("work_offsets.json")).unwrap(),
        "not json"
    );
}

#[test]
fn state_file_lives_beside_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("machine.json");
    fs::write(&cfg, "{}").unwrap();
    Command::cargo_bin("wcs")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&cfg)
        .args(["exec", "G10 L2 P6 E1"])
        .assert()
        .success();
    let text = fs::read_to_string(dir.path().join("work_offsets.json")).unwrap();
    assert!(text.contains("\"G59\""));
}

#[test]
fn disabled_feature_reports_unknown_commands() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = dir.path().join("machine.json");
    fs::write(&cfg, r#"{"work_offsets": "none"}"#).unwrap();
    Command::cargo_bin("wcs")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&cfg)
        .args(["exec", "G54"])
        .assert()
        .code(2)
        .stdout("!! unknown command: G54\n");
    assert!(!dir.path().join("work_offsets.json").exists());
}
