//! End-to-end checks against the compiled `bbs-engine` binary, the way
//! `webpipe`'s own CLI contract tests exercise `webpipe`'s binary rather
//! than its library surface directly.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn version_contract() {
    let mut cmd = Command::cargo_bin("bbs-engine").unwrap();
    let assert = cmd.arg("version").assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse version json");

    assert_eq!(v["schema_version"].as_u64(), Some(1));
    assert_eq!(v["name"].as_str(), Some("bbs-engine"));
    assert!(!v["version"].as_str().unwrap_or("").is_empty());
}

#[test]
fn round_config_contract_against_a_fresh_data_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("bbs-engine").unwrap();
    let assert = cmd
        .arg("round-config")
        .arg("--data-dir")
        .arg(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"Round\""));
    let s = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse round-config json");
    assert_eq!(v["ok"].as_bool(), Some(true));
    assert!(v["response"]["payload"]["enabled"].is_boolean());
}

#[test]
fn diag_logs_is_empty_on_a_fresh_data_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("bbs-engine").unwrap();
    let assert = cmd.arg("diag-logs").arg("--data-dir").arg(tmp.path()).assert().success();
    let s = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse diag-logs json");
    assert_eq!(v["response"]["payload"].as_array().map(|a| a.is_empty()), Some(true));
}

#[test]
fn unknown_board_url_surfaces_as_a_failure_envelope() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("bbs-engine").unwrap();
    let assert = cmd
        .args(["fetch-subject", "--board-url", "https://no-such-board.example/"])
        .arg("--data-dir")
        .arg(tmp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("unknown board"));
    let s = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let v: serde_json::Value = serde_json::from_str(&s).expect("parse error envelope json");
    assert_eq!(v["ok"].as_bool(), Some(false));
}
