use crate::common::{fixture, rule_debug};
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn test_missing_script_file() {
    rule_debug()
        .args(["step", "tests/fixtures/scripts/does_not_exist.py"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read script file"));
}

#[test]
fn test_unknown_mode_is_rejected() {
    rule_debug()
        .args(["step", &fixture("scenario.py"), "--mode", "jump"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'jump'"));
}

#[test]
fn test_zero_step_limit_is_a_config_error() {
    rule_debug()
        .args(["--step-limit", "0", "step", &fixture("scenario.py")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step_limit must be greater than 0"));
}

#[test]
fn test_step_limit_from_environment() {
    rule_debug()
        .env("RULE_DEBUG_STEP_LIMIT", "0")
        .args(["step", &fixture("scenario.py")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("step_limit"));
}

#[test]
fn test_breakpoint_zero_is_rejected() {
    rule_debug()
        .args(["step", &fixture("scenario.py"), "-b", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1-based"));
}

#[test]
fn test_malformed_request_still_answers_in_json() {
    let output = rule_debug()
        .arg("request")
        .write_stdin(r#"{"sourceText": "x = 1", "mode": "step"}"#)
        .output()
        .unwrap();
    assert!(!output.status.success());

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["success"], false);
    assert_eq!(result["errorKind"], "validation");
    assert!(result["error"].as_str().unwrap().contains("sessionId"));
}

#[test]
fn test_missing_interpreter_is_a_spawn_failure() {
    let output = rule_debug()
        .args(["--python", "no-such-python-here", "request"])
        .write_stdin(r#"{"sourceText": "x = 1", "mode": "step", "sessionId": "s"}"#)
        .output()
        .unwrap();
    assert!(!output.status.success());

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["errorKind"], "spawn");
    assert_eq!(result["isCompleted"], true);
}
