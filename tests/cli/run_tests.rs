use crate::common::{fixture, require_python, rule_debug};
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn test_step_json_output() {
    require_python!();
    let output = rule_debug()
        .args(["--quiet", "step", &fixture("scenario.py"), "--current-step", "1", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["currentStep"], 2);
    assert_eq!(result["variables"]["y"], 2);
    assert_eq!(result["stopReason"], "step");
}

#[test]
fn test_step_pretty_output() {
    require_python!();
    rule_debug()
        .args(["step", &fixture("loop.py"), "--mode", "continue", "-b", "12"])
        .args(["--source-map", &fixture("loop.map.json")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Breakpoint at step 2 (line 12, generated line 3)"))
        .stdout(predicate::str::contains("total = 0"));
}

#[test]
fn test_trace_lists_every_step() {
    require_python!();
    rule_debug()
        .args(["trace", &fixture("loop.py")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed 5 steps"))
        .stdout(predicate::str::contains("result = total * 2"));
}

#[test]
fn test_failing_script_exits_non_zero() {
    require_python!();
    rule_debug()
        .args(["step", &fixture("failing.py"), "--mode", "continue"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("ValueError: too big: 5"));
}

#[test]
fn test_request_from_file() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("request.json");
    std::fs::write(
        &path,
        r#"{"sourceText": "a = 2\nb = a * 21\n", "mode": "continue", "sessionId": "cli-test"}"#,
    )
    .unwrap();

    let output = rule_debug()
        .args(["request", path.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["isCompleted"], true);
    assert_eq!(result["variables"]["b"], 42);
}
