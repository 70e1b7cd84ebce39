use crate::common::{fixture, rule_debug};
use predicates::prelude::*;
use serde_json::Value;

#[test]
fn test_instrument_prints_executable_script() {
    rule_debug()
        .args(["instrument", &fixture("loop.py")])
        .assert()
        .success()
        .stdout(predicate::str::contains("_CONFIG_JSON = "))
        .stdout(predicate::str::contains("_PROGRAM = "))
        .stdout(predicate::str::contains("__step_control__(\\\"STMT_3\\\""))
        .stdout(predicate::str::contains("class StepController"));
}

#[test]
fn test_instrument_batch_packaging() {
    rule_debug()
        .args(["instrument", &fixture("loop.py"), "--packaging", "batch-trace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("batch_trace"));
}

#[test]
fn test_hook_table() {
    rule_debug()
        .args(["instrument", &fixture("loop.py"), "--hooks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("STEP ID"))
        .stdout(predicate::str::contains("STMT_1"))
        .stdout(predicate::str::contains("total += i"))
        .stdout(predicate::str::contains("STMT_2").not());
}

#[test]
fn test_hook_table_json_with_source_map() {
    let output = rule_debug()
        .args([
            "instrument",
            &fixture("loop.py"),
            "--hooks",
            "--output",
            "json",
            "--source-map",
            &fixture("loop.map.json"),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let hooks: Value = serde_json::from_slice(&output.stdout).unwrap();
    let origins: Vec<u64> = hooks
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["origin_line"].as_u64().unwrap())
        .collect();
    assert_eq!(origins, vec![10, 12, 14]);
}

#[test]
fn test_instrumentation_error_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.py");
    std::fs::write(&path, "if ready:\nprint('no body')\n").unwrap();

    rule_debug()
        .args(["instrument", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Instrumentation failed at line 1"));
}
