use assert_cmd::Command;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;

const SCHEMA_PATH: &str = "tests/schemas/step_result.json";

fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn assert_matches_schema(json_val: &Value) {
    let schema_content = fs::read_to_string(SCHEMA_PATH).expect("Failed to read schema file");
    let schema_json: Value =
        serde_json::from_str(&schema_content).expect("Failed to parse schema JSON");

    let compiled = JSONSchema::compile(&schema_json).expect("Failed to compile schema");
    let result = compiled.validate(json_val);

    if let Err(errors) = result {
        let mut error_msgs = Vec::new();
        for error in errors {
            error_msgs.push(format!(
                "Property: {}, Error: {}",
                error.instance_path, error
            ));
        }
        panic!("JSON Schema validation failed:\n{}", error_msgs.join("\n"));
    }
}

fn request_output(stdin: &str) -> Value {
    let mut cmd = Command::cargo_bin("rule-debug").unwrap();
    let output = cmd
        .arg("--quiet")
        .arg("request")
        .env("XDG_CONFIG_HOME", "/nonexistent/rule-debug-test-config")
        .write_stdin(stdin)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8(output.stdout).expect("Stdout is not valid UTF-8");
    serde_json::from_str(&stdout)
        .unwrap_or_else(|_| panic!("Failed to parse JSON output: {}", stdout))
}

#[test]
fn test_failure_output_schema_validation() {
    let json_val = request_output(r#"{"mode": "step"}"#);
    assert_eq!(json_val["success"], false);
    assert_matches_schema(&json_val);
}

#[test]
fn test_library_results_match_schema() {
    let completed = rule_debugger::StepResult::from_run("done\n", "", Some(0), None);
    assert_matches_schema(&serde_json::to_value(&completed).unwrap());

    let crashed = rule_debugger::StepResult::from_run("", "Killed", None, None);
    assert_matches_schema(&serde_json::to_value(&crashed).unwrap());
}

#[test]
fn test_pause_and_error_output_schema_validation() {
    if !python_available() {
        eprintln!("python3 not found, skipping");
        return;
    }

    let paused = request_output(
        r#"{"sourceText": "x = 1\ny = x + 1\n", "mode": "step", "currentStep": 1, "sessionId": "schema"}"#,
    );
    assert_eq!(paused["stopReason"], "step");
    assert_matches_schema(&paused);

    let failed = request_output(
        r#"{"sourceText": "x = 1\nraise RuntimeError('bad rule')\n", "mode": "continue", "sessionId": "schema"}"#,
    );
    assert_eq!(failed["errorKind"], "userCode");
    assert_matches_schema(&failed);
}
