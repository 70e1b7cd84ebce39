use crate::common::rule_debug;
use predicates::prelude::*;

#[test]
fn test_help_lists_subcommands() {
    rule_debug()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("step"))
        .stdout(predicate::str::contains("trace"))
        .stdout(predicate::str::contains("instrument"))
        .stdout(predicate::str::contains("request"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_step_help_documents_flags() {
    rule_debug()
        .args(["step", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--breakpoint"))
        .stdout(predicate::str::contains("--current-step"))
        .stdout(predicate::str::contains("--source-map"))
        .stdout(predicate::str::contains("initialize"));
}

#[test]
fn test_version() {
    rule_debug()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("rule-debug "));
}

#[test]
fn test_completions() {
    rule_debug()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rule-debug"));
}
