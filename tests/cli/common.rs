use assert_cmd::Command;

/// `rule-debug` with a clean environment: no config overrides and no user
/// config directory.
pub fn rule_debug() -> Command {
    let mut cmd = Command::cargo_bin("rule-debug").unwrap();
    cmd.env_remove("RULE_DEBUG_PYTHON")
        .env_remove("RULE_DEBUG_TIMEOUT_MS")
        .env_remove("RULE_DEBUG_STEP_LIMIT")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent/rule-debug-test-config")
        .env("NO_COLOR", "1");
    cmd
}

pub fn fixture(name: &str) -> String {
    format!("tests/fixtures/scripts/{}", name)
}

pub fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! require_python {
    () => {
        if !crate::common::python_available() {
            eprintln!("python3 not found, skipping");
            return;
        }
    };
}
pub(crate) use require_python;
