//! Assembles the executable script handed to the interpreter.
//!
//! The script is three parts: the run configuration and the instrumented
//! program body (both embedded as string literals), followed by the
//! step-control runtime. Embedding the body instead of splicing it into a
//! `try:` block keeps every user line byte-identical; the runtime compiles
//! and executes it inside its own top-level `try/except`.

use crate::debugger::StepMode;
use crate::instrument::{python_str, InstrumentedProgram};
use crate::{DebuggerError, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// The step-control runtime, appended verbatim to every script.
pub const STEP_CONTROL_RUNTIME: &str = include_str!("step_control.py");

/// Filename the program body is compiled under; tracebacks filter on it.
pub const PROGRAM_NAME: &str = "<rule>";

/// How the hook behaves once it decides to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Packaging {
    /// Stop the program at the first pause point and report it.
    Interactive,
    /// Never stop early (except at the step limit); report every step.
    BatchTrace,
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Packaging::Interactive => write!(f, "interactive"),
            Packaging::BatchTrace => write!(f, "batch-trace"),
        }
    }
}

/// Run parameters baked into one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub mode: StepMode,
    pub packaging: Packaging,
    /// Step the caller is currently paused at (0 before the first step).
    pub current_step: u64,
    pub step_limit: u64,
    pub breakpoints: BTreeSet<usize>,
    pub preview_limit: usize,
}

impl RunSettings {
    pub fn interactive(mode: StepMode, current_step: u64, step_limit: u64) -> Self {
        Self {
            mode,
            packaging: Packaging::Interactive,
            current_step,
            step_limit,
            breakpoints: BTreeSet::new(),
            preview_limit: 200,
        }
    }

    pub fn batch_trace(step_limit: u64) -> Self {
        Self {
            mode: StepMode::Initialize,
            packaging: Packaging::BatchTrace,
            current_step: 0,
            step_limit,
            breakpoints: BTreeSet::new(),
            preview_limit: 200,
        }
    }

    pub fn with_breakpoints(mut self, breakpoints: BTreeSet<usize>) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub fn with_preview_limit(mut self, preview_limit: usize) -> Self {
        self.preview_limit = preview_limit;
        self
    }

    /// Step at which a `step` request pauses.
    pub fn target_step(&self) -> u64 {
        match self.mode {
            StepMode::Step => self.current_step + 1,
            StepMode::Continue | StepMode::Initialize => self.step_limit,
        }
    }
}

#[derive(Serialize)]
struct ScriptConfig<'a> {
    mode: StepMode,
    packaging: Packaging,
    target_step: u64,
    resume_after: u64,
    step_limit: u64,
    breakpoints: &'a BTreeSet<usize>,
    preview_limit: usize,
    script_name: &'static str,
    line_map: &'a [usize],
}

/// Build the complete interpreter input for `program`.
pub fn assemble(program: &InstrumentedProgram, settings: &RunSettings) -> Result<String> {
    let config = ScriptConfig {
        mode: settings.mode,
        packaging: settings.packaging,
        target_step: settings.target_step(),
        resume_after: settings.current_step,
        step_limit: settings.step_limit,
        breakpoints: &settings.breakpoints,
        preview_limit: settings.preview_limit,
        script_name: PROGRAM_NAME,
        line_map: &program.line_map,
    };
    let config_json = serde_json::to_string(&config).map_err(|e| {
        DebuggerError::Instrumentation {
            line: 0,
            reason: format!("failed to encode run configuration: {}", e),
        }
    })?;

    let mut script = String::with_capacity(
        STEP_CONTROL_RUNTIME.len() + program.body.len() * 2 + config_json.len() + 128,
    );
    script.push_str("# -*- coding: utf-8 -*-\n");
    script.push_str("# Generated by rule-debugger. Do not edit.\n");
    script.push_str("_CONFIG_JSON = ");
    script.push_str(&python_str(&config_json));
    script.push('\n');
    script.push_str("_PROGRAM = ");
    script.push_str(&python_str(&program.body));
    script.push('\n');
    script.push_str(STEP_CONTROL_RUNTIME);
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::Instrumenter;

    #[test]
    fn test_target_step_per_mode() {
        assert_eq!(RunSettings::interactive(StepMode::Step, 0, 100).target_step(), 1);
        assert_eq!(RunSettings::interactive(StepMode::Step, 4, 100).target_step(), 5);
        assert_eq!(RunSettings::interactive(StepMode::Continue, 4, 100).target_step(), 100);
        assert_eq!(RunSettings::batch_trace(50).target_step(), 50);
    }

    #[test]
    fn test_assemble_embeds_config_and_program() {
        let program = Instrumenter::default()
            .instrument("name = \"x\"\nprint(name)", None)
            .unwrap();
        let settings = RunSettings::interactive(StepMode::Continue, 2, 1000)
            .with_breakpoints([2].into_iter().collect());
        let script = assemble(&program, &settings).unwrap();

        let config_line = script
            .lines()
            .find(|l| l.starts_with("_CONFIG_JSON = "))
            .unwrap();
        let literal: String =
            serde_json::from_str(config_line.trim_start_matches("_CONFIG_JSON = ")).unwrap();
        let config: serde_json::Value = serde_json::from_str(&literal).unwrap();
        assert_eq!(config["mode"], "continue");
        assert_eq!(config["packaging"], "interactive");
        assert_eq!(config["target_step"], 1000);
        assert_eq!(config["resume_after"], 2);
        assert_eq!(config["breakpoints"], serde_json::json!([2]));
        assert_eq!(config["line_map"], serde_json::json!([1, 1, 2, 2]));

        let program_line = script.lines().find(|l| l.starts_with("_PROGRAM = ")).unwrap();
        let body: String =
            serde_json::from_str(program_line.trim_start_matches("_PROGRAM = ")).unwrap();
        assert_eq!(body, program.body);

        assert!(script.ends_with(STEP_CONTROL_RUNTIME));
    }

    #[test]
    fn test_runtime_speaks_the_wire_markers() {
        use crate::protocol::Marker;
        for marker in Marker::ALL {
            assert!(STEP_CONTROL_RUNTIME.contains(marker.as_str()));
        }
        assert!(STEP_CONTROL_RUNTIME.contains(crate::instrument::HOOK_NAME));
    }
}
