//! Request types accepted at the debugger boundary.

use super::breakpoint::BreakpointSet;
use crate::source_map::SourceMap;
use crate::{DebuggerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far a request should run before reporting back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Pause at the step after `current_step`.
    Step,
    /// Run to the next breakpoint after `current_step`.
    Continue,
    /// Run straight through to seed initial state.
    Initialize,
}

impl StepMode {
    pub fn as_str(self) -> &'static str {
        match self {
            StepMode::Step => "step",
            StepMode::Continue => "continue",
            StepMode::Initialize => "initialize",
        }
    }
}

impl fmt::Display for StepMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One debug request. Immutable once built; `session_id` is only echoed
/// into logs and temp-file names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub source_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMap>,
    pub mode: StepMode,
    #[serde(default)]
    pub current_step: u64,
    #[serde(default)]
    pub breakpoints: BreakpointSet,
    pub session_id: String,
}

impl StepRequest {
    pub fn new(source_text: impl Into<String>, mode: StepMode, session_id: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            source_map: None,
            mode,
            current_step: 0,
            breakpoints: BreakpointSet::new(),
            session_id: session_id.into(),
        }
    }

    pub fn with_current_step(mut self, current_step: u64) -> Self {
        self.current_step = current_step;
        self
    }

    pub fn with_breakpoints(mut self, breakpoints: BreakpointSet) -> Self {
        self.breakpoints = breakpoints;
        self
    }

    pub fn with_source_map(mut self, source_map: SourceMap) -> Self {
        self.source_map = Some(source_map);
        self
    }

    /// Decode a request, naming the offending field on failure.
    pub fn from_json(json: &str) -> Result<Self> {
        let de = &mut serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(de).map_err(|e| {
            let path = e.path().to_string();
            DebuggerError::Validation(format!("{} (at {})", e.into_inner(), path))
        })
    }

    /// Reject requests that cannot be served before doing any work.
    pub fn validate(&self, step_limit: u64) -> Result<()> {
        if self.source_text.trim().is_empty() {
            return Err(DebuggerError::Validation("sourceText is empty".to_string()));
        }
        if self.session_id.trim().is_empty() {
            return Err(DebuggerError::Validation("sessionId is empty".to_string()));
        }
        if self.breakpoints.contains(0) {
            return Err(DebuggerError::Validation(
                "breakpoint lines are 1-based".to_string(),
            ));
        }
        if self.mode == StepMode::Step && self.current_step >= step_limit {
            return Err(DebuggerError::Validation(format!(
                "currentStep {} is at or beyond the step limit {}",
                self.current_step, step_limit
            )));
        }
        Ok(())
    }
}
