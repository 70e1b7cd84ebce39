//! Typed outcomes handed back to callers.
//!
//! Both result types are derived from one child run (stdout, stderr, exit
//! code) and never fail to build: decoding problems become `success: false`
//! with an [`ErrorKind`].

use super::parser;
use crate::protocol::{
    CompletePayload, ErrorPayload, Marker, PausePayload, PauseReason, StepRecord, TerminalEvent,
    Variables,
};
use crate::source_map::{self, SourceMap};
use crate::{DebuggerError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const UNKNOWN_ERROR: &str = "unknown execution error";

/// Why a run stopped where it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    Step,
    Breakpoint,
    StepLimit,
    Completed,
    Error,
}

impl From<PauseReason> for StopReason {
    fn from(reason: PauseReason) -> Self {
        match reason {
            PauseReason::Step => StopReason::Step,
            PauseReason::Breakpoint => StopReason::Breakpoint,
            PauseReason::StepLimit => StopReason::StepLimit,
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::Step => "step",
            StopReason::Breakpoint => "breakpoint",
            StopReason::StepLimit => "step limit",
            StopReason::Completed => "completed",
            StopReason::Error => "error",
        };
        f.write_str(text)
    }
}

/// Outcome of one interactive debug request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub success: bool,
    pub current_step: u64,
    pub generated_line: usize,
    pub origin_line: usize,
    pub variables: Variables,
    pub is_completed: bool,
    pub hit_breakpoint: bool,
    pub stop_reason: StopReason,
    #[serde(default)]
    pub description: String,
    pub total_steps: u64,
    pub can_continue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(default)]
    pub program_output: String,
    #[serde(default)]
    pub raw_output: String,
}

impl StepResult {
    /// Interpret one finished interactive run.
    pub fn from_run(
        stdout: &str,
        stderr: &str,
        exit_code: Option<i32>,
        source_map: Option<&SourceMap>,
    ) -> Self {
        let frame = match parser::find_frame(stdout) {
            Some(frame) => frame,
            None => return Self::without_marker(stdout, stderr, exit_code),
        };
        let program_output = parser::program_output(stdout, &frame).to_string();

        let mut result = match frame.decode() {
            Ok(TerminalEvent::Pause(pause)) => Self::paused(pause, source_map),
            Ok(TerminalEvent::Complete(complete)) => Self::completed(complete),
            Ok(TerminalEvent::Error(error)) => Self::errored(error, source_map),
            Err(e) => return Self::failure(&e, stdout),
        };
        result.program_output = program_output;
        result.raw_output = stdout.to_string();
        result
    }

    /// Result for a request that failed outside the child program.
    pub fn failure(error: &DebuggerError, raw_output: &str) -> Self {
        Self {
            success: false,
            is_completed: true,
            stop_reason: StopReason::Error,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            raw_output: raw_output.to_string(),
            ..Self::blank()
        }
    }

    fn blank() -> Self {
        Self {
            success: true,
            current_step: 0,
            generated_line: 0,
            origin_line: 0,
            variables: Variables::new(),
            is_completed: false,
            hit_breakpoint: false,
            stop_reason: StopReason::Completed,
            description: String::new(),
            total_steps: 0,
            can_continue: false,
            error: None,
            error_kind: None,
            traceback: None,
            program_output: String::new(),
            raw_output: String::new(),
        }
    }

    fn paused(pause: PausePayload, source_map: Option<&SourceMap>) -> Self {
        let record = resolved(pause.step_info, source_map);
        let stop_reason = match pause.stop_reason {
            Some(reason) => reason.into(),
            None if pause.hit_breakpoint => StopReason::Breakpoint,
            None => StopReason::Step,
        };
        Self {
            current_step: record.step_number,
            generated_line: record.generated_line,
            origin_line: record.origin_line,
            variables: record.variables,
            description: record.description,
            hit_breakpoint: pause.hit_breakpoint,
            stop_reason,
            total_steps: pause.total_steps,
            can_continue: pause.can_continue,
            ..Self::blank()
        }
    }

    fn completed(complete: CompletePayload) -> Self {
        Self {
            current_step: complete.total_steps,
            variables: complete.final_variables,
            is_completed: complete.is_completed,
            total_steps: complete.total_steps,
            ..Self::blank()
        }
    }

    fn errored(error: ErrorPayload, source_map: Option<&SourceMap>) -> Self {
        let generated_line = error.line.unwrap_or(0);
        Self {
            success: false,
            current_step: error.step,
            generated_line,
            origin_line: error_origin(generated_line, source_map),
            is_completed: true,
            stop_reason: StopReason::Error,
            total_steps: error.step,
            error: Some(error.error),
            error_kind: Some(ErrorKind::UserCode),
            traceback: Some(error.traceback),
            ..Self::blank()
        }
    }

    fn without_marker(stdout: &str, stderr: &str, exit_code: Option<i32>) -> Self {
        if exit_code == Some(0) {
            return Self {
                is_completed: true,
                program_output: stdout.to_string(),
                raw_output: stdout.to_string(),
                ..Self::blank()
            };
        }
        let error = no_marker_error(stderr, exit_code);
        warn!("Child exited without a terminal event: {}", error);
        Self::failure(&error, stdout)
    }
}

/// Outcome of one batch trace: every step the program executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceResult {
    pub success: bool,
    pub steps: Vec<StepRecord>,
    pub total_steps: u64,
    pub final_variables: Variables,
    /// The run was cut off at the step limit.
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(default)]
    pub raw_output: String,
}

impl TraceResult {
    pub fn from_run(
        stdout: &str,
        stderr: &str,
        exit_code: Option<i32>,
        source_map: Option<&SourceMap>,
    ) -> Self {
        let event = match parser::parse_event(stdout) {
            Ok(Some(event)) => event,
            Ok(None) if exit_code == Some(0) => {
                return Self {
                    raw_output: stdout.to_string(),
                    ..Self::empty()
                }
            }
            Ok(None) => return Self::failure(&no_marker_error(stderr, exit_code), stdout),
            Err(e) => return Self::failure(&e, stdout),
        };

        let mut result = match event {
            TerminalEvent::Complete(complete) => Self {
                steps: resolve_all(complete.steps, source_map),
                total_steps: complete.total_steps,
                final_variables: complete.final_variables,
                truncated: complete.truncated,
                ..Self::empty()
            },
            TerminalEvent::Error(error) => Self {
                success: false,
                steps: resolve_all(error.steps, source_map),
                total_steps: error.step,
                error: Some(error.error),
                error_kind: Some(ErrorKind::UserCode),
                traceback: Some(error.traceback),
                ..Self::empty()
            },
            TerminalEvent::Pause(_) => {
                let error = DebuggerError::ProtocolParse {
                    marker: Marker::Pause.as_str(),
                    reason: "batch trace runs never pause".to_string(),
                };
                return Self::failure(&error, stdout);
            }
        };
        result.raw_output = stdout.to_string();
        result
    }

    pub fn failure(error: &DebuggerError, raw_output: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            raw_output: raw_output.to_string(),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            success: true,
            steps: Vec::new(),
            total_steps: 0,
            final_variables: Variables::new(),
            truncated: false,
            error: None,
            error_kind: None,
            traceback: None,
            raw_output: String::new(),
        }
    }
}

fn resolved(mut record: StepRecord, source_map: Option<&SourceMap>) -> StepRecord {
    if record.origin_line == 0 {
        record.origin_line = source_map::resolve(record.generated_line, source_map);
    }
    record
}

fn resolve_all(records: Vec<StepRecord>, source_map: Option<&SourceMap>) -> Vec<StepRecord> {
    records
        .into_iter()
        .map(|record| resolved(record, source_map))
        .collect()
}

fn error_origin(generated_line: usize, source_map: Option<&SourceMap>) -> usize {
    if generated_line == 0 {
        0
    } else {
        source_map::resolve(generated_line, source_map)
    }
}

fn no_marker_error(stderr: &str, exit_code: Option<i32>) -> DebuggerError {
    let stderr = stderr.trim();
    DebuggerError::NonZeroExit {
        code: exit_code.map_or_else(|| "signal".to_string(), |c| format!("code {}", c)),
        stderr: if stderr.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            stderr.to_string()
        },
    }
}
