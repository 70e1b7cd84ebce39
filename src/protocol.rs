//! Wire framing between the instrumented child process and the debugger.
//!
//! The child writes exactly one terminal event to stdout: a marker line
//! followed by one JSON payload.
//!
//! ```text
//! __STEP_PAUSE__
//! {"type":"step_pause","step_info":{...},"hit_breakpoint":false,"total_steps":3,"can_continue":true}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Captured variables, keyed by name.
pub type Variables = BTreeMap<String, serde_json::Value>;

/// Literal marker lines that introduce a terminal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Pause,
    Complete,
    Error,
}

impl Marker {
    pub const ALL: [Marker; 3] = [Marker::Pause, Marker::Complete, Marker::Error];

    pub fn as_str(self) -> &'static str {
        match self {
            Marker::Pause => "__STEP_PAUSE__",
            Marker::Complete => "__EXECUTION_COMPLETE__",
            Marker::Error => "__EXECUTION_ERROR__",
        }
    }

    pub fn from_line(line: &str) -> Option<Marker> {
        let line = line.trim();
        Self::ALL.into_iter().find(|m| m.as_str() == line)
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed instrumented call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step_id: String,
    pub step_number: u64,
    pub generated_line: usize,
    pub origin_line: usize,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mode: String,
    /// The origin line of this step carries a breakpoint.
    #[serde(default)]
    pub on_breakpoint: bool,
}

/// Why an interactive run stopped before its natural end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    Step,
    Breakpoint,
    StepLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausePayload {
    pub step_info: StepRecord,
    pub hit_breakpoint: bool,
    pub total_steps: u64,
    #[serde(default = "default_true")]
    pub can_continue: bool,
    #[serde(default)]
    pub stop_reason: Option<PauseReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePayload {
    pub total_steps: u64,
    #[serde(default)]
    pub final_variables: Variables,
    #[serde(default = "default_true")]
    pub is_completed: bool,
    /// Full step log, only present for batch-trace runs.
    #[serde(default)]
    pub steps: Vec<StepRecord>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default)]
    pub traceback: String,
    #[serde(default)]
    pub step: u64,
    /// Generated line of the innermost failing user frame, when known.
    #[serde(default)]
    pub line: Option<usize>,
    #[serde(default)]
    pub steps: Vec<StepRecord>,
}

fn default_true() -> bool {
    true
}

/// The single event that ends a child-process run.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalEvent {
    Pause(PausePayload),
    Complete(CompletePayload),
    Error(ErrorPayload),
}

impl TerminalEvent {
    pub fn marker(&self) -> Marker {
        match self {
            TerminalEvent::Pause(_) => Marker::Pause,
            TerminalEvent::Complete(_) => Marker::Complete,
            TerminalEvent::Error(_) => Marker::Error,
        }
    }

    /// Render the event exactly as the step-control runtime prints it.
    pub fn to_frame(&self) -> String {
        let payload = match self {
            TerminalEvent::Pause(p) => tagged(p, Some("step_pause")),
            TerminalEvent::Complete(p) => tagged(p, Some("execution_complete")),
            TerminalEvent::Error(p) => tagged(p, None),
        };
        format!("\n{}\n{}\n", self.marker(), payload)
    }
}

fn tagged<T: Serialize>(payload: &T, tag: Option<&str>) -> String {
    let mut value = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
    if let (Some(tag), Some(object)) = (tag, value.as_object_mut()) {
        object.insert("type".to_string(), serde_json::Value::String(tag.to_string()));
    }
    value.to_string()
}
