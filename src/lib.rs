//! Replay-based stepping debugger for generated rule scripts.
//!
//! A rule written in some higher-level "origin" language is turned into a
//! Python script by an external generator. This crate rewrites that script
//! with step-control hooks, runs it in a time-bounded child interpreter and
//! decodes the single framed event the child prints before it exits.
//!
//! Reaching step `N` re-executes the program from the start; no process is
//! kept alive between requests.

pub mod cli;
pub mod config;
pub mod debugger;
pub mod instrument;
pub mod protocol;
pub mod runtime;
pub mod source_map;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::DebuggerConfig;
pub use debugger::{BreakpointSet, Debugger, StepMode, StepRequest};
pub use instrument::{InstrumentedProgram, Instrumenter};
pub use protocol::{StepRecord, TerminalEvent};
pub use runtime::{StepResult, StopReason, TraceResult};
pub use source_map::{SourceMap, SourceMapEntry};

/// Errors produced anywhere inside the debugger pipeline.
#[derive(Error, Debug)]
pub enum DebuggerError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Instrumentation failed at line {line}: {reason}")]
    Instrumentation { line: usize, reason: String },

    #[error("Failed to start interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Execution timed out after {0} ms")]
    Timeout(u64),

    #[error("Interpreter exited with {code}: {stderr}")]
    NonZeroExit { code: String, stderr: String },

    #[error("Malformed {marker} payload: {reason}")]
    ProtocolParse {
        marker: &'static str,
        reason: String,
    },

    #[error("{0}")]
    UserCode(String),

    #[error("Invalid source map: {0}")]
    SourceMap(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DebuggerError {
    /// Category of this error as reported to callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DebuggerError::Validation(_) => ErrorKind::Validation,
            DebuggerError::Instrumentation { .. } => ErrorKind::Instrumentation,
            DebuggerError::Spawn { .. } => ErrorKind::Spawn,
            DebuggerError::Timeout(_) => ErrorKind::Timeout,
            DebuggerError::NonZeroExit { .. } => ErrorKind::NonZeroExit,
            DebuggerError::ProtocolParse { .. } => ErrorKind::ProtocolParse,
            DebuggerError::UserCode(_) => ErrorKind::UserCode,
            DebuggerError::SourceMap(_) => ErrorKind::Validation,
            DebuggerError::Config(_) => ErrorKind::Config,
            DebuggerError::Io(_) => ErrorKind::Io,
        }
    }
}

/// Serialisable error category carried by failed results.
///
/// `UserCode` is the expected failure (the rule itself raised); every other
/// kind points at the debugger or its environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    Instrumentation,
    Spawn,
    Timeout,
    NonZeroExit,
    ProtocolParse,
    UserCode,
    Config,
    Io,
}

impl ErrorKind {
    /// True when the failure comes from the rule being debugged rather than
    /// from the debugger infrastructure.
    pub fn is_user_error(self) -> bool {
        matches!(self, ErrorKind::UserCode)
    }
}

pub type Result<T> = std::result::Result<T, DebuggerError>;
