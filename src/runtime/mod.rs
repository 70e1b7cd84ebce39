//! Runtime execution sub-system.
//!
//! Sub-modules:
//! - [`executor`] — Public façade; coordinates all sub-modules.
//! - [`loader`]   — Script packaging around the step-control runtime.
//! - [`invoker`]  — Interpreter invocation with timeout protection.
//! - [`parser`]   — Terminal event extraction from captured stdout.
//! - [`result`]   — Caller-facing result types.

pub mod executor;
pub mod invoker;
pub mod loader;
pub mod parser;
pub mod result;

pub use executor::ScriptExecutor;
pub use invoker::{ProcessOutput, Supervisor};
pub use loader::{Packaging, RunSettings};
pub use result::{StepResult, StopReason, TraceResult};
