//! Public boundary of the stepping debugger.
//!
//! Every request is served by a fresh child process; nothing is kept
//! between calls. Both entry points always return a result value: failures
//! are reported through `success: false` and an error kind.

pub mod breakpoint;
pub mod state;

pub use breakpoint::BreakpointSet;
pub use state::{StepMode, StepRequest};

use crate::config::DebuggerConfig;
use crate::runtime::{ScriptExecutor, StepResult, TraceResult};
use crate::source_map::SourceMap;
use tracing::{info, warn};

pub struct Debugger {
    executor: ScriptExecutor,
}

impl Debugger {
    pub fn new(config: &DebuggerConfig) -> Self {
        Self {
            executor: ScriptExecutor::new(config),
        }
    }

    /// Replay the program and stop where `request` asks.
    #[tracing::instrument(
        skip_all,
        fields(session = %request.session_id, mode = %request.mode, current_step = request.current_step)
    )]
    pub async fn debug_step(&self, request: &StepRequest) -> StepResult {
        if let Err(e) = request.validate(self.executor.step_limit()) {
            warn!("Rejected request: {}", e);
            return StepResult::failure(&e, "");
        }

        let settings = self.executor.interactive_settings(
            request.mode,
            request.current_step,
            request.breakpoints.as_set().clone(),
        );
        let outcome = self
            .executor
            .run_step(
                &request.source_text,
                request.source_map.as_ref(),
                &settings,
                &request.session_id,
            )
            .await;

        match outcome {
            Ok(result) => {
                info!(
                    success = result.success,
                    step = result.current_step,
                    stop = %result.stop_reason,
                    "Step request finished"
                );
                result
            }
            Err(e) => {
                warn!("Step request failed: {}", e);
                StepResult::failure(&e, "")
            }
        }
    }

    /// Run the whole program once and return every executed step.
    #[tracing::instrument(skip_all, fields(breakpoints = breakpoints.count()))]
    pub async fn trace_all(
        &self,
        source_text: &str,
        source_map: Option<&SourceMap>,
        breakpoints: &BreakpointSet,
    ) -> TraceResult {
        if source_text.trim().is_empty() {
            let e = crate::DebuggerError::Validation("sourceText is empty".to_string());
            return TraceResult::failure(&e, "");
        }

        let settings = self.executor.trace_settings(breakpoints.as_set().clone());
        match self
            .executor
            .run_trace(source_text, source_map, &settings, "trace")
            .await
        {
            Ok(result) => {
                info!(
                    success = result.success,
                    steps = result.steps.len(),
                    truncated = result.truncated,
                    "Trace finished"
                );
                result
            }
            Err(e) => {
                warn!("Trace failed: {}", e);
                TraceResult::failure(&e, "")
            }
        }
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(&DebuggerConfig::default())
    }
}
