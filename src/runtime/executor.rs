use super::invoker::{ProcessOutput, Supervisor};
use super::loader::{self, RunSettings};
use super::result::{StepResult, TraceResult};
use crate::config::DebuggerConfig;
use crate::debugger::StepMode;
use crate::instrument::{InstrumentOptions, InstrumentedProgram, Instrumenter};
use crate::source_map::SourceMap;
use crate::Result;
use std::collections::BTreeSet;
use tracing::info;

/// Runs generated scripts: instrument, assemble, spawn, decode.
pub struct ScriptExecutor {
    instrumenter: Instrumenter,
    supervisor: Supervisor,
    step_limit: u64,
    preview_limit: usize,
}

impl ScriptExecutor {
    pub fn new(config: &DebuggerConfig) -> Self {
        Self {
            instrumenter: Instrumenter::new(InstrumentOptions {
                description_max_len: config.description_max_len,
            }),
            supervisor: Supervisor::from_config(config),
            step_limit: config.step_limit,
            preview_limit: config.preview_limit,
        }
    }

    pub fn step_limit(&self) -> u64 {
        self.step_limit
    }

    /// Settings for an interactive request.
    pub fn interactive_settings(
        &self,
        mode: StepMode,
        current_step: u64,
        breakpoints: BTreeSet<usize>,
    ) -> RunSettings {
        RunSettings::interactive(mode, current_step, self.step_limit)
            .with_breakpoints(breakpoints)
            .with_preview_limit(self.preview_limit)
    }

    /// Settings for a batch trace.
    pub fn trace_settings(&self, breakpoints: BTreeSet<usize>) -> RunSettings {
        RunSettings::batch_trace(self.step_limit)
            .with_breakpoints(breakpoints)
            .with_preview_limit(self.preview_limit)
    }

    pub fn instrument(
        &self,
        source: &str,
        source_map: Option<&SourceMap>,
    ) -> Result<InstrumentedProgram> {
        self.instrumenter.instrument(source, source_map)
    }

    /// Build the exact script the interpreter would run.
    pub fn prepare(
        &self,
        source: &str,
        source_map: Option<&SourceMap>,
        settings: &RunSettings,
    ) -> Result<String> {
        let program = self.instrument(source, source_map)?;
        loader::assemble(&program, settings)
    }

    /// Execute one interactive request.
    ///
    /// Errors are infrastructure failures (instrumentation, spawn, timeout);
    /// everything the child reports is folded into the [`StepResult`].
    pub async fn run_step(
        &self,
        source: &str,
        source_map: Option<&SourceMap>,
        settings: &RunSettings,
        label: &str,
    ) -> Result<StepResult> {
        let output = self.execute(source, source_map, settings, label).await?;
        Ok(StepResult::from_run(
            &output.stdout,
            &output.stderr,
            output.exit_code,
            source_map,
        ))
    }

    /// Execute the whole program once, recording every step.
    pub async fn run_trace(
        &self,
        source: &str,
        source_map: Option<&SourceMap>,
        settings: &RunSettings,
        label: &str,
    ) -> Result<TraceResult> {
        let output = self.execute(source, source_map, settings, label).await?;
        Ok(TraceResult::from_run(
            &output.stdout,
            &output.stderr,
            output.exit_code,
            source_map,
        ))
    }

    async fn execute(
        &self,
        source: &str,
        source_map: Option<&SourceMap>,
        settings: &RunSettings,
        label: &str,
    ) -> Result<ProcessOutput> {
        let script = self.prepare(source, source_map, settings)?;
        info!(
            mode = %settings.mode,
            packaging = %settings.packaging,
            current_step = settings.current_step,
            breakpoints = settings.breakpoints.len(),
            "Executing instrumented script"
        );
        self.supervisor.run(&script, label).await
    }
}
