use crate::cli::output::{self, OutputFormat};
use crate::cli::{
    CompletionsArgs, Cli, InstrumentArgs, RequestArgs, StepArgs, TraceArgs, Verbosity,
};
use crate::config::DebuggerConfig;
use crate::debugger::{BreakpointSet, Debugger, StepRequest};
use crate::runtime::{loader, Packaging, ScriptExecutor, StepResult};
use crate::source_map::SourceMap;
use anyhow::{Context, Result};
use clap::CommandFactory;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Run one step request from the command line. Returns whether it succeeded.
pub async fn step(args: StepArgs, config: &DebuggerConfig, verbosity: Verbosity) -> Result<bool> {
    let source = read_source(&args.file)?;
    let mut request = StepRequest::new(source, args.mode, args.session_id)
        .with_current_step(args.current_step)
        .with_breakpoints(breakpoints(&args.breakpoints)?);
    if let Some(map) = load_source_map(args.source_map.as_deref())? {
        request = request.with_source_map(map);
    }

    info!("Stepping {}", args.file.display());
    let debugger = Debugger::new(config);
    let progress = output::spinner("Running script...", verbosity.is_quiet());
    let result = debugger.debug_step(&request).await;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    match args.output {
        OutputFormat::Json => output::print_json(&result)?,
        OutputFormat::Pretty => print!("{}", output::render_step_result(&result)),
    }
    Ok(result.success)
}

/// Trace every step of a script.
pub async fn trace(args: TraceArgs, config: &DebuggerConfig, verbosity: Verbosity) -> Result<bool> {
    let source = read_source(&args.file)?;
    let source_map = load_source_map(args.source_map.as_deref())?;
    let breakpoints = breakpoints(&args.breakpoints)?;

    info!("Tracing {}", args.file.display());
    let debugger = Debugger::new(config);
    let progress = output::spinner("Tracing script...", verbosity.is_quiet());
    let result = debugger
        .trace_all(&source, source_map.as_ref(), &breakpoints)
        .await;
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    match args.output {
        OutputFormat::Json => output::print_json(&result)?,
        OutputFormat::Pretty => print!("{}", output::render_trace(&result)),
    }
    Ok(result.success)
}

/// Print the instrumented script, or its hook table.
pub fn instrument(args: InstrumentArgs, config: &DebuggerConfig) -> Result<bool> {
    let source = read_source(&args.file)?;
    let source_map = load_source_map(args.source_map.as_deref())?;
    let executor = ScriptExecutor::new(config);
    let program = executor.instrument(&source, source_map.as_ref())?;

    if args.hooks {
        match args.output {
            OutputFormat::Json => output::print_json(&program.hooks)?,
            OutputFormat::Pretty => print!("{}", output::render_hooks(&program.hooks)),
        }
        return Ok(true);
    }

    let settings = match args.packaging {
        Packaging::Interactive => {
            executor.interactive_settings(args.mode, args.current_step, Default::default())
        }
        Packaging::BatchTrace => executor.trace_settings(Default::default()),
    };
    print!("{}", loader::assemble(&program, &settings)?);
    Ok(true)
}

/// Serve one JSON request; malformed requests still produce a JSON result.
pub async fn request(args: RequestArgs, config: &DebuggerConfig) -> Result<bool> {
    let json = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {:?}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            buf
        }
    };

    let result = match StepRequest::from_json(&json) {
        Ok(request) => Debugger::new(config).debug_step(&request).await,
        Err(e) => StepResult::failure(&e, ""),
    };
    output::print_json(&result)?;
    Ok(result.success)
}

pub fn completions(args: CompletionsArgs) -> Result<bool> {
    let mut command = Cli::command();
    clap_complete::generate(args.shell, &mut command, "rule-debug", &mut std::io::stdout());
    Ok(true)
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read script file: {:?}", path))
}

fn load_source_map(path: Option<&Path>) -> Result<Option<SourceMap>> {
    path.map(|p| {
        SourceMap::from_file(p).with_context(|| format!("Failed to load source map: {:?}", p))
    })
    .transpose()
}

fn breakpoints(lines: &[usize]) -> Result<BreakpointSet> {
    let mut set = BreakpointSet::new();
    for &line in lines {
        set.add(line)?;
    }
    Ok(set)
}
