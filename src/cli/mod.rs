pub mod commands;
pub mod output;

use crate::config::DebuggerConfig;
use crate::debugger::StepMode;
use crate::runtime::Packaging;
use clap::{Args, Parser, Subcommand};
use output::OutputFormat;
use std::path::PathBuf;

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Default log filter directive for this level.
    pub fn to_log_level(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "rule_debugger=debug,info",
        }
    }

    pub fn is_quiet(self) -> bool {
        self == Verbosity::Quiet
    }
}

#[derive(Parser)]
#[command(name = "rule-debug")]
#[command(about = "Step through generated rule scripts one statement at a time", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        self.global.verbosity()
    }
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Suppress progress output and non-error logs
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./.rule-debug.toml, then the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Interpreter executable
    #[arg(long, global = true, env = "RULE_DEBUG_PYTHON", value_name = "PATH")]
    pub python: Option<String>,

    /// Wall-clock limit for one run, in milliseconds
    #[arg(long, global = true, env = "RULE_DEBUG_TIMEOUT_MS", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum number of steps one run may execute
    #[arg(long, global = true, env = "RULE_DEBUG_STEP_LIMIT", value_name = "N")]
    pub step_limit: Option<u64>,
}

impl GlobalArgs {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Resolve the configuration file and apply flag/env overrides.
    pub fn load_config(&self) -> crate::Result<DebuggerConfig> {
        let mut config = DebuggerConfig::discover(self.config.as_deref())?;
        if let Some(python) = &self.python {
            config.interpreter = python.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }
        if let Some(step_limit) = self.step_limit {
            config.step_limit = step_limit;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script up to the next pause point
    Step(StepArgs),

    /// Run a script once and print every executed step
    Trace(TraceArgs),

    /// Print the instrumented script without running it
    Instrument(InstrumentArgs),

    /// Serve one JSON step request (stdin or file) and print the JSON result
    Request(RequestArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct StepArgs {
    /// Generated script to debug
    pub file: PathBuf,

    #[arg(short, long, value_enum, default_value_t = StepMode::Step)]
    pub mode: StepMode,

    /// Step the caller is currently paused at
    #[arg(long, default_value_t = 0)]
    pub current_step: u64,

    /// Origin-line breakpoint (repeatable, or comma separated)
    #[arg(short, long = "breakpoint", value_name = "LINE", value_delimiter = ',')]
    pub breakpoints: Vec<usize>,

    /// JSON source map emitted by the generator
    #[arg(long, value_name = "FILE")]
    pub source_map: Option<PathBuf>,

    /// Correlation token echoed into logs
    #[arg(long, default_value = "cli")]
    pub session_id: String,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct TraceArgs {
    /// Generated script to trace
    pub file: PathBuf,

    /// Origin-line breakpoint, flagged on matching steps
    #[arg(short, long = "breakpoint", value_name = "LINE", value_delimiter = ',')]
    pub breakpoints: Vec<usize>,

    #[arg(long, value_name = "FILE")]
    pub source_map: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct InstrumentArgs {
    /// Generated script to instrument
    pub file: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub source_map: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Packaging::Interactive)]
    pub packaging: Packaging,

    /// Mode baked into the interactive script
    #[arg(short, long, value_enum, default_value_t = StepMode::Step)]
    pub mode: StepMode,

    #[arg(long, default_value_t = 0)]
    pub current_step: u64,

    /// Print the table of injected hooks instead of the script
    #[arg(long)]
    pub hooks: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,
}

#[derive(Args)]
pub struct RequestArgs {
    /// Request file; stdin when omitted
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
