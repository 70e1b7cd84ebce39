//! Rendering of results for the terminal.

use crate::instrument::HookSite;
use crate::protocol::{StepRecord, Variables};
use crate::runtime::{StepResult, StopReason, TraceResult};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use itertools::Itertools;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human readable, coloured when stdout is a terminal
    Pretty,
    /// One JSON document on stdout
    Json,
}

/// Spinner on stderr while a child runs; hidden when stderr is not a TTY.
pub fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn render_step_result(result: &StepResult) -> String {
    let mut out = String::new();

    let status = match result.stop_reason {
        StopReason::Step => "Paused".green().bold(),
        StopReason::Breakpoint => "Breakpoint".yellow().bold(),
        StopReason::StepLimit => "Step limit reached".yellow().bold(),
        StopReason::Completed => "Completed".green().bold(),
        StopReason::Error => "Error".red().bold(),
    };
    out.push_str(&format!("{} ", status));

    if result.is_completed && result.success {
        out.push_str(&format!("after {} steps\n", result.total_steps));
    } else if result.success {
        out.push_str(&format!(
            "at step {} (line {}, generated line {})\n",
            result.current_step, result.origin_line, result.generated_line
        ));
        if !result.description.is_empty() {
            out.push_str(&format!("  {}\n", result.description.dimmed()));
        }
    } else {
        out.push_str(&format!(
            "{}\n",
            result.error.as_deref().unwrap_or("unknown execution error")
        ));
        if let Some(traceback) = result.traceback.as_deref().filter(|t| !t.is_empty()) {
            out.push_str(&indent(traceback.trim_end(), "  "));
            out.push('\n');
        }
    }

    if !result.variables.is_empty() {
        out.push_str(&format!("{}\n", "Variables:".bold()));
        out.push_str(&render_variables(&result.variables));
    }
    if !result.program_output.is_empty() {
        out.push_str(&format!("{}\n", "Program output:".bold()));
        out.push_str(&indent(result.program_output.trim_end(), "  "));
        out.push('\n');
    }
    if result.success && !result.is_completed && !result.can_continue {
        out.push_str(&format!("{}\n", "Execution cannot continue past this point.".dimmed()));
    }
    out
}

pub fn render_trace(trace: &TraceResult) -> String {
    let mut out = String::new();
    for record in &trace.steps {
        out.push_str(&render_record(record));
    }
    if trace.success {
        let mut summary = format!("{} {} steps", "Completed".green().bold(), trace.total_steps);
        if trace.truncated {
            summary.push_str(&format!(" {}", "(truncated at the step limit)".yellow()));
        }
        out.push_str(&summary);
        out.push('\n');
    } else {
        out.push_str(&format!(
            "{} {}\n",
            "Error".red().bold(),
            trace.error.as_deref().unwrap_or("unknown execution error")
        ));
        if let Some(traceback) = trace.traceback.as_deref().filter(|t| !t.is_empty()) {
            out.push_str(&indent(traceback.trim_end(), "  "));
            out.push('\n');
        }
    }
    out
}

fn render_record(record: &StepRecord) -> String {
    let marker = if record.on_breakpoint {
        "●".red().to_string()
    } else {
        " ".to_string()
    };
    let variables = record
        .variables
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .join(", ");
    format!(
        "{} {:>5}  L{:<4} {}  {}\n",
        marker,
        record.step_number,
        record.origin_line,
        record.description,
        variables.dimmed()
    )
}

pub fn render_hooks(hooks: &[HookSite]) -> String {
    let mut out = format!("{:<12} {:>9} {:>7}  {}\n", "STEP ID", "GENERATED", "ORIGIN", "STATEMENT");
    for hook in hooks {
        let position = if hook.before { " (before)" } else { "" };
        out.push_str(&format!(
            "{:<12} {:>9} {:>7}  {}{}\n",
            hook.step_id,
            hook.generated_line,
            hook.origin_line,
            hook.description,
            position.dimmed()
        ));
    }
    out
}

fn render_variables(variables: &Variables) -> String {
    let width = variables.keys().map(|k| k.chars().count()).max().unwrap_or(0);
    variables
        .iter()
        .map(|(name, value)| format!("  {:<width$} = {}\n", name.cyan(), value, width = width))
        .collect()
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines().map(|line| format!("{}{}", prefix, line)).join("\n")
}
