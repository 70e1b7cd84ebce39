//! Interpreter invocation with timeout protection and temp-file cleanup.
//!
//! This module is the only place a child process is started. It wires
//! together:
//! - A uniquely named temporary script file, removed when the guard drops.
//! - A piped, TTY-less child interpreter (`tokio::process`).
//! - A wall-clock deadline covering both process exit and pipe draining;
//!   on expiry the child is killed and reaped.
//!
//! Stdout is returned uninterpreted; decoding belongs to [`super::parser`].

use crate::config::DebuggerConfig;
use crate::{DebuggerError, Result};
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// What one child run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    /// Script location while it existed; deleted before this is returned.
    pub script_path: PathBuf,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Spawns the interpreter for one script at a time.
///
/// Holds no mutable state; concurrent `run` calls are independent.
#[derive(Debug, Clone)]
pub struct Supervisor {
    interpreter: String,
    interpreter_args: Vec<String>,
    timeout: Duration,
    temp_dir: Option<PathBuf>,
}

impl Supervisor {
    pub fn new(interpreter: impl Into<String>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            interpreter_args: Vec::new(),
            timeout,
            temp_dir: None,
        }
    }

    pub fn from_config(config: &DebuggerConfig) -> Self {
        Self {
            interpreter: config.interpreter.clone(),
            interpreter_args: config.interpreter_args.clone(),
            timeout: config.timeout(),
            temp_dir: config.temp_dir.clone(),
        }
    }

    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Run `script` to completion or until the deadline.
    ///
    /// `label` is folded into the temp-file name for correlation; the file
    /// name stays unique through a random suffix either way.
    #[tracing::instrument(skip_all, fields(label = label))]
    pub async fn run(&self, script: &str, label: &str) -> Result<ProcessOutput> {
        // The guard deletes the file on every exit path from here on.
        let script_file = self.write_script(script, label)?;
        let script_path = script_file.path().to_path_buf();
        debug!(path = %script_path.display(), "Wrote instrumented script");

        let started = Instant::now();
        let mut child = Command::new(&self.interpreter)
            .args(&self.interpreter_args)
            .arg(&script_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONUNBUFFERED", "1")
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DebuggerError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let outcome = tokio::time::timeout(self.timeout, async {
            tokio::try_join!(
                child.wait(),
                read_pipe(stdout_pipe),
                read_pipe(stderr_pipe)
            )
        })
        .await;

        let (status, stdout, stderr) = match outcome {
            Ok(Ok(collected)) => collected,
            Ok(Err(e)) => {
                warn!("Failed while collecting child output: {}", e);
                kill_quietly(&mut child).await;
                return Err(DebuggerError::Io(e));
            }
            Err(_) => {
                let millis = duration_millis(self.timeout);
                warn!(timeout_ms = millis, "Interpreter exceeded its time budget, killing it");
                kill_quietly(&mut child).await;
                return Err(DebuggerError::Timeout(millis));
            }
        };

        let elapsed = started.elapsed();
        let exit_code = status.code();
        info!(
            exit_code = ?exit_code,
            elapsed_ms = duration_millis(elapsed),
            stdout_bytes = stdout.len(),
            "Interpreter finished"
        );

        drop(script_file);

        Ok(ProcessOutput {
            exit_code,
            stdout,
            stderr,
            elapsed,
            script_path,
        })
    }

    fn write_script(&self, script: &str, label: &str) -> Result<NamedTempFile> {
        let prefix = format!("rule-step-{}-", sanitize_label(label));
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".py");

        let mut file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(script.as_bytes())?;
        file.flush()?;
        Ok(file)
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn kill_quietly(child: &mut tokio::process::Child) {
    if let Err(e) = child.kill().await {
        // Already exited between the deadline and the kill.
        debug!("Kill after deadline reported: {}", e);
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Keep label characters that are safe in file names, capped at 32.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(32)
        .collect();
    if cleaned.is_empty() {
        "run".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("session-42"), "session-42");
        assert_eq!(sanitize_label("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_label(""), "run");
        assert_eq!(sanitize_label(&"x".repeat(100)).len(), 32);
    }

    #[test]
    fn test_write_script_is_unique_and_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new("python3", Duration::from_secs(1)).with_temp_dir(dir.path());

        let a = supervisor.write_script("print(1)", "same").unwrap();
        let b = supervisor.write_script("print(2)", "same").unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a
            .path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("rule-step-same-"));
        assert_eq!(std::fs::read_to_string(a.path()).unwrap(), "print(1)");

        let path = a.path().to_path_buf();
        drop(a);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new("definitely-not-an-interpreter-xyz", Duration::from_secs(5))
            .with_temp_dir(dir.path());

        let err = supervisor.run("print(1)", "spawn").await.unwrap_err();
        assert!(matches!(err, DebuggerError::Spawn { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // `sh <script>` stands in for an interpreter that never finishes.
        let supervisor =
            Supervisor::new("sh", Duration::from_millis(200)).with_temp_dir(dir.path());

        let started = Instant::now();
        let err = supervisor.run("exec sleep 30\n", "slow").await.unwrap_err();
        assert!(matches!(err, DebuggerError::Timeout(200)));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_captures_stdout_stderr_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new("sh", Duration::from_secs(10)).with_temp_dir(dir.path());

        let output = supervisor
            .run("echo out\necho err 1>&2\nexit 3\n", "codes")
            .await
            .unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(!output.success());
        assert!(!output.script_path.exists());
    }
}
