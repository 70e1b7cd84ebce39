//! Debugger configuration.
//!
//! Values come from a TOML file (all keys optional) and are then
//! overridden by command-line flags or their environment variables.
//!
//! ```toml
//! interpreter = "python3.12"
//! timeout_ms = 10000
//! step_limit = 5000
//! ```

use crate::{DebuggerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".rule-debug.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebuggerConfig {
    /// Interpreter executable, looked up on `PATH`.
    pub interpreter: String,
    /// Extra arguments placed before the script path.
    pub interpreter_args: Vec<String>,
    pub timeout_ms: u64,
    /// Hard ceiling on executed steps per run.
    pub step_limit: u64,
    pub description_max_len: usize,
    pub preview_limit: usize,
    /// Directory for temporary scripts; system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            interpreter_args: Vec::new(),
            timeout_ms: 30_000,
            step_limit: 10_000,
            description_max_len: 100,
            preview_limit: 200,
            temp_dir: None,
        }
    }
}

impl DebuggerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| DebuggerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DebuggerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| DebuggerError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `explicit`, else the first discovered file, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::candidate_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Discovery order: working directory, then the user config directory.
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("rule-debug").join("config.toml"));
        }
        paths
    }

    pub fn validate(&self) -> Result<()> {
        if self.interpreter.trim().is_empty() {
            return Err(DebuggerError::Config("interpreter must not be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(DebuggerError::Config("timeout_ms must be greater than 0".to_string()));
        }
        if self.step_limit == 0 {
            return Err(DebuggerError::Config("step_limit must be greater than 0".to_string()));
        }
        Ok(())
    }
}
