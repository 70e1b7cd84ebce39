use crate::{DebuggerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Origin-line breakpoints for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BreakpointSet {
    lines: BTreeSet<usize>,
}

impl BreakpointSet {
    /// Create an empty breakpoint set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a breakpoint at an origin line. Returns false if it was already set.
    pub fn add(&mut self, line: usize) -> Result<bool> {
        if line == 0 {
            return Err(DebuggerError::Validation(
                "breakpoint lines are 1-based".to_string(),
            ));
        }
        Ok(self.lines.insert(line))
    }

    /// Remove a breakpoint
    pub fn remove(&mut self, line: usize) -> bool {
        self.lines.remove(&line)
    }

    pub fn contains(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }

    /// List all breakpoints in ascending order
    pub fn list(&self) -> Vec<usize> {
        self.lines.iter().copied().collect()
    }

    /// Clear all breakpoints
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn as_set(&self) -> &BTreeSet<usize> {
        &self.lines
    }

    /// Parse a comma separated list such as `"3, 7,12"`.
    pub fn parse_list(s: &str) -> Result<Self> {
        let mut set = Self::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let line = part.parse::<usize>().map_err(|_| {
                DebuggerError::Validation(format!("invalid breakpoint line '{}'", part))
            })?;
            set.add(line)?;
        }
        Ok(set)
    }
}

impl FromIterator<usize> for BreakpointSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}

impl From<BreakpointSet> for BTreeSet<usize> {
    fn from(set: BreakpointSet) -> Self {
        set.lines
    }
}

impl fmt::Display for BreakpointSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<String> = self.lines.iter().map(|l| l.to_string()).collect();
        write!(f, "{}", lines.join(", "))
    }
}
