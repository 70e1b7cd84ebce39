//! Generated-line → origin-line resolution.
//!
//! The external code generator emits a best-effort table of
//! [`SourceMapEntry`] values. Lookups fall back in a fixed order: exact
//! match (highest confidence wins), nearest preceding entry, and finally the
//! identity mapping when nothing applies.

use crate::{DebuggerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One row of the generator's mapping table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapEntry {
    #[serde(alias = "generated_line")]
    pub generated_line: usize,
    #[serde(alias = "origin_line")]
    pub origin_line: usize,
    #[serde(default = "full_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub description: String,
}

fn full_confidence() -> f64 {
    1.0
}

impl SourceMapEntry {
    pub fn new(generated_line: usize, origin_line: usize) -> Self {
        Self {
            generated_line,
            origin_line,
            confidence: 1.0,
            description: String::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// How a line was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionKind {
    Exact,
    Nearest,
    Identity,
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionKind::Exact => write!(f, "exact"),
            ResolutionKind::Nearest => write!(f, "nearest"),
            ResolutionKind::Identity => write!(f, "identity"),
        }
    }
}

/// Result of [`SourceMap::lookup`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub origin_line: usize,
    pub confidence: f64,
    pub kind: ResolutionKind,
}

impl Resolution {
    fn identity(generated_line: usize) -> Self {
        Self {
            origin_line: generated_line,
            confidence: 0.0,
            kind: ResolutionKind::Identity,
        }
    }
}

/// Read-only mapping table.
///
/// Entries are kept sorted by generated line and, within one generated
/// line, by descending confidence, so the first entry of a run is the
/// preferred one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SourceMapEntry>", into = "Vec<SourceMapEntry>")]
pub struct SourceMap {
    entries: Vec<SourceMapEntry>,
}

/// Why a table was rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMapError(String);

impl fmt::Display for SourceMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for SourceMapError {}

impl From<SourceMapError> for DebuggerError {
    fn from(err: SourceMapError) -> Self {
        DebuggerError::SourceMap(err.0)
    }
}

impl TryFrom<Vec<SourceMapEntry>> for SourceMap {
    type Error = SourceMapError;

    fn try_from(entries: Vec<SourceMapEntry>) -> std::result::Result<Self, Self::Error> {
        Self::new(entries)
    }
}

impl From<SourceMap> for Vec<SourceMapEntry> {
    fn from(map: SourceMap) -> Self {
        map.entries
    }
}

impl SourceMap {
    /// Build a map, rejecting zero line numbers and out-of-range confidence.
    pub fn new(mut entries: Vec<SourceMapEntry>) -> std::result::Result<Self, SourceMapError> {
        for (index, entry) in entries.iter().enumerate() {
            if entry.generated_line == 0 || entry.origin_line == 0 {
                return Err(SourceMapError(format!(
                    "entry {} uses line 0; line numbers are 1-based",
                    index
                )));
            }
            if !(0.0..=1.0).contains(&entry.confidence) {
                return Err(SourceMapError(format!(
                    "entry {} has confidence {} outside [0, 1]",
                    index, entry.confidence
                )));
            }
        }

        entries.sort_by(|a, b| {
            a.generated_line
                .cmp(&b.generated_line)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
        });

        Ok(Self { entries })
    }

    /// Parse the generator's JSON array form.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
            let path = e.path().to_string();
            DebuggerError::SourceMap(format!("{} (at {})", e.into_inner(), path))
        })
    }

    /// Load a JSON source map from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DebuggerError::SourceMap(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[SourceMapEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Resolve `generated_line`, reporting which fallback produced it.
    pub fn lookup(&self, generated_line: usize) -> Resolution {
        let end = self
            .entries
            .partition_point(|e| e.generated_line <= generated_line);
        if end == 0 {
            return Resolution::identity(generated_line);
        }

        let anchor = self.entries[end - 1].generated_line;
        let start = self.entries[..end].partition_point(|e| e.generated_line < anchor);
        let best = &self.entries[start];

        Resolution {
            origin_line: best.origin_line,
            confidence: best.confidence,
            kind: if anchor == generated_line {
                ResolutionKind::Exact
            } else {
                ResolutionKind::Nearest
            },
        }
    }

    pub fn resolve(&self, generated_line: usize) -> usize {
        self.lookup(generated_line).origin_line
    }
}

/// Resolve against an optional map; no map means identity.
pub fn resolve(generated_line: usize, source_map: Option<&SourceMap>) -> usize {
    match source_map {
        Some(map) => map.resolve(generated_line),
        None => generated_line,
    }
}
