//! Source rewriting: injects a step-control hook call next to every
//! executable statement of a generated script.
//!
//! Sub-modules:
//! - [`lexer`] — Physical lines → logical statements.
//! - [`tree`]  — Statement classification and the indentation block tree.
//!
//! Hooks are inserted as siblings of leaf statements with the leaf's own
//! indentation string, so no line of user text is ever re-indented.

pub mod lexer;
pub mod tree;

use crate::source_map::{self, SourceMap};
use crate::Result;
use serde::Serialize;
use tracing::debug;
use tree::{Node, Statement, StatementKind};

/// Name the hook is bound to inside the program namespace.
pub const HOOK_NAME: &str = "__step_control__";

#[derive(Debug, Clone)]
pub struct InstrumentOptions {
    /// Maximum length (in chars) of the statement description passed to
    /// the hook.
    pub description_max_len: usize,
}

impl Default for InstrumentOptions {
    fn default() -> Self {
        Self {
            description_max_len: 100,
        }
    }
}

/// One injected hook call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSite {
    pub step_id: String,
    pub generated_line: usize,
    pub origin_line: usize,
    pub description: String,
    /// Hook runs before the statement (control-transfer statements).
    pub before: bool,
}

/// Instrumented program body plus the bookkeeping needed to interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentedProgram {
    pub body: String,
    /// `line_map[i]` is the generated line that produced body line `i + 1`.
    pub line_map: Vec<usize>,
    pub hooks: Vec<HookSite>,
}

impl InstrumentedProgram {
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

pub struct Instrumenter {
    options: InstrumentOptions,
}

impl Instrumenter {
    pub fn new(options: InstrumentOptions) -> Self {
        Self { options }
    }

    /// Rewrite `source`, resolving every hook's origin line through
    /// `source_map` (identity when absent).
    #[tracing::instrument(skip_all, fields(bytes = source.len()))]
    pub fn instrument(
        &self,
        source: &str,
        source_map: Option<&SourceMap>,
    ) -> Result<InstrumentedProgram> {
        let chunks = lexer::split_statements(source)?;
        let nodes = tree::build(chunks)?;
        let lines: Vec<&str> = source.lines().collect();

        let mut renderer = Renderer {
            lines: &lines,
            source_map,
            docstring: tree::module_docstring(&nodes),
            max_len: self.options.description_max_len,
            out: Vec::new(),
            line_map: Vec::new(),
            hooks: Vec::new(),
        };
        renderer.render(&nodes);

        debug!(
            hooks = renderer.hooks.len(),
            lines = lines.len(),
            "Instrumented source"
        );

        let mut body = renderer.out.join("\n");
        if !renderer.out.is_empty() {
            body.push('\n');
        }

        Ok(InstrumentedProgram {
            body,
            line_map: renderer.line_map,
            hooks: renderer.hooks,
        })
    }
}

impl Default for Instrumenter {
    fn default() -> Self {
        Self::new(InstrumentOptions::default())
    }
}

struct Renderer<'a> {
    lines: &'a [&'a str],
    source_map: Option<&'a SourceMap>,
    /// Module docstring line; it must stay the first statement.
    docstring: Option<usize>,
    max_len: usize,
    out: Vec<String>,
    line_map: Vec<usize>,
    hooks: Vec<HookSite>,
}

impl Renderer<'_> {
    fn render(&mut self, nodes: &[Node]) {
        for (index, node) in nodes.iter().enumerate() {
            match node {
                Node::Trivia(line) => self.copy_lines(*line, *line),
                Node::Block { header, body } => {
                    self.copy_lines(header.line.start, header.line.end);
                    self.render(body);
                }
                Node::Leaf(statement) if self.docstring == Some(statement.line.start) => {
                    self.copy_lines(statement.line.start, statement.line.end)
                }
                Node::Leaf(statement) => match statement.kind {
                    StatementKind::Decorator
                    | StatementKind::InlineDefinition
                    | StatementKind::FutureImport => {
                        self.copy_lines(statement.line.start, statement.line.end)
                    }
                    StatementKind::Terminator => {
                        self.hook(statement, true);
                        self.copy_lines(statement.line.start, statement.line.end);
                    }
                    _ => {
                        self.copy_lines(statement.line.start, statement.line.end);
                        if !followed_by_continuation(&nodes[index + 1..]) {
                            self.hook(statement, false);
                        }
                    }
                },
            }
        }
    }

    fn copy_lines(&mut self, start: usize, end: usize) {
        for line_no in start..=end {
            let text = self.lines.get(line_no - 1).copied().unwrap_or_default();
            self.out.push(text.to_string());
            self.line_map.push(line_no);
        }
    }

    fn hook(&mut self, statement: &Statement, before: bool) {
        let generated_line = statement.line.start;
        let site = HookSite {
            step_id: format!("STMT_{}", generated_line),
            generated_line,
            origin_line: source_map::resolve(generated_line, self.source_map),
            description: truncate(&statement.line.code, self.max_len),
            before,
        };
        self.out.push(format!(
            "{}{}({}, {}, {}, {})",
            statement.line.indent,
            HOOK_NAME,
            python_str(&site.step_id),
            site.generated_line,
            site.origin_line,
            python_str(&site.description),
        ));
        self.line_map.push(generated_line);
        self.hooks.push(site);
    }
}

/// A hook may not separate a clause from its `elif`/`else`/`except`/`finally`.
fn followed_by_continuation(rest: &[Node]) -> bool {
    rest.iter()
        .find_map(Node::statement)
        .map(|next| tree::is_continuation_clause(&next.line))
        .unwrap_or(false)
}

/// Quote `text` as a Python string literal. JSON string escapes are a
/// subset of Python's.
pub(crate) fn python_str(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    if max_len <= 3 {
        return text.chars().take(max_len).collect();
    }
    let mut short: String = text.chars().take(max_len - 3).collect();
    short.push_str("...");
    short
}
