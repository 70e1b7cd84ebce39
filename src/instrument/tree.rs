//! Statement classification and the indentation block tree.

use super::lexer::{Chunk, LogicalLine};
use crate::{DebuggerError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// What a logical statement does to control flow, as far as hook placement
/// is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `@decorator` line; must stay glued to the following definition.
    Decorator,
    /// `def`/`class` header opening an indented body.
    Definition,
    /// `def f(): return 1` style one-liner.
    InlineDefinition,
    /// Control-structure header opening an indented body.
    Header,
    /// Control structure with its body on the same line (`if x: y = 1`).
    InlineCompound,
    /// `return`, `break`, `continue` or `raise`: nothing after it runs.
    Terminator,
    /// `from __future__ import ...`; must precede every other statement.
    FutureImport,
    Simple,
}

impl StatementKind {
    pub fn opens_block(self) -> bool {
        matches!(self, StatementKind::Definition | StatementKind::Header)
    }
}

fn definition_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:async\s+)?(?:def|class)\b").expect("valid regex"))
}

fn control_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?:async\s+)?(?:for|with)|if|elif|else|while|try|except|finally)\b")
            .expect("valid regex")
    })
}

fn soft_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:match|case)\s*[^\s=.]").expect("valid regex"))
}

fn terminator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:return|break|continue|raise)\b").expect("valid regex"))
}

fn inline_transfer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":\s*(?:return|break|continue|raise)\b").expect("valid regex")
    })
}

fn future_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^from\s+__future__\s+import\b").expect("valid regex"))
}

fn string_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^(?:[rRuU]|[bB][rR]?|[rR][bB])?["']"#).expect("valid regex"))
}

fn continuation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:elif|else|except|finally)\b").expect("valid regex"))
}

pub fn classify(line: &LogicalLine) -> StatementKind {
    let code = line.code.as_str();
    if code.starts_with('@') {
        StatementKind::Decorator
    } else if definition_re().is_match(code) {
        if line.ends_with_colon {
            StatementKind::Definition
        } else {
            StatementKind::InlineDefinition
        }
    } else if control_re().is_match(code) {
        if line.ends_with_colon {
            StatementKind::Header
        } else if inline_transfer_re().is_match(code) && !is_continuation_clause(line) {
            // `if x: return 1` leaves the block when taken.
            StatementKind::Terminator
        } else {
            StatementKind::InlineCompound
        }
    } else if line.ends_with_colon && soft_keyword_re().is_match(code) {
        StatementKind::Header
    } else if terminator_re().is_match(code) {
        StatementKind::Terminator
    } else if future_import_re().is_match(code) {
        StatementKind::FutureImport
    } else {
        StatementKind::Simple
    }
}

/// Statement that is a bare string literal, i.e. a docstring candidate.
pub fn is_string_literal(line: &LogicalLine) -> bool {
    string_literal_re().is_match(&line.code)
}

/// Start line of the module docstring, if the first statement is one.
pub fn module_docstring(nodes: &[Node]) -> Option<usize> {
    match nodes.iter().find(|n| !matches!(n, Node::Trivia(_)))? {
        Node::Leaf(s) if s.kind == StatementKind::Simple && is_string_literal(&s.line) => {
            Some(s.line.start)
        }
        _ => None,
    }
}

/// `elif`/`else`/`except`/`finally` continue the preceding statement.
pub fn is_continuation_clause(line: &LogicalLine) -> bool {
    continuation_re().is_match(&line.code)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub line: LogicalLine,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Trivia(usize),
    Leaf(Statement),
    Block { header: Statement, body: Vec<Node> },
}

impl Node {
    pub fn statement(&self) -> Option<&Statement> {
        match self {
            Node::Trivia(_) => None,
            Node::Leaf(s) => Some(s),
            Node::Block { header, .. } => Some(header),
        }
    }
}

struct Frame {
    indent: Option<usize>,
    header: Option<Statement>,
    nodes: Vec<Node>,
}

impl Frame {
    fn close(self, parent: &mut Frame) {
        match self.header {
            Some(header) => parent.nodes.push(Node::Block {
                header,
                body: self.nodes,
            }),
            None => parent.nodes.extend(self.nodes),
        }
    }
}

fn missing_body(header: &Statement) -> DebuggerError {
    DebuggerError::Instrumentation {
        line: header.line.start,
        reason: format!(
            "expected an indented block after '{}'",
            header.line.code.split_whitespace().next().unwrap_or("header")
        ),
    }
}

/// Assemble chunks into nested blocks using indentation.
pub fn build(chunks: Vec<Chunk>) -> Result<Vec<Node>> {
    let mut stack = vec![Frame {
        indent: Some(0),
        header: None,
        nodes: Vec::new(),
    }];

    for chunk in chunks {
        let line = match chunk {
            Chunk::Trivia(n) => {
                if let Some(top) = stack.last_mut() {
                    top.nodes.push(Node::Trivia(n));
                }
                continue;
            }
            Chunk::Statement(line) => line,
        };
        let width = line.indent_width();

        let awaiting = stack.last().and_then(|top| {
            if top.indent.is_none() {
                top.header.clone()
            } else {
                None
            }
        });

        if let Some(header) = awaiting {
            if width <= header.line.indent_width() {
                return Err(missing_body(&header));
            }
            if let Some(top) = stack.last_mut() {
                top.indent = Some(width);
            }
        } else {
            let mut dedented = false;
            while stack.len() > 1 && width < stack.last().and_then(|f| f.indent).unwrap_or(0) {
                if let Some(frame) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        frame.close(parent);
                    }
                }
                dedented = true;
            }
            let current = stack.last().and_then(|f| f.indent).unwrap_or(0);
            if width > current {
                let reason = if dedented {
                    "unindent does not match any outer indentation level"
                } else {
                    "unexpected indent"
                };
                return Err(DebuggerError::Instrumentation {
                    line: line.start,
                    reason: reason.to_string(),
                });
            }
        }

        let kind = classify(&line);
        let statement = Statement { line, kind };
        if kind.opens_block() {
            stack.push(Frame {
                indent: None,
                header: Some(statement),
                nodes: Vec::new(),
            });
        } else if let Some(top) = stack.last_mut() {
            top.nodes.push(Node::Leaf(statement));
        }
    }

    if let Some(top) = stack.last() {
        if top.indent.is_none() {
            if let Some(header) = &top.header {
                return Err(missing_body(header));
            }
        }
    }

    while stack.len() > 1 {
        if let Some(frame) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                frame.close(parent);
            }
        }
    }

    Ok(stack.pop().map(|root| root.nodes).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::lexer::split_statements;

    fn kinds(source: &str) -> Vec<StatementKind> {
        split_statements(source)
            .unwrap()
            .into_iter()
            .filter_map(|c| match c {
                Chunk::Statement(s) => Some(classify(&s)),
                Chunk::Trivia(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_classify() {
        use StatementKind::*;
        assert_eq!(
            kinds("@cached\ndef f(x):\n  return x\nclass A: pass\nif x: y = 1\nelse:\n  iffy = 2\nmatch cmd:\n  case 1:\n    match = 3\nasync for i in it:\n  break"),
            vec![
                Decorator,
                Definition,
                Terminator,
                InlineDefinition,
                InlineCompound,
                Header,
                Simple,
                Header,
                Header,
                Simple,
                Header,
                Terminator,
            ]
        );
    }

    #[test]
    fn test_future_import_and_docstring() {
        use StatementKind::*;
        assert_eq!(
            kinds("from __future__ import annotations\nfrom collections import deque"),
            vec![FutureImport, Simple]
        );

        let nodes = build(split_statements("# header\n\"\"\"Doc.\"\"\"\nx = 1").unwrap()).unwrap();
        assert_eq!(module_docstring(&nodes), Some(2));
        let nodes = build(split_statements("x = 1\n'not a docstring'").unwrap()).unwrap();
        assert_eq!(module_docstring(&nodes), None);
    }

    #[test]
    fn test_inline_control_transfer() {
        use StatementKind::*;
        assert_eq!(
            kinds("if x: return 1\nelif y: raise E\nelse: continue_ = 2\nwhile t: break"),
            vec![Terminator, InlineCompound, InlineCompound, Terminator]
        );
    }

    #[test]
    fn test_match_call_is_not_a_header() {
        assert_eq!(kinds("match(x)"), vec![StatementKind::Simple]);
    }

    #[test]
    fn test_build_nests_blocks() {
        let nodes = build(split_statements("x = 1\nif x:\n    y = 2\n\n    z = 3\nw = 4").unwrap()).unwrap();
        assert_eq!(nodes.len(), 3);
        match &nodes[1] {
            Node::Block { header, body } => {
                assert_eq!(header.line.start, 2);
                assert_eq!(body.len(), 3);
                assert_eq!(body[1], Node::Trivia(4));
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[test]
    fn test_build_closes_several_levels() {
        let src = "for a in b:\n  if a:\n    c = 1\nd = 2";
        let nodes = build(split_statements(src).unwrap()).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].statement().unwrap().line.start, 4);
    }

    #[test]
    fn test_build_errors() {
        let err = build(split_statements("x = 1\n  y = 2").unwrap()).unwrap_err();
        assert!(matches!(err, DebuggerError::Instrumentation { line: 2, .. }));

        let err = build(split_statements("if x:\ny = 2").unwrap()).unwrap_err();
        assert!(err.to_string().contains("expected an indented block after 'if'"));

        let err = build(split_statements("while True:\n").unwrap()).unwrap_err();
        assert!(matches!(err, DebuggerError::Instrumentation { line: 1, .. }));

        let err = build(split_statements("if x:\n    a = 1\n  b = 2").unwrap()).unwrap_err();
        assert!(err.to_string().contains("unindent"));
    }
}
