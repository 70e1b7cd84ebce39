//! Splits physical source lines into logical statements.
//!
//! Only as much of Python's tokenizer is modelled as is needed to know where
//! a statement ends: bracket nesting, string literals (single, triple and
//! escaped quotes), comments and explicit backslash continuation.

use crate::{DebuggerError, Result};

/// A complete statement, possibly spanning several physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// First physical line, 1-based.
    pub start: usize,
    /// Last physical line, 1-based.
    pub end: usize,
    /// Leading whitespace of the first physical line.
    pub indent: String,
    /// Statement text without comments, physical lines joined by a space.
    pub code: String,
    /// Last significant character outside comments is `:`.
    pub ends_with_colon: bool,
}

impl LogicalLine {
    /// Indentation column, tabs advancing to the next multiple of eight.
    pub fn indent_width(&self) -> usize {
        indent_width(&self.indent)
    }
}

/// Either a statement or a line that carries no code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Blank or comment-only physical line (1-based line number).
    Trivia(usize),
    Statement(LogicalLine),
}

pub fn indent_width(indent: &str) -> usize {
    indent.chars().fold(0, |width, ch| match ch {
        '\t' => (width / 8 + 1) * 8,
        '\x0c' => 0,
        _ => width + 1,
    })
}

fn leading_whitespace(line: &str) -> &str {
    let end = line
        .find(|c: char| !matches!(c, ' ' | '\t' | '\x0c'))
        .unwrap_or(line.len());
    &line[..end]
}

#[derive(Debug, Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
    line: usize,
}

/// Scanner state carried from one physical line to the next.
#[derive(Debug, Default)]
struct Scanner {
    brackets: Vec<(char, usize)>,
    string: Option<OpenString>,
    escaped: bool,
    backslash_continuation: bool,
    last_significant: Option<char>,
}

impl Scanner {
    fn is_open(&self) -> bool {
        !self.brackets.is_empty() || self.string.is_some() || self.backslash_continuation
    }

    /// Scan one physical line and return the code part (comment removed).
    fn scan<'a>(&mut self, line: &'a str, line_no: usize) -> Result<&'a str> {
        self.backslash_continuation = false;
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut code_end = line.len();
        let mut i = 0;

        while i < chars.len() {
            let (offset, ch) = chars[i];

            if let Some(open) = self.string {
                self.last_significant = Some(ch);
                if self.escaped {
                    self.escaped = false;
                } else if ch == '\\' {
                    self.escaped = true;
                } else if ch == open.quote {
                    if !open.triple {
                        self.string = None;
                    } else if is_triple(&chars, i, ch) {
                        self.string = None;
                        i += 2;
                    }
                }
                i += 1;
                continue;
            }

            match ch {
                '#' => {
                    code_end = offset;
                    break;
                }
                '\'' | '"' => {
                    let triple = is_triple(&chars, i, ch);
                    self.string = Some(OpenString {
                        quote: ch,
                        triple,
                        line: line_no,
                    });
                    if triple {
                        i += 2;
                    }
                }
                '(' | '[' | '{' => self.brackets.push((ch, line_no)),
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match self.brackets.pop() {
                        Some((open, _)) if open == expected => {}
                        Some((open, open_line)) => {
                            return Err(DebuggerError::Instrumentation {
                                line: line_no,
                                reason: format!(
                                    "closing '{}' does not match '{}' opened on line {}",
                                    ch, open, open_line
                                ),
                            })
                        }
                        None => {
                            return Err(DebuggerError::Instrumentation {
                                line: line_no,
                                reason: format!("unmatched '{}'", ch),
                            })
                        }
                    }
                }
                '\\' if i + 1 == chars.len() => {
                    self.backslash_continuation = true;
                    i += 1;
                    continue;
                }
                _ => {}
            }

            if !ch.is_whitespace() {
                self.last_significant = Some(ch);
            }
            i += 1;
        }

        if let Some(open) = self.string {
            if !open.triple {
                if self.escaped {
                    // An escaped newline continues a single-quoted literal.
                    self.escaped = false;
                } else {
                    return Err(DebuggerError::Instrumentation {
                        line: open.line,
                        reason: "unterminated string literal".to_string(),
                    });
                }
            }
        }

        Ok(&line[..code_end])
    }
}

fn is_triple(chars: &[(usize, char)], i: usize, quote: char) -> bool {
    chars.get(i + 1).map(|c| c.1) == Some(quote) && chars.get(i + 2).map(|c| c.1) == Some(quote)
}

/// Split `source` into trivia lines and logical statements, in order.
pub fn split_statements(source: &str) -> Result<Vec<Chunk>> {
    if let Some(pos) = source.find('\0') {
        let line = source[..pos].matches('\n').count() + 1;
        return Err(DebuggerError::Instrumentation {
            line,
            reason: "source contains a NUL byte".to_string(),
        });
    }

    let mut chunks = Vec::new();
    let mut scanner = Scanner::default();
    let mut current: Option<(LogicalLine, Vec<String>)> = None;

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;

        if current.is_none() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                chunks.push(Chunk::Trivia(line_no));
                continue;
            }
            scanner.last_significant = None;
            current = Some((
                LogicalLine {
                    start: line_no,
                    end: line_no,
                    indent: leading_whitespace(line).to_string(),
                    code: String::new(),
                    ends_with_colon: false,
                },
                Vec::new(),
            ));
        }

        let code = scanner.scan(line, line_no)?;
        if let Some((logical, parts)) = current.as_mut() {
            logical.end = line_no;
            let piece = code.trim().trim_end_matches('\\').trim_end();
            if !piece.is_empty() {
                parts.push(piece.to_string());
            }
        }

        if !scanner.is_open() {
            if let Some((mut logical, parts)) = current.take() {
                logical.code = parts.join(" ");
                logical.ends_with_colon = scanner.last_significant == Some(':');
                chunks.push(Chunk::Statement(logical));
            }
        }
    }

    if let Some((logical, _)) = current {
        let (line, reason) = if let Some(open) = scanner.string {
            (open.line, "unterminated triple-quoted string literal".to_string())
        } else if let Some((bracket, line)) = scanner.brackets.last() {
            (*line, format!("'{}' was never closed", bracket))
        } else {
            (
                logical.end,
                "unexpected end of file after line continuation".to_string(),
            )
        };
        return Err(DebuggerError::Instrumentation { line, reason });
    }

    Ok(chunks)
}
