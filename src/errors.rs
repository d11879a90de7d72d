use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Loc {
    pub line: usize,
    pub column: usize,
}

impl Loc {
    pub fn new(line: usize, column: usize) -> Self {
        Loc { line, column }
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Start/end positions of a syntactic construct. The end is the stream
/// position immediately after the last token the construct consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Loc,
    pub end: Loc,
}

impl Span {
    pub fn new(start: Loc, end: Loc) -> Self {
        Span { start, end }
    }

    /// A zero-width span, used for nodes synthesized during desugaring.
    pub fn at(loc: Loc) -> Self {
        Span {
            start: loc,
            end: loc,
        }
    }
}

/// The only error the front end produces: a message pinned to a location.
/// Parsing is fail-fast; the first violation aborts the whole parse.
#[derive(Debug, Clone, Error)]
#[error("syntax error: {message} at {loc}")]
pub struct SyntaxError {
    pub message: String,
    pub loc: Loc,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, loc: Loc) -> Self {
        SyntaxError {
            message: message.into(),
            loc,
        }
    }
}

/// Source text kept around for diagnostics rendering.
pub struct SourceFile {
    pub filename: String,
    lines: Vec<String>,
}

impl SourceFile {
    pub fn new(filename: &str, content: &str) -> Self {
        SourceFile {
            filename: filename.to_string(),
            lines: content.lines().map(|s| s.to_string()).collect(),
        }
    }

    pub fn get_line(&self, line_num: usize) -> Option<&str> {
        if line_num > 0 && line_num <= self.lines.len() {
            Some(&self.lines[line_num - 1])
        } else {
            None
        }
    }

    /// Render an error with the offending source line and a caret pointer.
    pub fn render(&self, err: &SyntaxError) -> String {
        const RED: &str = "\x1b[1;31m";
        const BLUE: &str = "\x1b[1;34m";
        const RESET: &str = "\x1b[0m";
        const BOLD: &str = "\x1b[1m";

        let mut out = String::new();
        out.push_str(&format!(
            "{}error{}: {}{}{}\n",
            RED, RESET, BOLD, err.message, RESET
        ));
        out.push_str(&format!(
            "  {}-->{} {}:{}:{}\n",
            BLUE, RESET, self.filename, err.loc.line, err.loc.column
        ));

        if let Some(line) = self.get_line(err.loc.line) {
            let gutter = err.loc.line.to_string();
            let width = gutter.len();
            out.push_str(&format!("  {:width$} {}|{}\n", "", BLUE, RESET));
            out.push_str(&format!(
                "  {}{}{} {}|{} {}\n",
                BLUE,
                gutter,
                RESET,
                BLUE,
                RESET,
                line.trim_end()
            ));
            let offset = err.loc.column.saturating_sub(1);
            out.push_str(&format!(
                "  {:width$} {}|{} {}{}^--- here{}\n",
                "",
                BLUE,
                RESET,
                " ".repeat(offset),
                RED,
                RESET
            ));
        }

        out
    }
}
