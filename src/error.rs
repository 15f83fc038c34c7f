// ABOUTME: Error types for lexing, parsing, and evaluation failures

use crate::context::Context;
use crate::position::Position;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Anything that can be rendered as "File X, line Y" plus a caret-underlined
/// source excerpt. Implemented by lex, parse, and runtime errors so the CLI
/// formats all three identically.
pub trait Diagnostic {
    fn span(&self) -> (&Position, &Position);
    fn description(&self) -> String;

    /// Full printable report: header line, message, underlined source.
    fn report(&self) -> String {
        let (start, end) = self.span();
        format!(
            "File {}, on line {}\n{}\n{}\n",
            start.file_name,
            start.line + 1,
            self.description(),
            string_with_arrows(&start.source, start, end)
        )
    }
}

#[derive(Error, Debug, Clone)]
#[error("Illegal character in the stream ({details})")]
pub struct IllegalCharError {
    pub details: String,
    pub start: Position,
    pub end: Position,
}

impl Diagnostic for IllegalCharError {
    fn span(&self) -> (&Position, &Position) {
        (&self.start, &self.end)
    }
    fn description(&self) -> String {
        format!("IllegalCharError: {}", self.details)
    }
}

#[derive(Error, Debug, Clone)]
#[error("Invalid syntax in the stream ({details})")]
pub struct InvalidSyntaxError {
    pub details: String,
    pub start: Position,
    pub end: Position,
}

impl Diagnostic for InvalidSyntaxError {
    fn span(&self) -> (&Position, &Position) {
        (&self.start, &self.end)
    }
    fn description(&self) -> String {
        format!("InvalidSyntaxError: {}", self.details)
    }
}

/// Runtime errors raised while evaluating an AST. Every variant carries the
/// span that triggered it and the `Context` active at the time, so a
/// traceback can be generated (spec: traceback order is root frame first,
/// innermost frame last).
#[derive(Error, Debug, Clone)]
pub enum RuntimeError {
    #[error("Illegal operation")]
    IllegalOperation {
        start: Position,
        end: Position,
        context: Rc<Context>,
    },

    #[error("Division by zero")]
    DivisionByZero {
        start: Position,
        end: Position,
        context: Rc<Context>,
    },

    #[error("VAR \"{name}\" not defined")]
    UndefinedSymbol {
        name: String,
        start: Position,
        end: Position,
        context: Rc<Context>,
    },

    #[error("{expected} args passed into {function}, got {actual}")]
    ArityMismatch {
        function: String,
        expected: usize,
        actual: usize,
        start: Position,
        end: Position,
        context: Rc<Context>,
    },

    #[error("Index out of bounds")]
    IndexOutOfBounds {
        start: Position,
        end: Position,
        context: Rc<Context>,
    },

    #[error("'{keyword}' used outside a loop")]
    LoopControlOutsideLoop {
        keyword: &'static str,
        start: Position,
        end: Position,
        context: Rc<Context>,
    },

    /// Errors raised by a built-in function body.
    #[error("{message}")]
    Custom {
        message: String,
        start: Position,
        end: Position,
        context: Rc<Context>,
    },
}

impl RuntimeError {
    pub fn span(&self) -> (&Position, &Position) {
        match self {
            RuntimeError::IllegalOperation { start, end, .. }
            | RuntimeError::DivisionByZero { start, end, .. }
            | RuntimeError::UndefinedSymbol { start, end, .. }
            | RuntimeError::ArityMismatch { start, end, .. }
            | RuntimeError::IndexOutOfBounds { start, end, .. }
            | RuntimeError::LoopControlOutsideLoop { start, end, .. }
            | RuntimeError::Custom { start, end, .. } => (start, end),
        }
    }

    pub fn context(&self) -> &Rc<Context> {
        match self {
            RuntimeError::IllegalOperation { context, .. }
            | RuntimeError::DivisionByZero { context, .. }
            | RuntimeError::UndefinedSymbol { context, .. }
            | RuntimeError::ArityMismatch { context, .. }
            | RuntimeError::IndexOutOfBounds { context, .. }
            | RuntimeError::LoopControlOutsideLoop { context, .. }
            | RuntimeError::Custom { context, .. } => context,
        }
    }

    /// Chronological traceback, following parent links from the top-level
    /// frame down to the failure site (spec: root frame first, innermost
    /// frame last).
    fn traceback(&self) -> String {
        let mut frames = Vec::new();
        let mut context = Some(self.context().clone());
        let (mut pos_line, mut pos_fn) = {
            let (start, _) = self.span();
            (start.line, start.file_name.clone())
        };

        while let Some(ctx) = context {
            frames.push(format!(
                "File {}, line {}, in {}\n",
                pos_fn,
                pos_line + 1,
                ctx.display_name
            ));
            if let Some(entry) = &ctx.parent_entry_pos {
                pos_line = entry.line;
                pos_fn = entry.file_name.clone();
            }
            context = ctx.parent.clone();
        }

        frames.reverse();
        format!("\nTraceback (most recent call last):\n{}", frames.concat())
    }
}

impl Diagnostic for RuntimeError {
    fn span(&self) -> (&Position, &Position) {
        RuntimeError::span(self)
    }

    fn description(&self) -> String {
        format!("{}", self)
    }

    fn report(&self) -> String {
        let (start, end) = self.span();
        format!(
            "{}{}\n{}\n",
            self.traceback(),
            self.description(),
            string_with_arrows(&start.source, start, end)
        )
    }
}

impl fmt::Display for IllegalCharError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report())
    }
}

impl fmt::Display for InvalidSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.report())
    }
}

/// Underlines the span `[start, end)` in `text` with `^` markers, matching
/// the original SimpleScript's `string_with_arrows` helper.
pub fn string_with_arrows(text: &str, start: &Position, end: &Position) -> String {
    let mut result = String::new();

    let line_start = text[..start.index.min(text.len())]
        .rfind('\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    let line_end = text[start.index.min(text.len())..]
        .find('\n')
        .map(|i| i + start.index)
        .unwrap_or(text.len());

    let line_count = end.line.saturating_sub(start.line) + 1;
    let mut idx_start = line_start;
    let mut idx_end = line_end;

    for i in 0..line_count {
        let line = &text[idx_start.min(text.len())..idx_end.min(text.len())];

        let col_start = if i == 0 { start.column } else { 0 };
        let col_end = if i == line_count - 1 {
            end.column
        } else {
            line.chars().count()
        };

        result.push_str(line);
        result.push('\n');
        result.push_str(&" ".repeat(col_start));
        result.push_str(&"^".repeat(col_end.saturating_sub(col_start).max(1)));

        idx_start = idx_end;
        if let Some(next_nl) = text[idx_start.min(text.len())..].find('\n') {
            idx_start += next_nl + 1;
            idx_end = text[idx_start.min(text.len())..]
                .find('\n')
                .map(|i| i + idx_start)
                .unwrap_or(text.len());
        }
    }

    result.replace('\t', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;

    fn root_context() -> Rc<Context> {
        Rc::new(Context::new(
            "<program>".to_string(),
            None,
            None,
            Environment::new(),
        ))
    }

    fn pos(index: usize, column: usize) -> Position {
        Position {
            file_name: Rc::from("<test>"),
            source: Rc::from("5 / 0"),
            line: 0,
            column,
            index,
        }
    }

    #[test]
    fn division_by_zero_reports_span_over_the_zero_literal() {
        let err = RuntimeError::DivisionByZero {
            start: pos(4, 4),
            end: pos(5, 5),
            context: root_context(),
        };
        let (start, end) = err.span();
        assert_eq!(start.column, 4);
        assert_eq!(end.column, 5);
    }

    #[test]
    fn traceback_lists_root_frame_first() {
        let root = root_context();
        let inner = Rc::new(Context::new(
            "add".to_string(),
            Some(root.clone()),
            Some(pos(0, 0)),
            Environment::new(),
        ));
        let err = RuntimeError::DivisionByZero {
            start: pos(4, 4),
            end: pos(5, 5),
            context: inner,
        };
        let tb = err.traceback();
        let root_idx = tb.find("<program>").unwrap();
        let add_idx = tb.find("add").unwrap();
        assert!(
            root_idx < add_idx,
            "expected root frame before inner frame in traceback"
        );
    }

    #[test]
    fn string_with_arrows_underlines_single_line_span() {
        let text = "5 / 0";
        let start = pos(4, 4);
        let end = pos(5, 5);
        let underlined = string_with_arrows(text, &start, &end);
        assert!(underlined.contains("5 / 0"));
        assert!(underlined.contains('^'));
    }
}
