// ABOUTME: Source position tracking for diagnostics (lexer, parser, runtime errors)

use std::rc::Rc;

/// A single point in a source file, advanced one character at a time.
///
/// File name and source text are `Rc`-shared so that every token, AST node,
/// and value can carry a cheap copy without re-allocating the program text.
#[derive(Debug, Clone)]
pub struct Position {
    pub file_name: Rc<str>,
    pub source: Rc<str>,
    pub line: usize,
    pub column: usize,
    pub index: usize,
}

impl Position {
    pub fn new(file_name: Rc<str>, source: Rc<str>) -> Self {
        Position {
            file_name,
            source,
            line: 0,
            column: 0,
            index: 0,
        }
    }

    /// Advances the position over `current_char`, tracking line/column.
    pub fn advance(&mut self, current_char: Option<char>) {
        self.index += 1;
        self.column += 1;

        if current_char == Some('\n') {
            self.line += 1;
            self.column = 0;
        }
    }

    pub fn advanced(&self, current_char: Option<char>) -> Self {
        let mut next = self.clone();
        next.advance(current_char);
        next
    }

    /// Placeholder position for values built outside any source text (e.g.
    /// constants seeded by the environment). Never shown to a user in
    /// practice since such values always pick up a real span on first use.
    pub fn unknown() -> Self {
        Position::new(Rc::from("<unknown>"), Rc::from(""))
    }
}

impl PartialEq for Position {
    /// Positions compare by location only; two positions into different
    /// source texts are still equal if line/column/index line up. Never
    /// used for value equality (spec: positions never participate in
    /// value equality), only for test assertions.
    fn eq(&self, other: &Self) -> bool {
        self.line == other.line && self.column == other.column && self.index == other.index
    }
}
