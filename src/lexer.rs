// ABOUTME: Source text to token stream, tracking line/column for diagnostics

use crate::error::IllegalCharError;
use crate::position::Position;
use crate::token::{Keyword, Token, TokenKind};
use nom::character::complete::{alpha1, alphanumeric1, digit1};
use nom::combinator::recognize;
use nom::multi::many0_count;
use nom::sequence::pair;
use nom::IResult;
use std::rc::Rc;

const DIGITS: &str = "0123456789";

pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    pos: Position,
}

impl Lexer {
    pub fn new(file_name: impl Into<Rc<str>>, source: impl Into<Rc<str>>) -> Self {
        let file_name = file_name.into();
        let source = source.into();
        let pos = Position::new(file_name, source);
        Lexer {
            chars: pos.source.chars().collect(),
            index: 0,
            pos,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn advance(&mut self) {
        let c = self.current();
        self.pos.advance(c);
        self.index += 1;
    }

    fn rest(&self) -> String {
        self.chars[self.index..].iter().collect()
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, IllegalCharError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.current() {
            match c {
                ' ' | '\t' => self.advance(),
                '#' => self.skip_comment(),
                '\n' | ';' => tokens.push(self.make_newline()),
                c if DIGITS.contains(c) => tokens.push(self.make_number()),
                c if c.is_alphabetic() || c == '_' => tokens.push(self.make_identifier()),
                '"' => tokens.push(self.make_string()?),
                '+' => tokens.push(self.single(TokenKind::Plus)),
                '*' => tokens.push(self.single(TokenKind::Mul)),
                '^' => tokens.push(self.single(TokenKind::Power)),
                '%' => tokens.push(self.single(TokenKind::Modulo)),
                '(' => tokens.push(self.single(TokenKind::LParen)),
                ')' => tokens.push(self.single(TokenKind::RParen)),
                '[' => tokens.push(self.single(TokenKind::LSquare)),
                ']' => tokens.push(self.single(TokenKind::RSquare)),
                ',' => tokens.push(self.single(TokenKind::Comma)),
                '-' => tokens.push(self.make_minus_or_arrow()),
                '/' => tokens.push(self.make_slash_or_clean_div()),
                '!' => tokens.push(self.make_not_equals()?),
                '=' => tokens.push(self.make_equals_family(TokenKind::Eq, TokenKind::Ee)),
                '<' => tokens.push(self.make_equals_family(TokenKind::Lt, TokenKind::Lte)),
                '>' => tokens.push(self.make_equals_family(TokenKind::Gt, TokenKind::Gte)),
                other => {
                    let start = self.pos.clone();
                    self.advance();
                    return Err(IllegalCharError {
                        details: format!("'{other}'"),
                        start: start.clone(),
                        end: self.pos.clone(),
                    });
                }
            }
        }

        tokens.push(Token::new(TokenKind::Eof, self.pos.clone(), self.pos.clone()));
        Ok(tokens)
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.pos.clone();
        self.advance();
        Token::new(kind, start, self.pos.clone())
    }

    fn make_newline(&mut self) -> Token {
        let start = self.pos.clone();
        while matches!(self.current(), Some('\n') | Some(';')) {
            self.advance();
        }
        Token::new(TokenKind::Newline, start, self.pos.clone())
    }

    fn make_number(&mut self) -> Token {
        let start = self.pos.clone();
        let (_, matched) = recognize_number(&self.rest()).expect("caller checked leading digit");
        let consumed = matched.to_string();
        for _ in 0..consumed.chars().count() {
            self.advance();
        }
        let value: f64 = consumed.parse().unwrap_or(0.0);
        Token::new(TokenKind::Number(value), start, self.pos.clone())
    }

    fn make_identifier(&mut self) -> Token {
        let start = self.pos.clone();
        let (_, matched) =
            recognize_identifier(&self.rest()).expect("caller checked leading identifier char");
        let consumed = matched.to_string();
        for _ in 0..consumed.chars().count() {
            self.advance();
        }
        let kind = match Keyword::lookup(&consumed) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier(consumed),
        };
        Token::new(kind, start, self.pos.clone())
    }

    fn make_string(&mut self) -> Result<Token, IllegalCharError> {
        let start = self.pos.clone();
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.current() {
                None => {
                    return Err(IllegalCharError {
                        details: "unterminated string literal".to_string(),
                        start: start.clone(),
                        end: self.pos.clone(),
                    })
                }
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.current() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some(other) => other,
                        None => {
                            return Err(IllegalCharError {
                                details: "unterminated string escape".to_string(),
                                start: start.clone(),
                                end: self.pos.clone(),
                            })
                        }
                    };
                    value.push(escaped);
                    self.advance();
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(Token::new(TokenKind::String(value), start, self.pos.clone()))
    }

    fn make_minus_or_arrow(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current() == Some('>') {
            self.advance();
            Token::new(TokenKind::Arrow, start, self.pos.clone())
        } else {
            Token::new(TokenKind::Minus, start, self.pos.clone())
        }
    }

    fn make_slash_or_clean_div(&mut self) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current() == Some('/') {
            self.advance();
            Token::new(TokenKind::CleanDiv, start, self.pos.clone())
        } else {
            Token::new(TokenKind::Div, start, self.pos.clone())
        }
    }

    fn make_not_equals(&mut self) -> Result<Token, IllegalCharError> {
        let start = self.pos.clone();
        self.advance();
        if self.current() == Some('=') {
            self.advance();
            Ok(Token::new(TokenKind::Ne, start, self.pos.clone()))
        } else {
            Err(IllegalCharError {
                details: "'!' must be followed by '=' (use NOT for negation)".to_string(),
                start,
                end: self.pos.clone(),
            })
        }
    }

    fn make_equals_family(&mut self, single: TokenKind, doubled: TokenKind) -> Token {
        let start = self.pos.clone();
        self.advance();
        if self.current() == Some('=') {
            self.advance();
            Token::new(doubled, start, self.pos.clone())
        } else {
            Token::new(single, start, self.pos.clone())
        }
    }
}

fn recognize_number(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        digit1,
        nom::combinator::opt(pair(nom::character::complete::char('.'), digit1)),
    ))(input)
}

fn recognize_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        nom::branch::alt((alpha1, nom::bytes::complete::tag("_"))),
        many0_count(nom::branch::alt((alphanumeric1, nom::bytes::complete::tag("_")))),
    ))(input)
}

/// Tokenizes `source`, attributing diagnostics to `file_name`.
pub fn tokenize(file_name: impl Into<Rc<str>>, source: impl Into<Rc<str>>) -> Result<Vec<Token>, IllegalCharError> {
    Lexer::new(file_name, source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize("<test>", src)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_arithmetic_expression() {
        let kinds = kinds("5 + 2 * 3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number(5.0),
                TokenKind::Plus,
                TokenKind::Number(2.0),
                TokenKind::Mul,
                TokenKind::Number(3.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_float_literal() {
        let kinds = kinds("3.5");
        assert_eq!(kinds, vec![TokenKind::Number(3.5), TokenKind::Eof]);
    }

    #[test]
    fn tokenizes_keyword_vs_identifier() {
        let kinds = kinds("VAR x");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword(Keyword::Var),
                TokenKind::Identifier("x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_string_with_escapes() {
        let kinds = kinds(r#""a\nb""#);
        assert_eq!(
            kinds,
            vec![TokenKind::String("a\nb".to_string()), TokenKind::Eof]
        );
    }

    #[test]
    fn distinguishes_arrow_from_minus() {
        let kinds = kinds("a -> b - c");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Arrow,
                TokenKind::Identifier("b".to_string()),
                TokenKind::Minus,
                TokenKind::Identifier("c".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn distinguishes_div_from_clean_div() {
        let kinds = kinds("a / b // c");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier("a".to_string()),
                TokenKind::Div,
                TokenKind::Identifier("b".to_string()),
                TokenKind::CleanDiv,
                TokenKind::Identifier("c".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(kinds("=="), vec![TokenKind::Ee, TokenKind::Eof]);
        assert_eq!(kinds("!="), vec![TokenKind::Ne, TokenKind::Eof]);
        assert_eq!(kinds("<="), vec![TokenKind::Lte, TokenKind::Eof]);
        assert_eq!(kinds(">="), vec![TokenKind::Gte, TokenKind::Eof]);
        assert_eq!(kinds("<"), vec![TokenKind::Lt, TokenKind::Eof]);
        assert_eq!(kinds(">"), vec![TokenKind::Gt, TokenKind::Eof]);
        assert_eq!(kinds("="), vec![TokenKind::Eq, TokenKind::Eof]);
    }

    #[test]
    fn newline_runs_collapse_to_one_token() {
        let kinds = kinds("1\n\n\n2");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number(1.0),
                TokenKind::Newline,
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let kinds = kinds("1 # trailing comment\n2");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number(1.0),
                TokenKind::Newline,
                TokenKind::Number(2.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn illegal_character_is_reported() {
        let err = tokenize("<test>", "@").unwrap_err();
        assert!(err.details.contains('@'));
    }

    #[test]
    fn bare_bang_without_equals_is_illegal() {
        assert!(tokenize("<test>", "!").is_err());
    }
}
