// ABOUTME: Recursive-descent parser turning a token stream into an AST

use crate::ast::{BinOpKind, IfCase, Node, UnaryOpKind};
use crate::error::InvalidSyntaxError;
use crate::token::{Keyword, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

type ParseResult = Result<Node, InvalidSyntaxError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, index: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        tok
    }

    fn skip_newlines(&mut self) {
        while matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, InvalidSyntaxError> {
        if std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {kind:?}, found {:?}", self.current().kind)))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, InvalidSyntaxError> {
        if self.current().matches_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected keyword {keyword:?}, found {:?}",
                self.current().kind
            )))
        }
    }

    fn error(&self, details: String) -> InvalidSyntaxError {
        let tok = self.current();
        InvalidSyntaxError {
            details,
            start: tok.start.clone(),
            end: tok.end.clone(),
        }
    }

    /// Parses the whole token stream as a top-level statement list, wrapped
    /// in a `ListNode` whose evaluated value becomes the program result.
    pub fn parse(mut self) -> ParseResult {
        let start = self.current().start.clone();
        self.skip_newlines();
        let mut statements = Vec::new();

        if !matches!(self.current().kind, TokenKind::Eof) {
            statements.push(self.statement()?);
        }

        loop {
            let mut newline_count = 0;
            while matches!(self.current().kind, TokenKind::Newline) {
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 || matches!(self.current().kind, TokenKind::Eof) {
                break;
            }
            statements.push(self.statement()?);
        }

        if !matches!(self.current().kind, TokenKind::Eof) {
            return Err(self.error(format!(
                "unexpected token {:?}, expected end of input",
                self.current().kind
            )));
        }

        let end = self.current().end.clone();
        Ok(Node::ListLit {
            elements: statements,
            start,
            end,
        })
    }

    fn statement(&mut self) -> ParseResult {
        let tok = self.current().clone();
        if tok.matches_keyword(Keyword::Return) {
            self.advance();
            let value = if self.ends_statement() {
                None
            } else {
                Some(Box::new(self.expr()?))
            };
            let end = value
                .as_ref()
                .map(|v| v.span().1.clone())
                .unwrap_or_else(|| tok.end.clone());
            return Ok(Node::Return {
                value,
                start: tok.start,
                end,
            });
        }
        if tok.matches_keyword(Keyword::Continue) {
            self.advance();
            return Ok(Node::Continue {
                start: tok.start,
                end: tok.end,
            });
        }
        if tok.matches_keyword(Keyword::Break) {
            self.advance();
            return Ok(Node::Break {
                start: tok.start,
                end: tok.end,
            });
        }
        self.expr()
    }

    fn ends_statement(&self) -> bool {
        matches!(self.current().kind, TokenKind::Newline | TokenKind::Eof)
            || self.current().matches_keyword(Keyword::End)
            || self.current().matches_keyword(Keyword::Elif)
            || self.current().matches_keyword(Keyword::Else)
    }

    fn expr(&mut self) -> ParseResult {
        if self.current().matches_keyword(Keyword::Var) {
            let start = self.advance().start;
            let name_tok = self.expect(&TokenKind::Identifier(String::new()))?;
            let name = match name_tok.kind {
                TokenKind::Identifier(n) => n,
                _ => unreachable!(),
            };
            self.expect(&TokenKind::Eq)?;
            let value = self.expr()?;
            let end = value.span().1.clone();
            return Ok(Node::VarAssign {
                name,
                value: Box::new(value),
                start,
                end,
            });
        }

        let mut node = self.comp_expr()?;
        while self.current().matches_keyword(Keyword::And) || self.current().matches_keyword(Keyword::Or) {
            let op = if self.advance().matches_keyword(Keyword::And) {
                BinOpKind::And
            } else {
                BinOpKind::Or
            };
            let right = self.comp_expr()?;
            node = bin_op(node, op, right);
        }
        Ok(node)
    }

    fn comp_expr(&mut self) -> ParseResult {
        if self.current().matches_keyword(Keyword::Not) {
            let start = self.advance().start;
            let operand = self.comp_expr()?;
            let end = operand.span().1.clone();
            return Ok(Node::UnaryOp {
                op: UnaryOpKind::Not,
                operand: Box::new(operand),
                start,
                end,
            });
        }

        let mut node = self.arith_expr()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Ee => BinOpKind::Ee,
                TokenKind::Ne => BinOpKind::Ne,
                TokenKind::Lt => BinOpKind::Lt,
                TokenKind::Lte => BinOpKind::Lte,
                TokenKind::Gt => BinOpKind::Gt,
                TokenKind::Gte => BinOpKind::Gte,
                _ => break,
            };
            self.advance();
            let right = self.arith_expr()?;
            node = bin_op(node, op, right);
        }
        Ok(node)
    }

    fn arith_expr(&mut self) -> ParseResult {
        let mut node = self.term()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOpKind::Plus,
                TokenKind::Minus => BinOpKind::Minus,
                _ => break,
            };
            self.advance();
            let right = self.term()?;
            node = bin_op(node, op, right);
        }
        Ok(node)
    }

    fn term(&mut self) -> ParseResult {
        let mut node = self.factor()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Mul => BinOpKind::Mul,
                TokenKind::Div => BinOpKind::Div,
                TokenKind::Modulo => BinOpKind::Modulo,
                TokenKind::CleanDiv => BinOpKind::CleanDiv,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            node = bin_op(node, op, right);
        }
        Ok(node)
    }

    fn factor(&mut self) -> ParseResult {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Plus => {
                self.advance();
                self.factor()
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.factor()?;
                let end = operand.span().1.clone();
                Ok(Node::UnaryOp {
                    op: UnaryOpKind::Minus,
                    operand: Box::new(operand),
                    start: tok.start,
                    end,
                })
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> ParseResult {
        let base = self.call()?;
        if matches!(self.current().kind, TokenKind::Power) {
            self.advance();
            let exponent = self.factor()?; // right-associative
            return Ok(bin_op(base, BinOpKind::Power, exponent));
        }
        Ok(base)
    }

    fn call(&mut self) -> ParseResult {
        let mut node = self.atom()?;
        while matches!(self.current().kind, TokenKind::LParen) {
            let start = node.span().0.clone();
            self.advance();
            let mut args = Vec::new();
            if !matches!(self.current().kind, TokenKind::RParen) {
                args.push(self.expr()?);
                while matches!(self.current().kind, TokenKind::Comma) {
                    self.advance();
                    args.push(self.expr()?);
                }
            }
            let end_tok = self.expect(&TokenKind::RParen)?;
            node = Node::Call {
                callee: Box::new(node),
                args,
                start,
                end: end_tok.end,
            };
        }
        Ok(node)
    }

    fn atom(&mut self) -> ParseResult {
        let tok = self.current().clone();
        match tok.kind.clone() {
            TokenKind::Number(value) => {
                self.advance();
                Ok(Node::Number {
                    value,
                    start: tok.start,
                    end: tok.end,
                })
            }
            TokenKind::String(value) => {
                self.advance();
                Ok(Node::Str {
                    value,
                    start: tok.start,
                    end: tok.end,
                })
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(Node::VarAccess {
                    name,
                    start: tok.start,
                    end: tok.end,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::LSquare => self.list_expr(),
            TokenKind::Keyword(Keyword::If) => self.if_expr(),
            TokenKind::Keyword(Keyword::For) => self.for_expr(),
            TokenKind::Keyword(Keyword::While) => self.while_expr(),
            TokenKind::Keyword(Keyword::Fun) => self.func_def(),
            _ => Err(self.error(format!("unexpected token {:?}", tok.kind))),
        }
    }

    fn list_expr(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        self.advance(); // [
        let mut elements = Vec::new();
        if !matches!(self.current().kind, TokenKind::RSquare) {
            elements.push(self.expr()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                elements.push(self.expr()?);
            }
        }
        let end_tok = self.expect(&TokenKind::RSquare)?;
        Ok(Node::ListLit {
            elements,
            start,
            end: end_tok.end,
        })
    }

    /// Parses one `IF`/`ELIF`/`ELSE` chain. Each arm is either a single
    /// inline expression (`should_return_null = false`) or a newline-led
    /// statement block (`should_return_null = true`, per spec the block's
    /// value is discarded in favor of `Number(0)`). A trailing `END`, if
    /// present, closes the chain; it is required only when the chain's
    /// last arm used a block.
    fn if_expr(&mut self) -> ParseResult {
        let start = self.current().start.clone();
        let mut cases = Vec::new();
        self.expect_keyword(Keyword::If)?;
        cases.push(self.if_case()?);

        while self.current().matches_keyword(Keyword::Elif) {
            self.advance();
            cases.push(self.if_case()?);
        }

        let mut else_case = None;
        let mut used_block = cases.iter().any(|(_, _, should_return_null)| *should_return_null);
        let mut end = cases.last().unwrap().1.span().1.clone();
        if self.current().matches_keyword(Keyword::Else) {
            self.advance();
            let (body, should_return_null) = self.branch_body()?;
            used_block = used_block || should_return_null;
            end = body.span().1.clone();
            else_case = Some((Box::new(body), should_return_null));
        }

        if self.current().matches_keyword(Keyword::End) {
            end = self.advance().end;
        } else if used_block {
            return Err(self.error("expected keyword End to close block".to_string()));
        }

        Ok(Node::If {
            cases,
            else_case,
            start,
            end,
        })
    }

    fn if_case(&mut self) -> Result<IfCase, InvalidSyntaxError> {
        let condition = self.expr()?;
        self.expect_keyword(Keyword::Then)?;
        let (body, should_return_null) = self.branch_body()?;
        Ok((condition, body, should_return_null))
    }

    /// A branch body is either a single expression on the same line, or a
    /// newline followed by a statement sequence ending at `END`,
    /// `ELIF`/`ELSE`, or end of input (the `END` token itself, if any, is
    /// left for the enclosing construct to consume).
    fn branch_body(&mut self) -> Result<(Node, bool), InvalidSyntaxError> {
        if matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
            self.skip_newlines();
            let mut statements = vec![self.statement()?];
            loop {
                let mut newline_count = 0;
                while matches!(self.current().kind, TokenKind::Newline) {
                    self.advance();
                    newline_count += 1;
                }
                if newline_count == 0 || self.at_block_terminator() {
                    break;
                }
                statements.push(self.statement()?);
            }
            let start = statements.first().unwrap().span().0.clone();
            let end = statements.last().unwrap().span().1.clone();
            Ok((
                Node::ListLit {
                    elements: statements,
                    start,
                    end,
                },
                true,
            ))
        } else {
            Ok((self.statement()?, false))
        }
    }

    fn at_block_terminator(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
            || self.current().matches_keyword(Keyword::End)
            || self.current().matches_keyword(Keyword::Elif)
            || self.current().matches_keyword(Keyword::Else)
    }

    fn for_expr(&mut self) -> ParseResult {
        let start = self.advance().start; // FOR
        let name_tok = self.expect(&TokenKind::Identifier(String::new()))?;
        let var_name = match name_tok.kind {
            TokenKind::Identifier(n) => n,
            _ => unreachable!(),
        };
        self.expect(&TokenKind::Eq)?;
        let start_value = Box::new(self.expr()?);
        self.expect_keyword(Keyword::To)?;
        let end_value = Box::new(self.expr()?);
        let step_value = if self.current().matches_keyword(Keyword::Step) {
            self.advance();
            Some(Box::new(self.expr()?))
        } else {
            None
        };
        self.expect_keyword(Keyword::Then)?;
        let (body, should_return_null) = self.branch_body()?;
        let mut end = body.span().1.clone();
        if self.current().matches_keyword(Keyword::End) {
            end = self.advance().end;
        } else if should_return_null {
            return Err(self.error("expected keyword End to close block".to_string()));
        }
        Ok(Node::For {
            var_name,
            start_value,
            end_value,
            step_value,
            body: Box::new(body),
            should_return_null,
            start,
            end,
        })
    }

    fn while_expr(&mut self) -> ParseResult {
        let start = self.advance().start; // WHILE
        let condition = Box::new(self.expr()?);
        self.expect_keyword(Keyword::Then)?;
        let (body, should_return_null) = self.branch_body()?;
        let mut end = body.span().1.clone();
        if self.current().matches_keyword(Keyword::End) {
            end = self.advance().end;
        } else if should_return_null {
            return Err(self.error("expected keyword End to close block".to_string()));
        }
        Ok(Node::While {
            condition,
            body: Box::new(body),
            should_return_null,
            start,
            end,
        })
    }

    fn func_def(&mut self) -> ParseResult {
        let start = self.advance().start; // FUN
        let name = if let TokenKind::Identifier(n) = self.current().kind.clone() {
            self.advance();
            Some(n)
        } else {
            None
        };
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if let TokenKind::Identifier(n) = self.current().kind.clone() {
            self.advance();
            params.push(n);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                let n = match self.expect(&TokenKind::Identifier(String::new()))?.kind {
                    TokenKind::Identifier(n) => n,
                    _ => unreachable!(),
                };
                params.push(n);
            }
        }
        self.expect(&TokenKind::RParen)?;

        if matches!(self.current().kind, TokenKind::Arrow) {
            self.advance();
            let body = self.expr()?;
            let end = body.span().1.clone();
            return Ok(Node::FuncDef {
                name,
                params,
                body: Box::new(body),
                auto_return: true,
                start,
                end,
            });
        }

        self.expect(&TokenKind::Newline)?;
        self.skip_newlines();
        let mut statements = vec![self.statement()?];
        loop {
            let mut newline_count = 0;
            while matches!(self.current().kind, TokenKind::Newline) {
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 || self.at_block_terminator() {
                break;
            }
            statements.push(self.statement()?);
        }
        let body_start = statements.first().unwrap().span().0.clone();
        let body_end = statements.last().unwrap().span().1.clone();
        let body = Node::ListLit {
            elements: statements,
            start: body_start,
            end: body_end,
        };
        let end = self.expect_keyword(Keyword::End)?.end;
        Ok(Node::FuncDef {
            name,
            params,
            body: Box::new(body),
            auto_return: false,
            start,
            end,
        })
    }
}

fn bin_op(left: Node, op: BinOpKind, right: Node) -> Node {
    let start = left.span().0.clone();
    let end = right.span().1.clone();
    Node::BinOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
        start,
        end,
    }
}

pub fn parse(tokens: Vec<Token>) -> ParseResult {
    Parser::new(tokens).parse()
}
