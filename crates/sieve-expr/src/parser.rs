//! Recursive-descent parser
//!
//! Precedence, loosest first: ternary, `||`, `&&`, equality, relational,
//! additive, multiplicative, unary, postfix (`.name`, `.call()`, `[i]`).
//! Word operators (`and`, `or`, `not`, `eq`, `ne`, `lt`, `le`, `gt`, `ge`)
//! are accepted wherever their symbolic forms are.

use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::ExprError;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::value::Value;

const KEYWORDS: [&str; 12] = [
    "true", "false", "null", "not", "and", "or", "eq", "ne", "lt", "le", "gt", "ge",
];

pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.ternary()?;
    match parser.peek() {
        TokenKind::Eof => Ok(expr),
        other => Err(parser.error(format!("unexpected {}", describe(other)))),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn current(&self) -> &Token {
        // The token stream always ends with Eof and the parser never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if kind != TokenKind::Eof {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), TokenKind::Word(w) if w == word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                describe(&kind),
                describe(self.peek())
            )))
        }
    }

    fn error(&self, message: impl Into<String>) -> ExprError {
        ExprError::Syntax {
            expression: self.source.to_string(),
            offset: self.current().offset,
            message: message.into(),
        }
    }

    fn ternary(&mut self) -> Result<Expr, ExprError> {
        let condition = self.or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }
        let then = self.ternary()?;
        self.expect(TokenKind::Colon)?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.and()?;
        while self.eat(&TokenKind::OrOr) || self.eat_word("or") {
            let right = self.and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.equality()?;
        while self.eat(&TokenKind::AndAnd) || self.eat_word("and") {
            let right = self.equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.relational()?;
        loop {
            let op = if self.eat(&TokenKind::EqEq) || self.eat_word("eq") {
                BinaryOp::Eq
            } else if self.eat(&TokenKind::NotEq) || self.eat_word("ne") {
                BinaryOp::Ne
            } else {
                return Ok(left);
            };
            let right = self.relational()?;
            left = binary(op, left, right);
        }
    }

    fn relational(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.additive()?;
        loop {
            let op = if self.eat(&TokenKind::Lt) || self.eat_word("lt") {
                BinaryOp::Lt
            } else if self.eat(&TokenKind::Le) || self.eat_word("le") {
                BinaryOp::Le
            } else if self.eat(&TokenKind::Gt) || self.eat_word("gt") {
                BinaryOp::Gt
            } else if self.eat(&TokenKind::Ge) || self.eat_word("ge") {
                BinaryOp::Ge
            } else {
                return Ok(left);
            };
            let right = self.additive()?;
            left = binary(op, left, right);
        }
    }

    fn additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> Result<Expr, ExprError> {
        let op = if self.eat(&TokenKind::Bang) || self.eat_word("not") {
            UnaryOp::Not
        } else if self.eat(&TokenKind::Minus) {
            UnaryOp::Negate
        } else {
            return self.postfix();
        };
        let operand = self.unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let name = match self.advance() {
                    TokenKind::Word(name) => name,
                    other => {
                        return Err(
                            self.error(format!("expected a name after `.`, found {}", describe(&other)))
                        )
                    }
                };
                expr = if self.eat(&TokenKind::LParen) {
                    Expr::MethodCall {
                        target: Box::new(expr),
                        method: name,
                        args: self.arguments(TokenKind::RParen)?,
                    }
                } else {
                    Expr::Property {
                        target: Box::new(expr),
                        name,
                    }
                };
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.ternary()?;
                self.expect(TokenKind::RBracket)?;
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Number(n)))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.ternary()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::LBracket => {
                self.advance();
                Ok(Expr::List(self.arguments(TokenKind::RBracket)?))
            }
            TokenKind::Word(word) => match word.as_str() {
                "true" => {
                    self.advance();
                    Ok(Expr::Literal(Value::Bool(true)))
                }
                "false" => {
                    self.advance();
                    Ok(Expr::Literal(Value::Bool(false)))
                }
                "null" => {
                    self.advance();
                    Ok(Expr::Literal(Value::Null))
                }
                w if KEYWORDS.contains(&w) => Err(self.error(format!("unexpected keyword `{}`", w))),
                _ => {
                    self.advance();
                    if self.eat(&TokenKind::LParen) {
                        Ok(Expr::FunctionCall {
                            name: word,
                            args: self.arguments(TokenKind::RParen)?,
                        })
                    } else {
                        Ok(Expr::Variable(word))
                    }
                }
            },
            other => Err(self.error(format!("unexpected {}", describe(&other)))),
        }
    }

    /// Comma-separated expressions up to `close`, which has not been consumed yet.
    fn arguments(&mut self, close: TokenKind) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.eat(&close) {
            return Ok(args);
        }
        loop {
            args.push(self.ternary()?);
            if self.eat(&close) {
                return Ok(args);
            }
            self.expect(TokenKind::Comma)?;
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(n) => format!("number `{}`", n),
        TokenKind::Str(s) => format!("string '{}'", s),
        TokenKind::Word(w) => format!("`{}`", w),
        TokenKind::Eof => "end of expression".to_string(),
        TokenKind::LParen => "`(`".to_string(),
        TokenKind::RParen => "`)`".to_string(),
        TokenKind::LBracket => "`[`".to_string(),
        TokenKind::RBracket => "`]`".to_string(),
        TokenKind::Comma => "`,`".to_string(),
        TokenKind::Dot => "`.`".to_string(),
        TokenKind::Question => "`?`".to_string(),
        TokenKind::Colon => "`:`".to_string(),
        TokenKind::Plus => "`+`".to_string(),
        TokenKind::Minus => "`-`".to_string(),
        TokenKind::Star => "`*`".to_string(),
        TokenKind::Slash => "`/`".to_string(),
        TokenKind::Percent => "`%`".to_string(),
        TokenKind::Bang => "`!`".to_string(),
        TokenKind::AndAnd => "`&&`".to_string(),
        TokenKind::OrOr => "`||`".to_string(),
        TokenKind::EqEq => "`==`".to_string(),
        TokenKind::NotEq => "`!=`".to_string(),
        TokenKind::Lt => "`<`".to_string(),
        TokenKind::Le => "`<=`".to_string(),
        TokenKind::Gt => "`>`".to_string(),
        TokenKind::Ge => "`>=`".to_string(),
    }
}
