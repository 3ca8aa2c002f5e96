use rust_decimal::Decimal;

use crate::error::ExprError;
use crate::value::parse_decimal;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(Decimal),
    Str(String),
    /// Identifiers and keywords alike; the parser decides which by position.
    Word(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Question,
    Colon,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AndAnd,
    OrOr,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ExprError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let offset = self.offset();
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    offset,
                });
                return Ok(tokens);
            };

            let kind = match c {
                '0'..='9' => self.number()?,
                '\'' | '"' => self.string(c)?,
                c if c.is_alphabetic() || c == '_' || c == '$' => self.word(),
                _ => self.punct(c)?,
            };
            tokens.push(Token { kind, offset });
        }
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|(_, c)| *c)
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).map(|(_, c)| *c)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ExprError {
        ExprError::Syntax {
            expression: self.source.to_string(),
            offset,
            message: message.into(),
        }
    }

    fn number(&mut self) -> Result<TokenKind, ExprError> {
        let start = self.offset();
        while matches!(self.peek(), Some('0'..='9')) {
            self.pos += 1;
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some('0'..='9')) {
            self.pos += 1;
            while matches!(self.peek(), Some('0'..='9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if matches!(self.peek_at(digit_at), Some('0'..='9')) {
                self.pos += digit_at;
                while matches!(self.peek(), Some('0'..='9')) {
                    self.pos += 1;
                }
            }
        }
        let text = &self.source[start..self.offset()];
        parse_decimal(text)
            .map(TokenKind::Number)
            .ok_or_else(|| self.error(start, format!("number `{}` is out of range", text)))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, ExprError> {
        let start = self.offset();
        self.pos += 1;
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error(start, "unterminated string literal")),
                Some(c) if c == quote => return Ok(TokenKind::Str(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(other) => text.push(other),
                    None => return Err(self.error(start, "unterminated string literal")),
                },
                Some(c) => text.push(c),
            }
        }
    }

    fn word(&mut self) -> TokenKind {
        let start = self.offset();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_' || c == '$') {
            self.pos += 1;
        }
        TokenKind::Word(self.source[start..self.offset()].to_string())
    }

    fn punct(&mut self, c: char) -> Result<TokenKind, ExprError> {
        let offset = self.offset();
        let next = self.peek_at(1);
        let (kind, width) = match (c, next) {
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', _) => (TokenKind::Gt, 1),
            ('!', _) => (TokenKind::Bang, 1),
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('[', _) => (TokenKind::LBracket, 1),
            (']', _) => (TokenKind::RBracket, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('.', _) => (TokenKind::Dot, 1),
            ('?', _) => (TokenKind::Question, 1),
            (':', _) => (TokenKind::Colon, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            _ => return Err(self.error(offset, format!("unexpected character `{}`", c))),
        };
        self.pos += width;
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_comparison() {
        assert_eq!(
            kinds("args.size() >= 2.50"),
            vec![
                TokenKind::Word("args".into()),
                TokenKind::Dot,
                TokenKind::Word("size".into()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Ge,
                TokenKind::Number(Decimal::new(250, 2)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\"b""#),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\"b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_errors_carry_offsets() {
        let err = Lexer::new("a # b").tokenize().unwrap_err();
        assert!(matches!(err, ExprError::Syntax { offset: 2, .. }));
        let err = Lexer::new("'open").tokenize().unwrap_err();
        assert!(matches!(err, ExprError::Syntax { offset: 0, .. }));
    }
}
