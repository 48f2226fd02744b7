//! Tokenizer for the script subset.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Str(String),
    /// Identifiers and keywords; the parser tells them apart.
    Ident(String),
    Punct(&'static str),
    Eof,
}

#[derive(Debug, Clone)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) newline_before: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError {
    pub(crate) message: String,
    pub(crate) line: u32,
    pub(crate) column: u32,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.message, self.line, self.column)
    }
}

// Longest first so that `===` wins over `==` and `=`.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "{", "}", "(", ")", "[", "]",
    ";", ",", ".", ":", "?", "!", "=", "<", ">", "+", "-", "*", "/", "%",
];

pub(crate) struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole source; the last token is always `Eof`.
    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let newline_before = self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let kind = match self.peek() {
                None => TokenKind::Eof,
                Some(c) if c.is_ascii_digit() => self.number()?,
                Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
                Some(c) if c == '"' || c == '\'' => self.string(c)?,
                Some(c) if is_ident_start(c) => self.ident(),
                Some(_) => self.punct()?,
            };
            let done = kind == TokenKind::Eof;
            tokens.push(Token {
                kind,
                line,
                column,
                newline_before,
            });
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    /// Skip whitespace and comments; reports whether a line break was seen.
    fn skip_trivia(&mut self) -> Result<bool, SyntaxError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some('\n') => {
                    newline = true;
                    self.bump();
                }
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            None => return Err(self.error("Unterminated comment")),
                            Some('\n') => newline = true,
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    fn number(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.pos;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let digits = &self.source[digits_start..self.pos];
            return u64::from_str_radix(digits, 16)
                .map(|n| TokenKind::Number(n as f64))
                .map_err(|_| self.error("Invalid hexadecimal literal"));
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek() == Some('.') {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error("Identifier directly after number"));
        }
        self.source[start..self.pos]
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error("Invalid number literal"))
    }

    fn string(&mut self, quote: char) -> Result<TokenKind, SyntaxError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error("Unterminated string literal")),
                Some(c) if c == quote => return Ok(TokenKind::Str(text)),
                Some('\\') => self.escape(&mut text)?,
                Some(c) => text.push(c),
            }
        }
    }

    fn escape(&mut self, text: &mut String) -> Result<(), SyntaxError> {
        let c = self.bump().ok_or_else(|| self.error("Unterminated string literal"))?;
        match c {
            'n' => text.push('\n'),
            't' => text.push('\t'),
            'r' => text.push('\r'),
            'b' => text.push('\u{8}'),
            'f' => text.push('\u{c}'),
            'v' => text.push('\u{b}'),
            '0' => text.push('\0'),
            '\n' => {}
            'x' => {
                let code = self.hex_digits(2)?;
                text.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            'u' => {
                let code = if self.peek() == Some('{') {
                    self.bump();
                    let mut code = 0u32;
                    while let Some(c) = self.peek().filter(|&c| c != '}') {
                        let digit = c.to_digit(16).ok_or_else(|| self.error("Invalid escape"))?;
                        code = code.saturating_mul(16).saturating_add(digit);
                        self.bump();
                    }
                    if self.bump() != Some('}') {
                        return Err(self.error("Invalid escape"));
                    }
                    code
                } else {
                    self.hex_digits(4)?
                };
                // Lone surrogates have no UTF-8 form.
                text.push(char::from_u32(code).unwrap_or('\u{fffd}'));
            }
            other => text.push(other),
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize) -> Result<u32, SyntaxError> {
        let mut code = 0;
        for _ in 0..count {
            let digit = self
                .bump()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_part) {
            self.bump();
        }
        TokenKind::Ident(self.source[start..self.pos].to_string())
    }

    fn punct(&mut self) -> Result<TokenKind, SyntaxError> {
        let rest: &'a str = &self.source[self.pos..];
        let punct = PUNCTUATORS
            .iter()
            .find(|p| rest.starts_with(**p))
            .ok_or_else(|| {
                let c = rest.chars().next().unwrap_or(' ');
                self.error(format!("Unexpected character '{c}'"))
            })?;
        for _ in 0..punct.len() {
            self.bump();
        }
        Ok(TokenKind::Punct(punct))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_punctuators_prefer_longest() {
        assert_eq!(
            kinds("a === b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct("==="),
                TokenKind::Ident("b".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers_and_strings() {
        assert_eq!(
            kinds("1.5e2 0x1f 'a\\n' \"\\u0041\""),
            vec![
                TokenKind::Number(150.0),
                TokenKind::Number(31.0),
                TokenKind::Str("a\n".into()),
                TokenKind::Str("A".into()),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_comments_and_newlines() {
        let tokens = Lexer::new("a // note\n/* block */ b").tokenize().unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::new("'abc").tokenize().unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
    }
}
