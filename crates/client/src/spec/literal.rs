//! Structured-literal parser for specs embedded in inline scripts.
//!
//! Accepts the object/array literal subset that documentation pages inline
//! (`spec: { openapi: '3.0.0', paths: { ... }, }`) and converts it to JSON
//! without evaluating anything. Supported beyond strict JSON: unquoted keys,
//! single-quoted and backtick strings, trailing commas, line and block
//! comments, hex numbers, and `undefined`. Variable references, calls, and
//! template interpolation are rejected.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LiteralError {
    #[error("unexpected character {ch:?} at offset {at}")]
    Unexpected { ch: char, at: usize },

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("unterminated comment starting at offset {0}")]
    UnterminatedComment(usize),

    #[error("cannot resolve identifier `{0}`")]
    Identifier(String),

    #[error("template interpolation is not supported")]
    Interpolation,

    #[error("malformed literal: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open(char),
    Close(char),
    Colon,
    Comma,
    Str(String),
    Num(String),
    Ident(String),
}

/// Parse an object or array literal into a JSON value.
pub fn parse_literal(src: &str) -> Result<Value, LiteralError> {
    let tokens = Lexer::new(src).tokens()?;
    let json = to_json(&tokens)?;
    serde_json::from_str(&json).map_err(|e| LiteralError::Malformed(e.to_string()))
}

/// Slice of `src` from the `{`/`[` at byte offset `open_at` through its
/// matching close, skipping brackets inside strings and comments.
pub fn balanced_literal(src: &str, open_at: usize) -> Option<&str> {
    let bytes = src.as_bytes();
    if !matches!(bytes.get(open_at), Some(b'{') | Some(b'[')) {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open_at;
    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&src[open_at..=i]);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self { chars: src.chars().collect(), pos: 0 }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn tokens(mut self) -> Result<Vec<Token>, LiteralError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek(0) {
            match c {
                c if c.is_whitespace() || c == ';' => self.pos += 1,
                '/' if self.peek(1) == Some('/') => {
                    while self.peek(0).is_some_and(|c| c != '\n') {
                        self.pos += 1;
                    }
                }
                '/' if self.peek(1) == Some('*') => self.block_comment()?,
                '{' | '[' => {
                    tokens.push(Token::Open(c));
                    self.pos += 1;
                }
                '}' | ']' => {
                    tokens.push(Token::Close(c));
                    self.pos += 1;
                }
                ':' => {
                    tokens.push(Token::Colon);
                    self.pos += 1;
                }
                ',' => {
                    tokens.push(Token::Comma);
                    self.pos += 1;
                }
                '"' | '\'' | '`' => tokens.push(Token::Str(self.string(c)?)),
                c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => tokens.push(Token::Num(self.number())),
                c if c.is_alphabetic() || c == '_' || c == '$' => tokens.push(Token::Ident(self.ident())),
                ch => return Err(LiteralError::Unexpected { ch, at: self.pos }),
            }
        }
        Ok(tokens)
    }

    fn block_comment(&mut self) -> Result<(), LiteralError> {
        let start = self.pos;
        self.pos += 2;
        loop {
            match (self.peek(0), self.peek(1)) {
                (Some('*'), Some('/')) => {
                    self.pos += 2;
                    return Ok(());
                }
                (Some(_), _) => self.pos += 1,
                (None, _) => return Err(LiteralError::UnterminatedComment(start)),
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<String, LiteralError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(c) = self.peek(0) else {
                return Err(LiteralError::UnterminatedString(start));
            };
            self.pos += 1;
            match c {
                c if c == quote => return Ok(out),
                '$' if quote == '`' && self.peek(0) == Some('{') => return Err(LiteralError::Interpolation),
                '\\' => {
                    let Some(escaped) = self.peek(0) else {
                        return Err(LiteralError::UnterminatedString(start));
                    };
                    self.pos += 1;
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'b' => out.push('\u{8}'),
                        'f' => out.push('\u{c}'),
                        'v' => out.push('\u{b}'),
                        '0' => out.push('\0'),
                        'u' => out.push(self.hex_escape(4)),
                        'x' => out.push(self.hex_escape(2)),
                        '\n' => {}
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
    }

    /// Reads `len` hex digits; malformed escapes decode to U+FFFD.
    fn hex_escape(&mut self, len: usize) -> char {
        let end = (self.pos + len).min(self.chars.len());
        let digits: String = self.chars[self.pos..end].iter().collect();
        self.pos = end;
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .unwrap_or('\u{fffd}')
    }

    fn number(&mut self) -> String {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek(0) {
            let exponent_sign = (c == '+' || c == '-') && matches!(self.chars[self.pos - 1], 'e' | 'E');
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw: String = self.chars[start..self.pos].iter().filter(|c| **c != '_').collect();
        normalize_number(&raw)
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek(0).is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }
}

fn normalize_number(raw: &str) -> String {
    let (sign, digits) = match raw.as_bytes().first() {
        Some(b'-') => ("-", &raw[1..]),
        Some(b'+') => ("", &raw[1..]),
        _ => ("", raw),
    };
    let lower = digits.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x")
        && let Ok(n) = i64::from_str_radix(hex, 16)
    {
        return format!("{sign}{n}");
    }
    let mut out = String::from(sign);
    if digits.starts_with('.') {
        out.push('0');
    }
    out.push_str(digits);
    if digits.ends_with('.') {
        out.push('0');
    }
    out
}

fn to_json(tokens: &[Token]) -> Result<String, LiteralError> {
    let mut out = String::new();
    let mut after_value = false;
    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1);
        let starts_value = matches!(token, Token::Open(_) | Token::Str(_) | Token::Num(_) | Token::Ident(_));
        if starts_value && after_value {
            return Err(LiteralError::Malformed(format!("missing separator before token {i}")));
        }
        after_value = matches!(token, Token::Close(_) | Token::Str(_) | Token::Num(_) | Token::Ident(_));
        match token {
            Token::Open(c) | Token::Close(c) => out.push(*c),
            Token::Colon => out.push(':'),
            Token::Comma => {
                if !matches!(next, Some(Token::Close(_)) | None) {
                    out.push(',');
                }
            }
            Token::Str(s) => out.push_str(&quote(s)?),
            Token::Num(n) => out.push_str(n),
            Token::Ident(name) if next == Some(&Token::Colon) => out.push_str(&quote(name)?),
            Token::Ident(name) => match name.as_str() {
                "true" | "false" | "null" => out.push_str(name),
                "undefined" | "NaN" | "Infinity" => out.push_str("null"),
                _ => return Err(LiteralError::Identifier(name.clone())),
            },
        }
    }
    Ok(out)
}

fn quote(s: &str) -> Result<String, LiteralError> {
    serde_json::to_string(s).map_err(|e| LiteralError::Malformed(e.to_string()))
}
