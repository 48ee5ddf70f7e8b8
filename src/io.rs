//! Textual (de)serialization of [`Ast`] values.
//!
//! Not JSON: `Failure` is written as a bare `Type("message")` call rather
//! than an object, and the escape set is the small fixed one the original
//! tool chain supports. Used for snapshot testing (`write`) and for the
//! `astify`/`astcmp` tools (`write` + `read`).

use std::iter::Peekable;
use std::str::Chars;

use crate::ast::{Ast, Named};
use crate::error::ParseError;
use thiserror::Error;

const INDENT: &str = "    ";

/// Render `ast` in the write-format described in the crate's top-level
/// docs: `Empty` -> `null`, `Leaf` -> a quoted escaped string, `Sequence`
/// -> a bracketed comma list, `Named` -> a braced `"key" : value` list in
/// declaration order, `Failure` -> `Type("message")`.
pub fn write(ast: &Ast) -> String {
    let mut out = String::new();
    write_at(ast, 0, &mut out);
    out
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_at(ast: &Ast, depth: usize, out: &mut String) {
    if let Some(err) = ast.as_failure() {
        out.push_str(err.kind());
        out.push('(');
        push_quoted(&err.message(), out);
        out.push(')');
        return;
    }
    if let Some(s) = ast.as_leaf() {
        push_quoted(s, out);
        return;
    }
    if let Some(seq) = ast.as_sequence() {
        if seq.items.is_empty() {
            out.push_str("[]");
            return;
        }
        out.push_str("[\n");
        for (i, item) in seq.items.iter().enumerate() {
            if i > 0 {
                out.push_str(", \n");
            }
            push_indent(out, depth + 1);
            write_at(item, depth + 1, out);
        }
        out.push('\n');
        push_indent(out, depth);
        out.push(']');
        return;
    }
    if let Some(named) = ast.as_named() {
        if named.order.is_empty() {
            out.push_str("{}");
            return;
        }
        out.push_str("{\n");
        for (i, key) in named.order.iter().enumerate() {
            if i > 0 {
                out.push_str(", \n");
            }
            push_indent(out, depth + 1);
            push_quoted(key, out);
            out.push_str(" : ");
            write_at(&named.map[key], depth + 1, out);
        }
        out.push('\n');
        push_indent(out, depth);
        out.push('}');
        return;
    }
    out.push_str("null");
}

fn push_quoted(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

/// A malformed write-format document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("expected {expected:?} at position {pos}, found {found:?}")]
    UnexpectedChar { expected: char, found: char, pos: usize },
    #[error("unknown failure kind {0:?}")]
    UnknownFailureKind(String),
    #[error("unicode escapes (\\u) are not supported")]
    UnsupportedEscape,
    #[error("expected a value at position {0}")]
    ExpectedValue(usize),
    #[error("trailing data after value at position {0}")]
    TrailingData(usize),
}

/// Parse the write-format produced by [`write`]. Errors on malformed input,
/// including any `\u` escape (explicitly unsupported; spec §4.5).
pub fn read(input: &str) -> Result<Ast, ReadError> {
    let mut reader = Reader { chars: input.chars().peekable(), pos: 0 };
    reader.skip_ws();
    let ast = reader.read_value()?;
    reader.skip_ws();
    if reader.peek().is_some() {
        return Err(ReadError::TrailingData(reader.pos));
    }
    Ok(ast)
}

struct Reader<'a> {
    chars: Peekable<Chars<'a>>,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ReadError> {
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(ReadError::UnexpectedChar { expected, found: c, pos: self.pos }),
            None => Err(ReadError::UnexpectedEof),
        }
    }

    fn read_value(&mut self) -> Result<Ast, ReadError> {
        self.skip_ws();
        match self.peek() {
            Some('n') => self.read_null(),
            Some('"') => Ok(Ast::leaf(self.read_string()?)),
            Some('[') => self.read_sequence(),
            Some('{') => self.read_named(),
            Some(c) if c.is_ascii_uppercase() => self.read_failure(),
            _ => Err(ReadError::ExpectedValue(self.pos)),
        }
    }

    fn read_null(&mut self) -> Result<Ast, ReadError> {
        for expected in "null".chars() {
            self.expect(expected)?;
        }
        Ok(Ast::empty())
    }

    fn read_string(&mut self) -> Result<String, ReadError> {
        self.expect('"')?;
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(ReadError::UnexpectedEof),
                Some('"') => return Ok(s),
                Some('\\') => match self.bump() {
                    Some('b') => s.push('\u{8}'),
                    Some('f') => s.push('\u{c}'),
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('u') => return Err(ReadError::UnsupportedEscape),
                    Some(other) => s.push(other),
                    None => return Err(ReadError::UnexpectedEof),
                },
                Some(ch) => s.push(ch),
            }
        }
    }

    fn read_sequence(&mut self) -> Result<Ast, ReadError> {
        self.expect('[')?;
        self.skip_ws();
        let mut items = Vec::new();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(Ast::sequence(items));
        }
        loop {
            items.push(self.read_value()?);
            self.skip_ws();
            match self.bump() {
                Some(',') => {
                    self.skip_ws();
                }
                Some(']') => break,
                Some(c) => {
                    return Err(ReadError::UnexpectedChar { expected: ']', found: c, pos: self.pos })
                }
                None => return Err(ReadError::UnexpectedEof),
            }
        }
        Ok(Ast::sequence(items))
    }

    fn read_named(&mut self) -> Result<Ast, ReadError> {
        self.expect('{')?;
        self.skip_ws();
        let mut named = Named::default();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Ast::from_named(named));
        }
        loop {
            let key = self.read_string()?;
            self.skip_ws();
            self.expect(':')?;
            self.skip_ws();
            let value = self.read_value()?;
            if key != "@" {
                named.order.push(key.clone());
            }
            named.map.insert(key, value);
            self.skip_ws();
            match self.bump() {
                Some(',') => {
                    self.skip_ws();
                }
                Some('}') => break,
                Some(c) => {
                    return Err(ReadError::UnexpectedChar { expected: '}', found: c, pos: self.pos })
                }
                None => return Err(ReadError::UnexpectedEof),
            }
        }
        Ok(Ast::from_named(named))
    }

    fn read_failure(&mut self) -> Result<Ast, ReadError> {
        let mut kind = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            kind.push(self.bump().unwrap());
        }
        self.expect('(')?;
        self.skip_ws();
        let message = self.read_string()?;
        self.skip_ws();
        self.expect(')')?;
        let err = match kind.as_str() {
            "FailedToken" => ParseError::FailedToken(strip_prefix(&message, "expecting \"", "\"")),
            "FailedPattern" => {
                ParseError::FailedPattern(strip_prefix(&message, "expecting \"", "\""))
            }
            "FailedLookahead" => ParseError::FailedLookahead,
            "FailedParse" => ParseError::FailedParse(message),
            other => return Err(ReadError::UnknownFailureKind(other.to_string())),
        };
        Ok(Ast::failure(err))
    }
}

/// Best-effort recovery of a `FailedToken`/`FailedPattern`'s original
/// payload from its rendered `expecting "..."` message; falls back to the
/// whole message if it does not look like that shape.
fn strip_prefix(message: &str, prefix: &str, suffix: &str) -> String {
    message
        .strip_prefix(prefix)
        .and_then(|s| s.strip_suffix(suffix))
        .unwrap_or(message)
        .to_string()
}
