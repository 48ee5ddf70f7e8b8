//! The closed set of parse-failure kinds a combinator can report.
//!
//! These are values, not exceptions: a failing combinator returns an
//! [`Ast::Failure`](crate::ast::Ast) carrying a [`ParseError`], and the
//! engine inspects that value at `try`/`option`/`choice`/closure
//! boundaries rather than unwinding the stack.

use thiserror::Error;

/// A single parse failure, as reported by a combinator.
///
/// `type()` and `message()` are the two fields the serializer and the
/// equality relation care about; everything else about a `ParseError` is
/// incidental.
#[derive(Error, Debug, Clone)]
pub enum ParseError {
    /// `token(s)` did not match at the current position.
    #[error("expecting \"{0}\"")]
    FailedToken(String),
    /// `pattern(re)` did not match at the current position.
    #[error("expecting \"{0}\"")]
    FailedPattern(String),
    /// A negative lookahead's inner pattern matched (so the lookahead fails).
    #[error("failed lookahead")]
    FailedLookahead,
    /// An explicit `fail()`, an empty closure, an EOF check, or a
    /// grammar-emitted error with a free-form message.
    #[error("{0}")]
    FailedParse(String),
}

impl ParseError {
    /// The discriminator string the serializer writes as `Type(...)`.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::FailedToken(_) => "FailedToken",
            ParseError::FailedPattern(_) => "FailedPattern",
            ParseError::FailedLookahead => "FailedLookahead",
            ParseError::FailedParse(_) => "FailedParse",
        }
    }

    /// The human-readable detail `Display` already formats as `message()`.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl PartialEq for ParseError {
    /// Per spec §4.2: equality compares `(type, message)`, nothing else.
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.message() == other.message()
    }
}

impl Eq for ParseError {}
