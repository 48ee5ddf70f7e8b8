#![doc = include_str!("../README.md")]

//! `pegrat` is runtime support for packrat-memoized PEG parsers: a result
//! tree ([`ast::Ast`]) with merge semantics for concatenation and named
//! capture, a text [`buffer::Buffer`] with whitespace/nameguard-aware
//! matching, and a combinator [`engine::Parser`] tying them together with a
//! packrat cache and a cut operator.
//!
//! A generated grammar is expected to look roughly like:
//!
//! ```
//! use pegrat::prelude::*;
//!
//! fn digit(p: &mut Parser) -> Ast {
//!     p.pattern(r"[0-9]+")
//! }
//!
//! fn number(p: &mut Parser) -> Ast {
//!     p.call("number", digit)
//! }
//!
//! let mut p = Parser::new("42", ());
//! let ast = number(&mut p);
//! assert_eq!(ast.as_leaf(), Some("42"));
//! ```
//!
//! Rule bodies are ordinary functions (or closures) of shape
//! `FnMut(&mut Parser<S>) -> Ast`, built up by calling combinator methods on
//! the `Parser` and merging their results into an accumulator that starts
//! life as [`Ast::empty`]. Named (keyed) captures go through [`Ast::assign`]
//! instead of [`Ast::merge`]; see the [`ast`] module docs for the full
//! semantics.

pub mod ast;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod io;
pub mod semantics;

/// The common set of imports a generated grammar needs.
pub mod prelude {
    pub use crate::ast::Ast;
    pub use crate::engine::Parser;
    pub use crate::error::ParseError;
    pub use crate::semantics::{NoopSemantics, Semantics};
}
