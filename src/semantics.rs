//! The semantic-action hook `call` invokes after a rule body succeeds.

use crate::ast::Ast;

/// A semantic-action callback keyed by rule name.
///
/// Implementations transform a successfully-parsed rule's [`Ast`] before it
/// is cached and returned to the caller — the concrete equivalent of the
/// `(Ast) -> Ast` hook §6 describes in prose. A grammar with no semantic
/// actions simply never registers one on its [`crate::engine::Parser`].
pub trait Semantics<S> {
    /// Called once per successful (non-`Failure`) rule body, named by
    /// `rule`. `state` is the parser's state *after* the rule body ran.
    /// Failures never reach this hook; see §4.4.7 step 5.
    fn apply(&mut self, rule: &str, ast: Ast, state: &S) -> Ast;
}

/// The no-op hook: returns `ast` unchanged. Useful as a default type
/// parameter for grammars with no semantic actions.
pub struct NoopSemantics;

impl<S> Semantics<S> for NoopSemantics {
    fn apply(&mut self, _rule: &str, ast: Ast, _state: &S) -> Ast {
        ast
    }
}
