//! The combinator primitives, the packrat cache, and rule dispatch.
//!
//! A grammar rule body is a sequence of calls into a [`Parser`] that each
//! produce an [`Ast`], merged together by the caller. Everything here is
//! single-threaded and synchronous; see the crate docs for the concurrency
//! model.

use std::collections::{BTreeMap, HashMap};

use crate::ast::Ast;
use crate::buffer::Buffer;
use crate::error::ParseError;
use crate::semantics::Semantics;

struct CacheEntry<S> {
    ast: Ast,
    new_pos: usize,
    new_state: S,
}

/// A packrat-memoized PEG parser over a [`Buffer`], generic over a
/// user-defined state `S` threaded alongside the cursor.
///
/// `S` is cloned on every `try`/lookahead/cache operation, so it should stay
/// cheap (the common case is `()`  or a small `Copy` enum tracking, say,
/// "are we inside a string literal").
pub struct Parser<S = ()> {
    buffer: Buffer,
    state: S,
    cache: BTreeMap<usize, HashMap<(String, S), CacheEntry<S>>>,
    semantics: Option<Box<dyn Semantics<S>>>,
}

impl<S> Parser<S>
where
    S: Clone + Eq + std::hash::Hash,
{
    pub fn new(text: impl Into<String>, state: S) -> Self {
        Parser {
            buffer: Buffer::new(text),
            state,
            cache: BTreeMap::new(),
            semantics: None,
        }
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffer
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn set_semantics(&mut self, semantics: impl Semantics<S> + 'static) {
        self.semantics = Some(Box::new(semantics));
    }

    fn snapshot(&self) -> (usize, S) {
        (self.buffer.pos(), self.state.clone())
    }

    fn restore(&mut self, snap: (usize, S)) {
        self.buffer.go_to(snap.0);
        self.state = snap.1;
    }

    // ---- 4.4.1 Primitives ----------------------------------------------

    /// Skip whitespace, then match the literal `s`. Yields `Leaf(s)` on
    /// success, `Failure(FailedToken(s))` on failure.
    pub fn token(&mut self, s: &str) -> Ast {
        self.buffer.next_token();
        if self.buffer.match_token(s) {
            Ast::leaf(s)
        } else {
            Ast::failure(ParseError::FailedToken(s.to_string()))
        }
    }

    /// Skip whitespace, then match the anchored regex `re`. Yields
    /// `Leaf(captured text)` on success.
    pub fn pattern(&mut self, re: &str) -> Ast {
        self.buffer.next_token();
        match self.buffer.match_pattern(re) {
            Ok(Some(matched)) => Ast::leaf(matched),
            Ok(None) => Ast::failure(ParseError::FailedPattern(re.to_string())),
            Err(err) => Ast::failure(ParseError::FailedPattern(format!("{}: {}", re, err))),
        }
    }

    /// Always fails.
    pub fn fail(&mut self) -> Ast {
        Ast::failure(ParseError::FailedParse("fail".to_string()))
    }

    /// Skip whitespace; succeed with `Empty` iff at end of input.
    pub fn check_eof(&mut self) -> Ast {
        self.buffer.next_token();
        if self.buffer.at_end() {
            Ast::empty()
        } else {
            Ast::failure(ParseError::FailedParse("Expecting end of text.".to_string()))
        }
    }

    /// Commit: yields `Empty` with `cut=true`, and drops every packrat cache
    /// entry whose position is at or before the current one.
    pub fn cut(&mut self) -> Ast {
        let pos = self.buffer.pos();
        let kept = self.cache.split_off(&(pos + 1));
        let dropped: usize = self.cache.values().map(|m| m.len()).sum();
        self.cache = kept;
        log::trace!("cut at {}: dropped {} cache entries", pos, dropped);
        Ast::cut_marker()
    }

    // ---- 4.4.2 Scoping and backtracking ---------------------------------

    /// Snapshot `(pos, state)`, invoke `f`. On `Failure`, restore both; in
    /// all cases the result propagates unchanged.
    pub fn try_parse(&mut self, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let snap = self.snapshot();
        let result = f(self);
        if result.is_failure() {
            self.restore(snap);
        }
        result
    }

    /// Alias for [`Parser::try_parse`]; denotes the scope of one branch of
    /// a disjunction.
    pub fn choice(&mut self, f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        self.try_parse(f)
    }

    /// One alternative of a `choice`. Returns `(fired, ast)`: `fired` is
    /// `false` only when `f` failed without a cut, meaning the choice
    /// should keep trying further alternatives.
    pub fn option(&mut self, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> (bool, Ast) {
        let result = self.try_parse(&mut f);
        if result.is_failure() && !result.cut() {
            (false, Ast::empty())
        } else {
            let mut result = result;
            result.set_cut(false);
            (true, result)
        }
    }

    /// `optional(f)`: a convenience `choice` of one option against an
    /// implicit empty alternative. Never itself fails.
    pub fn optional(&mut self, f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let (_, ast) = self.option(f);
        ast
    }

    // ---- 4.4.4 Lookaheads ------------------------------------------------

    /// Positive lookahead: run `f`, always restore `(pos, state)`.
    /// Propagates `Failure` unchanged; on success returns `Empty`. Never
    /// memoized.
    pub fn lookahead(&mut self, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let snap = self.snapshot();
        let result = f(self);
        self.restore(snap);
        if result.is_failure() {
            result
        } else {
            Ast::empty()
        }
    }

    /// Negative lookahead: a success inside `f` becomes
    /// `Failure(FailedLookahead)`; a failure becomes `Empty`.
    pub fn lookahead_not(&mut self, f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let inner = self.lookahead(f);
        if inner.is_failure() {
            Ast::empty()
        } else {
            Ast::failure(ParseError::FailedLookahead)
        }
    }

    // ---- 4.4.5 Grouping --------------------------------------------------

    /// Run `f`; if it produced a `Sequence`, mark it mergeable so its items
    /// splice into the enclosing sequence instead of nesting.
    pub fn group(&mut self, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let mut result = f(self);
        result.mark_mergeable();
        result
    }

    // ---- 4.4.6 Closures ---------------------------------------------------

    /// Zero-or-more repetition of `f`, accumulated into a `Sequence`.
    pub fn closure(&mut self, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let mut acc = Ast::sequence(Vec::new());
        loop {
            let before = self.buffer.pos();
            let item = self.try_parse(&mut f);
            if item.is_failure() {
                if item.cut() {
                    return item;
                }
                return acc;
            }
            if self.buffer.pos() == before {
                return Ast::failure(ParseError::FailedParse("empty closure".to_string()));
            }
            acc.merge(item);
        }
    }

    /// One-or-more repetition of `f`: the first iteration is mandatory, the
    /// remainder is a [`Parser::closure`] spliced into it.
    pub fn positive_closure(&mut self, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let first = self.try_parse(&mut f);
        if first.is_failure() {
            return first;
        }
        let mut rest = self.closure(&mut f);
        if rest.is_failure() {
            return rest;
        }
        rest.mark_mergeable();
        let mut acc = Ast::sequence(vec![first]);
        acc.merge(rest);
        acc
    }

    // ---- 4.4.7 Rule call and packrat --------------------------------------

    /// Invoke rule `name`'s body `f` under full packrat memoization.
    pub fn call(&mut self, name: &str, mut f: impl FnMut(&mut Parser<S>) -> Ast) -> Ast {
        let pos = self.buffer.pos();
        let key = (name.to_string(), self.state.clone());

        if let Some(entry) = self.cache.get(&pos).and_then(|m| m.get(&key)) {
            log::trace!("packrat hit: {} @ {}", name, pos);
            let ast = entry.ast.clone();
            self.buffer.go_to(entry.new_pos);
            self.state = entry.new_state.clone();
            return ast;
        }
        log::trace!("packrat miss: {} @ {}", name, pos);

        if name.chars().next().map_or(false, |c| c.is_lowercase()) {
            self.buffer.next_token();
        }

        let orig_state = self.state.clone();
        let mut ast = f(self);
        ast.unwrap_at_sign();

        if let (Some(semantics), false) = (self.semantics.as_mut(), ast.is_failure()) {
            ast = semantics.apply(name, ast, &self.state);
        }

        let new_pos = self.buffer.pos();
        let new_state = self.state.clone();
        log::debug!("call {} @ {}: {}", name, pos, if ast.is_failure() { "fail" } else { "ok" });
        self.cache.entry(pos).or_default().insert(
            key,
            CacheEntry { ast: ast.clone(), new_pos, new_state },
        );

        if ast.is_failure() {
            self.buffer.go_to(pos);
            self.state = orig_state;
        }

        ast
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> Parser<()> {
        Parser::new(text, ())
    }

    #[test]
    fn token_consumes_and_skips_leading_whitespace() {
        let mut parser = p("  foo");
        let ast = parser.token("foo");
        assert_eq!(ast.as_leaf(), Some("foo"));
        assert!(parser.buffer().at_end());
    }

    #[test]
    fn failed_token_does_not_consume() {
        let mut parser = p("bar");
        let ast = parser.token("foo");
        assert!(ast.is_failure());
        assert_eq!(parser.buffer().pos(), 0);
    }

    #[test]
    fn try_parse_restores_state_on_failure() {
        let mut parser = p("bar");
        parser.try_parse(|p| p.token("foo"));
        assert_eq!(parser.buffer().pos(), 0);
    }

    #[test]
    fn option_reports_not_fired_on_plain_failure() {
        let mut parser = p("bar");
        let (fired, ast) = parser.option(|p| p.token("foo"));
        assert!(!fired);
        assert!(ast.is_empty());
        assert_eq!(parser.buffer().pos(), 0);
    }

    #[test]
    fn option_reports_fired_on_cut_failure() {
        let mut parser = p("bar");
        let (fired, ast) = parser.option(|p| {
            let mut acc = p.cut();
            acc.merge(p.token("foo"));
            acc
        });
        assert!(fired);
        assert!(ast.is_failure());
        assert!(!ast.cut());
    }

    #[test]
    fn lookahead_never_consumes() {
        let mut parser = p("foo");
        let ast = parser.lookahead(|p| p.token("foo"));
        assert!(ast.is_empty());
        assert_eq!(parser.buffer().pos(), 0);
    }

    #[test]
    fn lookahead_not_inverts() {
        let mut parser = p("foo");
        let ast = parser.lookahead_not(|p| p.token("foo"));
        assert!(ast.is_failure());
        assert_eq!(parser.buffer().pos(), 0);

        let mut parser2 = p("bar");
        let ast2 = parser2.lookahead_not(|p| p.token("foo"));
        assert!(ast2.is_empty());
    }

    #[test]
    fn closure_collects_zero_or_more() {
        let mut parser = p("aaab");
        let ast = parser.closure(|p| p.token("a"));
        assert_eq!(
            ast.as_sequence().unwrap().items.len(),
            3
        );
        assert_eq!(parser.buffer().pos(), 3);
    }

    #[test]
    fn closure_on_no_matches_is_empty_sequence_not_failure() {
        let mut parser = p("b");
        let ast = parser.closure(|p| p.token("a"));
        assert!(!ast.is_failure());
        assert_eq!(ast.as_sequence().unwrap().items.len(), 0);
    }

    #[test]
    fn positive_closure_requires_one() {
        let mut parser = p("b");
        let ast = parser.positive_closure(|p| p.token("a"));
        assert!(ast.is_failure());
    }

    #[test]
    fn positive_closure_collects_all() {
        let mut parser = p("aaab");
        let ast = parser.positive_closure(|p| p.token("a"));
        assert_eq!(ast.as_sequence().unwrap().items.len(), 3);
    }

    #[test]
    fn call_memoizes_and_restores_position_on_cache_hit() {
        let mut parser = p("foo foo");
        let first = parser.call("token_foo", |p| p.token("foo"));
        assert_eq!(first.as_leaf(), Some("foo"));
        let pos_after_first = parser.buffer().pos();

        parser.buffer_mut().go_to(0);
        let replay = parser.call("token_foo", |p| p.token("foo"));
        assert_eq!(replay.as_leaf(), Some("foo"));
        assert_eq!(parser.buffer().pos(), pos_after_first);
    }

    #[test]
    fn call_unwraps_at_sign_rule_replacement() {
        let mut parser = p("foo");
        let ast = parser.call("Rule", |p| {
            let mut named = Ast::empty();
            named.assign("@", p.token("foo"));
            named
        });
        assert_eq!(ast.as_leaf(), Some("foo"));
    }

    #[test]
    fn cut_drops_cache_entries_at_or_before_current_position() {
        let mut parser = p("foo");
        parser.call("r", |p| p.token("foo"));
        parser.buffer_mut().go_to(3);
        parser.cut();
        assert!(parser.cache.is_empty());
    }
}
