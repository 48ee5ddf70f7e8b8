//! The invariants listed in the crate's testable-properties section,
//! each as a focused integration test against the public API.

use pegrat::ast::Ast;
use pegrat::buffer::Buffer;
use pegrat::engine::Parser;
use pegrat::error::ParseError;
use pegrat::io::{read, write};

/// Lets `RUST_LOG=trace` surface packrat cache hits/misses while a single
/// test runs; safe to call repeatedly since later calls are no-ops.
fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn property_1_match_advances_pos_by_token_len_or_not_at_all() {
    init_logging();
    let mut buf = Buffer::new("foobar");
    assert!(buf.match_token("foo"));
    assert_eq!(buf.pos(), 3);

    let mut buf = Buffer::new("foobar");
    assert!(!buf.match_token("bar"));
    assert_eq!(buf.pos(), 0);
}

#[test]
fn property_2_next_token_is_idempotent() {
    init_logging();
    let mut buf = Buffer::new("   foo");
    buf.next_token();
    let once = buf.pos();
    buf.next_token();
    assert_eq!(buf.pos(), once);
}

#[test]
fn property_3_try_restores_on_failure_only() {
    init_logging();
    let mut p = Parser::new("bar", ());
    p.try_parse(|p| p.token("foo"));
    assert_eq!(p.buffer().pos(), 0);

    let mut p = Parser::new("foo", ());
    p.try_parse(|p| p.token("foo"));
    assert_eq!(p.buffer().pos(), 3);
}

#[test]
fn property_4_packrat_is_referentially_transparent() {
    init_logging();
    let mut p = Parser::new("foofoo", ());
    let first = p.call("r", |p| p.token("foo"));
    let pos_after_first = p.buffer().pos();

    p.buffer_mut().go_to(0);
    let replay = p.call("r", |p| p.token("foo"));

    assert_eq!(first, replay);
    assert_eq!(p.buffer().pos(), pos_after_first);
}

#[test]
fn property_5_cut_evicts_entries_at_or_before_current_position() {
    init_logging();
    let mut p = Parser::new("foo", ());
    p.call("r", |p| p.token("foo"));
    assert_ne!(p.buffer().pos(), 0);
    p.cut();
    // A subsequent call at position 0 must miss the cache and re-parse,
    // rather than quietly returning a stale entry, since nothing is left
    // there to hit.
    p.buffer_mut().go_to(0);
    let ast = p.call("r", |p| p.token("foo"));
    assert_eq!(ast.as_leaf(), Some("foo"));
}

#[test]
fn property_6_merge_is_left_associative_and_does_not_mutate_the_addend() {
    init_logging();
    let addend = Ast::leaf("b");
    let mut augend = Ast::leaf("a");
    augend.merge(addend.clone());
    assert_eq!(addend, Ast::leaf("b"));
    assert_eq!(augend, Ast::sequence(vec![Ast::leaf("a"), Ast::leaf("b")]));
}

#[test]
fn property_7_serialization_round_trips() {
    init_logging();
    let mut named = Ast::empty();
    named.assign("k", Ast::sequence(vec![Ast::leaf("x"), Ast::leaf("y")]));
    let trees = vec![
        Ast::empty(),
        Ast::leaf("hello \"world\"\n"),
        Ast::sequence(vec![Ast::leaf("a"), Ast::leaf("b")]),
        named,
        Ast::failure(ParseError::FailedToken("x".to_string())),
        Ast::failure(ParseError::FailedParse("custom message".to_string())),
    ];
    for ast in trees {
        assert_eq!(read(&write(&ast)).unwrap(), ast);
    }
}

#[test]
fn property_8_equality_is_an_equivalence_relation() {
    init_logging();
    let a = Ast::sequence(vec![Ast::leaf("x")]);
    let b = Ast::sequence(vec![Ast::leaf("x")]);
    let c = Ast::sequence(vec![Ast::leaf("x")]);

    assert_eq!(a, a); // reflexive
    assert_eq!(a, b);
    assert_eq!(b, a); // symmetric
    assert_eq!(b, c);
    assert_eq!(a, c); // transitive
}
