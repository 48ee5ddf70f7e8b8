//! The polymorphic result tree and its merge semantics.
//!
//! [`Ast`] is a tagged sum over `{Empty, Leaf, Sequence, Named, Failure}`.
//! Every grammar rule body builds one by repeatedly [`Ast::merge`]-ing
//! child results into an accumulator that starts life as [`Ast::empty`].
//! Named (keyed) captures go through [`Ast::assign`] instead, which is the
//! only path that is allowed to populate a [`Named`] payload.

use crate::error::ParseError;
use indexmap::IndexMap;
use std::mem;

/// A node in the result tree, plus the sticky `cut` bit every node carries.
///
/// The `cut` bit lives outside the variant on purpose: it is set by
/// [`Ast::merge`] whenever the addend carries one, even in cases (e.g.
/// merging into an already-failed augend) where the variant itself does
/// not change. See §4.3 of the spec for the merge table this type
/// implements.
#[derive(Debug, Clone)]
pub struct Ast {
    node: AstNode,
    cut: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum AstNode {
    Empty,
    Leaf(String),
    Sequence(Sequence),
    Named(Named),
    Failure(ParseError),
}

/// The result of a concrete rule body or a `(...)` group.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    /// Children in the order the grammar matched them.
    pub items: Vec<Ast>,
    /// Right-hand-side-only: "splice my items into the augend instead of
    /// appending me as a single nested element."
    pub mergeable: bool,
}

impl PartialEq for Sequence {
    /// `mergeable` is a merge-time instruction, not part of the tree's
    /// identity, so it is excluded here (spec §4.3.2).
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}
impl Eq for Sequence {}

/// The result of an abstract rule body built from named captures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Named {
    /// Declared keys in declaration order. Never includes `"@"`.
    pub order: Vec<String>,
    pub map: IndexMap<String, Ast>,
}
impl Eq for Named {}

impl Ast {
    /// The identity element for merge; what every accumulator starts as.
    pub fn empty() -> Self {
        Ast { node: AstNode::Empty, cut: false }
    }

    /// A matched token or pattern capture.
    pub fn leaf(s: impl Into<String>) -> Self {
        Ast { node: AstNode::Leaf(s.into()), cut: false }
    }

    /// A concrete sequence of already-built children (not yet mergeable).
    pub fn sequence(items: Vec<Ast>) -> Self {
        Ast { node: AstNode::Sequence(Sequence { items, mergeable: false }), cut: false }
    }

    /// A fresh, empty abstract (named-capture) result.
    pub fn named() -> Self {
        Ast { node: AstNode::Named(Named::default()), cut: false }
    }

    /// Wrap an already-built [`Named`] payload (used by the serializer's
    /// reader, which parses keys directly in declaration order).
    pub fn from_named(named: Named) -> Self {
        Ast { node: AstNode::Named(named), cut: false }
    }

    /// An abstract result pre-seeded with the keys a generated rule body
    /// declares, in declaration order. `force_list` keys start as an empty
    /// [`Sequence`] instead of [`Ast::empty`], matching the grammar
    /// compiler's `*`-declared (forced-list) captures.
    pub fn named_seeded<'a, I: IntoIterator<Item = (&'a str, bool)>>(keys: I) -> Self {
        let mut named = Named::default();
        for (key, force_list) in keys {
            let slot = if force_list { Ast::sequence(Vec::new()) } else { Ast::empty() };
            named.map.insert(key.to_string(), slot);
            if key != "@" {
                named.order.push(key.to_string());
            }
        }
        Ast { node: AstNode::Named(named), cut: false }
    }

    /// A failed match carrying a diagnostic payload.
    pub fn failure(err: ParseError) -> Self {
        Ast { node: AstNode::Failure(err), cut: false }
    }

    /// `Empty` with the cut bit set; this is what [`crate::engine::Parser::cut`] yields.
    pub(crate) fn cut_marker() -> Self {
        Ast { node: AstNode::Empty, cut: true }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.node, AstNode::Empty)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.node, AstNode::Failure(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.node, AstNode::Sequence(_))
    }

    pub fn is_named(&self) -> bool {
        matches!(self.node, AstNode::Named(_))
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match &self.node {
            AstNode::Leaf(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Sequence> {
        match &self.node {
            AstNode::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&Named> {
        match &self.node {
            AstNode::Named(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_failure(&self) -> Option<&ParseError> {
        match &self.node {
            AstNode::Failure(e) => Some(e),
            _ => None,
        }
    }

    /// Consume `self`, returning the error if it was a failure.
    pub fn into_failure(self) -> Option<ParseError> {
        match self.node {
            AstNode::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn cut(&self) -> bool {
        self.cut
    }

    pub fn set_cut(&mut self, cut: bool) {
        self.cut = cut;
    }

    /// Look up a named child by key, if `self` is [`Named`] and holds it.
    pub fn get(&self, key: &str) -> Option<&Ast> {
        match &self.node {
            AstNode::Named(n) => n.map.get(key),
            _ => None,
        }
    }

    /// If `self` is `Sequence`, set its `mergeable` flag. Used by `group`
    /// and `positive_closure` to let a child's items splice into the
    /// parent on the next merge. A no-op on any other variant.
    pub fn mark_mergeable(&mut self) {
        if let AstNode::Sequence(seq) = &mut self.node {
            seq.mergeable = true;
        }
    }

    /// If `self` is `Named` and contains the reserved `"@"` key, replace
    /// `self` with that child (rule-replacement; spec §4.3.1, §4.4.7 step 4).
    /// The cut bit carries over from whichever value ends up in `self`.
    pub fn unwrap_at_sign(&mut self) {
        if let AstNode::Named(named) = &mut self.node {
            if let Some(replacement) = named.map.shift_remove("@") {
                *self = replacement;
            }
        }
    }

    /// Merge `addend` into `self` (the augend) per the table in spec §4.3.
    /// `self` is mutated in place; `addend` is consumed, never mutated.
    pub fn merge(&mut self, addend: Ast) {
        if addend.cut {
            self.cut = true;
        }
        let augend_node = mem::replace(&mut self.node, AstNode::Empty);
        self.node = merge_nodes(augend_node, addend.node);
    }

    /// Named-capture assignment: `self[key] <- value` (spec §4.3.1).
    ///
    /// If `value` is a failure, it replaces `self`'s *content* wholesale
    /// (the cut bit on `self` is untouched — only the indexed slot's cut
    /// status, folded in via its own `merge`, can change that). Otherwise
    /// `self` is coerced to `Named` if it is not one already, the key is
    /// seeded with `Empty` if absent, and `value` is merged into that slot.
    pub fn assign(&mut self, key: &str, value: Ast) {
        if let AstNode::Failure(_) = &value.node {
            self.node = value.node;
            return;
        }
        if !matches!(self.node, AstNode::Named(_)) {
            self.node = AstNode::Named(Named::default());
        }
        if let AstNode::Named(named) = &mut self.node {
            if !named.map.contains_key(key) {
                named.map.insert(key.to_string(), Ast::empty());
                if key != "@" {
                    named.order.push(key.to_string());
                }
            }
            let slot = named.map.get_mut(key).expect("just inserted");
            slot.merge(value);
        }
    }
}

fn wrap(node: AstNode) -> Ast {
    Ast { node, cut: false }
}

fn merge_nodes(augend: AstNode, addend: AstNode) -> AstNode {
    match (augend, addend) {
        // A Failure augend absorbs everything; it stays a Failure.
        (AstNode::Failure(e), _) => AstNode::Failure(e),
        // Any addend failure overrides whatever the augend was.
        (_, AstNode::Failure(e)) => AstNode::Failure(e),

        // Empty addend never changes the augend (its cut bit was already
        // folded in by `Ast::merge`).
        (augend, AstNode::Empty) => augend,

        (AstNode::Empty, addend) => addend,

        (AstNode::Leaf(t), AstNode::Leaf(s)) => AstNode::Sequence(Sequence {
            items: vec![Ast::leaf(t), Ast::leaf(s)],
            mergeable: false,
        }),
        (AstNode::Leaf(t), AstNode::Sequence(l)) => {
            let items = if l.mergeable {
                let mut items = vec![Ast::leaf(t)];
                items.extend(l.items);
                items
            } else {
                vec![Ast::leaf(t), wrap(AstNode::Sequence(l))]
            };
            AstNode::Sequence(Sequence { items, mergeable: false })
        }
        (AstNode::Leaf(t), AstNode::Named(m)) => AstNode::Sequence(Sequence {
            items: vec![Ast::leaf(t), wrap(AstNode::Named(m))],
            mergeable: false,
        }),

        (AstNode::Sequence(mut s), AstNode::Leaf(x)) => {
            s.items.push(Ast::leaf(x));
            AstNode::Sequence(s)
        }
        (AstNode::Sequence(mut s), AstNode::Sequence(l)) => {
            if l.mergeable {
                s.items.extend(l.items);
            } else {
                s.items.push(wrap(AstNode::Sequence(l)));
            }
            AstNode::Sequence(s)
        }
        (AstNode::Sequence(mut s), AstNode::Named(m)) => {
            s.items.push(wrap(AstNode::Named(m)));
            AstNode::Sequence(s)
        }

        // Plain merges into a Named augend drop their payload (spec's
        // preserved "open question": nested-named-into-named is ignored,
        // not merged). Named capture assembly must go through `assign`.
        (AstNode::Named(m), AstNode::Leaf(_))
        | (AstNode::Named(m), AstNode::Sequence(_))
        | (AstNode::Named(m), AstNode::Named(_)) => AstNode::Named(m),
    }
}

impl PartialEq for Ast {
    /// Structural equality (spec §4.3.2): variant-wise, ignoring the
    /// `cut` bit and `Sequence::mergeable`.
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}
impl Eq for Ast {}
