//! Unit tests for term encoding and interning.

use crate::interner::TermInterner;
use crate::term::Term;

#[test]
fn interning_is_canonical() {
    let mut interner = TermInterner::new();
    let a = interner.intern(&Term::named("http://example.org/a"));
    let b = interner.intern(&Term::named("http://example.org/b"));
    let a2 = interner.intern(&Term::named("http://example.org/a"));

    assert_eq!(a, a2);
    assert_ne!(a, b);
    assert_eq!(interner.len(), 2);
}

#[test]
fn structurally_equal_terms_share_ids() {
    let mut interner = TermInterner::new();
    let lit = Term::typed_literal("42", "http://www.w3.org/2001/XMLSchema#integer");
    let id = interner.intern(&lit);
    let again = interner.intern(&Term::typed_literal(
        "42",
        "http://www.w3.org/2001/XMLSchema#integer",
    ));
    assert_eq!(id, again);
    assert_eq!(interner.resolve(id), &lit);
}

#[test]
fn owned_and_borrowed_interning_agree() {
    let mut interner = TermInterner::new();
    let id = interner.intern(&Term::named("a"));
    let owned = interner.intern_owned(Term::named("a"));
    assert_eq!(id, owned);
    assert_eq!(interner.len(), 1);

    let fresh = interner.intern_owned(Term::literal("a"));
    assert_ne!(id, fresh);
    assert_eq!(interner.resolve(fresh), &Term::literal("a"));
}

#[test]
fn distinct_kinds_never_collide() {
    let mut interner = TermInterner::new();
    // Same spelling, different kinds.
    let named = interner.intern(&Term::named("x"));
    let blank = interner.intern(&Term::blank("x"));
    let var = interner.intern(&Term::variable("x"));
    let lit = interner.intern(&Term::literal("x"));

    let ids = [named, blank, var, lit];
    for (i, a) in ids.iter().enumerate() {
        for (j, b) in ids.iter().enumerate() {
            assert_eq!(i == j, a == b);
        }
    }
}

#[test]
fn literal_encoding_distinguishes_datatype_and_language() {
    let plain = Term::literal("chat");
    let french = Term::lang_literal("chat", "fr");
    let typed = Term::typed_literal("chat", "http://example.org/dt");

    assert_ne!(plain.encode(), french.encode());
    assert_ne!(plain.encode(), typed.encode());
    assert_ne!(french.encode(), typed.encode());
}

#[test]
fn literal_encoding_escapes_quotes() {
    // A value containing quote syntax must not forge another encoding.
    let tricky = Term::literal("a\"^^<http://example.org/dt>");
    let honest = Term::typed_literal("a", "http://example.org/dt");
    assert_ne!(tricky.encode(), honest.encode());
}

#[test]
fn lookup_does_not_intern() {
    let mut interner = TermInterner::new();
    assert!(interner.lookup(&Term::named("a")).is_none());
    let id = interner.intern(&Term::named("a"));
    assert_eq!(interner.lookup(&Term::named("a")), Some(id));
    assert_eq!(interner.len(), 1);
}

#[test]
fn iter_yields_insertion_order() {
    let mut interner = TermInterner::new();
    let a = interner.intern(&Term::named("a"));
    let b = interner.intern(&Term::blank("b"));
    let collected: Vec<_> = interner.iter().map(|(id, _)| id).collect();
    assert_eq!(collected, vec![a, b]);
}

#[test]
fn term_serde_round_trip() {
    let term = Term::lang_literal("hello", "en");
    let json = serde_json::to_string(&term).unwrap();
    let back: Term = serde_json::from_str(&json).unwrap();
    assert_eq!(term, back);
}
