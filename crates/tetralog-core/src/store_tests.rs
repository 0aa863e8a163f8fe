//! Unit tests for the quad store and order-selection policy.

use crate::store::{GRAPH, OBJECT, PREDICATE, QuadStore, SPOG, SUBJECT, TermOrder};
use crate::term::Term;

#[test]
fn order_policy_puts_constants_first_and_graph_last() {
    // Only the predicate bound.
    let order = TermOrder::for_pattern([false, true, false, false]);
    assert_eq!(order.0, [PREDICATE as u8, SUBJECT as u8, OBJECT as u8, GRAPH as u8]);

    // Subject and object bound.
    let order = TermOrder::for_pattern([true, false, true, false]);
    assert_eq!(order.0, [SUBJECT as u8, OBJECT as u8, PREDICATE as u8, GRAPH as u8]);

    // Nothing bound.
    let order = TermOrder::for_pattern([false, false, false, false]);
    assert_eq!(order, SPOG);

    // A bound graph still sorts last.
    let order = TermOrder::for_pattern([false, false, false, true]);
    assert_eq!(order, SPOG);
}

#[test]
fn insert_updates_every_materialized_order() {
    let mut store = QuadStore::new();
    let posg = TermOrder([1, 2, 0, 3]);
    store.ensure_order(posg);

    assert!(store.insert_quad(
        &Term::named("s"),
        &Term::named("p"),
        &Term::named("o"),
        &Term::DefaultGraph,
    ));

    assert_eq!(store.get_index(SPOG).unwrap().len(), 1);
    assert_eq!(store.get_index(posg).unwrap().len(), 1);
}

#[test]
fn ensure_order_backfills_existing_quads() {
    let mut store = QuadStore::new();
    store.insert_quad(
        &Term::named("s"),
        &Term::named("p"),
        &Term::literal("1"),
        &Term::DefaultGraph,
    );
    store.insert_quad(
        &Term::named("s"),
        &Term::named("q"),
        &Term::literal("2"),
        &Term::DefaultGraph,
    );

    let posg = TermOrder([1, 2, 0, 3]);
    let index = store.ensure_order(posg);
    assert_eq!(index.len(), 2);
}

#[test]
fn remove_keeps_orders_and_predicates_in_sync() {
    let mut store = QuadStore::new();
    let posg = TermOrder([1, 2, 0, 3]);
    store.ensure_order(posg);

    store.insert_quad(
        &Term::named("s"),
        &Term::named("p"),
        &Term::named("o"),
        &Term::DefaultGraph,
    );
    let p = store.intern(&Term::named("p"));
    assert!(store.has_predicate(p));

    let quad = [
        store.intern(&Term::named("s")),
        p,
        store.intern(&Term::named("o")),
        store.intern(&Term::DefaultGraph),
    ];
    assert!(store.remove(quad));
    assert!(!store.has_predicate(p));
    assert!(store.get_index(posg).unwrap().is_empty());
    assert!(store.is_empty());
}

#[test]
fn duplicate_insert_is_reported() {
    let mut store = QuadStore::new();
    let quad = (
        Term::named("s"),
        Term::named("p"),
        Term::named("o"),
        Term::DefaultGraph,
    );
    assert!(store.insert_quad(&quad.0, &quad.1, &quad.2, &quad.3));
    assert!(!store.insert_quad(&quad.0, &quad.1, &quad.2, &quad.3));
    assert_eq!(store.len(), 1);
}

#[test]
fn scan_matches_partial_patterns() {
    let mut store = QuadStore::new();
    store.insert_quad(
        &Term::named("s1"),
        &Term::named("p"),
        &Term::literal("1"),
        &Term::DefaultGraph,
    );
    store.insert_quad(
        &Term::named("s2"),
        &Term::named("p"),
        &Term::literal("2"),
        &Term::DefaultGraph,
    );

    let s1 = store.intern(&Term::named("s1"));
    let hits: Vec<_> = store.scan(&[Some(s1), None, None, None]).collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0][OBJECT], store.intern(&Term::literal("1")));
}

#[test]
#[should_panic(expected = "ground")]
fn variables_cannot_be_stored() {
    let mut store = QuadStore::new();
    store.insert_quad(
        &Term::variable("x"),
        &Term::named("p"),
        &Term::named("o"),
        &Term::DefaultGraph,
    );
}
