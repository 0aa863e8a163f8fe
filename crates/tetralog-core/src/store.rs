//! Quad storage: one trie index per materialized term order.
//!
//! The store owns the interner, keeps every materialized index in sync on
//! insert/delete, and implements the order-selection policy compiled
//! patterns rely on: constant positions first, variable positions after,
//! graph always last.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::interner::{TermId, TermInterner};
use crate::term::Term;
use crate::trie::{Scan, TrieIndex};

pub const SUBJECT: usize = 0;
pub const PREDICATE: usize = 1;
pub const OBJECT: usize = 2;
pub const GRAPH: usize = 3;

/// A permutation of the four quad positions, naming which position a trie
/// index tests at each depth.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TermOrder(pub [u8; 4]);

/// Canonical subject→predicate→object→graph order, always materialized.
pub const SPOG: TermOrder = TermOrder([0, 1, 2, 3]);

impl TermOrder {
    /// Order preferred for a pattern with the given bound positions:
    /// bound subject/predicate/object positions first (in that fixed
    /// priority), unbound ones after, the graph position last. This puts
    /// every directly walkable level before the first choice point.
    pub fn for_pattern(bound: [bool; 4]) -> TermOrder {
        let mut order = [0u8; 4];
        let mut at = 0;
        for p in [SUBJECT, PREDICATE, OBJECT] {
            if bound[p] {
                order[at] = p as u8;
                at += 1;
            }
        }
        for p in [SUBJECT, PREDICATE, OBJECT] {
            if !bound[p] {
                order[at] = p as u8;
                at += 1;
            }
        }
        order[3] = GRAPH as u8;
        TermOrder(order)
    }

    pub fn positions(&self) -> [u8; 4] {
        self.0
    }
}

impl std::fmt::Display for TermOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &p in &self.0 {
            let c = match p as usize {
                SUBJECT => 's',
                PREDICATE => 'p',
                OBJECT => 'o',
                GRAPH => 'g',
                _ => '?',
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Extensional fact storage for one module.
#[derive(Debug, Clone)]
pub struct QuadStore {
    interner: TermInterner,
    orders: IndexMap<TermOrder, TrieIndex>,
    /// Distinct-predicate reference counts, for compile-time resolution.
    predicate_use: BTreeMap<TermId, usize>,
}

impl Default for QuadStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadStore {
    pub fn new() -> Self {
        let mut orders = IndexMap::new();
        orders.insert(SPOG, TrieIndex::new(&SPOG.0));
        Self {
            interner: TermInterner::new(),
            orders,
            predicate_use: BTreeMap::new(),
        }
    }

    pub fn interner(&self) -> &TermInterner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut TermInterner {
        &mut self.interner
    }

    pub fn intern(&mut self, term: &Term) -> TermId {
        self.interner.intern(term)
    }

    /// Number of stored quads.
    pub fn len(&self) -> usize {
        self.index(SPOG).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert an already-interned quad into every materialized index.
    /// Returns false if the quad was already present.
    pub fn insert(&mut self, quad: [TermId; 4]) -> bool {
        let mut inserted = false;
        for index in self.orders.values_mut() {
            inserted = index.insert(&quad);
        }
        if inserted {
            *self.predicate_use.entry(quad[PREDICATE]).or_insert(0) += 1;
        }
        inserted
    }

    /// Intern the terms of a quad and insert it.
    ///
    /// # Panics
    /// Panics if any term is a variable — stored facts are ground.
    pub fn insert_quad(&mut self, subject: &Term, predicate: &Term, object: &Term, graph: &Term) -> bool {
        for t in [subject, predicate, object, graph] {
            assert!(!t.is_variable(), "stored facts must be ground: {t}");
        }
        let quad = [
            self.interner.intern(subject),
            self.interner.intern(predicate),
            self.interner.intern(object),
            self.interner.intern(graph),
        ];
        self.insert(quad)
    }

    /// Remove a quad from every materialized index, pruning emptied
    /// branches. Returns false if the quad was not present.
    pub fn remove(&mut self, quad: [TermId; 4]) -> bool {
        let mut removed = false;
        for index in self.orders.values_mut() {
            removed = index.remove(&quad);
        }
        if removed {
            let count = self
                .predicate_use
                .get_mut(&quad[PREDICATE])
                .expect("predicate count out of sync with indexes");
            *count -= 1;
            if *count == 0 {
                self.predicate_use.remove(&quad[PREDICATE]);
            }
        }
        removed
    }

    pub fn contains(&self, quad: [TermId; 4]) -> bool {
        self.index(SPOG).contains(&quad)
    }

    /// Whether any stored quad uses this predicate.
    pub fn has_predicate(&self, predicate: TermId) -> bool {
        self.predicate_use.contains_key(&predicate)
    }

    /// The index for a given order. The canonical SPOG index always exists;
    /// other orders exist once `ensure_order` has materialized them.
    pub fn get_index(&self, order: TermOrder) -> Option<&TrieIndex> {
        self.orders.get(&order)
    }

    fn index(&self, order: TermOrder) -> &TrieIndex {
        self.orders
            .get(&order)
            .expect("order not materialized (canonical SPOG always is)")
    }

    /// Materialize an index for the given order, backfilling it from the
    /// canonical index. Subsequent inserts and deletes keep it in sync.
    pub fn ensure_order(&mut self, order: TermOrder) -> &TrieIndex {
        if !self.orders.contains_key(&order) {
            let mut index = TrieIndex::new(&order.0);
            for tuple in self.index(SPOG).iter() {
                index.insert(&tuple);
            }
            self.orders.insert(order, index);
        }
        &self.orders[&order]
    }

    /// Scan the canonical index with a partial pattern.
    pub fn scan(&self, pattern: &[Option<TermId>; 4]) -> Scan<'_> {
        self.index(SPOG).scan(pattern)
    }
}
