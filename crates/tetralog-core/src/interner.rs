//! Term interning: canonical deduplication of terms into cheap handles.
//!
//! Converts structured terms into integer handles (`TermId`). Two ids are
//! equal iff the terms are structurally equal, so unification and index
//! lookups reduce to O(1) integer comparison.
//!
//! The interner is an explicit value owned by whichever store or session
//! needs canonical terms — never process-wide state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::term::Term;

/// A lightweight handle to an interned term.
///
/// Ids are ordered by insertion order, not by any term ordering — resolve
/// through the interner if the term itself is needed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TermId(u32);

impl TermId {
    /// Raw index for serialization/debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Create a TermId from a raw index. Use only for deserialization.
    #[inline]
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }
}

impl PartialOrd for TermId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TermId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// Canonicalizing term interner keyed on the stable textual encoding.
#[derive(Debug, Clone, Default)]
pub struct TermInterner {
    /// Map from encoding to id for deduplication.
    map: HashMap<String, TermId>,
    /// Storage for interned terms, indexed by TermId.
    terms: Vec<Term>,
}

impl TermInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a term, returning its id.
    /// If an equal term was already interned, returns the existing id.
    pub fn intern(&mut self, term: &Term) -> TermId {
        let key = term.encode();
        if let Some(&id) = self.map.get(&key) {
            return id;
        }

        let id = TermId(self.terms.len() as u32);
        self.terms.push(term.clone());
        self.map.insert(key, id);
        id
    }

    /// Intern an owned term, avoiding the clone if not already present.
    pub fn intern_owned(&mut self, term: Term) -> TermId {
        let key = term.encode();
        if let Some(&id) = self.map.get(&key) {
            return id;
        }

        let id = TermId(self.terms.len() as u32);
        self.terms.push(term);
        self.map.insert(key, id);
        id
    }

    /// Look up a term's id without interning it.
    pub fn lookup(&self, term: &Term) -> Option<TermId> {
        self.map.get(&term.encode()).copied()
    }

    /// Resolve an id back to its term.
    ///
    /// # Panics
    /// Panics if the id was not created by this interner.
    #[inline]
    pub fn resolve(&self, id: TermId) -> &Term {
        &self.terms[id.0 as usize]
    }

    /// Try to resolve an id, returning None if invalid.
    #[inline]
    pub fn try_resolve(&self, id: TermId) -> Option<&Term> {
        self.terms.get(id.0 as usize)
    }

    /// Number of interned terms.
    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over all interned terms with their ids.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Term)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(i, t)| (TermId(i as u32), t))
    }
}
