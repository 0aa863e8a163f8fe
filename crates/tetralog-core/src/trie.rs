//! Trie-shaped tuple index.
//!
//! An index stores n-ary tuples of term ids under a fixed term order: each
//! branch level maps the term at one position to the next level, and the
//! terminal level is a set of terms for the last position. Deterministic
//! iteration comes from the ordered maps, so a scan over an unchanged index
//! always yields the same sequence.
//!
//! Two structural invariants hold at all times:
//! - no branch node has zero children (deletes prune emptied branches all
//!   the way back toward the root)
//! - `len` equals the number of distinct stored tuples

use std::collections::{BTreeMap, BTreeSet, btree_map, btree_set};

use crate::interner::TermId;

/// One level of a trie index: a branch map or the terminal member set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrieNode {
    Branch(BTreeMap<TermId, TrieNode>),
    Leaf(BTreeSet<TermId>),
}

impl TrieNode {
    fn empty_for_depth(depth: usize, arity: usize) -> TrieNode {
        if depth < arity - 1 {
            TrieNode::Branch(BTreeMap::new())
        } else {
            TrieNode::Leaf(BTreeSet::new())
        }
    }

    /// Child node under a branch key, if present.
    pub fn child(&self, key: TermId) -> Option<&TrieNode> {
        match self {
            TrieNode::Branch(map) => map.get(&key),
            TrieNode::Leaf(_) => None,
        }
    }

    /// All (key, child) pairs of a branch level, in id order.
    pub fn children(&self) -> btree_map::Iter<'_, TermId, TrieNode> {
        match self {
            TrieNode::Branch(map) => map.iter(),
            TrieNode::Leaf(_) => panic!("children() on a leaf level"),
        }
    }

    /// Membership test at the terminal level.
    pub fn has_member(&self, key: TermId) -> bool {
        match self {
            TrieNode::Leaf(set) => set.contains(&key),
            TrieNode::Branch(_) => false,
        }
    }

    /// Members of the terminal level, in id order.
    pub fn members(&self) -> btree_set::Iter<'_, TermId> {
        match self {
            TrieNode::Leaf(set) => set.iter(),
            TrieNode::Branch(_) => panic!("members() on a branch level"),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TrieNode::Leaf(_))
    }

    fn count(&self) -> usize {
        match self {
            TrieNode::Branch(map) => map.values().map(TrieNode::count).sum(),
            TrieNode::Leaf(set) => set.len(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            TrieNode::Branch(map) => map.is_empty(),
            TrieNode::Leaf(set) => set.is_empty(),
        }
    }
}

/// Tuple index with a fixed term order.
///
/// `order[k]` names the tuple position tested at depth `k`; the last entry
/// selects the terminal member set. All tuples passed in must have exactly
/// `order.len()` positions.
#[derive(Debug, Clone)]
pub struct TrieIndex {
    order: Box<[u8]>,
    root: TrieNode,
    len: usize,
}

impl TrieIndex {
    /// Create an empty index over the given position order.
    ///
    /// # Panics
    /// Panics if `order` is empty or not a permutation of `0..order.len()`.
    pub fn new(order: &[u8]) -> Self {
        let arity = order.len();
        assert!(arity >= 1, "index order must name at least one position");
        let mut seen = vec![false; arity];
        for &p in order {
            assert!(
                (p as usize) < arity && !seen[p as usize],
                "index order must be a permutation of tuple positions"
            );
            seen[p as usize] = true;
        }
        Self {
            order: order.into(),
            root: TrieNode::empty_for_depth(0, arity),
            len: 0,
        }
    }

    pub fn order(&self) -> &[u8] {
        &self.order
    }

    pub fn arity(&self) -> usize {
        self.order.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Root level, the entry point for compiled pattern walks.
    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Insert a tuple, creating missing branch levels.
    /// Returns false if the tuple was already present.
    pub fn insert(&mut self, tuple: &[TermId]) -> bool {
        assert_eq!(tuple.len(), self.arity(), "tuple arity mismatch");
        let arity = self.arity();
        let mut node = &mut self.root;
        for depth in 0..arity - 1 {
            let key = tuple[self.order[depth] as usize];
            node = match node {
                TrieNode::Branch(map) => map
                    .entry(key)
                    .or_insert_with(|| TrieNode::empty_for_depth(depth + 1, arity)),
                TrieNode::Leaf(_) => unreachable!("leaf at medial depth"),
            };
        }
        let last = tuple[self.order[arity - 1] as usize];
        let inserted = match node {
            TrieNode::Leaf(set) => set.insert(last),
            TrieNode::Branch(_) => unreachable!("branch at terminal depth"),
        };
        if inserted {
            self.len += 1;
        }
        inserted
    }

    /// Remove a tuple, pruning any branch left without children.
    /// Returns false if the tuple was not present.
    pub fn remove(&mut self, tuple: &[TermId]) -> bool {
        assert_eq!(tuple.len(), self.arity(), "tuple arity mismatch");
        let keys: Vec<TermId> = self
            .order
            .iter()
            .map(|&p| tuple[p as usize])
            .collect();
        let removed = remove_rec(&mut self.root, &keys);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Exact membership test.
    pub fn contains(&self, tuple: &[TermId]) -> bool {
        assert_eq!(tuple.len(), self.arity(), "tuple arity mismatch");
        let mut node = &self.root;
        for depth in 0..self.arity() - 1 {
            let key = tuple[self.order[depth] as usize];
            match node.child(key) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.has_member(tuple[self.order[self.arity() - 1] as usize])
    }

    /// Lazy scan over all tuples matching a partial pattern.
    ///
    /// `pattern[p]` constrains tuple position `p`; `None` is a wildcard.
    /// Bound positions are walked directly, unbound positions enumerate
    /// every child, so the sequence is finite and in index order. Yielded
    /// tuples are in position order (not index order).
    pub fn scan(&self, pattern: &[Option<TermId>]) -> Scan<'_> {
        assert_eq!(pattern.len(), self.arity(), "pattern arity mismatch");
        let want: Vec<Option<TermId>> = self
            .order
            .iter()
            .map(|&p| pattern[p as usize])
            .collect();
        let stack = vec![range_for(&self.root, want[0])];
        Scan {
            order: &self.order,
            want,
            stack,
            path: Vec::new(),
        }
    }

    /// Iterate over all stored tuples, in index order.
    pub fn iter(&self) -> Scan<'_> {
        let pattern = vec![None; self.arity()];
        self.scan(&pattern)
    }

    /// New index containing members present in both operands.
    ///
    /// # Panics
    /// Panics if the operands' orders differ.
    pub fn intersection(&self, other: &TrieIndex) -> TrieIndex {
        assert_eq!(self.order, other.order, "index orders are incompatible");
        let root = intersect_rec(&self.root, &other.root);
        let len = root.count();
        TrieIndex {
            order: self.order.clone(),
            root,
            len,
        }
    }

    /// New index containing members present only in the left operand.
    ///
    /// # Panics
    /// Panics if the operands' orders differ.
    pub fn difference(&self, other: &TrieIndex) -> TrieIndex {
        assert_eq!(self.order, other.order, "index orders are incompatible");
        let root = difference_rec(&self.root, &other.root);
        let len = root.count();
        TrieIndex {
            order: self.order.clone(),
            root,
            len,
        }
    }
}

fn remove_rec(node: &mut TrieNode, keys: &[TermId]) -> bool {
    match node {
        TrieNode::Leaf(set) => {
            debug_assert_eq!(keys.len(), 1);
            set.remove(&keys[0])
        }
        TrieNode::Branch(map) => {
            let Some(child) = map.get_mut(&keys[0]) else {
                return false;
            };
            let removed = remove_rec(child, &keys[1..]);
            if removed && child.is_empty() {
                map.remove(&keys[0]);
            }
            removed
        }
    }
}

fn intersect_rec(a: &TrieNode, b: &TrieNode) -> TrieNode {
    match (a, b) {
        (TrieNode::Leaf(sa), TrieNode::Leaf(sb)) => TrieNode::Leaf(sa & sb),
        (TrieNode::Branch(ma), TrieNode::Branch(mb)) => {
            let mut out = BTreeMap::new();
            for (k, ca) in ma {
                if let Some(cb) = mb.get(k) {
                    let child = intersect_rec(ca, cb);
                    if !child.is_empty() {
                        out.insert(*k, child);
                    }
                }
            }
            TrieNode::Branch(out)
        }
        _ => unreachable!("mismatched node kinds at equal depth"),
    }
}

fn difference_rec(a: &TrieNode, b: &TrieNode) -> TrieNode {
    match (a, b) {
        (TrieNode::Leaf(sa), TrieNode::Leaf(sb)) => TrieNode::Leaf(sa - sb),
        (TrieNode::Branch(ma), TrieNode::Branch(mb)) => {
            let mut out = BTreeMap::new();
            for (k, ca) in ma {
                let child = match mb.get(k) {
                    Some(cb) => difference_rec(ca, cb),
                    None => ca.clone(),
                };
                if !child.is_empty() {
                    out.insert(*k, child);
                }
            }
            TrieNode::Branch(out)
        }
        _ => unreachable!("mismatched node kinds at equal depth"),
    }
}

enum Level<'a> {
    Branch(btree_map::Range<'a, TermId, TrieNode>),
    Leaf(btree_set::Range<'a, TermId>),
}

fn range_for<'a>(node: &'a TrieNode, want: Option<TermId>) -> Level<'a> {
    match (node, want) {
        (TrieNode::Branch(map), Some(k)) => Level::Branch(map.range(k..=k)),
        (TrieNode::Branch(map), None) => Level::Branch(map.range(..)),
        (TrieNode::Leaf(set), Some(k)) => Level::Leaf(set.range(k..=k)),
        (TrieNode::Leaf(set), None) => Level::Leaf(set.range(..)),
    }
}

/// Lazy matching-tuple iterator over a [`TrieIndex`].
pub struct Scan<'a> {
    order: &'a [u8],
    /// Pattern constraints in index order.
    want: Vec<Option<TermId>>,
    stack: Vec<Level<'a>>,
    /// Keys chosen on the path into the current level (one per edge).
    path: Vec<TermId>,
}

impl<'a> Iterator for Scan<'a> {
    type Item = Vec<TermId>;

    fn next(&mut self) -> Option<Vec<TermId>> {
        loop {
            let stepped = match self.stack.last_mut()? {
                Level::Branch(it) => it.next().map(|(k, child)| (*k, Some(child))),
                Level::Leaf(it) => it.next().map(|k| (*k, None)),
            };
            match stepped {
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
                Some((key, Some(child))) => {
                    let depth = self.stack.len();
                    self.path.push(key);
                    self.stack.push(range_for(child, self.want[depth]));
                }
                Some((key, None)) => return Some(self.emit(key)),
            }
        }
    }
}

impl Scan<'_> {
    fn emit(&self, last: TermId) -> Vec<TermId> {
        let arity = self.order.len();
        debug_assert_eq!(self.path.len(), arity - 1);
        let mut tuple = vec![last; arity];
        for (depth, &key) in self.path.iter().enumerate() {
            tuple[self.order[depth] as usize] = key;
        }
        tuple
    }
}
