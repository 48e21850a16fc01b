//! The indexed tuple store: every declared relation owns a total index plus
//! zero or more secondary indices, and optionally behaves as an equivalence
//! relation closed under reflexivity/symmetry/transitivity.

mod index;
mod union_find;

pub use index::Index;

use crate::domain::{RamDomain, Tuple};
use std::collections::HashMap;
use union_find::UnionFind;

/// A secondary index is identified by the ordered list of columns it is
/// keyed on (the leading prefix of its attribute order).
pub type IndexKey = Vec<usize>;

#[derive(Clone, Debug)]
pub struct Relation {
    arity: usize,
    /// `symbol_mask[i]` is true when attribute `i` holds a string handle
    /// rather than a plain integer (§3 "Relation").
    symbol_mask: Vec<bool>,
    total: Index,
    secondary: HashMap<IndexKey, Index>,
    equivalence: Option<UnionFind>,
}

impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.arity == other.arity && self.total == other.total
    }
}

impl Relation {
    pub fn new(arity: usize) -> Self {
        Self::with_symbol_mask(arity, vec![false; arity])
    }

    pub fn with_symbol_mask(arity: usize, symbol_mask: Vec<bool>) -> Self {
        Relation {
            arity,
            symbol_mask,
            total: Index::total(arity),
            secondary: HashMap::new(),
            equivalence: None,
        }
    }

    pub fn new_equivalence(arity: usize) -> Self {
        assert_eq!(arity, 2, "equivalence relations are always binary");
        Relation {
            arity,
            symbol_mask: vec![false; arity],
            total: Index::total(arity),
            secondary: HashMap::new(),
            equivalence: Some(UnionFind::new()),
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn symbol_mask(&self) -> &[bool] {
        &self.symbol_mask
    }

    pub fn is_equivalence(&self) -> bool {
        self.equivalence.is_some()
    }

    /// Ensures a secondary index keyed on `key` exists, then returns it.
    /// Used lazily the first time an `IndexScan`/`Aggregate`/existence check
    /// references a given attribute subset, mirroring Souffle's on-demand
    /// `getIndex(SearchSignature)`.
    pub fn get_index(&mut self, key: &[usize]) -> &Index {
        self.secondary
            .entry(key.to_vec())
            .or_insert_with(|| Index::new(key, self.arity))
    }

    pub fn total_index(&self) -> &Index {
        &self.total
    }

    pub fn size(&self) -> usize {
        self.total.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total.is_empty()
    }

    pub fn exists(&self, tuple: &[RamDomain]) -> bool {
        self.total.contains(tuple)
    }

    /// Inserts `tuple`, returning `true` if it was new. For equivalence
    /// relations this also materializes the transitive/symmetric closure
    /// implied by the new pair, inserting every newly-implied pair too.
    pub fn insert(&mut self, tuple: Tuple) -> bool {
        assert_eq!(tuple.len(), self.arity);
        if let Some(uf) = &mut self.equivalence {
            let (a, b) = (tuple[0], tuple[1]);
            let class = uf.union(a, b);
            let mut changed = false;
            for &x in &class {
                for &y in &class {
                    let pair = vec![x, y];
                    if self.total.insert(&pair) {
                        changed = true;
                    }
                    for index in self.secondary.values_mut() {
                        index.insert(&pair);
                    }
                }
            }
            changed
        } else {
            let inserted = self.total.insert(&tuple);
            if inserted {
                for index in self.secondary.values_mut() {
                    index.insert(&tuple);
                }
            }
            inserted
        }
    }

    pub fn extend_from(&mut self, other: &Relation) {
        for tuple in other.total.iter() {
            self.insert(tuple);
        }
    }

    pub fn clear(&mut self) {
        self.total.clear();
        for index in self.secondary.values_mut() {
            index.clear();
        }
        if let Some(uf) = &mut self.equivalence {
            *uf = UnionFind::new();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Tuple> + '_ {
        self.total.iter()
    }

    pub fn range<'a>(&'a self, key: &[usize], pattern: &'a [Option<RamDomain>]) -> Vec<Tuple> {
        match self.secondary.get(key) {
            Some(index) => index.range(pattern).collect(),
            None => self.total.range(pattern).collect(),
        }
    }
}

/// The interpreter's map of live relations, name to `Relation`. Backed by a
/// `DashMap` so concurrent children inside a `Parallel` statement can write
/// to distinct relations without any coordination beyond picking different
/// keys (§5 "relations written concurrently require that each child writes
/// to a distinct relation").
#[derive(Default)]
pub struct RelationStore {
    relations: dashmap::DashMap<String, Relation, ahash::RandomState>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, name: &str, arity: usize, is_equivalence: bool) {
        self.create_with_symbol_mask(name, arity, vec![false; arity], is_equivalence)
    }

    pub fn create_with_symbol_mask(
        &self,
        name: &str,
        arity: usize,
        symbol_mask: Vec<bool>,
        is_equivalence: bool,
    ) {
        if self.relations.contains_key(name) {
            return;
        }
        let relation = if is_equivalence {
            Relation::new_equivalence(arity)
        } else {
            Relation::with_symbol_mask(arity, symbol_mask)
        };
        self.relations.insert(name.to_string(), relation);
    }

    pub fn drop(&self, name: &str) {
        self.relations.remove(name);
    }

    pub fn with<R>(&self, name: &str, f: impl FnOnce(&Relation) -> R) -> R {
        let guard = self
            .relations
            .get(name)
            .unwrap_or_else(|| panic!("no such relation: {name}"));
        f(&guard)
    }

    pub fn with_mut<R>(&self, name: &str, f: impl FnOnce(&mut Relation) -> R) -> R {
        let mut guard = self
            .relations
            .get_mut(name)
            .unwrap_or_else(|| panic!("no such relation: {name}"));
        f(&mut guard)
    }

    /// Swaps the relation objects behind two names without copying tuples
    /// (§4.8 `Swap`).
    pub fn swap(&self, a: &str, b: &str) {
        let relation_a = self
            .relations
            .remove(a)
            .unwrap_or_else(|| panic!("no such relation: {a}"))
            .1;
        let relation_b = self
            .relations
            .remove(b)
            .unwrap_or_else(|| panic!("no such relation: {b}"))
            .1;
        self.relations.insert(a.to_string(), relation_b);
        self.relations.insert(b.to_string(), relation_a);
    }

    /// `Merge(src,tgt)` (§4.8): if `tgt` is an equivalence relation, `src`
    /// first closes itself under `tgt`'s pairs too, then `tgt` absorbs every
    /// tuple of `src`.
    pub fn merge(&self, source: &str, target: &str) {
        let target_is_equivalence = self.with(target, |t| t.is_equivalence());
        if target_is_equivalence {
            let target_snapshot = self.with(target, |t| t.clone());
            self.with_mut(source, |s| s.extend_from(&target_snapshot));
        }
        let source_snapshot = self.with(source, |s| s.clone());
        self.with_mut(target, |t| t.extend_from(&source_snapshot));
    }
}
