//! A single ordered index over a relation's tuples.
//!
//! Souffle keeps a B-tree per declared search signature; the teacher repo's
//! `models::index` picks a generic `IndexBacking` backend per relation and
//! grounds its B-tree-shaped variant directly on `BTreeSet<ValueRowId>`. We
//! generalize that to whole tuples: an `Index` reorders each tuple so the
//! attributes it is keyed on come first (in search order), then stores the
//! permuted tuples in a `BTreeSet`, which makes prefix range queries an
//! ordinary `BTreeSet::range` call.

use crate::domain::{RamDomain, Tuple, MAX_DOMAIN, MIN_DOMAIN};
use std::collections::BTreeSet;

/// The attribute columns this index is sorted on, in comparison order,
/// followed implicitly by every other column in ascending order. A mask of
/// `0..arity` is the "total index" every relation always carries.
pub type AttributeOrder = Vec<usize>;

fn full_order(order: &[usize], arity: usize) -> Vec<usize> {
    let mut full = order.to_vec();
    for col in 0..arity {
        if !order.contains(&col) {
            full.push(col);
        }
    }
    full
}

fn permute(tuple: &[RamDomain], order: &[usize]) -> Tuple {
    order.iter().map(|&col| tuple[col]).collect()
}

fn unpermute(permuted: &[RamDomain], order: &[usize]) -> Tuple {
    let mut tuple = vec![0; permuted.len()];
    for (pos, &col) in order.iter().enumerate() {
        tuple[col] = permuted[pos];
    }
    tuple
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Index {
    order: Vec<usize>,
    data: BTreeSet<Tuple>,
}

impl Index {
    pub fn new(key: &[usize], arity: usize) -> Self {
        Index {
            order: full_order(key, arity),
            data: BTreeSet::new(),
        }
    }

    pub fn total(arity: usize) -> Self {
        Self::new(&(0..arity).collect::<Vec<_>>(), arity)
    }

    /// The attribute columns this index is keyed on (excludes the implicit
    /// tail of remaining columns).
    pub fn key_columns(&self, key_len: usize) -> &[usize] {
        &self.order[..key_len]
    }

    pub fn insert(&mut self, tuple: &[RamDomain]) -> bool {
        self.data.insert(permute(tuple, &self.order))
    }

    pub fn remove(&mut self, tuple: &[RamDomain]) -> bool {
        self.data.remove(&permute(tuple, &self.order))
    }

    pub fn contains(&self, tuple: &[RamDomain]) -> bool {
        self.data.contains(&permute(tuple, &self.order))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Tuple> + '_ {
        let order = self.order.clone();
        self.data.iter().map(move |permuted| unpermute(permuted, &order))
    }

    /// Range-scans every tuple whose bound columns (the `Some` entries of
    /// `pattern`) match, filling unbound positions with the full attribute
    /// range. Mirrors `Interpreter::visitIndexScan`'s `lowerUpperRange` call.
    pub fn range<'a>(&'a self, pattern: &'a [Option<RamDomain>]) -> impl Iterator<Item = Tuple> + 'a {
        let lower: Tuple = self
            .order
            .iter()
            .map(|&col| pattern.get(col).copied().flatten().unwrap_or(MIN_DOMAIN))
            .collect();
        let upper: Tuple = self
            .order
            .iter()
            .map(|&col| pattern.get(col).copied().flatten().unwrap_or(MAX_DOMAIN))
            .collect();
        let order = self.order.clone();
        self.data
            .range(lower..=upper)
            .map(move |permuted| unpermute(permuted, &order))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_index_round_trips_tuples() {
        let mut idx = Index::total(3);
        idx.insert(&[1, 2, 3]);
        idx.insert(&[4, 5, 6]);
        assert_eq!(idx.len(), 2);
        assert!(idx.contains(&[1, 2, 3]));
        assert!(!idx.contains(&[9, 9, 9]));
    }

    #[test]
    fn secondary_index_ranges_on_bound_prefix() {
        let mut idx = Index::new(&[1], 2);
        idx.insert(&[10, 1]);
        idx.insert(&[20, 1]);
        idx.insert(&[30, 2]);
        let matches: Vec<_> = idx.range(&[None, Some(1)]).collect();
        assert_eq!(matches.len(), 2);
        assert!(matches.contains(&vec![10, 1]));
        assert!(matches.contains(&vec![20, 1]));
    }

    #[test]
    fn remove_drops_tuple_from_index() {
        let mut idx = Index::total(2);
        idx.insert(&[1, 1]);
        assert!(idx.remove(&[1, 1]));
        assert!(idx.is_empty());
    }

    #[test]
    fn insertion_order_does_not_affect_final_contents() {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        let mut tuples: Vec<Tuple> = (0..50).map(|i| vec![i % 7, i]).collect();
        tuples.shuffle(&mut thread_rng());

        let mut idx = Index::new(&[0], 2);
        for t in &tuples {
            idx.insert(t);
        }
        assert_eq!(idx.len(), 50);
        let matches: Vec<_> = idx.range(&[Some(3), None]).collect();
        assert_eq!(matches.len(), tuples.iter().filter(|t| t[0] == 3).count());
    }
}
