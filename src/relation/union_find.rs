//! Disjoint-set structure backing equivalence relations. A pair inserted
//! into an equivalence relation unions its two members; the relation then
//! materializes every pair within the resulting class so scans see the full
//! closure (`RN_ExistenceCheck`/`RN_Scan` don't know about union-find at
//! all, they just see tuples).

use crate::domain::RamDomain;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct UnionFind {
    parent: HashMap<RamDomain, RamDomain>,
}

impl UnionFind {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&mut self, x: RamDomain) -> RamDomain {
        let p = *self.parent.entry(x).or_insert(x);
        if p == x {
            x
        } else {
            let root = self.find(p);
            self.parent.insert(x, root);
            root
        }
    }

    /// Unions `a` and `b`'s classes, returning every member of the resulting
    /// class.
    pub fn union(&mut self, a: RamDomain, b: RamDomain) -> Vec<RamDomain> {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent.insert(ra, rb);
        }
        let root = self.find(b);
        let members: Vec<RamDomain> = self
            .parent
            .keys()
            .copied()
            .collect::<Vec<_>>()
            .into_iter()
            .filter(|&x| self.find(x) == root)
            .collect();
        members
    }
}
