//! Lattice engine (§3 "Lattice association", §4.9): declared lattice
//! unary/binary functions evaluated via ordered case tables, plus the
//! LatNorm/LatClean statements that drive semi-naive iteration over
//! lattice-valued final columns.

use itertools::Itertools;

use crate::context::Context;
use crate::domain::RamDomain;
use crate::eval;
use crate::interpreter::Interpreter;
use crate::ir::{Condition, Value};
use crate::relation::Relation;

/// One `(match, output)` entry. `match = None` matches unconditionally —
/// the case-table walk stops at the first case whose condition holds, or
/// the first with no condition at all.
#[derive(Clone, Debug, PartialEq)]
pub struct Case {
    pub when: Option<Condition>,
    pub output: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LatticeFunction {
    pub name: String,
    pub cases: Vec<Case>,
}

impl LatticeFunction {
    /// Evaluates this function's case table with `args` bound as the
    /// subroutine-argument vector (so case bodies reference them via
    /// `Value::Argument`). Fatal if no case matches (§4.9).
    pub fn apply(&self, interp: &Interpreter, args: Vec<RamDomain>) -> RamDomain {
        let mut ctx = Context::with_args(args);
        for case in &self.cases {
            let matched = match &case.when {
                None => true,
                Some(cond) => eval::condition::eval_condition(interp, &mut ctx, cond),
            };
            if matched {
                return eval::value::eval_value(interp, &mut ctx, &case.output);
            }
        }
        panic!("lattice function {:?} had no matching case", self.name);
    }
}

/// The declared lattice: its bounds and the named functions an IR tree can
/// reference by name (`LatticeGLB`/`LatticeUnaryFunctor`/`LatticeBinaryFunctor`,
/// plus the LUB used internally by `LatNorm`/`LatClean`).
#[derive(Clone, Debug, PartialEq)]
pub struct LatticeAssociation {
    pub bottom: RamDomain,
    pub top: RamDomain,
    pub lub_function: String,
    pub glb_function: String,
    pub unary: std::collections::HashMap<String, LatticeFunction>,
    pub binary: std::collections::HashMap<String, LatticeFunction>,
}

impl LatticeAssociation {
    pub fn apply_unary(&self, interp: &Interpreter, name: &str, arg: RamDomain) -> RamDomain {
        let f = self
            .unary
            .get(name)
            .unwrap_or_else(|| panic!("no such lattice unary function: {name}"));
        f.apply(interp, vec![arg])
    }

    pub fn apply_binary(&self, interp: &Interpreter, name: &str, lhs: RamDomain, rhs: RamDomain) -> RamDomain {
        let f = self
            .binary
            .get(name)
            .unwrap_or_else(|| panic!("no such lattice binary function: {name}"));
        f.apply(interp, vec![lhs, rhs])
    }

    pub fn lub(&self, interp: &Interpreter, lhs: RamDomain, rhs: RamDomain) -> RamDomain {
        self.apply_binary(interp, &self.lub_function, lhs, rhs)
    }

    pub fn glb(&self, interp: &Interpreter, lhs: RamDomain, rhs: RamDomain) -> RamDomain {
        self.apply_binary(interp, &self.glb_function, lhs, rhs)
    }
}

/// Groups `relation`'s tuples by their first `arity - 1` attributes (the
/// "prefix"), relying on the total index's lexicographic order to make
/// equal prefixes contiguous.
fn prefix_groups(relation: &Relation) -> Vec<Vec<crate::domain::Tuple>> {
    relation
        .iter()
        .group_by(|t| t[..t.len() - 1].to_vec())
        .into_iter()
        .map(|(_, group)| group.collect())
        .collect()
}

/// `LatNorm(IN, OUT)` (§4.9): fold each prefix group's last attribute
/// through the LUB function, short-circuiting on `top`.
pub fn lat_norm(interp: &Interpreter, input: &Relation, output: &mut Relation) {
    let assoc = interp
        .lattice
        .as_ref()
        .expect("LatNorm requires a declared lattice association");
    for group in prefix_groups(input) {
        let arity = group[0].len();
        let mut acc = group[0][arity - 1];
        for tuple in &group[1..] {
            if acc == assoc.top {
                break;
            }
            acc = assoc.lub(interp, acc, tuple[arity - 1]);
        }
        let mut out_tuple = group[0][..arity - 1].to_vec();
        out_tuple.push(acc);
        output.insert(out_tuple);
    }
}

/// `LatClean(ORIGIN, NEW, OUT_NEW)` (§4.9): the semi-naive delta of `new`
/// relative to `origin`.
pub fn lat_clean(interp: &Interpreter, origin: &Relation, new: &Relation, out_new: &mut Relation) {
    let assoc = interp
        .lattice
        .as_ref()
        .expect("LatClean requires a declared lattice association");
    // There can be several tuples for each cell in `origin` (it's only
    // normalized on demand), so its contribution must be LUB-folded over the
    // whole group, not just its first tuple.
    let origin_groups: std::collections::HashMap<crate::domain::Tuple, RamDomain> = prefix_groups(origin)
        .into_iter()
        .map(|g| {
            let arity = g[0].len();
            let mut acc = g[0][arity - 1];
            for tuple in &g[1..] {
                if acc == assoc.top {
                    break;
                }
                acc = assoc.lub(interp, acc, tuple[arity - 1]);
            }
            (g[0][..arity - 1].to_vec(), acc)
        })
        .collect();

    for group in prefix_groups(new) {
        let arity = group[0].len();
        let prefix = group[0][..arity - 1].to_vec();
        let mut acc = group[0][arity - 1];
        let mut topped_out = acc == assoc.top;
        for tuple in &group[1..] {
            if topped_out {
                break;
            }
            acc = assoc.lub(interp, acc, tuple[arity - 1]);
            topped_out = acc == assoc.top;
        }
        if let Some(&origin_value) = origin_groups.get(&prefix) {
            if !topped_out {
                acc = assoc.lub(interp, acc, origin_value);
            }
        }
        if acc == assoc.bottom {
            continue;
        }
        let mut candidate = prefix.clone();
        candidate.push(acc);
        if !origin.exists(&candidate) {
            out_new.insert(candidate);
        }
    }
}
