//! Statement nodes: the top-level program tree. `RN_Sequence`, `RN_Parallel`,
//! `RN_Loop`, `RN_Exit`, `RN_Create`, `RN_Clear`, `RN_Drop`, `RN_LogSize`,
//! `RN_LogTimer`, `RN_DebugInfo`, `RN_Stratum`, `RN_Load`, `RN_Store`,
//! `RN_Fact`, `RN_Insert`, `RN_Merge`, `RN_Swap`, `RN_LatNorm`, `RN_LatClean`
//! from `RamNode.h`.

use super::{Condition, Operation, RelationRef, Value};
use crate::io::IoDirective;

#[derive(Clone, Debug, PartialEq)]
pub struct RelationSchema {
    pub relation: RelationRef,
    pub arity: usize,
    /// `symbol_mask[i]` is true when attribute `i` holds a string handle.
    pub symbol_mask: Vec<bool>,
    pub is_equivalence: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    Sequence(Vec<Statement>),
    /// Forks its children across the worker pool and joins; see `crate::eval::statement`.
    Parallel(Vec<Statement>),
    /// Repeats `body` until it returns `false`.
    Loop(Box<Statement>),
    /// Returns `!condition`; used inside `Loop` bodies to halt a fixed point.
    Exit(Condition),
    Create(RelationSchema),
    Clear(RelationRef),
    Drop(RelationRef),
    LogSize {
        relation: RelationRef,
        message: String,
    },
    LogTimer {
        message: String,
        relation: Option<RelationRef>,
        inner: Box<Statement>,
    },
    DebugInfo {
        message: String,
        inner: Box<Statement>,
    },
    Stratum {
        index: usize,
        inner: Box<Statement>,
    },
    Load {
        relation: RelationRef,
        directives: Vec<IoDirective>,
    },
    Store {
        relation: RelationRef,
        directives: Vec<IoDirective>,
    },
    Fact {
        relation: RelationRef,
        values: Vec<Value>,
    },
    /// Evaluates the nested operation pipeline, optionally guarded by a
    /// condition that must hold first.
    Insert {
        condition: Option<Condition>,
        operation: Operation,
    },
    /// If `target` is an equivalence relation, first closes `source` into it
    /// (`source.extend(target)`), then unions `source` into `target`.
    Merge {
        source: RelationRef,
        target: RelationRef,
    },
    /// Swaps the relation objects behind two names without copying tuples.
    Swap(RelationRef, RelationRef),
    /// Canonicalizes `input` into `output` by LUB-folding duplicate prefixes.
    LatNorm {
        input: RelationRef,
        output: RelationRef,
    },
    /// Computes the semi-naive delta of `new` against `origin`.
    LatClean {
        origin: RelationRef,
        new: RelationRef,
        out_new: RelationRef,
    },
}

impl Statement {
    /// Direct `Statement` children, for traversal/rewrite passes (e.g. the
    /// stratum-relation-name collector `visitStratum` needs).
    pub fn children(&self) -> Vec<&Statement> {
        match self {
            Statement::Sequence(stmts) | Statement::Parallel(stmts) => stmts.iter().collect(),
            Statement::Loop(body) => vec![body],
            Statement::LogTimer { inner, .. }
            | Statement::DebugInfo { inner, .. }
            | Statement::Stratum { inner, .. } => vec![inner],
            _ => vec![],
        }
    }

    /// Depth-first walk over every `Statement` in the tree, including `self`.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Statement)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}
