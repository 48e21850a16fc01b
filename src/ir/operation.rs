//! Operation nodes: the nested-loop query plan inside a `RamInsert`/`RamFact`
//! statement. `RN_Scan`, `RN_IndexScan`, `RN_Lookup`, `RN_Aggregate`,
//! `RN_Filter` all carry a nested inner operation (`RamSearch` /
//! `RamNestedOperation` in the original); `RN_Project` and (for subroutines)
//! `RN_Return` are the pipeline's leaves.

use super::{Condition, Pattern, RelationRef, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateFunction {
    Min,
    Max,
    Sum,
    Count,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// Binds `context[depth]` to each tuple of `relation` in turn.
    Scan {
        relation: RelationRef,
        depth: usize,
        /// Frequency-profiling label (§6 "quantity events for relation
        /// sizes and frequencies"); `None` when profiling text wasn't
        /// attached by the front end. Bumped once per tuple bound, mirroring
        /// `Interpreter::visitSearch`'s per-binding frequency counter.
        profile_text: Option<String>,
        inner: Box<Operation>,
    },
    /// Like `Scan`, but restricted to the index range implied by `pattern`.
    IndexScan {
        relation: RelationRef,
        depth: usize,
        pattern: Pattern,
        profile_text: Option<String>,
        inner: Box<Operation>,
    },
    /// Reads the record handle at `context[source_depth][source_col]`,
    /// unpacks it (skipping the rest of the pipeline if it's `NULL`), and
    /// binds the unpacked tuple to `context[depth]`.
    Lookup {
        depth: usize,
        source_depth: usize,
        source_col: usize,
        arity: usize,
        profile_text: Option<String>,
        inner: Box<Operation>,
    },
    /// Aggregates `target` (ignored for `Count`) over the index range implied
    /// by `pattern`, then binds a synthetic one-element tuple holding the
    /// result to `context[depth]`.
    Aggregate {
        function: AggregateFunction,
        relation: RelationRef,
        target: Option<Value>,
        pattern: Pattern,
        depth: usize,
        profile_text: Option<String>,
        inner: Box<Operation>,
    },
    /// Recurses into `inner` only if `condition` holds.
    Filter {
        condition: Condition,
        profile_text: Option<String>,
        inner: Box<Operation>,
    },
    /// Leaf: evaluates `values` and inserts the resulting tuple into `relation`.
    Project {
        relation: RelationRef,
        values: Vec<Value>,
    },
    /// Leaf: used by subroutines. `None` entries append `(0, true)` ("null",
    /// errored) to the context's return buffers instead of evaluating.
    Return(Vec<Option<Value>>),
}

impl Operation {
    /// The nested inner operation, if any (everything but `Project`/`Return`).
    pub fn inner(&self) -> Option<&Operation> {
        match self {
            Operation::Scan { inner, .. }
            | Operation::IndexScan { inner, .. }
            | Operation::Lookup { inner, .. }
            | Operation::Aggregate { inner, .. }
            | Operation::Filter { inner, .. } => Some(inner),
            Operation::Project { .. } | Operation::Return(_) => None,
        }
    }

    pub fn children(&self) -> Vec<&Operation> {
        self.inner().into_iter().collect()
    }
}
