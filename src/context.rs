//! Per-operation evaluation context: the array of currently-bound tuples
//! indexed by context depth, plus the subroutine argument/return vectors.
//! One context is created per top-level `Insert`/subroutine call and lives
//! for the duration of that operation tree's execution; it is never shared
//! across `Parallel` siblings (§5).

use crate::domain::{RamDomain, Tuple};

/// A tuple bound to a context depth. `Scan`/`IndexScan` bind a borrowed
/// slice straight out of relation storage; `Lookup` and `Aggregate` bind a
/// tuple they just constructed (an unpacked record, or the synthetic
/// one-element aggregate result) and must own it.
#[derive(Clone, Debug)]
enum Binding<'a> {
    Borrowed(&'a [RamDomain]),
    Owned(Tuple),
}

impl<'a> Binding<'a> {
    fn as_slice(&self) -> &[RamDomain] {
        match self {
            Binding::Borrowed(s) => s,
            Binding::Owned(t) => t,
        }
    }
}

/// The evaluation context threaded through the value/condition/operation
/// evaluators for one executing operation tree.
pub struct Context<'a> {
    frames: Vec<Option<Binding<'a>>>,
    args: Vec<RamDomain>,
    return_values: Vec<RamDomain>,
    return_errors: Vec<bool>,
}

impl<'a> Context<'a> {
    pub fn new(depth_capacity: usize) -> Self {
        Context {
            frames: vec![None; depth_capacity],
            args: Vec::new(),
            return_values: Vec::new(),
            return_errors: Vec::new(),
        }
    }

    pub fn with_args(args: Vec<RamDomain>) -> Self {
        Context {
            frames: Vec::new(),
            args,
            return_values: Vec::new(),
            return_errors: Vec::new(),
        }
    }

    fn ensure_depth(&mut self, depth: usize) {
        if depth >= self.frames.len() {
            self.frames.resize(depth + 1, None);
        }
    }

    pub fn bind_borrowed(&mut self, depth: usize, tuple: &'a [RamDomain]) {
        self.ensure_depth(depth);
        self.frames[depth] = Some(Binding::Borrowed(tuple));
    }

    pub fn bind_owned(&mut self, depth: usize, tuple: Tuple) {
        self.ensure_depth(depth);
        self.frames[depth] = Some(Binding::Owned(tuple));
    }

    pub fn unbind(&mut self, depth: usize) {
        if depth < self.frames.len() {
            self.frames[depth] = None;
        }
    }

    /// Reads `context[depth][col]`. Panics if `depth` has no bound tuple —
    /// the analysis-assigned depths guarantee this can't happen for
    /// well-formed programs (§4.5 `ElementAccess`: "undefined if `d` has no
    /// bound tuple").
    pub fn element(&self, depth: usize, col: usize) -> RamDomain {
        self.frames
            .get(depth)
            .and_then(|b| b.as_ref())
            .unwrap_or_else(|| panic!("context depth {depth} has no bound tuple"))
            .as_slice()[col]
    }

    pub fn argument(&self, index: usize) -> RamDomain {
        self.args[index]
    }

    pub fn push_return(&mut self, value: RamDomain, errored: bool) {
        self.return_values.push(value);
        self.return_errors.push(errored);
    }

    pub fn into_returns(self) -> (Vec<RamDomain>, Vec<bool>) {
        (self.return_values, self.return_errors)
    }
}
