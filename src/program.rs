//! The top-level program object (§3 "Program", §6 "a fully constructed
//! RamProgram object"): everything the front end hands the interpreter.

use indexmap::IndexMap;

use crate::ir::Statement;
use crate::lattice::LatticeAssociation;

/// A relation's declared shape, as named in `Create` statements but also
/// needed up front so the interpreter can report arity/symbol-mask
/// information before the first `Create` runs (e.g. subroutine argument
/// checks).
#[derive(Clone, Debug, PartialEq)]
pub struct RelationSpec {
    pub arity: usize,
    pub symbol_mask: Vec<bool>,
    pub is_equivalence: bool,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program {
    /// Insertion-ordered so `Stratum` records and profile output come out
    /// in declaration order, matching the front end's emission order.
    pub relations: IndexMap<String, RelationSpec>,
    pub main: Option<Statement>,
    pub subroutines: IndexMap<String, Statement>,
    pub lattice: Option<LatticeAssociation>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subroutine(&self, name: &str) -> &Statement {
        self.subroutines
            .get(name)
            .unwrap_or_else(|| panic!("no such subroutine: {name}"))
    }
}
