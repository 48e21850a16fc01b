//! The RAM intermediate representation: a tree of tagged-variant nodes in
//! four families (values, conditions, operations, statements), grounded on
//! `RamNode`'s `RamNodeType` tag enumeration (`RamNode.h`). Rather than one
//! polymorphic base class with virtual `clone`/`apply`/`getChildNodes`, each
//! family is its own `enum`; `#[derive(Clone, PartialEq)]` gives deep clone
//! and structural equality for free, and pattern matching replaces the
//! visitor dispatch entirely (see `DESIGN.md`).
//!
//! A program never shares IR nodes: every `Box<Value>` etc. below is an
//! exclusively owned child, matching the `std::unique_ptr` ownership in the
//! original tree.

mod condition;
mod operation;
mod statement;
mod value;

pub use condition::{Condition, ConstraintOp};
pub use operation::{AggregateFunction, Operation};
pub use statement::{RelationSchema, Statement};
pub use value::{IntrinsicOp, Value};

/// Name of a declared relation. Names starting with `@` are temporary
/// relations excluded from user-visible profiling (see `RelationRef::is_temp`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationRef(pub String);

impl RelationRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn is_temp(&self) -> bool {
        self.0.starts_with('@')
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RelationRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A range-query / existence-check pattern: one slot per attribute, `None`
/// meaning the attribute is left unbound (sentinel-bounded in the index
/// query built from it).
pub type Pattern = Vec<Option<Value>>;
