//! I/O reader/writer contract.
//!
//! The core deliberately does not know how to read or write CSV/TSV/binary
//! files — that is an external collaborator's job. `Load`/`Store` statements
//! only carry [`IoDirective`] records; `Statement::Load`/`Statement::Store`
//! hand each directive to a [`ReaderFactory`]/[`WriterFactory`] the embedding
//! application supplies.

use crate::relation::Relation;
use std::collections::BTreeMap;

/// One `Load`/`Store` directive, as attached to a statement by the front end.
/// Key/value pairs are implementation-defined (`"filename"`, `"delimiter"`,
/// `"IO"` = the reader/writer kind, etc.) mirroring Souffle's `IODirectives`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct IoDirective {
    pub params: BTreeMap<String, String>,
}

impl IoDirective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// A reader populates a relation from some external source. Reader failures
/// are logged, not fatal (§7.5).
pub trait Reader {
    fn read_all(&self, relation: &mut Relation) -> std::io::Result<()>;
}

/// A writer drains a relation to some external sink. Writer failures are
/// fatal (§7.6): the embedding application is expected to abort the process
/// if `write_all` returns `Err`.
pub trait Writer {
    fn write_all(&self, relation: &Relation) -> std::io::Result<()>;
}

/// Given a relation's shape, its symbol table, and a directive, produce the
/// reader/writer that statement should use. Implemented by the embedding
/// application, not the core.
pub trait ReaderFactory {
    fn build(
        &self,
        symbol_mask: &[bool],
        directive: &IoDirective,
        provenance: bool,
    ) -> std::io::Result<Box<dyn Reader>>;
}

pub trait WriterFactory {
    fn build(
        &self,
        symbol_mask: &[bool],
        directive: &IoDirective,
        provenance: bool,
    ) -> std::io::Result<Box<dyn Writer>>;
}
