//! The integer value domain the whole interpreter computes over.
//!
//! Every value a [`crate::ir::Value`] node ever produces is a `RamDomain`;
//! strings and records are handles into the [`crate::symbol::SymbolTable`] and
//! [`crate::record::RecordStore`] resolved lazily by the functors that need
//! the underlying text or tuple.

/// Signed, fixed-width cell of the value domain.
pub type RamDomain = i32;

/// Lower sentinel used to leave a range-query attribute unbound from below.
pub const MIN_DOMAIN: RamDomain = RamDomain::MIN;

/// Upper sentinel used to leave a range-query attribute unbound from above.
pub const MAX_DOMAIN: RamDomain = RamDomain::MAX;

/// Handle denoting "no record" for [`crate::ir::Operation::Lookup`].
pub const NULL: RamDomain = 0;

pub fn is_null(value: RamDomain) -> bool {
    value == NULL
}

/// A fixed-arity row of domain values, as stored in a [`crate::relation::Relation`].
pub type Tuple = Vec<RamDomain>;
