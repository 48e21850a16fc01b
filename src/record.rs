//! Record (sub-tuple) interning for [`crate::ir::Value::Pack`] and
//! [`crate::ir::Operation::Lookup`].
//!
//! Mirrors [`crate::symbol::SymbolTable`]'s shape: a record is just a tuple
//! of [`RamDomain`]s, interned the same way a string is, so that a `Pack`
//! value can hand back a single handle a later `Lookup` can unpack. Handle
//! `0` ([`crate::domain::NULL`]) is reserved and never allocated.

use crate::domain::{RamDomain, Tuple, NULL};
use dashmap::DashMap;
use std::sync::atomic::{AtomicI32, Ordering};

pub struct RecordStore {
    forward: DashMap<Tuple, RamDomain, ahash::RandomState>,
    backward: DashMap<RamDomain, Tuple, ahash::RandomState>,
    next: AtomicI32,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            forward: DashMap::with_hasher(ahash::RandomState::new()),
            backward: DashMap::with_hasher(ahash::RandomState::new()),
            next: AtomicI32::new(1),
        }
    }

    /// Interns `tuple`, returning a stable non-null handle.
    pub fn pack(&self, tuple: Tuple) -> RamDomain {
        if let Some(handle) = self.forward.get(&tuple) {
            return *handle;
        }
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.backward.insert(handle, tuple.clone());
        self.forward.insert(tuple, handle);
        handle
    }

    /// Unpacks a previously interned handle.
    ///
    /// The caller (a [`crate::ir::Operation::Lookup`]) is expected to guard
    /// against `NULL` before calling; this panics on `NULL` or an unknown
    /// handle since both are structural interpreter bugs, not user errors.
    pub fn unpack(&self, handle: RamDomain, arity: usize) -> Tuple {
        assert_ne!(handle, NULL, "attempted to unpack the NULL record handle");
        let tuple = self
            .backward
            .get(&handle)
            .unwrap_or_else(|| panic!("record handle {handle} was never packed"));
        assert_eq!(
            tuple.len(),
            arity,
            "record handle {handle} has arity {} but {arity} was requested",
            tuple.len()
        );
        tuple.clone()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}
