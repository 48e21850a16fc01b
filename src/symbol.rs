//! Process-wide string interning.
//!
//! Grounded on `shapiro`'s `misc::string_interning::Interner`, which wraps a
//! `lasso::Rodeo` to turn `TypedValue::Str` into `TypedValue::InternedStr`.
//! The RAM domain never holds text cells though: every string a node touches
//! is already a [`crate::domain::RamDomain`] handle, so the table collapses
//! to a plain bidirectional string <-> handle map. It has to stay safe to
//! read from every worker thread a `Parallel` statement spawns, so instead of
//! `Rodeo` (single-writer) this reaches for `dashmap`, the same sharded map
//! `shapiro`'s `data_structures::hashmap::ConcurrentHashMap` is built on.

use crate::domain::RamDomain;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI32, Ordering};

/// Interns strings to [`RamDomain`] handles and resolves them back.
///
/// `lookup` interns on first sight; repeated lookups of the same string
/// return the same handle. Reads never block each other; a write (new
/// string) only contends with writes that land in the same shard.
pub struct SymbolTable {
    forward: DashMap<String, RamDomain, ahash::RandomState>,
    backward: DashMap<RamDomain, String, ahash::RandomState>,
    next: AtomicI32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            forward: DashMap::with_hasher(ahash::RandomState::new()),
            backward: DashMap::with_hasher(ahash::RandomState::new()),
            next: AtomicI32::new(1),
        }
    }

    /// Interns `s`, returning its stable handle.
    pub fn lookup(&self, s: &str) -> RamDomain {
        if let Some(handle) = self.forward.get(s) {
            return *handle;
        }
        // Racing writers may both get here; the loser's handle is discarded
        // and its `backward` entry overwritten by a duplicate string, which
        // is harmless since both map to the same text.
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.forward.insert(s.to_string(), handle);
        self.backward.insert(handle, s.to_string());
        *self.forward.get(s).unwrap()
    }

    /// Resolves a handle previously returned by `lookup`.
    ///
    /// Panics if the handle was never interned; every handle reaching here
    /// originated from this table, so a miss is a structural bug upstream.
    pub fn resolve(&self, handle: RamDomain) -> String {
        self.backward
            .get(&handle)
            .unwrap_or_else(|| panic!("symbol handle {handle} was never interned"))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
