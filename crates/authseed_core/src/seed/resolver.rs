//! Per-run symbolic reference tables.
//!
//! # Invariants
//! - One table per entity kind; a fresh `RefTable` per seeding run.
//! - Entries only ever point at identities whose creation phase committed.
//! - A later `put` for the same `(kind, ref)` replaces the earlier identity.

use crate::model::EntityKind;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct RefTable {
    tables: HashMap<EntityKind, HashMap<String, Uuid>>,
}

impl RefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `reference -> id` for `kind`; returns the replaced id, if any.
    pub fn put(
        &mut self,
        kind: EntityKind,
        reference: impl Into<String>,
        id: Uuid,
    ) -> Option<Uuid> {
        self.tables
            .entry(kind)
            .or_default()
            .insert(reference.into(), id)
    }

    pub fn get(&self, kind: EntityKind, reference: &str) -> Option<Uuid> {
        self.tables
            .get(&kind)
            .and_then(|table| table.get(reference))
            .copied()
    }

    pub fn contains(&self, kind: EntityKind, reference: &str) -> bool {
        self.get(kind, reference).is_some()
    }

    /// Number of refs recorded for `kind`.
    pub fn len(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }
}
