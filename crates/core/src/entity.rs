//! Entity trait: identity + continuity across state changes.

use std::collections::HashMap;

use crate::error::{DomainError, DomainResult};

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Human-readable kind used in not-found errors (e.g. "account").
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Identity map of entities of one kind, owned by a single tenant's state.
///
/// Tables are plain values: cloning a table snapshots it, which is what the
/// unit-of-work layer relies on for rollback.
#[derive(Debug, Clone)]
pub struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<E: Entity> Table<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, id: E::Id) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    /// Fetch an entity or fail with `NotFound`.
    pub fn require(&self, id: E::Id) -> DomainResult<&E> {
        self.rows
            .get(&id)
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    pub fn require_mut(&mut self, id: E::Id) -> DomainResult<&mut E> {
        self.rows
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(E::KIND, id))
    }

    /// Insert an entity, replacing any previous row with the same id.
    pub fn insert(&mut self, entity: E) {
        self.rows.insert(entity.id(), entity);
    }

    pub fn remove(&mut self, id: E::Id) -> Option<E> {
        self.rows.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    /// Rows matching `predicate`, sorted with `order`.
    pub fn select<P, O>(&self, predicate: P, order: O) -> Vec<&E>
    where
        P: Fn(&E) -> bool,
        O: FnMut(&&E, &&E) -> core::cmp::Ordering,
    {
        let mut rows: Vec<&E> = self.rows.values().filter(|e| predicate(e)).collect();
        rows.sort_by(order);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Widget {
        id: u32,
        name: &'static str,
    }

    impl Entity for Widget {
        type Id = u32;
        const KIND: &'static str = "widget";

        fn id(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn require_reports_kind_and_id() {
        let table: Table<Widget> = Table::new();
        let err = table.require(7).unwrap_err();
        assert_eq!(err, DomainError::not_found("widget", 7));
    }

    #[test]
    fn select_filters_and_orders() {
        let mut table = Table::new();
        table.insert(Widget { id: 1, name: "b" });
        table.insert(Widget { id: 2, name: "a" });
        table.insert(Widget { id: 3, name: "c" });

        let names: Vec<_> = table
            .select(|w| w.id != 3, |a, b| a.name.cmp(b.name))
            .into_iter()
            .map(|w| w.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn clone_is_an_independent_snapshot() {
        let mut table = Table::new();
        table.insert(Widget { id: 1, name: "a" });
        let snapshot = table.clone();
        table.remove(1);
        assert!(snapshot.contains(1));
        assert!(table.is_empty());
    }
}
