//! In-memory foreign-key joins across separately fetched collections.
//!
//! Pages fetch their collections independently and in any order. A joined view therefore has to
//! cope with a side collection that has not arrived yet, or that arrived without the referenced
//! id. Both cases resolve to [`Resolved::Pending`], which views render as a loading placeholder.

use crate::models::{Identified, RecordId};
use serde::Serialize;
use std::collections::HashMap;

/// State of one fetched slice of page data.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Loadable<T> {
    Loading,
    Loaded(T),
}

impl<T> Default for Loadable<T> {
    fn default() -> Self {
        Loadable::Loading
    }
}

impl<T> Loadable<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Loadable::Loaded(_))
    }

    pub fn as_ref(&self) -> Loadable<&T> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Loaded(v) => Loadable::Loaded(v),
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Loadable::Loading => None,
            Loadable::Loaded(v) => Some(v),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loadable<U> {
        match self {
            Loadable::Loading => Loadable::Loading,
            Loadable::Loaded(v) => Loadable::Loaded(f(v)),
        }
    }
}

/// Outcome of resolving one foreign key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolved<T> {
    Found(T),
    /// Side collection not loaded, or the id is not in it (yet).
    Pending,
}

impl<T> Resolved<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Resolved::Found(v) => Some(v),
            Resolved::Pending => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Found(v) => Resolved::Found(f(v)),
            Resolved::Pending => Resolved::Pending,
        }
    }
}

impl<T> From<Option<T>> for Resolved<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Resolved::Pending, Resolved::Found)
    }
}

/// Linear scan for the record with `id`.
pub fn lookup<T: Identified>(side: &[T], id: RecordId) -> Option<&T> {
    side.iter().find(|item| item.id() == id)
}

/// Resolve `id` against a side collection that may still be loading.
pub fn resolve<T: Identified>(side: &Loadable<Vec<T>>, id: RecordId) -> Resolved<&T> {
    match side {
        Loadable::Loading => Resolved::Pending,
        Loadable::Loaded(items) => lookup(items, id).into(),
    }
}

/// Resolve against a single record fetched by id (detail pages).
///
/// The fetched record must carry the expected id, otherwise it is treated as not yet resolved.
pub fn resolve_one<T: Identified>(side: &Loadable<T>, id: RecordId) -> Resolved<&T> {
    match side {
        Loadable::Loaded(item) if item.id() == id => Resolved::Found(item),
        _ => Resolved::Pending,
    }
}

/// Keyed lookup table for larger collections, built once per fetch.
///
/// Same contract as [`lookup`]: the exact element for a present id, `None` otherwise.
#[derive(Debug)]
pub struct KeyedIndex<'a, T> {
    by_id: HashMap<RecordId, &'a T>,
}

impl<'a, T: Identified> KeyedIndex<'a, T> {
    /// Builds the index. On duplicate ids the first occurrence wins, as with a linear scan.
    pub fn build(items: &'a [T]) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        for item in items {
            by_id.entry(item.id()).or_insert(item);
        }
        Self { by_id }
    }

    pub fn get(&self, id: RecordId) -> Option<&'a T> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{doctor, patient};

    #[test]
    fn test_lookup_returns_exact_element() {
        let doctors = vec![doctor(4, "Ann", "Lee"), doctor(5, "Tom", "Ryan")];
        let found = lookup(&doctors, RecordId::new(5)).expect("doctor 5 present");
        assert!(std::ptr::eq(found, &doctors[1]));
        assert!(lookup(&doctors, RecordId::new(6)).is_none());
    }

    #[test]
    fn test_resolve_is_pending_while_loading() {
        let side: Loadable<Vec<crate::models::Doctor>> = Loadable::Loading;
        assert_eq!(resolve(&side, RecordId::new(5)), Resolved::Pending);
    }

    #[test]
    fn test_resolve_is_pending_for_absent_id_in_loaded_collection() {
        let side = Loadable::Loaded(vec![patient(1, "Niamh", "Walsh")]);
        assert_eq!(resolve(&side, RecordId::new(9)), Resolved::Pending);
        let found = resolve(&side, RecordId::new(1)).found().expect("present");
        assert_eq!(found.first_name, "Niamh");
    }

    #[test]
    fn test_resolve_one_checks_identity() {
        let side = Loadable::Loaded(doctor(5, "Tom", "Ryan"));
        assert!(resolve_one(&side, RecordId::new(5)).found().is_some());
        assert_eq!(resolve_one(&side, RecordId::new(6)), Resolved::Pending);
    }

    #[test]
    fn test_keyed_index_agrees_with_linear_scan() {
        let doctors = vec![
            doctor(4, "Ann", "Lee"),
            doctor(5, "Tom", "Ryan"),
            doctor(5, "Duplicate", "Entry"),
        ];
        let index = KeyedIndex::build(&doctors);
        assert_eq!(index.len(), 2);
        for id in [3, 4, 5, 6] {
            let id = RecordId::new(id);
            match (index.get(id), lookup(&doctors, id)) {
                (Some(a), Some(b)) => assert!(std::ptr::eq(a, b), "same element for {id}"),
                (None, None) => {}
                other => panic!("index and scan disagree for {id}: {other:?}"),
            }
        }
    }
}
