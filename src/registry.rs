//! Export and import record tables.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::handle::ExportHandle;

/// A server-held record binding a handle to an exported surface.
#[derive(Debug)]
pub(crate) struct ExportRecord<S> {
    pub handle: ExportHandle,
    pub surface: S,
}

/// The export registry: capability handles to exported-surface records.
///
/// Generic over the surface identity `S` so the table can be exercised without a live
/// display.
#[derive(Debug)]
pub(crate) struct Exports<S> {
    records: FxHashMap<ExportHandle, ExportRecord<S>>,
}

impl<S> Exports<S> {
    pub fn new() -> Self {
        Self {
            records: FxHashMap::default(),
        }
    }

    /// Registers `surface` under a freshly minted handle.
    pub fn insert(&mut self, surface: S) -> ExportHandle {
        let handle = ExportHandle::generate();
        self.records.insert(
            handle.clone(),
            ExportRecord {
                handle: handle.clone(),
                surface,
            },
        );
        handle
    }

    /// The record exported under `handle`, if any.
    pub fn record(&self, handle: &str) -> Option<&ExportRecord<S>> {
        self.records.get(handle)
    }

    /// Removes the record exported under `handle`, revoking it.
    pub fn remove(&mut self, handle: &ExportHandle) -> Option<ExportRecord<S>> {
        self.records.remove(handle)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// A record of one redeemed handle.
#[derive(Debug)]
pub(crate) struct ImportRecord<S> {
    pub handle: ExportHandle,
    pub surface: S,
}

/// Import records keyed by the proxy object that owns them.
///
/// One export may back any number of imports; every importing client gets its own proxy and
/// therefore its own record. The handle index is a multimap, not a dedup.
#[derive(Debug)]
pub(crate) struct Imports<K, S> {
    records: FxHashMap<K, ImportRecord<S>>,
    by_handle: FxHashMap<ExportHandle, Vec<K>>,
}

impl<K, S> Imports<K, S>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            records: FxHashMap::default(),
            by_handle: FxHashMap::default(),
        }
    }

    /// Registers the proxy keyed by `key` as an import of `handle`.
    pub fn insert(&mut self, handle: ExportHandle, key: K, surface: S) {
        self.by_handle.entry(handle.clone()).or_default().push(key.clone());
        self.records.insert(key, ImportRecord { handle, surface });
    }

    /// Removes the record owned by the proxy keyed by `key`.
    pub fn remove(&mut self, key: &K) -> Option<ImportRecord<S>> {
        let record = self.records.remove(key)?;

        if let Some(keys) = self.by_handle.get_mut(&record.handle) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.by_handle.remove(&record.handle);
            }
        }

        Some(record)
    }

    /// The records currently imported under `handle`.
    pub fn records_for(&self, handle: &str) -> impl Iterator<Item = &ImportRecord<S>> + '_ {
        self.by_handle
            .get(handle)
            .into_iter()
            .flatten()
            .filter_map(|key| self.records.get(key))
    }

    #[cfg(test)]
    pub fn contains(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Exports, Imports};

    #[test]
    fn unknown_handle_is_absent() {
        let exports = Exports::<u32>::new();
        assert!(exports.record("not-a-handle").is_none());
    }

    #[test]
    fn insert_then_lookup() {
        let mut exports = Exports::new();
        let handle = exports.insert(7u32);

        let record = exports.record(handle.as_str()).unwrap();
        assert_eq!(record.surface, 7);
        assert_eq!(record.handle, handle);
    }

    /// Revoking a handle removes the record exactly once.
    #[test]
    fn remove_is_single_shot() {
        let mut exports = Exports::new();
        let handle = exports.insert(7u32);

        assert!(exports.remove(&handle).is_some());
        assert!(exports.remove(&handle).is_none());
        assert_eq!(exports.len(), 0);
    }

    /// Two imports of the same handle are two independent records, not a dedup.
    #[test]
    fn imports_of_one_handle_are_independent() {
        let mut exports = Exports::new();
        let handle = exports.insert(7u32);

        let mut imports = Imports::new();
        imports.insert(handle.clone(), 1u32, 7u32);
        imports.insert(handle.clone(), 2u32, 7u32);

        assert_eq!(imports.len(), 2);
        assert_eq!(imports.records_for(handle.as_str()).count(), 2);

        let removed = imports.remove(&1).unwrap();
        assert_eq!(removed.handle, handle);
        assert!(!imports.contains(&1));
        assert!(imports.contains(&2));
        assert_eq!(imports.records_for(handle.as_str()).count(), 1);
    }

    #[test]
    fn removing_unknown_import_is_a_no_op() {
        let mut imports = Imports::<u32, u32>::new();
        assert!(imports.remove(&9).is_none());
    }
}
