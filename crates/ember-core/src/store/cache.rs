//! Ordered entity cache.

use std::fmt;

use indexmap::IndexMap;
use parking_lot::{RwLock, RwLockWriteGuard};

use crate::foundation::{Cached, Entity, Snowflake};

/// An insertion-ordered map from [`Snowflake`] to [`Cached`] entity handles.
///
/// - Keys are unique; [`set`](Cache::set) on an existing key replaces the
///   handle but keeps its original position.
/// - [`delete`](Cache::delete) keeps the relative order of the remaining
///   entries.
/// - Iteration helpers return snapshots of the handle list, so a reader never
///   holds the lock while a writer inserts.
///
/// The cache is unbounded. Size limits are the owning manager's concern.
pub struct Cache<E> {
    entries: RwLock<IndexMap<Snowflake, Cached<E>>>,
}

impl<E: Entity> Cache<E> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// Returns the handle stored under `id`.
    pub fn get(&self, id: Snowflake) -> Option<Cached<E>> {
        self.entries.read().get(&id).cloned()
    }

    /// Stores `handle` under `id`, returning the previous handle.
    pub fn set(&self, id: Snowflake, handle: Cached<E>) -> Option<Cached<E>> {
        self.entries.write().insert(id, handle)
    }

    /// Removes the entry under `id`.
    pub fn delete(&self, id: Snowflake) -> Option<Cached<E>> {
        self.entries.write().shift_remove(&id)
    }

    /// Whether an entry exists under `id`.
    pub fn contains(&self, id: Snowflake) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<Snowflake> {
        self.entries.read().keys().copied().collect()
    }

    /// Handles in insertion order.
    pub fn values(&self) -> Vec<Cached<E>> {
        self.entries.read().values().cloned().collect()
    }

    /// Key/handle pairs in insertion order.
    pub fn entries(&self) -> Vec<(Snowflake, Cached<E>)> {
        self.entries
            .read()
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect()
    }

    /// The oldest entry.
    pub fn first(&self) -> Option<Cached<E>> {
        self.entries.read().first().map(|(_, h)| h.clone())
    }

    /// The newest entry.
    pub fn last(&self) -> Option<Cached<E>> {
        self.entries.read().last().map(|(_, h)| h.clone())
    }

    /// The first entry, in insertion order, whose state matches `pred`.
    pub fn find(&self, mut pred: impl FnMut(&E) -> bool) -> Option<Cached<E>> {
        self.values().into_iter().find(|h| h.with(&mut pred))
    }

    /// All entries, in insertion order, whose state matches `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&E) -> bool) -> Vec<Cached<E>> {
        self.values()
            .into_iter()
            .filter(|h| h.with(&mut pred))
            .collect()
    }

    /// Removes everything.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Removes the oldest entries until at most `max` remain.
    ///
    /// Returns the evicted handles, oldest first.
    pub(crate) fn truncate_front(&self, max: usize) -> Vec<Cached<E>> {
        let mut entries = self.entries.write();
        let excess = entries.len().saturating_sub(max);
        entries.drain(..excess).map(|(_, h)| h).collect()
    }

    pub(crate) fn write_map(&self) -> RwLockWriteGuard<'_, IndexMap<Snowflake, Cached<E>>> {
        self.entries.write()
    }
}

impl<E: Entity> Default for Cache<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> fmt::Debug for Cache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("kind", &E::KIND)
            .field("len", &self.len())
            .finish()
    }
}
