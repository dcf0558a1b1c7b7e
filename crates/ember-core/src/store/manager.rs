//! Generic payload → cached entity bridge.

use std::fmt;

use serde_json::Value;
use tracing::{debug, trace};

use super::cache::Cache;
use crate::error::CoreResult;
use crate::foundation::{Cached, Entity, Resolvable, Snowflake};

/// Owns one [`Cache`] and the add/resolve logic for one entity type.
///
/// Repeated [`add`](EntityManager::add) calls for the same key converge on a
/// single live instance: the first call constructs and caches it, later
/// calls patch it in place and return the same handle.
pub struct EntityManager<E: Entity> {
    cache: Cache<E>,
    context: E::Context,
    limit: Option<usize>,
}

impl<E: Entity> EntityManager<E> {
    /// Creates a manager with an empty, unbounded cache.
    pub fn new(context: E::Context) -> Self {
        Self {
            cache: Cache::new(),
            context,
            limit: None,
        }
    }

    /// Bounds the cache. Inserting beyond `limit` evicts the oldest entries.
    ///
    /// A limit of zero disables caching of new entities entirely.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Read access to the cache.
    pub fn cache(&self) -> &Cache<E> {
        &self.cache
    }

    /// The construction context handed to every entity.
    pub fn context(&self) -> &E::Context {
        &self.context
    }

    /// Adds a payload to the cache, patching the existing entity if present.
    pub fn add(&self, payload: &Value) -> CoreResult<Cached<E>> {
        self.add_with(payload, true, &self.context)
    }

    /// Like [`add`](Self::add), with control over caching and the context
    /// used to construct a new entity.
    ///
    /// With `should_cache == false` an uncached entity is constructed and
    /// returned without being registered. A cached entity is still patched.
    pub fn add_with(
        &self,
        payload: &Value,
        should_cache: bool,
        ctx: &E::Context,
    ) -> CoreResult<Cached<E>> {
        let id = E::key(payload)?;

        if let Some(existing) = self.cache.get(id) {
            trace!(kind = E::KIND, id = %id, "Patching cached entity");
            existing.write().patch(payload, ctx);
            return Ok(existing);
        }

        let entity = E::construct(payload, ctx)?;
        if !should_cache || self.limit == Some(0) {
            return Ok(Cached::new(entity));
        }

        let mut map = self.cache.write_map();
        // Inserted by someone else since the first lookup.
        if let Some(existing) = map.get(&id).cloned() {
            drop(map);
            existing.write().patch(payload, ctx);
            return Ok(existing);
        }
        let handle = Cached::new(entity);
        map.insert(id, handle.clone());
        drop(map);
        trace!(kind = E::KIND, id = %id, "Cached new entity");

        if let Some(limit) = self.limit {
            let evicted = self.cache.truncate_front(limit);
            if !evicted.is_empty() {
                debug!(kind = E::KIND, count = evicted.len(), "Evicted oldest entities");
            }
        }

        Ok(handle)
    }

    /// Installs an already constructed entity, replacing any cached one.
    pub fn insert(&self, entity: E) -> Cached<E> {
        let handle = Cached::new(entity);
        self.cache.set(handle.id(), handle.clone());
        handle
    }

    /// Removes and returns the live handle under `id`.
    pub fn remove(&self, id: Snowflake) -> Option<Cached<E>> {
        self.cache.delete(id)
    }

    /// Patches the cached entity under `id`, if any, and returns it.
    pub fn patch(&self, id: Snowflake, payload: &Value) -> Option<Cached<E>> {
        let handle = self.cache.get(id)?;
        handle.write().patch(payload, &self.context);
        Some(handle)
    }

    /// Returns `handle`'s current state patched with `payload`, without
    /// touching the cached entity.
    pub fn patched_clone(&self, handle: &Cached<E>, payload: &Value) -> E {
        let mut clone = handle.snapshot();
        clone.patch(payload, &self.context);
        clone
    }

    /// Resolves to the cached handle, or `None`.
    ///
    /// A handle resolvable is returned as-is, mirroring the identity the
    /// caller already holds.
    pub fn resolve(&self, resolvable: impl Into<Resolvable<E>>) -> Option<Cached<E>> {
        match resolvable.into() {
            Resolvable::Entity(handle) => Some(handle),
            Resolvable::Id(id) => self.cache.get(id),
        }
    }

    /// Resolves to the bare key named by the resolvable.
    pub fn resolve_id(&self, resolvable: impl Into<Resolvable<E>>) -> Option<Snowflake> {
        Some(resolvable.into().id())
    }

    /// Looks up a cached entity by key.
    pub fn get(&self, id: Snowflake) -> Option<Cached<E>> {
        self.cache.get(id)
    }
}

impl<E: Entity> fmt::Debug for EntityManager<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityManager")
            .field("cache", &self.cache)
            .field("limit", &self.limit)
            .finish()
    }
}
