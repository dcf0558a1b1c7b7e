//! The entity lifecycle contract.
//!
//! Every cached structure implements [`Entity`]:
//!
//! - [`construct`](Entity::construct) builds a fully initialised value from a
//!   payload. Optional fields that the payload omits get explicit defaults.
//! - [`patch`](Entity::patch) merges a *partial* payload in place. Absent keys
//!   leave fields untouched; explicit `null` clears them.
//! - `Clone` produces an independent snapshot. Entities hold only owned data
//!   and keys, so a clone never shares mutable state with the original.
//! - [`equals`](Entity::equals) compares every tracked field.
//!
//! Cached entities live behind a [`Cached`] handle. Handles are shared: a
//! patch applied through the owning manager is visible to every holder.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;

use super::payload;
use super::snowflake::Snowflake;
use crate::error::{CoreError, CoreResult};

/// Lifecycle contract shared by all cached structures.
pub trait Entity: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Extra construction arguments, e.g. the owning guild's id or the
    /// managers that nested entities are registered with.
    type Context: Send + Sync + 'static;

    /// Type name used in diagnostics.
    const KIND: &'static str;

    /// Extracts the cache key from a payload.
    ///
    /// The default reads the `id` field.
    fn key(payload: &Value) -> CoreResult<Snowflake> {
        payload::snowflake(payload, "id").ok_or(CoreError::malformed(Self::KIND, "id"))
    }

    /// Builds a new entity from a full payload.
    fn construct(payload: &Value, ctx: &Self::Context) -> CoreResult<Self>;

    /// Merges the fields present in `payload` into `self`.
    fn patch(&mut self, payload: &Value, ctx: &Self::Context);

    /// The entity's key.
    fn id(&self) -> Snowflake;

    /// Structural equality across all tracked fields.
    fn equals(&self, other: &Self) -> bool {
        self == other
    }

    /// Called on the final snapshot of an entity removed by a delete event.
    fn mark_deleted(&mut self) {}
}

/// Field group for entities whose creation time is encoded in their key.
pub trait Timestamped {
    /// The snowflake carrying the creation time.
    fn timestamp_key(&self) -> Snowflake;

    /// Unix timestamp in milliseconds at which the entity was created.
    fn created_timestamp(&self) -> i64 {
        self.timestamp_key().timestamp()
    }

    /// Time at which the entity was created.
    fn created_at(&self) -> DateTime<Utc> {
        self.timestamp_key().created_at()
    }
}

// =============================================================================
// Cached handle
// =============================================================================

/// A shared handle to a live cached entity.
///
/// Cloning the handle is cheap and yields another reference to the *same*
/// entity. Use [`snapshot`](Cached::snapshot) to obtain an independent copy.
pub struct Cached<E> {
    inner: Arc<RwLock<E>>,
}

impl<E: Entity> Cached<E> {
    /// Wraps an entity in a new handle.
    pub fn new(entity: E) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    /// Borrows the current state.
    ///
    /// Do not hold the guard across an await point.
    pub fn read(&self) -> RwLockReadGuard<'_, E> {
        self.inner.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, E> {
        self.inner.write()
    }

    /// Returns an independent copy of the current state.
    pub fn snapshot(&self) -> E {
        self.inner.read().clone()
    }

    /// The entity's key.
    pub fn id(&self) -> Snowflake {
        self.inner.read().id()
    }

    /// Whether two handles refer to the same live entity.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Applies a closure to the current state.
    pub fn with<R>(&self, f: impl FnOnce(&E) -> R) -> R {
        f(&self.inner.read())
    }
}

impl<E> Clone for Cached<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Cached<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cached").field(&*self.inner.read()).finish()
    }
}

// =============================================================================
// Resolvables
// =============================================================================

/// Something that identifies an entity: a key or a handle.
#[derive(Debug, Clone)]
pub enum Resolvable<E> {
    /// A bare key.
    Id(Snowflake),
    /// A handle to a (possibly stale) entity.
    Entity(Cached<E>),
}

impl<E: Entity> Resolvable<E> {
    /// Returns the key this resolvable names.
    pub fn id(&self) -> Snowflake {
        match self {
            Self::Id(id) => *id,
            Self::Entity(handle) => handle.id(),
        }
    }
}

impl<E> From<Snowflake> for Resolvable<E> {
    fn from(id: Snowflake) -> Self {
        Self::Id(id)
    }
}

impl<E> From<Cached<E>> for Resolvable<E> {
    fn from(handle: Cached<E>) -> Self {
        Self::Entity(handle)
    }
}

impl<E> From<&Cached<E>> for Resolvable<E> {
    fn from(handle: &Cached<E>) -> Self {
        Self::Entity(handle.clone())
    }
}
