//! Reconciliation of inbound event payloads against a manager's cache.
//!
//! These are the building blocks of the gateway actions: each one decides
//! whether a payload creates, updates or deletes an entity. Parent
//! resolution (the guild or channel an entity lives in) happens before
//! they are called; a missing parent means the event is dropped.

use serde_json::Value;
use tracing::trace;

use crate::error::CoreResult;
use crate::foundation::{Cached, Entity};
use crate::store::EntityManager;

/// Result of [`create`].
#[derive(Debug, Clone)]
pub enum Created<E> {
    /// The entity was not cached before; listeners should be notified.
    New(Cached<E>),
    /// The entity was already cached. No notification.
    Duplicate(Cached<E>),
}

impl<E: Entity> Created<E> {
    /// The live handle, whichever way it was obtained.
    pub fn handle(&self) -> &Cached<E> {
        match self {
            Self::New(h) | Self::Duplicate(h) => h,
        }
    }

    /// Consumes the result, returning the live handle.
    pub fn into_handle(self) -> Cached<E> {
        match self {
            Self::New(h) | Self::Duplicate(h) => h,
        }
    }

    /// Whether this call created the entity.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Result of [`update`].
#[derive(Debug, Clone)]
pub struct Updated<E> {
    /// Snapshot taken before the patch.
    pub old: E,
    /// The live, patched entity.
    pub new: Cached<E>,
}

impl<E: Entity> Updated<E> {
    /// Whether the patch changed any tracked field.
    pub fn changed(&self) -> bool {
        !self.old.equals(&self.new.read())
    }
}

/// Adds the entity unless it is already cached.
///
/// An already cached entity is returned untouched.
pub fn create<E: Entity>(manager: &EntityManager<E>, payload: &Value) -> CoreResult<Created<E>> {
    let id = E::key(payload)?;
    if let Some(existing) = manager.get(id) {
        trace!(kind = E::KIND, id = %id, "Create for cached entity ignored");
        return Ok(Created::Duplicate(existing));
    }
    manager.add(payload).map(Created::New)
}

/// Patches the cached entity, keeping a pre-patch snapshot.
///
/// Returns `Ok(None)` when the entity is not cached.
pub fn update<E: Entity>(
    manager: &EntityManager<E>,
    payload: &Value,
) -> CoreResult<Option<Updated<E>>> {
    let id = E::key(payload)?;
    let Some(live) = manager.get(id) else {
        trace!(kind = E::KIND, id = %id, "Update for uncached entity dropped");
        return Ok(None);
    };
    let old = live.snapshot();
    manager.patch(id, payload);
    Ok(Some(Updated { old, new: live }))
}

/// Removes the cached entity and returns its final snapshot.
///
/// Returns `Ok(None)` when the entity is not cached.
pub fn delete<E: Entity>(manager: &EntityManager<E>, payload: &Value) -> CoreResult<Option<E>> {
    let id = E::key(payload)?;
    let Some(removed) = manager.remove(id) else {
        trace!(kind = E::KIND, id = %id, "Delete for uncached entity dropped");
        return Ok(None);
    };
    let mut last = removed.snapshot();
    last.mark_deleted();
    Ok(Some(last))
}
