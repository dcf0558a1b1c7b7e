//! Shared registry handed to every manager.

use std::fmt;
use std::sync::Arc;

use ember_core::{Cached, Emitter, EntityManager, RestClient, Snowflake};
use parking_lot::RwLock;

use crate::cdn::Cdn;
use crate::config::ClientOptions;
use crate::events::ClientEvent;
use crate::structures::{User, UserRegistry};

/// What every manager needs besides its own cache.
///
/// Cloning is cheap. The registry holds no manager that owns a clone of it,
/// so it never forms a reference cycle.
#[derive(Clone)]
pub struct Services {
    /// The REST transport.
    pub rest: Arc<dyn RestClient>,
    /// The global user cache nested payloads are registered with.
    pub users: UserRegistry,
    /// Listener registry.
    pub emitter: Emitter<ClientEvent>,
    pub options: Arc<ClientOptions>,
    pub cdn: Cdn,
    me: Arc<RwLock<Option<Snowflake>>>,
}

impl Services {
    pub fn new(options: ClientOptions, rest: Arc<dyn RestClient>) -> Self {
        Self {
            rest,
            users: Arc::new(EntityManager::new(())),
            emitter: Emitter::new(options.event_capacity),
            cdn: Cdn::new(&options.cdn_url),
            options: Arc::new(options),
            me: Arc::new(RwLock::new(None)),
        }
    }

    /// The client user's id, once the session is ready.
    pub fn me(&self) -> Option<Snowflake> {
        *self.me.read()
    }

    /// The cached client user.
    pub fn user(&self) -> Option<Cached<User>> {
        self.me().and_then(|id| self.users.get(id))
    }

    pub(crate) fn set_me(&self, id: Snowflake) {
        *self.me.write() = Some(id);
    }

    /// Emits a notification to every subscriber.
    pub(crate) fn emit(&self, event: ClientEvent) {
        self.emitter.emit(event);
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("users", &self.users)
            .field("emitter", &self.emitter)
            .field("me", &self.me())
            .finish_non_exhaustive()
    }
}
