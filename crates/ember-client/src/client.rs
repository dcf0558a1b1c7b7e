//! The client: the root every manager hangs off.
//!
//! ```text
//! Client
//!   ├── users     UserManager      (global user cache)
//!   ├── channels  ChannelManager   ── MessageManager per text-based channel
//!   └── guilds    GuildManager     ── GuildScope per guild
//!                                       ├── RoleManager
//!                                       ├── GuildMemberManager
//!                                       └── GuildStickerManager
//! ```
//!
//! Gateway frames enter through [`Client::dispatch`]; notifications leave
//! through the receivers handed out by [`Client::subscribe`].

use std::sync::Arc;

use ember_core::{Cached, CoreResult, Entity, Method, RequestOptions, RestClient, Snowflake};
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::actions;
use crate::cdn::Cdn;
use crate::config::ClientOptions;
use crate::events::{ClientEvent, GatewayDispatch};
use crate::managers::{ChannelManager, GuildManager, UserManager, request};
use crate::services::Services;
use crate::structures::{Sticker, StickerPack, User};

/// A chat client bound to one REST transport.
///
/// Cloning is cheap; clones share every cache.
#[derive(Clone)]
pub struct Client {
    services: Services,
    users: Arc<UserManager>,
    channels: Arc<ChannelManager>,
    guilds: Arc<GuildManager>,
}

impl Client {
    pub fn new(options: ClientOptions, rest: Arc<dyn RestClient>) -> Self {
        let services = Services::new(options, rest);
        let channels = Arc::new(ChannelManager::new(services.clone()));
        Self {
            users: Arc::new(UserManager::new(services.clone(), channels.clone())),
            guilds: Arc::new(GuildManager::new(services.clone(), channels.clone())),
            channels,
            services,
        }
    }

    pub fn users(&self) -> &Arc<UserManager> {
        &self.users
    }

    pub fn channels(&self) -> &Arc<ChannelManager> {
        &self.channels
    }

    pub fn guilds(&self) -> &Arc<GuildManager> {
        &self.guilds
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn options(&self) -> &ClientOptions {
        &self.services.options
    }

    pub fn cdn(&self) -> &Cdn {
        &self.services.cdn
    }

    /// The client user, once `READY` was received.
    pub fn user(&self) -> Option<Cached<User>> {
        self.services.user()
    }

    /// Subscribes to cache notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.services.emitter.subscribe()
    }

    /// Applies one gateway frame to the cache.
    pub fn dispatch(&self, event: &GatewayDispatch) {
        actions::dispatch(self, event);
    }

    /// Fetches any sticker by id. The result is not cached.
    pub async fn fetch_sticker(&self, id: Snowflake) -> CoreResult<Sticker> {
        let data = request(
            &self.services,
            Method::Get,
            &format!("/stickers/{id}"),
            RequestOptions::new(),
        )
        .await?;
        Sticker::construct(&data, &self.services.users)
    }

    /// Fetches the standard sticker packs, in listing order.
    pub async fn fetch_sticker_packs(&self) -> CoreResult<IndexMap<Snowflake, StickerPack>> {
        let data = request(
            &self.services,
            Method::Get,
            "/sticker-packs",
            RequestOptions::new(),
        )
        .await?;

        let mut packs = IndexMap::new();
        let listed = data.get("sticker_packs").and_then(Value::as_array);
        for raw in listed.into_iter().flatten() {
            match StickerPack::construct(raw, &self.services.users) {
                Ok(pack) => {
                    packs.insert(pack.id, pack);
                }
                Err(err) => debug!(error = %err, "Skipping malformed sticker pack"),
            }
        }
        Ok(packs)
    }

    /// The standard pack a sticker belongs to.
    pub async fn fetch_sticker_pack_of(
        &self,
        sticker: &Sticker,
    ) -> CoreResult<Option<StickerPack>> {
        let Some(pack_id) = sticker.pack_id else {
            return Ok(None);
        };
        Ok(self.fetch_sticker_packs().await?.shift_remove(&pack_id))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("me", &self.services.me())
            .field("channels", &self.channels)
            .field("guilds", &self.guilds)
            .finish_non_exhaustive()
    }
}
