use std::collections::HashMap;
use std::sync::Arc;

use ember_core::{
    Cache, Cached, CoreResult, EntityManager, Method, RequestOptions, Resolvable, Snowflake,
    action,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::channel::ChannelManager;
use super::member::GuildMemberManager;
use super::role::RoleManager;
use super::sticker::GuildStickerManager;
use super::{FetchOptions, request};
use crate::services::Services;
use crate::structures::Guild;

/// The managers owned by one guild.
#[derive(Debug)]
pub struct GuildScope {
    roles: Arc<RoleManager>,
    members: Arc<GuildMemberManager>,
    stickers: Arc<GuildStickerManager>,
}

impl GuildScope {
    fn new(services: &Services, guild_id: Snowflake, channels: Arc<ChannelManager>) -> Self {
        let roles = Arc::new(RoleManager::new(guild_id));
        Self {
            members: Arc::new(GuildMemberManager::new(
                services.clone(),
                guild_id,
                roles.clone(),
                channels,
            )),
            stickers: Arc::new(GuildStickerManager::new(services.clone(), guild_id)),
            roles,
        }
    }

    pub fn roles(&self) -> &Arc<RoleManager> {
        &self.roles
    }

    pub fn members(&self) -> &Arc<GuildMemberManager> {
        &self.members
    }

    pub fn stickers(&self) -> &Arc<GuildStickerManager> {
        &self.stickers
    }
}

/// Caches guilds and owns their scopes.
///
/// A scope is created when its guild is first cached and dropped with it.
pub struct GuildManager {
    services: Services,
    channels: Arc<ChannelManager>,
    guilds: EntityManager<Guild>,
    scopes: RwLock<HashMap<Snowflake, Arc<GuildScope>>>,
}

impl GuildManager {
    pub fn new(services: Services, channels: Arc<ChannelManager>) -> Self {
        Self {
            services,
            channels,
            guilds: EntityManager::new(()),
            scopes: RwLock::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &Cache<Guild> {
        self.guilds.cache()
    }

    pub(crate) fn entities(&self) -> &EntityManager<Guild> {
        &self.guilds
    }

    /// Adds or patches a guild.
    pub fn add(&self, data: &Value) -> CoreResult<Cached<Guild>> {
        let guild = self.guilds.add(data)?;
        self.open_scope(guild.id());
        Ok(guild)
    }

    /// Removes a guild, its scope and its channels. Returns the final snapshot.
    pub(crate) fn evict(&self, data: &Value) -> CoreResult<Option<Guild>> {
        let Some(last) = action::delete(&self.guilds, data)? else {
            return Ok(None);
        };
        self.scopes.write().remove(&last.id);
        let owned = self
            .channels
            .cache()
            .filter(|channel| channel.guild_id() == Some(last.id));
        for channel in &owned {
            self.channels.remove(channel.id());
        }
        debug!(guild_id = %last.id, channels = owned.len(), "Guild scope dropped");
        Ok(Some(last))
    }

    fn open_scope(&self, guild_id: Snowflake) {
        self.scopes.write().entry(guild_id).or_insert_with(|| {
            Arc::new(GuildScope::new(
                &self.services,
                guild_id,
                self.channels.clone(),
            ))
        });
    }

    pub fn scope(&self, guild_id: Snowflake) -> Option<Arc<GuildScope>> {
        self.scopes.read().get(&guild_id).cloned()
    }

    pub fn roles(&self, guild_id: Snowflake) -> Option<Arc<RoleManager>> {
        self.scope(guild_id).map(|scope| scope.roles.clone())
    }

    pub fn members(&self, guild_id: Snowflake) -> Option<Arc<GuildMemberManager>> {
        self.scope(guild_id).map(|scope| scope.members.clone())
    }

    pub fn stickers(&self, guild_id: Snowflake) -> Option<Arc<GuildStickerManager>> {
        self.scope(guild_id).map(|scope| scope.stickers.clone())
    }

    pub fn resolve(&self, guild: impl Into<Resolvable<Guild>>) -> Option<Cached<Guild>> {
        self.guilds.resolve(guild)
    }

    pub fn resolve_id(&self, guild: impl Into<Resolvable<Guild>>) -> Option<Snowflake> {
        self.guilds.resolve_id(guild)
    }

    /// Fetches a guild, answering from the cache unless forced.
    pub async fn fetch(&self, id: Snowflake, options: FetchOptions) -> CoreResult<Cached<Guild>> {
        if !options.force {
            if let Some(existing) = self.guilds.get(id) {
                return Ok(existing);
            }
        }
        let data = request(
            &self.services,
            Method::Get,
            &format!("/guilds/{id}"),
            RequestOptions::new(),
        )
        .await?;
        if options.cache {
            self.add(&data)
        } else {
            self.guilds.add_with(&data, false, &())
        }
    }
}

impl std::fmt::Debug for GuildManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildManager")
            .field("guilds", &self.guilds)
            .field("scopes", &self.scopes.read().len())
            .finish_non_exhaustive()
    }
}
