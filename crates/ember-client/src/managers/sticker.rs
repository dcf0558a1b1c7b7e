use ember_core::{
    ApiError, Cache, Cached, CoreError, CoreResult, EntityManager, FileAttachment, Method,
    RequestOptions, Resolvable, Snowflake,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{FetchOptions, request};
use crate::actions;
use crate::services::Services;
use crate::structures::Sticker;

/// Fields accepted by [`GuildStickerManager::edit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuildStickerEditData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    /// Comma separated autocomplete tags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Stickers uploaded to one guild.
pub struct GuildStickerManager {
    services: Services,
    guild_id: Snowflake,
    stickers: EntityManager<Sticker>,
}

impl GuildStickerManager {
    pub fn new(services: Services, guild_id: Snowflake) -> Self {
        Self {
            stickers: EntityManager::new(services.users.clone()),
            services,
            guild_id,
        }
    }

    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    pub fn cache(&self) -> &Cache<Sticker> {
        self.stickers.cache()
    }

    pub(crate) fn entities(&self) -> &EntityManager<Sticker> {
        &self.stickers
    }

    pub fn add(&self, data: &Value) -> CoreResult<Cached<Sticker>> {
        self.stickers.add(data)
    }

    pub fn resolve(&self, sticker: impl Into<Resolvable<Sticker>>) -> Option<Cached<Sticker>> {
        self.stickers.resolve(sticker)
    }

    pub fn resolve_id(&self, sticker: impl Into<Resolvable<Sticker>>) -> Option<Snowflake> {
        self.stickers.resolve_id(sticker)
    }

    fn route(&self, id: Option<Snowflake>) -> String {
        match id {
            Some(id) => format!("/guilds/{}/stickers/{id}", self.guild_id),
            None => format!("/guilds/{}/stickers", self.guild_id),
        }
    }

    /// Uploads a sticker.
    ///
    /// The response goes through the sticker-create action so listeners are
    /// notified once, even when the gateway later reports the same sticker.
    pub async fn create(
        &self,
        file: FileAttachment,
        name: impl Into<String>,
        tags: impl Into<String>,
        description: Option<&str>,
        reason: Option<&str>,
    ) -> CoreResult<Cached<Sticker>> {
        if file.data.is_empty() {
            return Err(CoreError::invalid("sticker file must not be empty"));
        }
        let fields = json!({
            "name": name.into(),
            "tags": tags.into(),
            "description": description.unwrap_or_default(),
        });
        let options = RequestOptions::json(fields)
            .with_files(vec![file])
            .with_reason(reason);
        let data = request(&self.services, Method::Post, &self.route(None), options).await?;
        actions::sticker::create(self, &self.services, &data).map(|created| created.into_handle())
    }

    /// Edits a sticker and returns the edited copy.
    pub async fn edit(
        &self,
        sticker: impl Into<Resolvable<Sticker>>,
        data: GuildStickerEditData,
        reason: Option<&str>,
    ) -> CoreResult<Sticker> {
        let id = self
            .resolve_id(sticker)
            .ok_or(CoreError::unresolved("StickerResolvable"))?;
        let body = serde_json::to_value(&data).map_err(ApiError::from)?;
        let response = request(
            &self.services,
            Method::Patch,
            &self.route(Some(id)),
            RequestOptions::json(body).with_reason(reason),
        )
        .await?;

        match self.stickers.get(id) {
            Some(existing) => Ok(self.stickers.patched_clone(&existing, &response)),
            None => Ok(self.add(&response)?.snapshot()),
        }
    }

    /// Deletes a sticker. The cache is updated by the gateway event.
    pub async fn delete(
        &self,
        sticker: impl Into<Resolvable<Sticker>>,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        let id = self
            .resolve_id(sticker)
            .ok_or(CoreError::unresolved("StickerResolvable"))?;
        request(
            &self.services,
            Method::Delete,
            &self.route(Some(id)),
            RequestOptions::new().with_reason(reason),
        )
        .await?;
        Ok(())
    }

    /// Fetches one sticker, answering from the cache unless forced.
    pub async fn fetch(&self, id: Snowflake, options: FetchOptions) -> CoreResult<Cached<Sticker>> {
        if !options.force {
            if let Some(existing) = self.stickers.get(id) {
                return Ok(existing);
            }
        }
        let data = request(
            &self.services,
            Method::Get,
            &self.route(Some(id)),
            RequestOptions::new(),
        )
        .await?;
        self.stickers
            .add_with(&data, options.cache, self.stickers.context())
    }

    /// Fetches every sticker of the guild.
    pub async fn fetch_all(
        &self,
        options: FetchOptions,
    ) -> CoreResult<IndexMap<Snowflake, Cached<Sticker>>> {
        let data = request(
            &self.services,
            Method::Get,
            &self.route(None),
            RequestOptions::new(),
        )
        .await?;

        let mut stickers = IndexMap::new();
        for raw in data.as_array().into_iter().flatten() {
            match self
                .stickers
                .add_with(raw, options.cache, self.stickers.context())
            {
                Ok(sticker) => {
                    stickers.insert(sticker.id(), sticker);
                }
                Err(err) => debug!(guild_id = %self.guild_id, error = %err, "Skipping sticker"),
            }
        }
        Ok(stickers)
    }
}

impl std::fmt::Debug for GuildStickerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildStickerManager")
            .field("guild_id", &self.guild_id)
            .field("stickers", &self.stickers)
            .finish_non_exhaustive()
    }
}
