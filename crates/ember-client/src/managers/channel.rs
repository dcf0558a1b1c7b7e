use std::collections::HashMap;
use std::sync::Arc;

use ember_core::{
    Cache, Cached, CoreError, CoreResult, Created, Entity, EntityManager, Method,
    RequestOptions, Resolvable, Snowflake, action,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Value, json};

use super::message::MessageManager;
use super::{FetchOptions, request};
use crate::services::Services;
use crate::structures::Channel;

/// Fields accepted by [`ChannelManager::edit`]. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChannelEditData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u32>,
    /// `Some(None)` resets to automatic region selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rtc_region: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "parent_id")]
    pub parent: Option<Option<Snowflake>>,
}

/// Caches every channel the client can see.
///
/// Text-based channels get a [`MessageManager`] that lives as long as the
/// channel stays cached.
pub struct ChannelManager {
    services: Services,
    channels: EntityManager<Channel>,
    messages: RwLock<HashMap<Snowflake, Arc<MessageManager>>>,
}

impl ChannelManager {
    pub fn new(services: Services) -> Self {
        Self {
            channels: EntityManager::new(services.users.clone()),
            messages: RwLock::new(HashMap::new()),
            services,
        }
    }

    pub fn cache(&self) -> &Cache<Channel> {
        self.channels.cache()
    }

    pub(crate) fn entities(&self) -> &EntityManager<Channel> {
        &self.channels
    }

    /// Adds or patches a channel.
    pub fn add(&self, data: &Value) -> CoreResult<Cached<Channel>> {
        self.add_with(data, true)
    }

    pub fn add_with(&self, data: &Value, cache: bool) -> CoreResult<Cached<Channel>> {
        let channel = self
            .channels
            .add_with(data, cache, self.channels.context())?;
        if cache {
            self.attach_messages(&channel);
        }
        Ok(channel)
    }

    /// Adds a channel unless it is already cached.
    pub(crate) fn create(&self, data: &Value) -> CoreResult<Created<Channel>> {
        let created = action::create(&self.channels, data)?;
        if created.is_new() {
            self.attach_messages(created.handle());
        }
        Ok(created)
    }

    /// Removes a channel and its message cache. Returns the final snapshot.
    pub(crate) fn evict(&self, data: &Value) -> CoreResult<Option<Channel>> {
        let last = action::delete(&self.channels, data)?;
        if let Some(channel) = &last {
            self.messages.write().remove(&channel.id());
        }
        Ok(last)
    }

    /// Replaces the cached channel outright, e.g. after a type change.
    pub(crate) fn replace(&self, channel: Channel) -> Cached<Channel> {
        let handle = self.channels.insert(channel);
        self.messages.write().remove(&handle.id());
        self.attach_messages(&handle);
        handle
    }

    /// Removes a channel together with its message cache.
    pub(crate) fn remove(&self, id: Snowflake) -> Option<Cached<Channel>> {
        self.messages.write().remove(&id);
        self.channels.remove(id)
    }

    fn attach_messages(&self, channel: &Cached<Channel>) {
        if !channel.read().is_text_based() {
            return;
        }
        let id = channel.id();
        self.messages
            .write()
            .entry(id)
            .or_insert_with(|| Arc::new(MessageManager::new(self.services.clone(), id)));
    }

    /// The message manager of a cached text-based channel.
    pub fn messages(&self, channel_id: Snowflake) -> Option<Arc<MessageManager>> {
        self.messages.read().get(&channel_id).cloned()
    }

    pub fn resolve(&self, channel: impl Into<Resolvable<Channel>>) -> Option<Cached<Channel>> {
        self.channels.resolve(channel)
    }

    pub fn resolve_id(&self, channel: impl Into<Resolvable<Channel>>) -> Option<Snowflake> {
        self.channels.resolve_id(channel)
    }

    /// Fetches a channel, answering from the cache unless forced.
    pub async fn fetch(&self, id: Snowflake, options: FetchOptions) -> CoreResult<Cached<Channel>> {
        if !options.force {
            if let Some(existing) = self.channels.get(id) {
                return Ok(existing);
            }
        }
        let data = request(
            &self.services,
            Method::Get,
            &format!("/channels/{id}"),
            RequestOptions::new(),
        )
        .await?;
        self.add_with(&data, options.cache)
    }

    /// Edits a channel and returns the edited copy.
    pub async fn edit(
        &self,
        channel: impl Into<Resolvable<Channel>>,
        data: ChannelEditData,
        reason: Option<&str>,
    ) -> CoreResult<Channel> {
        let id = self
            .resolve_id(channel)
            .ok_or(CoreError::unresolved("ChannelResolvable"))?;
        let body = serde_json::to_value(&data).map_err(ember_core::ApiError::from)?;
        let response = request(
            &self.services,
            Method::Patch,
            &format!("/channels/{id}"),
            RequestOptions::json(body).with_reason(reason),
        )
        .await?;

        match self.channels.get(id) {
            Some(existing) => Ok(self.channels.patched_clone(&existing, &response)),
            None => Ok(self.add(&response)?.snapshot()),
        }
    }

    /// Sets a voice channel's bitrate.
    pub async fn set_bitrate(
        &self,
        channel: impl Into<Resolvable<Channel>>,
        bitrate: u32,
        reason: Option<&str>,
    ) -> CoreResult<Channel> {
        let data = ChannelEditData {
            bitrate: Some(bitrate),
            ..ChannelEditData::default()
        };
        self.edit(channel, data, reason).await
    }

    /// Pins a voice channel's region, or resets it with `None`.
    pub async fn set_rtc_region(
        &self,
        channel: impl Into<Resolvable<Channel>>,
        region: Option<String>,
        reason: Option<&str>,
    ) -> CoreResult<Channel> {
        let data = ChannelEditData {
            rtc_region: Some(region),
            ..ChannelEditData::default()
        };
        self.edit(channel, data, reason).await
    }

    /// Deletes a channel. The cache is updated by the gateway event.
    pub async fn delete(
        &self,
        channel: impl Into<Resolvable<Channel>>,
        reason: Option<&str>,
    ) -> CoreResult<Value> {
        let id = self
            .resolve_id(channel)
            .ok_or(CoreError::unresolved("ChannelResolvable"))?;
        request(
            &self.services,
            Method::Delete,
            &format!("/channels/{id}"),
            RequestOptions::new().with_reason(reason),
        )
        .await
    }

    /// Finds the cached DM channel with `user_id`.
    pub fn dm_with(&self, user_id: Snowflake) -> Option<Cached<Channel>> {
        self.cache().find(|channel| {
            channel
                .as_dm()
                .is_some_and(|dm| dm.recipient_id == Some(user_id))
        })
    }
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Body for creating a DM with `user_id`.
pub(crate) fn dm_body(user_id: Snowflake) -> Value {
    json!({ "recipient_id": user_id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::ChannelKind;
    use crate::testing;

    #[tokio::test]
    async fn edit_returns_patched_clone() {
        let (client, rest) = testing::client();
        let channels = client.channels();
        let live = channels
            .add(&json!({ "id": "1", "type": 2, "name": "voice", "bitrate": 64000 }))
            .unwrap();
        rest.respond(
            Method::Patch,
            "/channels/1",
            json!({ "id": "1", "type": 2, "bitrate": 96000 }),
        );

        let edited = channels
            .set_bitrate(Snowflake::new(1), 96000, Some("louder"))
            .await
            .unwrap();

        assert_eq!(edited.as_voice().unwrap().bitrate, Some(96000));
        assert_eq!(edited.name(), Some("voice"));
        assert_eq!(live.read().as_voice().unwrap().bitrate, Some(64000));

        let sent = rest.last();
        assert_eq!(sent.options.data, Some(json!({ "bitrate": 96000 })));
        assert_eq!(sent.options.reason.as_deref(), Some("louder"));
    }

    #[tokio::test]
    async fn rtc_region_reset_sends_null() {
        let (client, rest) = testing::client();
        client
            .channels()
            .add(&json!({ "id": "1", "type": 2, "rtc_region": "europe" }))
            .unwrap();

        client
            .channels()
            .set_rtc_region(Snowflake::new(1), None, None)
            .await
            .unwrap();

        assert_eq!(rest.last().options.data, Some(json!({ "rtc_region": null })));
    }

    #[tokio::test]
    async fn edit_of_uncached_channel_adds_it() {
        let (client, rest) = testing::client();
        rest.respond(
            Method::Patch,
            "/channels/5",
            json!({ "id": "5", "type": 0, "name": "renamed" }),
        );

        let edited = client
            .channels()
            .edit(
                Snowflake::new(5),
                ChannelEditData {
                    name: Some("renamed".into()),
                    ..ChannelEditData::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(edited.kind(), ChannelKind::Text);
        assert!(client.channels().cache().contains(Snowflake::new(5)));
        assert!(client.channels().messages(Snowflake::new(5)).is_some());
    }

    #[tokio::test]
    async fn fetch_prefers_cache() {
        let (client, rest) = testing::client();
        let cached = client
            .channels()
            .add(&json!({ "id": "1", "type": 0 }))
            .unwrap();

        let fetched = client
            .channels()
            .fetch(Snowflake::new(1), FetchOptions::default())
            .await
            .unwrap();
        assert!(fetched.ptr_eq(&cached));
        assert!(rest.requests().is_empty());

        rest.respond(Method::Get, "/channels/1", json!({ "id": "1", "type": 0, "name": "x" }));
        let forced = client
            .channels()
            .fetch(Snowflake::new(1), FetchOptions::force())
            .await
            .unwrap();
        assert!(forced.ptr_eq(&cached));
        assert_eq!(cached.read().name(), Some("x"));
    }

    #[test]
    fn messages_only_for_text_based() {
        let (client, _) = testing::client();
        let channels = client.channels();
        channels.add(&json!({ "id": "1", "type": 0 })).unwrap();
        channels.add(&json!({ "id": "2", "type": 2 })).unwrap();

        assert!(channels.messages(Snowflake::new(1)).is_some());
        assert!(channels.messages(Snowflake::new(2)).is_none());

        channels.remove(Snowflake::new(1));
        assert!(channels.messages(Snowflake::new(1)).is_none());
    }
}
