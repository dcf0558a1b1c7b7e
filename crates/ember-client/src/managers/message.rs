use ember_core::{
    ApiError, Cache, Cached, CoreError, CoreResult, EntityManager, Method, RequestOptions,
    Resolvable, Snowflake,
};
use serde::Serialize;
use serde_json::Value;

use super::{FetchOptions, request};
use crate::actions;
use crate::services::Services;
use crate::structures::Message;

/// Fields accepted by [`MessageManager::edit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageEditData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

/// Messages of one text-based channel.
///
/// Bounded by [`ClientOptions::message_cache_max_size`]: the oldest messages
/// are evicted first.
///
/// [`ClientOptions::message_cache_max_size`]: crate::ClientOptions::message_cache_max_size
pub struct MessageManager {
    services: Services,
    channel_id: Snowflake,
    messages: EntityManager<Message>,
}

impl MessageManager {
    pub fn new(services: Services, channel_id: Snowflake) -> Self {
        Self {
            messages: EntityManager::new(services.users.clone())
                .with_limit(services.options.message_cache_max_size),
            services,
            channel_id,
        }
    }

    pub fn channel_id(&self) -> Snowflake {
        self.channel_id
    }

    pub fn cache(&self) -> &Cache<Message> {
        self.messages.cache()
    }

    pub(crate) fn entities(&self) -> &EntityManager<Message> {
        &self.messages
    }

    pub fn add(&self, data: &Value) -> CoreResult<Cached<Message>> {
        self.messages.add(data)
    }

    pub fn resolve(&self, message: impl Into<Resolvable<Message>>) -> Option<Cached<Message>> {
        self.messages.resolve(message)
    }

    pub fn resolve_id(&self, message: impl Into<Resolvable<Message>>) -> Option<Snowflake> {
        self.messages.resolve_id(message)
    }

    fn route(&self, id: Option<Snowflake>) -> String {
        match id {
            Some(id) => format!("/channels/{}/messages/{id}", self.channel_id),
            None => format!("/channels/{}/messages", self.channel_id),
        }
    }

    /// Fetches one message, answering from the cache unless forced.
    pub async fn fetch(&self, id: Snowflake, options: FetchOptions) -> CoreResult<Cached<Message>> {
        if !options.force {
            if let Some(existing) = self.messages.get(id) {
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
        self.messages
            .add_with(&data, options.cache, self.messages.context())
    }

    /// Sends a text message.
    ///
    /// The response goes through the message-create action, so listeners
    /// see the message once even when the gateway echoes it.
    pub async fn send(&self, content: impl Into<String>) -> CoreResult<Cached<Message>> {
        let body = serde_json::json!({ "content": content.into() });
        let data = request(
            &self.services,
            Method::Post,
            &self.route(None),
            RequestOptions::json(body),
        )
        .await?;
        actions::message::create(self, &self.services, &data).map(|created| created.into_handle())
    }

    /// Edits a message and returns the edited copy.
    pub async fn edit(
        &self,
        message: impl Into<Resolvable<Message>>,
        data: MessageEditData,
    ) -> CoreResult<Message> {
        let id = self
            .resolve_id(message)
            .ok_or(CoreError::unresolved("MessageResolvable"))?;
        let body = serde_json::to_value(&data).map_err(ApiError::from)?;
        let response = request(
            &self.services,
            Method::Patch,
            &self.route(Some(id)),
            RequestOptions::json(body),
        )
        .await?;

        match self.messages.get(id) {
            Some(existing) => Ok(self.messages.patched_clone(&existing, &response)),
            None => Ok(self.add(&response)?.snapshot()),
        }
    }

    /// Deletes a message. The cache is updated by the gateway event.
    pub async fn delete(
        &self,
        message: impl Into<Resolvable<Message>>,
        reason: Option<&str>,
    ) -> CoreResult<()> {
        let id = self
            .resolve_id(message)
            .ok_or(CoreError::unresolved("MessageResolvable"))?;
        request(
            &self.services,
            Method::Delete,
            &self.route(Some(id)),
            RequestOptions::new().with_reason(reason),
        )
        .await?;
        Ok(())
    }
}

impl std::fmt::Debug for MessageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageManager")
            .field("channel_id", &self.channel_id)
            .field("messages", &self.messages)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use crate::events::ClientEvent;
    use crate::testing;
    use serde_json::json;

    #[tokio::test]
    async fn send_notifies_once() {
        let (client, rest) = testing::client();
        client.channels().add(&json!({ "id": "1", "type": 0 })).unwrap();
        let messages = client.channels().messages(Snowflake::new(1)).unwrap();
        let mut events = client.subscribe();

        let created = json!({
            "id": "10",
            "channel_id": "1",
            "content": "hello",
            "author": { "id": "2" }
        });
        rest.respond(Method::Post, "/channels/1/messages", created.clone());

        let sent = messages.send("hello").await.unwrap();
        assert_eq!(sent.read().content, "hello");
        assert_eq!(rest.last().options.data, Some(json!({ "content": "hello" })));

        // The gateway echo is deduplicated.
        client.dispatch(&crate::GatewayDispatch::new("MESSAGE_CREATE", created));
        assert_eq!(messages.cache().len(), 1);

        assert!(matches!(events.try_recv(), Ok(ClientEvent::MessageCreate(m)) if m.content == "hello"));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn edit_leaves_cache_until_gateway_update() {
        let (client, rest) = testing::client();
        client.channels().add(&json!({ "id": "1", "type": 0 })).unwrap();
        let messages = client.channels().messages(Snowflake::new(1)).unwrap();
        let live = messages
            .add(&json!({ "id": "10", "channel_id": "1", "content": "a" }))
            .unwrap();
        rest.respond(
            Method::Patch,
            "/channels/1/messages/10",
            json!({ "id": "10", "channel_id": "1", "content": "b" }),
        );

        let edited = messages
            .edit(
                &live,
                MessageEditData {
                    content: Some(Some("b".into())),
                    ..MessageEditData::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.content, "b");
        assert_eq!(live.read().content, "a");
    }

    #[test]
    fn cache_is_bounded() {
        let (client, _) = testing::client_with(ClientOptions {
            message_cache_max_size: Some(2),
            ..ClientOptions::default()
        });
        client.channels().add(&json!({ "id": "1", "type": 0 })).unwrap();
        let messages = client.channels().messages(Snowflake::new(1)).unwrap();
        for id in 10..13 {
            messages
                .add(&json!({ "id": id.to_string(), "channel_id": "1" }))
                .unwrap();
        }
        assert_eq!(
            messages.cache().keys(),
            vec![Snowflake::new(11), Snowflake::new(12)]
        );
    }

    #[tokio::test]
    async fn remote_failures_surface_unchanged() {
        let (client, rest) = testing::client();
        client.channels().add(&json!({ "id": "1", "type": 0 })).unwrap();
        let messages = client.channels().messages(Snowflake::new(1)).unwrap();
        rest.fail(
            Method::Delete,
            "/channels/1/messages/10",
            ApiError::Http {
                status: 404,
                code: Some(10008),
                message: "Unknown Message".into(),
            },
        );

        let err = messages.delete(Snowflake::new(10), None).await.unwrap_err();
        assert!(matches!(err, CoreError::Remote(ApiError::Http { status: 404, .. })));
    }
}
