use std::sync::Arc;

use ember_core::{
    Cache, Cached, CoreError, CoreResult, Method, RequestOptions, Resolvable, Snowflake,
};
use serde_json::{Value, json};

use super::channel::{ChannelManager, dm_body};
use super::{FetchOptions, request};
use crate::actions;
use crate::services::Services;
use crate::structures::{Channel, User};

/// The global user cache and direct message helpers.
pub struct UserManager {
    services: Services,
    channels: Arc<ChannelManager>,
}

impl UserManager {
    pub fn new(services: Services, channels: Arc<ChannelManager>) -> Self {
        Self { services, channels }
    }

    pub fn cache(&self) -> &Cache<User> {
        self.services.users.cache()
    }

    pub fn add(&self, data: &Value) -> CoreResult<Cached<User>> {
        self.services.users.add(data)
    }

    pub fn resolve(&self, user: impl Into<Resolvable<User>>) -> Option<Cached<User>> {
        self.services.users.resolve(user)
    }

    pub fn resolve_id(&self, user: impl Into<Resolvable<User>>) -> Option<Snowflake> {
        self.services.users.resolve_id(user)
    }

    /// Fetches a user, answering from the cache unless forced.
    pub async fn fetch(&self, id: Snowflake, options: FetchOptions) -> CoreResult<Cached<User>> {
        if !options.force {
            if let Some(existing) = self.services.users.get(id) {
                return Ok(existing);
            }
        }
        let data = request(
            &self.services,
            Method::Get,
            &format!("/users/{id}"),
            RequestOptions::new(),
        )
        .await?;
        self.services.users.add_with(&data, options.cache, &())
    }

    /// Opens a DM with a user, reusing a cached one unless `force` is set.
    pub async fn create_dm(
        &self,
        user: impl Into<Resolvable<User>>,
        force: bool,
    ) -> CoreResult<Cached<Channel>> {
        let user_id = self
            .resolve_id(user)
            .ok_or(CoreError::unresolved("UserResolvable"))?;
        if !force {
            if let Some(existing) = self.channels.dm_with(user_id) {
                return Ok(existing);
            }
        }
        let data = request(
            &self.services,
            Method::Post,
            "/users/@me/channels",
            RequestOptions::json(dm_body(user_id)),
        )
        .await?;
        self.channels.add(&data)
    }

    /// Closes the cached DM with a user and returns its final snapshot.
    pub async fn delete_dm(&self, user: impl Into<Resolvable<User>>) -> CoreResult<Channel> {
        let user_id = self
            .resolve_id(user)
            .ok_or(CoreError::unresolved("UserResolvable"))?;
        let dm = self
            .channels
            .dm_with(user_id)
            .ok_or(CoreError::unresolved("DMChannel"))?;
        let id = dm.id();
        request(
            &self.services,
            Method::Delete,
            &format!("/channels/{id}"),
            RequestOptions::new(),
        )
        .await?;

        let removed =
            actions::channel::delete(&self.channels, &self.services, &json!({ "id": id }))?;
        Ok(removed.unwrap_or_else(|| dm.snapshot()))
    }
}

impl std::fmt::Debug for UserManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserManager")
            .field("users", &self.services.users)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ClientEvent;
    use crate::testing;
    use ember_core::Entity;

    #[tokio::test]
    async fn create_dm_reuses_cached_channel() {
        let (client, rest) = testing::client();
        let cached = client
            .channels()
            .add(&json!({ "id": "5", "type": 1, "recipients": [{ "id": "2" }] }))
            .unwrap();

        let dm = client.users().create_dm(Snowflake::new(2), false).await.unwrap();
        assert!(dm.ptr_eq(&cached));
        assert!(rest.requests().is_empty());
    }

    #[tokio::test]
    async fn create_dm_registers_new_channel() {
        let (client, rest) = testing::client();
        rest.respond(
            Method::Post,
            "/users/@me/channels",
            json!({ "id": "6", "type": 1, "recipients": [{ "id": "3", "username": "bob" }] }),
        );

        let dm = client.users().create_dm(Snowflake::new(3), true).await.unwrap();

        assert_eq!(rest.last().options.data, Some(json!({ "recipient_id": "3" })));
        assert_eq!(dm.read().as_dm().unwrap().recipient_id, Some(Snowflake::new(3)));
        assert!(client.channels().messages(Snowflake::new(6)).is_some());
        assert_eq!(
            client.users().resolve(Snowflake::new(3)).unwrap().read().username.as_deref(),
            Some("bob")
        );
    }

    #[tokio::test]
    async fn delete_dm_evicts_and_notifies() {
        let (client, rest) = testing::client();
        client
            .channels()
            .add(&json!({ "id": "5", "type": 1, "recipients": [{ "id": "2" }] }))
            .unwrap();
        let mut events = client.subscribe();

        let closed = client.users().delete_dm(Snowflake::new(2)).await.unwrap();

        assert_eq!(closed.id(), Snowflake::new(5));
        assert_eq!(rest.last().method, Method::Delete);
        assert_eq!(rest.last().route, "/channels/5");
        assert!(!client.channels().cache().contains(Snowflake::new(5)));
        assert!(matches!(events.try_recv(), Ok(ClientEvent::ChannelDelete(_))));

        let err = client.users().delete_dm(Snowflake::new(2)).await.unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedReference { .. }));
    }

    #[tokio::test]
    async fn fetch_without_cache() {
        let (client, rest) = testing::client();
        rest.respond(Method::Get, "/users/9", json!({ "id": "9", "username": "x" }));

        let user = client
            .users()
            .fetch(
                Snowflake::new(9),
                FetchOptions {
                    cache: false,
                    force: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(user.read().username.as_deref(), Some("x"));
        assert!(client.users().cache().is_empty());
    }
}
