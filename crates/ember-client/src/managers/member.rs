use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use ember_core::{
    Cache, Cached, CoreError, CoreResult, EntityManager, Method, RequestOptions, Resolvable,
    Snowflake,
};
use serde_json::{Map, Value, json};

use super::channel::ChannelManager;
use super::member_role::GuildMemberRoleManager;
use super::role::RoleManager;
use super::{FetchOptions, request};
use crate::services::Services;
use crate::structures::{Channel, ChannelKind, GuildMember, MemberContext, Role};

/// How long a member stays timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Until an absolute time.
    Until(DateTime<Utc>),
    /// For a number of seconds from now.
    Seconds(i64),
}

impl Timeout {
    /// The absolute end of the timeout. Times in the past are rejected.
    pub fn resolve(self, now: DateTime<Utc>) -> CoreResult<DateTime<Utc>> {
        let until = match self {
            Self::Until(until) => until,
            Self::Seconds(seconds) => Duration::try_seconds(seconds)
                .and_then(|delta| now.checked_add_signed(delta))
                .ok_or_else(|| CoreError::invalid("timeout out of range"))?,
        };
        if until < now {
            return Err(CoreError::invalid(
                "communication cannot be disabled until a time in the past",
            ));
        }
        Ok(until)
    }
}

/// Fields accepted by [`GuildMemberManager::edit`]. Unset fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct GuildMemberEditData {
    /// `Some(None)` removes the nickname.
    pub nick: Option<Option<String>>,
    /// Replaces the member's roles.
    pub roles: Option<Vec<Resolvable<Role>>>,
    pub mute: Option<bool>,
    pub deaf: Option<bool>,
    /// Voice channel to move the member to; `Some(None)` disconnects.
    pub channel: Option<Option<Resolvable<Channel>>>,
    /// `Some(None)` lifts a timeout.
    pub communication_disabled_until: Option<Option<Timeout>>,
}

/// Options of [`GuildMemberManager::ban`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanOptions {
    /// Days of messages to delete, `0..=7`.
    pub delete_message_days: u8,
    pub reason: Option<String>,
}

/// Members of one guild.
pub struct GuildMemberManager {
    services: Services,
    guild_id: Snowflake,
    members: EntityManager<GuildMember>,
    roles: Arc<RoleManager>,
    channels: Arc<ChannelManager>,
}

impl GuildMemberManager {
    pub fn new(
        services: Services,
        guild_id: Snowflake,
        roles: Arc<RoleManager>,
        channels: Arc<ChannelManager>,
    ) -> Self {
        let context = MemberContext {
            guild_id,
            users: services.users.clone(),
        };
        Self {
            services,
            guild_id,
            members: EntityManager::new(context),
            roles,
            channels,
        }
    }

    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    pub fn cache(&self) -> &Cache<GuildMember> {
        self.members.cache()
    }

    pub(crate) fn entities(&self) -> &EntityManager<GuildMember> {
        &self.members
    }

    pub fn add(&self, data: &Value) -> CoreResult<Cached<GuildMember>> {
        self.members.add(data)
    }

    pub fn resolve(
        &self,
        member: impl Into<Resolvable<GuildMember>>,
    ) -> Option<Cached<GuildMember>> {
        self.members.resolve(member)
    }

    pub fn resolve_id(&self, member: impl Into<Resolvable<GuildMember>>) -> Option<Snowflake> {
        self.members.resolve_id(member)
    }

    /// The client user's membership.
    pub fn me(&self) -> Option<Cached<GuildMember>> {
        self.services.me().and_then(|id| self.members.get(id))
    }

    /// A role view over one member.
    pub fn roles_of(&self, member: &Cached<GuildMember>) -> GuildMemberRoleManager<'_> {
        GuildMemberRoleManager::new(self, &self.roles, member.clone())
    }

    fn route(&self, user_id: Snowflake) -> String {
        format!("/guilds/{}/members/{user_id}", self.guild_id)
    }

    /// Fetches one member, answering from the cache unless forced.
    pub async fn fetch(
        &self,
        user_id: Snowflake,
        options: FetchOptions,
    ) -> CoreResult<Cached<GuildMember>> {
        if !options.force {
            if let Some(existing) = self.members.get(user_id) {
                return Ok(existing);
            }
        }
        let data = request(
            &self.services,
            Method::Get,
            &self.route(user_id),
            RequestOptions::new(),
        )
        .await?;
        self.members
            .add_with(&data, options.cache, self.members.context())
    }

    fn edit_body(&self, data: GuildMemberEditData) -> CoreResult<Map<String, Value>> {
        let mut body = Map::new();
        if let Some(nick) = data.nick {
            body.insert("nick".into(), json!(nick));
        }
        if let Some(roles) = data.roles {
            let ids: Vec<Snowflake> = roles
                .into_iter()
                .filter_map(|role| self.roles.resolve_id(role))
                .collect();
            body.insert("roles".into(), json!(ids));
        }
        if let Some(mute) = data.mute {
            body.insert("mute".into(), json!(mute));
        }
        if let Some(deaf) = data.deaf {
            body.insert("deaf".into(), json!(deaf));
        }
        match data.channel {
            Some(Some(channel)) => {
                let channel = self
                    .channels
                    .resolve(channel)
                    .filter(|c| {
                        let c = c.read();
                        c.kind() == ChannelKind::Voice && c.guild_id() == Some(self.guild_id)
                    })
                    .ok_or_else(|| {
                        CoreError::invalid("channel must resolve to a voice channel of this guild")
                    })?;
                body.insert("channel_id".into(), json!(channel.id()));
            }
            Some(None) => {
                body.insert("channel_id".into(), Value::Null);
            }
            None => {}
        }
        match data.communication_disabled_until {
            Some(Some(timeout)) => {
                let until = timeout.resolve(Utc::now())?;
                body.insert("communication_disabled_until".into(), json!(until.to_rfc3339()));
            }
            Some(None) => {
                body.insert("communication_disabled_until".into(), Value::Null);
            }
            None => {}
        }
        Ok(body)
    }

    /// Edits a member and returns the edited copy.
    ///
    /// Editing only the client user's own nickname uses the dedicated
    /// `@me/nick` route.
    pub async fn edit(
        &self,
        member: impl Into<Resolvable<GuildMember>>,
        data: GuildMemberEditData,
        reason: Option<&str>,
    ) -> CoreResult<GuildMember> {
        let member = self
            .resolve(member)
            .ok_or(CoreError::unresolved("GuildMemberResolvable"))?;
        let id = member.id();
        let body = self.edit_body(data)?;

        let route = if self.services.me() == Some(id) && body.len() == 1 && body.contains_key("nick")
        {
            format!("/guilds/{}/members/@me/nick", self.guild_id)
        } else {
            self.route(id)
        };
        let response = request(
            &self.services,
            Method::Patch,
            &route,
            RequestOptions::json(Value::Object(body)).with_reason(reason),
        )
        .await?;

        Ok(self.members.patched_clone(&member, &response))
    }

    /// Times a member out, or lifts the timeout with `None`.
    pub async fn disable_communication(
        &self,
        member: impl Into<Resolvable<GuildMember>>,
        timeout: Option<Timeout>,
        reason: Option<&str>,
    ) -> CoreResult<GuildMember> {
        let data = GuildMemberEditData {
            communication_disabled_until: Some(timeout),
            ..GuildMemberEditData::default()
        };
        self.edit(member, data, reason).await
    }

    /// Removes a member from the guild.
    pub async fn kick(
        &self,
        member: impl Into<Resolvable<GuildMember>>,
        reason: Option<&str>,
    ) -> CoreResult<Snowflake> {
        let id = self
            .resolve_id(member)
            .ok_or(CoreError::unresolved("GuildMemberResolvable"))?;
        request(
            &self.services,
            Method::Delete,
            &self.route(id),
            RequestOptions::new().with_reason(reason),
        )
        .await?;
        Ok(id)
    }

    /// Bans a user, member or not.
    pub async fn ban(
        &self,
        user: impl Into<Resolvable<GuildMember>>,
        options: BanOptions,
    ) -> CoreResult<Snowflake> {
        if options.delete_message_days > 7 {
            return Err(CoreError::invalid("delete_message_days must be between 0 and 7"));
        }
        let id = self
            .resolve_id(user)
            .ok_or(CoreError::unresolved("UserResolvable"))?;
        request(
            &self.services,
            Method::Put,
            &format!("/guilds/{}/bans/{id}", self.guild_id),
            RequestOptions::json(json!({ "delete_message_days": options.delete_message_days }))
                .with_reason(options.reason),
        )
        .await?;
        Ok(id)
    }

    pub(crate) fn services(&self) -> &Services {
        &self.services
    }
}

impl std::fmt::Debug for GuildMemberManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildMemberManager")
            .field("guild_id", &self.guild_id)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    const GUILD: &str = "100";

    fn seeded() -> (crate::Client, Arc<testing::RecordingRest>) {
        let (client, rest) = testing::client();
        client.dispatch(&crate::GatewayDispatch::new(
            "READY",
            json!({ "user": { "id": "1", "username": "me" }, "guilds": [] }),
        ));
        client.dispatch(&crate::GatewayDispatch::new(
            "GUILD_CREATE",
            json!({
                "id": GUILD,
                "name": "g",
                "channels": [
                    { "id": "20", "type": 2, "name": "voice" },
                    { "id": "21", "type": 0, "name": "text" }
                ],
                "roles": [{ "id": GUILD, "name": "@everyone" }],
                "members": [
                    { "user": { "id": "1" }, "roles": [] },
                    { "user": { "id": "2", "username": "pal" }, "roles": [], "nick": "p" }
                ]
            }),
        ));
        (client, rest)
    }

    fn members(client: &crate::Client) -> Arc<GuildMemberManager> {
        client
            .guilds()
            .scope(Snowflake::new(100))
            .unwrap()
            .members()
            .clone()
    }

    #[tokio::test]
    async fn own_nickname_uses_me_route() {
        let (client, rest) = seeded();
        let members = members(&client);
        rest.respond(Method::Patch, "/guilds/100/members/@me/nick", json!({ "nick": "bot" }));

        let edited = members
            .edit(
                Snowflake::new(1),
                GuildMemberEditData {
                    nick: Some(Some("bot".into())),
                    ..GuildMemberEditData::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(edited.nickname.as_deref(), Some("bot"));
        assert_eq!(rest.last().route, "/guilds/100/members/@me/nick");
        assert_eq!(members.me().unwrap().read().nickname, None);
    }

    #[tokio::test]
    async fn other_members_use_member_route() {
        let (client, rest) = seeded();
        let members = members(&client);

        members
            .edit(
                Snowflake::new(2),
                GuildMemberEditData {
                    nick: Some(None),
                    mute: Some(true),
                    ..GuildMemberEditData::default()
                },
                Some("quiet"),
            )
            .await
            .unwrap();

        let sent = rest.last();
        assert_eq!(sent.route, "/guilds/100/members/2");
        assert_eq!(sent.options.data, Some(json!({ "nick": null, "mute": true })));
        assert_eq!(sent.options.reason.as_deref(), Some("quiet"));
    }

    #[tokio::test]
    async fn voice_moves_must_target_voice_channels() {
        let (client, rest) = seeded();
        let members = members(&client);

        let err = members
            .edit(
                Snowflake::new(2),
                GuildMemberEditData {
                    channel: Some(Some(Snowflake::new(21).into())),
                    ..GuildMemberEditData::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        assert!(rest.requests().is_empty());

        members
            .edit(
                Snowflake::new(2),
                GuildMemberEditData {
                    channel: Some(Some(Snowflake::new(20).into())),
                    ..GuildMemberEditData::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(rest.last().options.data, Some(json!({ "channel_id": "20" })));

        members
            .edit(
                Snowflake::new(2),
                GuildMemberEditData {
                    channel: Some(None),
                    ..GuildMemberEditData::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(rest.last().options.data, Some(json!({ "channel_id": null })));
    }

    #[tokio::test]
    async fn timeouts_are_validated() {
        let (client, rest) = seeded();
        let members = members(&client);

        let err = members
            .disable_communication(Snowflake::new(2), Some(Timeout::Seconds(-60)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        members
            .disable_communication(Snowflake::new(2), Some(Timeout::Seconds(600)), None)
            .await
            .unwrap();
        let data = rest.last().options.data.unwrap();
        let until = data["communication_disabled_until"].as_str().unwrap();
        let until = DateTime::parse_from_rfc3339(until).unwrap();
        assert!(until > Utc::now());

        members
            .disable_communication(Snowflake::new(2), None, None)
            .await
            .unwrap();
        assert_eq!(
            rest.last().options.data,
            Some(json!({ "communication_disabled_until": null }))
        );
    }

    #[test]
    fn out_of_range_timeouts_are_rejected() {
        let now = Utc::now();
        for timeout in [
            Timeout::Seconds(10_000_000_000_000),
            Timeout::Seconds(i64::MAX),
            Timeout::Seconds(i64::MIN),
        ] {
            assert!(matches!(
                timeout.resolve(now),
                Err(CoreError::InvalidArgument(_))
            ));
        }
        assert_eq!(
            Timeout::Seconds(60).resolve(now).unwrap(),
            now + Duration::seconds(60)
        );
    }

    #[tokio::test]
    async fn edit_requires_a_cached_member() {
        let (client, _) = seeded();
        let err = members(&client)
            .edit(Snowflake::new(99), GuildMemberEditData::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedReference { .. }));
    }

    #[tokio::test]
    async fn ban_and_kick_routes() {
        let (client, rest) = seeded();
        let members = members(&client);

        let err = members
            .ban(
                Snowflake::new(2),
                BanOptions {
                    delete_message_days: 8,
                    reason: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        members
            .ban(
                Snowflake::new(3),
                BanOptions {
                    delete_message_days: 7,
                    reason: Some("spam".into()),
                },
            )
            .await
            .unwrap();
        let sent = rest.last();
        assert_eq!(sent.method, Method::Put);
        assert_eq!(sent.route, "/guilds/100/bans/3");
        assert_eq!(sent.options.data, Some(json!({ "delete_message_days": 7 })));

        let kicked = members.kick(Snowflake::new(2), None).await.unwrap();
        assert_eq!(kicked, Snowflake::new(2));
        assert_eq!(rest.last().method, Method::Delete);
        assert_eq!(rest.last().route, "/guilds/100/members/2");
    }

    #[test]
    fn timeout_resolution() {
        let now = Utc::now();
        assert_eq!(
            Timeout::Seconds(30).resolve(now).unwrap(),
            now + Duration::seconds(30)
        );
        assert!(Timeout::Until(now - Duration::seconds(1)).resolve(now).is_err());
        assert_eq!(Timeout::Until(now).resolve(now).unwrap(), now);
    }
}
