use chrono::{DateTime, Utc};
use ember_core::{CoreError, CoreResult, Entity, Snowflake, payload};
use serde_json::Value;

use super::{User, UserRegistry, register_user, timestamp_field, to_datetime};
use crate::cdn::{Cdn, ImageOptions};

/// Construction context of a [`GuildMember`].
#[derive(Debug, Clone)]
pub struct MemberContext {
    /// The guild the member belongs to.
    pub guild_id: Snowflake,
    /// Registry the member's user is added to.
    pub users: UserRegistry,
}

/// A user's membership in one guild.
///
/// Keyed by the user's id.
#[derive(Debug, Clone, PartialEq)]
pub struct GuildMember {
    pub guild_id: Snowflake,
    pub user_id: Snowflake,
    pub joined_timestamp: Option<i64>,
    pub premium_since_timestamp: Option<i64>,
    /// Set on the final snapshot handed to remove listeners.
    pub deleted: bool,
    pub nickname: Option<String>,
    pub communication_disabled_until_timestamp: Option<i64>,
    /// Role keys, excluding `@everyone`.
    pub roles: Vec<Snowflake>,
    /// Per-guild avatar hash.
    pub avatar: Option<String>,
    /// Whether the member has yet to pass membership screening.
    pub pending: bool,
}

impl Entity for GuildMember {
    type Context = MemberContext;
    const KIND: &'static str = "GuildMember";

    fn key(data: &Value) -> CoreResult<Snowflake> {
        payload::field(data, "user")
            .and_then(|user| payload::snowflake(user, "id"))
            .ok_or(CoreError::malformed(Self::KIND, "user.id"))
    }

    fn construct(data: &Value, ctx: &MemberContext) -> CoreResult<Self> {
        let mut member = Self {
            guild_id: ctx.guild_id,
            user_id: Self::key(data)?,
            joined_timestamp: None,
            premium_since_timestamp: None,
            deleted: false,
            nickname: None,
            communication_disabled_until_timestamp: None,
            roles: Vec::new(),
            avatar: None,
            pending: false,
        };
        member.patch(data, ctx);
        Ok(member)
    }

    fn patch(&mut self, data: &Value, ctx: &MemberContext) {
        if let Some(user) = payload::field(data, "user") {
            register_user(&ctx.users, user);
        }
        payload::patch(&mut self.nickname, data, "nick");
        payload::patch_with(&mut self.joined_timestamp, data, "joined_at", timestamp_field);
        payload::patch_with(
            &mut self.premium_since_timestamp,
            data,
            "premium_since",
            timestamp_field,
        );
        payload::patch_with(&mut self.roles, data, "roles", payload::snowflake_list);
        payload::patch_with(
            &mut self.communication_disabled_until_timestamp,
            data,
            "communication_disabled_until",
            timestamp_field,
        );
        payload::patch(&mut self.avatar, data, "avatar");
        payload::patch(&mut self.pending, data, "pending");
    }

    fn id(&self) -> Snowflake {
        self.user_id
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl GuildMember {
    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.joined_timestamp)
    }

    /// When the member started boosting the guild.
    pub fn premium_since(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.premium_since_timestamp)
    }

    /// When the member's timeout ends.
    pub fn communication_disabled_until(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.communication_disabled_until_timestamp)
    }

    /// Whether the member is timed out at `now`.
    pub fn is_communication_disabled_at(&self, now: DateTime<Utc>) -> bool {
        self.communication_disabled_until_timestamp
            .is_some_and(|until| until > now.timestamp_millis())
    }

    /// Whether the member is currently timed out.
    pub fn is_communication_disabled(&self) -> bool {
        self.is_communication_disabled_at(Utc::now())
    }

    /// The nickname, or the username when there is none.
    pub fn display_name(&self, user: Option<&User>) -> Option<String> {
        self.nickname
            .clone()
            .or_else(|| user.and_then(|u| u.username.clone()))
    }

    /// `<@!id>` when nicknamed, `<@id>` otherwise.
    pub fn mention(&self) -> String {
        if self.nickname.is_some() {
            format!("<@!{}>", self.user_id)
        } else {
            format!("<@{}>", self.user_id)
        }
    }

    /// The per-guild avatar, if any.
    pub fn avatar_url(&self, cdn: &Cdn, options: ImageOptions) -> Option<String> {
        self.avatar
            .as_deref()
            .map(|hash| cdn.guild_member_avatar(self.guild_id, self.user_id, hash, options))
    }

    /// The per-guild avatar, falling back to the user's display avatar.
    pub fn display_avatar_url(
        &self,
        cdn: &Cdn,
        user: Option<&User>,
        options: ImageOptions,
    ) -> Option<String> {
        self.avatar_url(cdn, options)
            .or_else(|| user.map(|u| u.display_avatar_url(cdn, options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::fixtures;
    use chrono::Duration;
    use serde_json::json;

    fn context() -> MemberContext {
        MemberContext {
            guild_id: Snowflake::new(100),
            users: fixtures::users(),
        }
    }

    #[test]
    fn keyed_by_user() {
        let ctx = context();
        let member = GuildMember::construct(
            &json!({
                "user": { "id": "7", "username": "pal" },
                "roles": ["1", "2"],
                "joined_at": "2021-06-01T00:00:00+00:00"
            }),
            &ctx,
        )
        .unwrap();

        assert_eq!(member.id(), Snowflake::new(7));
        assert_eq!(member.roles, vec![Snowflake::new(1), Snowflake::new(2)]);
        assert_eq!(member.joined_timestamp, Some(1_622_505_600_000));
        assert!(ctx.users.get(Snowflake::new(7)).is_some());
        assert_eq!(member.mention(), "<@7>");

        let err = GuildMember::construct(&json!({ "nick": "x" }), &ctx).unwrap_err();
        assert!(matches!(err, CoreError::MalformedPayload { field: "user.id", .. }));
    }

    #[test]
    fn display_name_and_mention() {
        let ctx = context();
        let mut member =
            GuildMember::construct(&json!({ "user": { "id": "7" }, "nick": "Nick" }), &ctx)
                .unwrap();
        let user = ctx.users.add(&json!({ "id": "7", "username": "pal" })).unwrap();

        assert_eq!(member.display_name(Some(&user.read())).as_deref(), Some("Nick"));
        assert_eq!(member.mention(), "<@!7>");

        member.patch(&json!({ "nick": null }), &ctx);
        assert_eq!(member.display_name(Some(&user.read())).as_deref(), Some("pal"));
    }

    #[test]
    fn timeouts() {
        let ctx = context();
        let now = Utc::now();
        let until = (now + Duration::minutes(10)).to_rfc3339();
        let mut member = GuildMember::construct(
            &json!({ "user": { "id": "7" }, "communication_disabled_until": until }),
            &ctx,
        )
        .unwrap();

        assert!(member.is_communication_disabled_at(now));
        assert!(!member.is_communication_disabled_at(now + Duration::minutes(11)));

        member.patch(&json!({ "communication_disabled_until": null }), &ctx);
        assert!(!member.is_communication_disabled());
        assert_eq!(member.communication_disabled_until(), None);
    }

    #[test]
    fn avatars_fall_back_to_user() {
        let ctx = context();
        let cdn = Cdn::new("https://cdn");
        let mut member = GuildMember::construct(&json!({ "user": { "id": "7" } }), &ctx).unwrap();
        let user = ctx
            .users
            .add(&json!({ "id": "7", "avatar": "u" }))
            .unwrap()
            .snapshot();

        assert_eq!(
            member.display_avatar_url(&cdn, Some(&user), ImageOptions::default()).as_deref(),
            Some("https://cdn/avatars/7/u.webp")
        );

        member.patch(&json!({ "avatar": "g" }), &ctx);
        assert_eq!(
            member.display_avatar_url(&cdn, Some(&user), ImageOptions::default()).as_deref(),
            Some("https://cdn/guilds/100/users/7/avatars/g.webp")
        );
    }
}
