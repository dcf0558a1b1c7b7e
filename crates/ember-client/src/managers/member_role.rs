use std::collections::HashSet;

use ember_core::{Cached, CoreError, CoreResult, Method, RequestOptions, Resolvable, Snowflake};
use futures::future::try_join_all;

use super::member::{GuildMemberEditData, GuildMemberManager};
use super::request;
use super::role::{RoleManager, highest_of};
use crate::structures::{GuildMember, Role};

/// The roles of one member, resolved against the guild's role cache.
pub struct GuildMemberRoleManager<'a> {
    members: &'a GuildMemberManager,
    roles: &'a RoleManager,
    member: Cached<GuildMember>,
}

impl<'a> GuildMemberRoleManager<'a> {
    pub(crate) fn new(
        members: &'a GuildMemberManager,
        roles: &'a RoleManager,
        member: Cached<GuildMember>,
    ) -> Self {
        Self {
            members,
            roles,
            member,
        }
    }

    /// The member's roles in guild role order, `@everyone` last.
    pub fn cache(&self) -> Vec<Cached<Role>> {
        let held: HashSet<Snowflake> = self.member.read().roles.iter().copied().collect();
        let mut roles = self.roles.cache().filter(|role| held.contains(&role.id));
        if let Some(everyone) = self.roles.everyone() {
            if !held.contains(&everyone.id()) {
                roles.push(everyone);
            }
        }
        roles
    }

    pub fn highest(&self) -> Option<Cached<Role>> {
        highest_of(self.cache())
    }

    /// The highest role that has a color.
    pub fn color(&self) -> Option<Cached<Role>> {
        highest_of(self.cache().into_iter().filter(|role| role.read().color != 0))
    }

    /// The highest role displayed separately.
    pub fn hoist(&self) -> Option<Cached<Role>> {
        highest_of(self.cache().into_iter().filter(|role| role.read().hoist))
    }

    fn resolve_all(
        &self,
        roles: impl IntoIterator<Item = Resolvable<Role>>,
    ) -> CoreResult<Vec<Snowflake>> {
        roles
            .into_iter()
            .map(|role| {
                self.roles
                    .resolve(role)
                    .map(|role| role.id())
                    .ok_or(CoreError::unresolved("RoleResolvable"))
            })
            .collect()
    }

    async fn send_each(
        &self,
        method: Method,
        ids: &[Snowflake],
        reason: Option<&str>,
    ) -> CoreResult<()> {
        let services = self.members.services();
        let guild_id = self.members.guild_id();
        let member_id = self.member.id();
        try_join_all(ids.iter().map(|role_id| {
            let route = format!("/guilds/{guild_id}/members/{member_id}/roles/{role_id}");
            async move {
                request(services, method, &route, RequestOptions::new().with_reason(reason)).await
            }
        }))
        .await?;
        Ok(())
    }

    /// Grants roles, one request per role. Returns the edited member copy.
    pub async fn add(
        &self,
        roles: impl IntoIterator<Item = Resolvable<Role>>,
        reason: Option<&str>,
    ) -> CoreResult<GuildMember> {
        let ids = self.resolve_all(roles)?;
        self.send_each(Method::Put, &ids, reason).await?;

        let mut member = self.member.snapshot();
        for id in ids {
            if !member.roles.contains(&id) {
                member.roles.push(id);
            }
        }
        Ok(member)
    }

    /// Revokes roles, one request per role. Returns the edited member copy.
    pub async fn remove(
        &self,
        roles: impl IntoIterator<Item = Resolvable<Role>>,
        reason: Option<&str>,
    ) -> CoreResult<GuildMember> {
        let ids = self.resolve_all(roles)?;
        self.send_each(Method::Delete, &ids, reason).await?;

        let mut member = self.member.snapshot();
        member.roles.retain(|id| !ids.contains(id));
        Ok(member)
    }

    /// Replaces the member's roles in one edit.
    pub async fn set(
        &self,
        roles: Vec<Resolvable<Role>>,
        reason: Option<&str>,
    ) -> CoreResult<GuildMember> {
        let data = GuildMemberEditData {
            roles: Some(roles),
            ..GuildMemberEditData::default()
        };
        self.members.edit(&self.member, data, reason).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{self, RecordingRest};
    use serde_json::json;

    fn seeded() -> (crate::Client, Arc<RecordingRest>) {
        let (client, rest) = testing::client();
        client.dispatch(&crate::GatewayDispatch::new(
            "GUILD_CREATE",
            json!({
                "id": "100",
                "name": "g",
                "roles": [
                    { "id": "100", "name": "@everyone", "position": 0 },
                    { "id": "1", "name": "red", "position": 1, "color": 16711680 },
                    { "id": "2", "name": "staff", "position": 4, "hoist": true },
                    { "id": "3", "name": "top", "position": 9 }
                ],
                "members": [{ "user": { "id": "7" }, "roles": ["1", "2"] }]
            }),
        ));
        (client, rest)
    }

    fn members(client: &crate::Client) -> Arc<GuildMemberManager> {
        client.guilds().members(Snowflake::new(100)).unwrap()
    }

    #[test]
    fn resolves_member_roles() {
        let (client, _) = seeded();
        let members = members(&client);
        let member = members.resolve(Snowflake::new(7)).unwrap();
        let roles = members.roles_of(&member);

        let ids: Vec<_> = roles.cache().iter().map(Cached::id).collect();
        assert_eq!(ids, vec![Snowflake::new(1), Snowflake::new(2), Snowflake::new(100)]);
        assert_eq!(roles.highest().unwrap().read().name, "staff");
        assert_eq!(roles.color().unwrap().read().name, "red");
        assert_eq!(roles.hoist().unwrap().read().name, "staff");
    }

    #[tokio::test]
    async fn add_sends_one_request_per_role() {
        let (client, rest) = seeded();
        let members = members(&client);
        let member = members.resolve(Snowflake::new(7)).unwrap();

        let edited = members
            .roles_of(&member)
            .add(vec![Snowflake::new(3).into(), Snowflake::new(1).into()], Some("promo"))
            .await
            .unwrap();

        let mut routes: Vec<_> = rest.requests().into_iter().map(|r| r.route).collect();
        routes.sort();
        assert_eq!(
            routes,
            vec!["/guilds/100/members/7/roles/1", "/guilds/100/members/7/roles/3"]
        );
        assert!(rest.requests().iter().all(|r| r.method == Method::Put));
        assert_eq!(
            edited.roles,
            vec![Snowflake::new(1), Snowflake::new(2), Snowflake::new(3)]
        );
        assert_eq!(member.read().roles.len(), 2);
    }

    #[tokio::test]
    async fn remove_and_unknown_roles() {
        let (client, rest) = seeded();
        let members = members(&client);
        let member = members.resolve(Snowflake::new(7)).unwrap();
        let roles = members.roles_of(&member);

        let err = roles.add(vec![Snowflake::new(55).into()], None).await.unwrap_err();
        assert!(matches!(err, CoreError::UnresolvedReference { .. }));
        assert!(rest.requests().is_empty());

        let edited = roles.remove(vec![Snowflake::new(1).into()], None).await.unwrap();
        assert_eq!(edited.roles, vec![Snowflake::new(2)]);
        assert_eq!(rest.last().method, Method::Delete);
    }

    #[tokio::test]
    async fn set_goes_through_member_edit() {
        let (client, rest) = seeded();
        let members = members(&client);
        let member = members.resolve(Snowflake::new(7)).unwrap();
        rest.respond(
            Method::Patch,
            "/guilds/100/members/7",
            json!({ "user": { "id": "7" }, "roles": ["3"] }),
        );

        let edited = members
            .roles_of(&member)
            .set(vec![Snowflake::new(3).into()], None)
            .await
            .unwrap();

        assert_eq!(rest.last().options.data, Some(json!({ "roles": ["3"] })));
        assert_eq!(edited.roles, vec![Snowflake::new(3)]);
    }
}
