use ember_core::{Cache, Cached, CoreResult, EntityManager, Resolvable, Snowflake};
use serde_json::Value;

use crate::structures::Role;

/// Roles of one guild.
#[derive(Debug)]
pub struct RoleManager {
    guild_id: Snowflake,
    roles: EntityManager<Role>,
}

impl RoleManager {
    pub fn new(guild_id: Snowflake) -> Self {
        Self {
            guild_id,
            roles: EntityManager::new(guild_id),
        }
    }

    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    pub fn cache(&self) -> &Cache<Role> {
        self.roles.cache()
    }

    pub(crate) fn entities(&self) -> &EntityManager<Role> {
        &self.roles
    }

    pub fn add(&self, data: &Value) -> CoreResult<Cached<Role>> {
        self.roles.add(data)
    }

    pub fn resolve(&self, role: impl Into<Resolvable<Role>>) -> Option<Cached<Role>> {
        self.roles.resolve(role)
    }

    pub fn resolve_id(&self, role: impl Into<Resolvable<Role>>) -> Option<Snowflake> {
        self.roles.resolve_id(role)
    }

    /// The `@everyone` role.
    pub fn everyone(&self) -> Option<Cached<Role>> {
        self.roles.get(self.guild_id)
    }

    /// The role at the top of the hierarchy.
    pub fn highest(&self) -> Option<Cached<Role>> {
        highest_of(self.cache().values())
    }
}

/// The highest role of a set, per [`Role::compare_position_to`].
pub(crate) fn highest_of(roles: impl IntoIterator<Item = Cached<Role>>) -> Option<Cached<Role>> {
    roles
        .into_iter()
        .max_by(|a, b| a.read().compare_position_to(&b.read()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn everyone_and_highest() {
        let roles = RoleManager::new(Snowflake::new(100));
        assert!(roles.highest().is_none());

        roles.add(&json!({ "id": "100", "name": "@everyone", "position": 0 })).unwrap();
        roles.add(&json!({ "id": "2", "name": "admin", "position": 5 })).unwrap();
        roles.add(&json!({ "id": "3", "name": "mod", "position": 3 })).unwrap();

        assert_eq!(roles.everyone().unwrap().id(), Snowflake::new(100));
        assert_eq!(roles.highest().unwrap().read().name, "admin");
        assert_eq!(roles.resolve_id(Snowflake::new(3)), Some(Snowflake::new(3)));
    }
}
