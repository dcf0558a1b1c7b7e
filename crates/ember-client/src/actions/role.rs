use std::sync::Arc;

use ember_core::{CoreError, CoreResult, Created, action, payload};
use serde_json::{Value, json};

use super::{missing_parent, parent};
use crate::client::Client;
use crate::events::ClientEvent;
use crate::managers::RoleManager;

fn guild_roles(client: &Client, data: &Value, event: &'static str) -> Option<Arc<RoleManager>> {
    let guild_id = parent(data, "guild_id", event)?;
    let roles = client.guilds().roles(guild_id);
    if roles.is_none() {
        missing_parent(event, guild_id);
    }
    roles
}

fn role_payload(data: &Value) -> CoreResult<&Value> {
    payload::field(data, "role").ok_or(CoreError::malformed("GuildRoleEvent", "role"))
}

pub(crate) fn create(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(roles) = guild_roles(client, data, "GUILD_ROLE_CREATE") else {
        return Ok(());
    };
    if let Created::New(role) = action::create(roles.entities(), role_payload(data)?)? {
        client.services().emit(ClientEvent::RoleCreate(role.snapshot()));
    }
    Ok(())
}

pub(crate) fn update(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(roles) = guild_roles(client, data, "GUILD_ROLE_UPDATE") else {
        return Ok(());
    };
    if let Some(updated) = action::update(roles.entities(), role_payload(data)?)? {
        client.services().emit(ClientEvent::RoleUpdate {
            new: updated.new.snapshot(),
            old: updated.old,
        });
    }
    Ok(())
}

pub(crate) fn delete(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(roles) = guild_roles(client, data, "GUILD_ROLE_DELETE") else {
        return Ok(());
    };
    let role_id = payload::snowflake(data, "role_id")
        .ok_or(CoreError::malformed("GuildRoleDelete", "role_id"))?;
    if let Some(last) = action::delete(roles.entities(), &json!({ "id": role_id }))? {
        client.services().emit(ClientEvent::RoleDelete(last));
    }
    Ok(())
}
