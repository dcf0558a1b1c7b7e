use std::sync::Arc;

use ember_core::{CoreResult, Created, action};
use serde_json::Value;

use super::{missing_parent, parent};
use crate::client::Client;
use crate::events::ClientEvent;
use crate::managers::GuildMemberManager;

fn guild_members(
    client: &Client,
    data: &Value,
    event: &'static str,
) -> Option<Arc<GuildMemberManager>> {
    let guild_id = parent(data, "guild_id", event)?;
    let members = client.guilds().members(guild_id);
    if members.is_none() {
        missing_parent(event, guild_id);
    }
    members
}

pub(crate) fn add(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(members) = guild_members(client, data, "GUILD_MEMBER_ADD") else {
        return Ok(());
    };
    if let Created::New(member) = action::create(members.entities(), data)? {
        client
            .services()
            .emit(ClientEvent::GuildMemberAdd(member.snapshot()));
    }
    Ok(())
}

/// Patches a cached member. Listeners hear of it only if a field changed.
pub(crate) fn update(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(members) = guild_members(client, data, "GUILD_MEMBER_UPDATE") else {
        return Ok(());
    };
    let Some(updated) = action::update(members.entities(), data)? else {
        return Ok(());
    };
    if updated.changed() {
        client.services().emit(ClientEvent::GuildMemberUpdate {
            new: updated.new.snapshot(),
            old: updated.old,
        });
    }
    Ok(())
}

pub(crate) fn remove(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(members) = guild_members(client, data, "GUILD_MEMBER_REMOVE") else {
        return Ok(());
    };
    if let Some(last) = action::delete(members.entities(), data)? {
        client.services().emit(ClientEvent::GuildMemberRemove(last));
    }
    Ok(())
}
