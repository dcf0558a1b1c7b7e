use ember_core::{CoreError, CoreResult, Entity, Snowflake, payload};
use serde_json::{Value, json};
use tracing::{debug, trace};

use super::with_guild_id;
use crate::client::Client;
use crate::events::ClientEvent;
use crate::managers::GuildScope;
use crate::structures::Guild;

fn each<'a>(data: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    data.get(key).and_then(Value::as_array).into_iter().flatten()
}

/// Records the client user and the (still unavailable) guilds of the session.
pub(crate) fn ready(client: &Client, data: &Value) -> CoreResult<()> {
    let user = payload::field(data, "user").ok_or(CoreError::malformed("Ready", "user"))?;
    let me = client.users().add(user)?;
    client.services().set_me(me.id());

    for guild in each(data, "guilds") {
        if let Err(err) = client.guilds().add(guild) {
            debug!(error = %err, "Skipping guild in READY");
        }
    }
    client.services().emit(ClientEvent::Ready(me.snapshot()));
    Ok(())
}

/// Caches a guild with everything it carries.
///
/// Notifies listeners when the guild is new or comes back from an outage.
pub(crate) fn create(client: &Client, data: &Value) -> CoreResult<()> {
    let guilds = client.guilds();
    let id = Guild::key(data)?;
    let was_available = guilds.entities().get(id).map(|guild| guild.read().available);

    let mut full = data.clone();
    if let Some(map) = full.as_object_mut() {
        map.entry("unavailable").or_insert(json!(false));
    }
    let guild = guilds.add(&full)?;
    if let Some(scope) = guilds.scope(id) {
        seed(client, &scope, data, id);
    }

    if was_available != Some(true) && guild.read().available {
        client.services().emit(ClientEvent::GuildCreate(guild.snapshot()));
    }
    Ok(())
}

fn seed(client: &Client, scope: &GuildScope, data: &Value, guild_id: Snowflake) {
    for channel in each(data, "channels") {
        if let Err(err) = client.channels().add(&with_guild_id(channel, guild_id)) {
            debug!(guild_id = %guild_id, error = %err, "Skipping channel in GUILD_CREATE");
        }
    }
    for role in each(data, "roles") {
        if let Err(err) = scope.roles().add(role) {
            debug!(guild_id = %guild_id, error = %err, "Skipping role in GUILD_CREATE");
        }
    }
    for member in each(data, "members") {
        if let Err(err) = scope.members().add(member) {
            debug!(guild_id = %guild_id, error = %err, "Skipping member in GUILD_CREATE");
        }
    }
    for sticker in each(data, "stickers") {
        if let Err(err) = scope.stickers().add(&with_guild_id(sticker, guild_id)) {
            debug!(guild_id = %guild_id, error = %err, "Skipping sticker in GUILD_CREATE");
        }
    }
}

/// Removes a guild, or marks it unavailable during an outage.
pub(crate) fn delete(client: &Client, data: &Value) -> CoreResult<()> {
    let id = Guild::key(data)?;
    if payload::get::<bool>(data, "unavailable") == Some(true) {
        if client.guilds().entities().patch(id, data).is_some() {
            trace!(guild_id = %id, "Guild became unavailable");
        }
        return Ok(());
    }
    if let Some(last) = client.guilds().evict(data)? {
        client.services().emit(ClientEvent::GuildDelete(last));
    }
    Ok(())
}
