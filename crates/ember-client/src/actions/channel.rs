use ember_core::{CoreResult, Created, Entity, action, payload};
use serde_json::Value;
use tracing::trace;

use super::missing_parent;
use crate::client::Client;
use crate::events::ClientEvent;
use crate::managers::ChannelManager;
use crate::services::Services;
use crate::structures::Channel;

pub(crate) fn handle_create(client: &Client, data: &Value) -> CoreResult<()> {
    if let Some(guild_id) = payload::snowflake(data, "guild_id") {
        if !client.guilds().cache().contains(guild_id) {
            missing_parent("CHANNEL_CREATE", guild_id);
            return Ok(());
        }
    }
    if let Created::New(channel) = client.channels().create(data)? {
        client.services().emit(ClientEvent::ChannelCreate(channel.snapshot()));
    }
    Ok(())
}

/// Patches a channel, or rebuilds it when its type changed.
pub(crate) fn update(client: &Client, data: &Value) -> CoreResult<()> {
    let channels = client.channels();
    let id = Channel::key(data)?;
    let Some(live) = channels.entities().get(id) else {
        trace!(channel_id = %id, "Update for uncached channel dropped");
        return Ok(());
    };

    let retyped = Channel::kind_of(data).is_ok_and(|kind| kind != live.read().kind());
    let (old, new) = if retyped {
        let old = live.snapshot();
        let rebuilt = Channel::construct(data, channels.entities().context())?;
        trace!(channel_id = %id, kind = ?rebuilt.kind(), "Channel type changed");
        (old, channels.replace(rebuilt).snapshot())
    } else {
        match action::update(channels.entities(), data)? {
            Some(updated) => (updated.old, updated.new.snapshot()),
            None => return Ok(()),
        }
    };
    client.services().emit(ClientEvent::ChannelUpdate { old, new });
    Ok(())
}

/// Evicts a channel and notifies listeners. Returns the final snapshot.
pub(crate) fn delete(
    channels: &ChannelManager,
    services: &Services,
    data: &Value,
) -> CoreResult<Option<Channel>> {
    let last = channels.evict(data)?;
    if let Some(channel) = &last {
        services.emit(ClientEvent::ChannelDelete(channel.clone()));
    }
    Ok(last)
}

pub(crate) fn handle_delete(client: &Client, data: &Value) -> CoreResult<()> {
    delete(client.channels(), client.services(), data).map(drop)
}
