use std::collections::HashSet;

use ember_core::{CoreError, CoreResult, Created, Entity, action};
use serde_json::{Value, json};
use tracing::debug;

use super::{missing_parent, parent, with_guild_id};
use crate::client::Client;
use crate::events::ClientEvent;
use crate::managers::GuildStickerManager;
use crate::services::Services;
use crate::structures::Sticker;

/// Adds a sticker unless it is cached, notifying listeners of new ones.
///
/// Shared by the gateway and by [`GuildStickerManager::create`].
pub(crate) fn create(
    stickers: &GuildStickerManager,
    services: &Services,
    data: &Value,
) -> CoreResult<Created<Sticker>> {
    let created = action::create(stickers.entities(), data)?;
    if let Created::New(sticker) = &created {
        services.emit(ClientEvent::StickerCreate(sticker.snapshot()));
    }
    Ok(created)
}

/// Reconciles a guild's sticker cache against the full list in the payload.
///
/// Stickers missing from the list are deleted, cached ones are updated
/// (notifying only on change) and the rest are created.
pub(crate) fn update_all(client: &Client, data: &Value) -> CoreResult<()> {
    const EVENT: &str = "GUILD_STICKERS_UPDATE";
    let Some(guild_id) = parent(data, "guild_id", EVENT) else {
        return Ok(());
    };
    let Some(stickers) = client.guilds().stickers(guild_id) else {
        missing_parent(EVENT, guild_id);
        return Ok(());
    };
    let incoming: Vec<Value> = data
        .get("stickers")
        .and_then(Value::as_array)
        .ok_or(CoreError::malformed("GuildStickersUpdate", "stickers"))?
        .iter()
        .map(|raw| with_guild_id(raw, guild_id))
        .collect();
    let keep: HashSet<_> = incoming
        .iter()
        .filter_map(|raw| Sticker::key(raw).ok())
        .collect();

    let services = client.services();
    for id in stickers.cache().keys() {
        if keep.contains(&id) {
            continue;
        }
        if let Some(last) = action::delete(stickers.entities(), &json!({ "id": id }))? {
            services.emit(ClientEvent::StickerDelete(last));
        }
    }

    for raw in &incoming {
        let result = match Sticker::key(raw) {
            Ok(id) if stickers.cache().contains(id) => {
                action::update(stickers.entities(), raw).map(|updated| {
                    if let Some(updated) = updated.filter(|u| u.changed()) {
                        services.emit(ClientEvent::StickerUpdate {
                            new: updated.new.snapshot(),
                            old: updated.old,
                        });
                    }
                })
            }
            _ => create(&stickers, services, raw).map(drop),
        };
        if let Err(err) = result {
            debug!(event = EVENT, guild_id = %guild_id, error = %err, "Skipping sticker");
        }
    }
    Ok(())
}
