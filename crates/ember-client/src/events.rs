//! Gateway ingress and client notifications.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ember_core::Snowflake;

use crate::structures::{Channel, Guild, GuildMember, Message, Role, Sticker, User};

/// One dispatch frame received from the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayDispatch {
    /// Event name, e.g. `MESSAGE_CREATE`.
    pub t: String,
    /// Event payload.
    #[serde(default)]
    pub d: Value,
}

impl GatewayDispatch {
    pub fn new(t: impl Into<String>, d: Value) -> Self {
        Self { t: t.into(), d }
    }
}

/// A change to the client's cache, as seen by listeners.
///
/// Every variant carries snapshots. Holding an event never keeps a cached
/// entity alive or observes later patches.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// The session is ready; carries the client user.
    Ready(User),

    MessageCreate(Message),
    MessageUpdate { old: Message, new: Message },
    /// The final snapshot, with `deleted` set.
    MessageDelete(Message),

    ChannelCreate(Channel),
    ChannelUpdate { old: Channel, new: Channel },
    ChannelDelete(Channel),

    GuildCreate(Guild),
    GuildDelete(Guild),

    GuildMemberAdd(GuildMember),
    /// Only emitted when a tracked field changed.
    GuildMemberUpdate { old: GuildMember, new: GuildMember },
    /// The final snapshot, with `deleted` set.
    GuildMemberRemove(GuildMember),

    RoleCreate(Role),
    RoleUpdate { old: Role, new: Role },
    RoleDelete(Role),

    StickerCreate(Sticker),
    StickerUpdate { old: Sticker, new: Sticker },
    StickerDelete(Sticker),
}

impl ClientEvent {
    /// Listener-facing event name.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::MessageCreate(_) => "message_create",
            Self::MessageUpdate { .. } => "message_update",
            Self::MessageDelete(_) => "message_delete",
            Self::ChannelCreate(_) => "channel_create",
            Self::ChannelUpdate { .. } => "channel_update",
            Self::ChannelDelete(_) => "channel_delete",
            Self::GuildCreate(_) => "guild_create",
            Self::GuildDelete(_) => "guild_delete",
            Self::GuildMemberAdd(_) => "guild_member_add",
            Self::GuildMemberUpdate { .. } => "guild_member_update",
            Self::GuildMemberRemove(_) => "guild_member_remove",
            Self::RoleCreate(_) => "role_create",
            Self::RoleUpdate { .. } => "role_update",
            Self::RoleDelete(_) => "role_delete",
            Self::StickerCreate(_) => "sticker_create",
            Self::StickerUpdate { .. } => "sticker_update",
            Self::StickerDelete(_) => "sticker_delete",
        }
    }

    /// The guild the event happened in, if any.
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::Ready(_) => None,
            Self::MessageCreate(m) | Self::MessageDelete(m) => m.guild_id,
            Self::MessageUpdate { new, .. } => new.guild_id,
            Self::ChannelCreate(c) | Self::ChannelDelete(c) => c.guild_id(),
            Self::ChannelUpdate { new, .. } => new.guild_id(),
            Self::GuildCreate(g) | Self::GuildDelete(g) => Some(g.id),
            Self::GuildMemberAdd(m) | Self::GuildMemberRemove(m) => Some(m.guild_id),
            Self::GuildMemberUpdate { new, .. } => Some(new.guild_id),
            Self::RoleCreate(r) | Self::RoleDelete(r) => Some(r.guild_id),
            Self::RoleUpdate { new, .. } => Some(new.guild_id),
            Self::StickerCreate(s) | Self::StickerDelete(s) => s.guild_id,
            Self::StickerUpdate { new, .. } => new.guild_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dispatch_frames_deserialize() {
        let frame: GatewayDispatch =
            serde_json::from_value(json!({ "t": "GUILD_DELETE", "d": { "id": "1" } })).unwrap();
        assert_eq!(frame, GatewayDispatch::new("GUILD_DELETE", json!({ "id": "1" })));

        let empty: GatewayDispatch = serde_json::from_value(json!({ "t": "RESUMED" })).unwrap();
        assert!(empty.d.is_null());
    }
}
