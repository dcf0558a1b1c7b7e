//! Cached structures.
//!
//! Every type here implements [`Entity`](ember_core::Entity). References to
//! other entities are stored as keys and resolved through the owning
//! managers.

mod channel;
mod guild;
mod member;
mod message;
mod role;
mod sticker;
mod sticker_pack;
mod user;

pub use channel::{Channel, ChannelKind, DmChannel, TextChannel, VoiceChannel};
pub use guild::Guild;
pub use member::{GuildMember, MemberContext};
pub use message::Message;
pub use role::Role;
pub use sticker::{Sticker, StickerFormat, StickerType};
pub use sticker_pack::StickerPack;
pub use user::User;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use ember_core::{EntityManager, Snowflake};
use serde_json::Value;
use tracing::debug;

/// The shared user registry nested payloads are added to.
pub type UserRegistry = Arc<EntityManager<User>>;

/// Converts an ISO 8601 timestamp field for [`payload::patch_with`].
///
/// `null` clears the slot; an unparsable string leaves it untouched.
///
/// [`payload::patch_with`]: ember_core::payload::patch_with
pub(crate) fn timestamp_field(raw: &Value) -> Option<Option<i64>> {
    match raw {
        Value::Null => Some(None),
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(time) => Some(Some(time.timestamp_millis())),
            Err(err) => {
                debug!(value = %s, error = %err, "Ignoring unparsable timestamp");
                None
            }
        },
        _ => None,
    }
}

/// Converts a millisecond timestamp to a date.
pub(crate) fn to_datetime(unix_ms: Option<i64>) -> Option<DateTime<Utc>> {
    unix_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// Registers a nested user payload, returning its key.
pub(crate) fn register_user(users: &UserRegistry, data: &Value) -> Option<Snowflake> {
    match users.add(data) {
        Ok(user) => Some(user.id()),
        Err(err) => {
            debug!(error = %err, "Dropping malformed nested user");
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn users() -> UserRegistry {
        Arc::new(EntityManager::new(()))
    }
}
