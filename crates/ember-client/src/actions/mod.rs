//! Gateway actions.
//!
//! Each inbound dispatch is routed to one action, which reconciles the
//! payload against the cache and emits at most the notifications the change
//! warrants. Actions run synchronously, in arrival order, and never hold a
//! lock across an await point.
//!
//! A payload whose parent (guild or channel) is not cached is dropped, as is
//! a payload that fails to parse. Neither is an error for the caller.

pub(crate) mod channel;
pub(crate) mod guild;
pub(crate) mod member;
pub(crate) mod message;
pub(crate) mod role;
pub(crate) mod sticker;

use ember_core::{Snowflake, payload};
use serde_json::Value;
use tracing::{debug, trace};

use crate::client::Client;
use crate::events::GatewayDispatch;

/// Routes one dispatch frame to its action.
pub(crate) fn dispatch(client: &Client, event: &GatewayDispatch) {
    let data = &event.d;
    let result = match event.t.as_str() {
        "READY" => guild::ready(client, data),
        "GUILD_CREATE" => guild::create(client, data),
        "GUILD_DELETE" => guild::delete(client, data),
        "CHANNEL_CREATE" => channel::handle_create(client, data),
        "CHANNEL_UPDATE" => channel::update(client, data),
        "CHANNEL_DELETE" => channel::handle_delete(client, data),
        "MESSAGE_CREATE" => message::handle_create(client, data),
        "MESSAGE_UPDATE" => message::update(client, data),
        "MESSAGE_DELETE" => message::delete(client, data),
        "GUILD_MEMBER_ADD" => member::add(client, data),
        "GUILD_MEMBER_UPDATE" => member::update(client, data),
        "GUILD_MEMBER_REMOVE" => member::remove(client, data),
        "GUILD_ROLE_CREATE" => role::create(client, data),
        "GUILD_ROLE_UPDATE" => role::update(client, data),
        "GUILD_ROLE_DELETE" => role::delete(client, data),
        "GUILD_STICKERS_UPDATE" => sticker::update_all(client, data),
        other => {
            trace!(event = other, "Unhandled gateway event");
            Ok(())
        }
    };
    if let Err(err) = result {
        debug!(event = %event.t, error = %err, "Gateway event dropped");
    }
}

/// Reads the parent key an event payload names.
fn parent(data: &Value, key: &'static str, event: &'static str) -> Option<Snowflake> {
    let id = payload::snowflake(data, key);
    if id.is_none() {
        trace!(event, key, "Event without parent key dropped");
    }
    id
}

/// Logs an event dropped because its parent is not cached.
fn missing_parent(event: &'static str, parent: Snowflake) {
    trace!(event, parent = %parent, "Parent not cached; event dropped");
}

/// Returns `data` with `guild_id` set, for nested payloads that omit it.
fn with_guild_id(data: &Value, guild_id: Snowflake) -> Value {
    let mut data = data.clone();
    if let Some(map) = data.as_object_mut() {
        map.entry("guild_id")
            .or_insert_with(|| Value::String(guild_id.to_string()));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn unknown_and_malformed_events_are_ignored() {
        let (client, _) = testing::client();
        let mut events = client.subscribe();

        client.dispatch(&GatewayDispatch::new("TYPING_START", json!({ "channel_id": "1" })));
        client.dispatch(&GatewayDispatch::new("CHANNEL_CREATE", json!({ "type": 0 })));
        client.dispatch(&GatewayDispatch::new("CHANNEL_CREATE", json!({ "id": "1", "type": 13 })));

        assert!(client.channels().cache().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn guild_id_is_injected_once() {
        let guild = Snowflake::new(7);
        assert_eq!(with_guild_id(&json!({ "id": "1" }), guild)["guild_id"], "7");
        assert_eq!(
            with_guild_id(&json!({ "id": "1", "guild_id": "8" }), guild)["guild_id"],
            "8"
        );
    }
}
