use ember_core::{CoreResult, Created, action};
use serde_json::Value;

use super::{missing_parent, parent};
use crate::client::Client;
use crate::events::ClientEvent;
use crate::managers::MessageManager;
use crate::services::Services;
use crate::structures::Message;

/// Adds a message unless it is cached, notifying listeners of new ones.
///
/// Shared by the gateway and by [`MessageManager::send`].
pub(crate) fn create(
    messages: &MessageManager,
    services: &Services,
    data: &Value,
) -> CoreResult<Created<Message>> {
    let created = action::create(messages.entities(), data)?;
    if let Created::New(message) = &created {
        services.emit(ClientEvent::MessageCreate(message.snapshot()));
    }
    Ok(created)
}

fn channel_messages(
    client: &Client,
    data: &Value,
    event: &'static str,
) -> Option<std::sync::Arc<MessageManager>> {
    let channel_id = parent(data, "channel_id", event)?;
    let messages = client.channels().messages(channel_id);
    if messages.is_none() {
        missing_parent(event, channel_id);
    }
    messages
}

pub(crate) fn handle_create(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(messages) = channel_messages(client, data, "MESSAGE_CREATE") else {
        return Ok(());
    };
    create(&messages, client.services(), data).map(drop)
}

pub(crate) fn update(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(messages) = channel_messages(client, data, "MESSAGE_UPDATE") else {
        return Ok(());
    };
    if let Some(updated) = action::update(messages.entities(), data)? {
        client.services().emit(ClientEvent::MessageUpdate {
            old: updated.old,
            new: updated.new.snapshot(),
        });
    }
    Ok(())
}

pub(crate) fn delete(client: &Client, data: &Value) -> CoreResult<()> {
    let Some(messages) = channel_messages(client, data, "MESSAGE_DELETE") else {
        return Ok(());
    };
    if let Some(last) = action::delete(messages.entities(), data)? {
        client.services().emit(ClientEvent::MessageDelete(last));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::GatewayDispatch;
    use crate::events::ClientEvent;
    use crate::testing;
    use ember_core::Snowflake;
    use serde_json::json;

    #[test]
    fn messages_for_unknown_channels_are_dropped() {
        let (client, _) = testing::client();
        let mut events = client.subscribe();

        client.dispatch(&GatewayDispatch::new(
            "MESSAGE_CREATE",
            json!({ "id": "10", "channel_id": "404", "content": "lost" }),
        ));

        assert!(events.try_recv().is_err());
    }

    #[test]
    fn updates_for_unknown_channels_are_dropped() {
        let (client, _) = testing::client();
        client.channels().add(&json!({ "id": "1", "type": 0 })).unwrap();
        let mut events = client.subscribe();

        client.dispatch(&GatewayDispatch::new(
            "MESSAGE_UPDATE",
            json!({ "id": "10", "channel_id": "404", "content": "edited" }),
        ));

        assert!(events.try_recv().is_err());
        assert_eq!(client.channels().cache().len(), 1);
        assert!(client.channels().messages(Snowflake::new(404)).is_none());
        let messages = client.channels().messages(Snowflake::new(1)).unwrap();
        assert!(messages.cache().is_empty());
    }

    #[test]
    fn update_then_delete() {
        let (client, _) = testing::client();
        client.channels().add(&json!({ "id": "1", "type": 0 })).unwrap();
        client.dispatch(&GatewayDispatch::new(
            "MESSAGE_CREATE",
            json!({ "id": "10", "channel_id": "1", "content": "a" }),
        ));
        let mut events = client.subscribe();

        client.dispatch(&GatewayDispatch::new(
            "MESSAGE_UPDATE",
            json!({ "id": "10", "channel_id": "1", "content": "b" }),
        ));
        match events.try_recv() {
            Ok(ClientEvent::MessageUpdate { old, new }) => {
                assert_eq!(old.content, "a");
                assert_eq!(new.content, "b");
            }
            other => panic!("expected message update, got {other:?}"),
        }

        client.dispatch(&GatewayDispatch::new(
            "MESSAGE_DELETE",
            json!({ "id": "10", "channel_id": "1" }),
        ));
        match events.try_recv() {
            Ok(ClientEvent::MessageDelete(last)) => {
                assert!(last.deleted);
                assert_eq!(last.content, "b");
            }
            other => panic!("expected message delete, got {other:?}"),
        }
        let messages = client.channels().messages(Snowflake::new(1)).unwrap();
        assert!(messages.cache().is_empty());

        // A second delete finds nothing to remove.
        client.dispatch(&GatewayDispatch::new(
            "MESSAGE_DELETE",
            json!({ "id": "10", "channel_id": "1" }),
        ));
        assert!(events.try_recv().is_err());
    }
}
