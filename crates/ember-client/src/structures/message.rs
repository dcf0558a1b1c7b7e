use chrono::{DateTime, Utc};
use ember_core::{CoreError, CoreResult, Entity, Snowflake, Timestamped, payload};
use serde_json::Value;

use super::{UserRegistry, register_user, timestamp_field, to_datetime};

/// A message in a text-based channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub author_id: Option<Snowflake>,
    pub content: String,
    pub tts: bool,
    pub pinned: bool,
    pub edited_timestamp: Option<i64>,
    /// Users mentioned in the content.
    pub mentions: Vec<Snowflake>,
    pub sticker_ids: Vec<Snowflake>,
    /// Set on the final snapshot handed to delete listeners.
    pub deleted: bool,
}

fn ids_of(raw: &Value) -> Option<Vec<Snowflake>> {
    raw.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| payload::snowflake(item, "id"))
            .collect()
    })
}

impl Entity for Message {
    type Context = UserRegistry;
    const KIND: &'static str = "Message";

    fn construct(data: &Value, users: &UserRegistry) -> CoreResult<Self> {
        let mut message = Self {
            id: Self::key(data)?,
            channel_id: payload::snowflake(data, "channel_id")
                .ok_or(CoreError::malformed(Self::KIND, "channel_id"))?,
            guild_id: None,
            author_id: None,
            content: String::new(),
            tts: false,
            pinned: false,
            edited_timestamp: None,
            mentions: Vec::new(),
            sticker_ids: Vec::new(),
            deleted: false,
        };
        message.patch(data, users);
        Ok(message)
    }

    fn patch(&mut self, data: &Value, users: &UserRegistry) {
        payload::patch(&mut self.guild_id, data, "guild_id");
        if let Some(author) = payload::field(data, "author") {
            self.author_id = register_user(users, author);
        }
        payload::patch(&mut self.content, data, "content");
        payload::patch(&mut self.tts, data, "tts");
        payload::patch(&mut self.pinned, data, "pinned");
        payload::patch_with(&mut self.edited_timestamp, data, "edited_timestamp", timestamp_field);
        if let Some(mentioned) = payload::field(data, "mentions").and_then(Value::as_array) {
            self.mentions = mentioned
                .iter()
                .filter_map(|user| register_user(users, user))
                .collect();
        }
        payload::patch_with(&mut self.sticker_ids, data, "sticker_items", ids_of);
    }

    fn id(&self) -> Snowflake {
        self.id
    }

    fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

impl Timestamped for Message {
    fn timestamp_key(&self) -> Snowflake {
        self.id
    }
}

impl Message {
    /// Time of the last edit.
    pub fn edited_at(&self) -> Option<DateTime<Utc>> {
        to_datetime(self.edited_timestamp)
    }

    /// Whether `user_id` is mentioned.
    pub fn mentions_user(&self, user_id: Snowflake) -> bool {
        self.mentions.contains(&user_id)
    }
}
