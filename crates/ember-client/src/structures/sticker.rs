use ember_core::{CoreResult, Entity, Snowflake, Timestamped, payload};
use serde_json::Value;

use super::{UserRegistry, register_user};
use crate::cdn::Cdn;

/// Where a sticker comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickerType {
    /// Part of an official pack.
    Standard,
    /// Uploaded to a guild.
    Guild,
}

impl StickerType {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::Standard),
            2 => Some(Self::Guild),
            _ => None,
        }
    }
}

/// Image format of a sticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StickerFormat {
    Png,
    Apng,
    Lottie,
}

impl StickerFormat {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::Png),
            2 => Some(Self::Apng),
            3 => Some(Self::Lottie),
            _ => None,
        }
    }
}

fn code<T>(from_code: fn(u64) -> Option<T>) -> impl Fn(&Value) -> Option<Option<T>> {
    move |raw| match raw {
        Value::Null => Some(None),
        other => other.as_u64().map(from_code),
    }
}

fn tag_list(raw: &Value) -> Option<Vec<String>> {
    match raw {
        Value::Null => Some(Vec::new()),
        Value::String(s) if s.is_empty() => Some(Vec::new()),
        Value::String(s) => Some(s.split(", ").map(str::to_string).collect()),
        _ => None,
    }
}

/// A sticker, standard or guild-owned.
#[derive(Debug, Clone, PartialEq)]
pub struct Sticker {
    pub id: Snowflake,
    pub kind: Option<StickerType>,
    /// Image asset id. Deprecated by the platform; usually empty.
    pub asset: Option<String>,
    pub description: Option<String>,
    pub format: Option<StickerFormat>,
    pub name: Option<String>,
    pub pack_id: Option<Snowflake>,
    /// Read from the comma separated `tags` field.
    pub tags: Vec<String>,
    /// Whether a guild sticker can be used. `None` for standard stickers.
    pub available: Option<bool>,
    pub guild_id: Option<Snowflake>,
    /// Uploader of a guild sticker.
    pub author_id: Option<Snowflake>,
    /// Sort order within a standard pack.
    pub sort_value: Option<i64>,
}

impl Entity for Sticker {
    type Context = UserRegistry;
    const KIND: &'static str = "Sticker";

    fn construct(data: &Value, users: &UserRegistry) -> CoreResult<Self> {
        let mut sticker = Self {
            id: Self::key(data)?,
            kind: None,
            asset: None,
            description: None,
            format: None,
            name: None,
            pack_id: None,
            tags: Vec::new(),
            available: None,
            guild_id: None,
            author_id: None,
            sort_value: None,
        };
        sticker.patch(data, users);
        Ok(sticker)
    }

    fn patch(&mut self, data: &Value, users: &UserRegistry) {
        payload::patch_with(&mut self.kind, data, "type", code(StickerType::from_code));
        payload::patch(&mut self.asset, data, "asset");
        payload::patch(&mut self.description, data, "description");
        payload::patch_with(
            &mut self.format,
            data,
            "format_type",
            code(StickerFormat::from_code),
        );
        payload::patch(&mut self.name, data, "name");
        payload::patch(&mut self.pack_id, data, "pack_id");
        payload::patch_with(&mut self.tags, data, "tags", tag_list);
        payload::patch(&mut self.available, data, "available");
        payload::patch(&mut self.guild_id, data, "guild_id");
        if let Some(user) = payload::field(data, "user") {
            self.author_id = match user {
                Value::Null => None,
                user => register_user(users, user),
            };
        }
        payload::patch(&mut self.sort_value, data, "sort_value");
    }

    fn id(&self) -> Snowflake {
        self.id
    }
}

impl Timestamped for Sticker {
    fn timestamp_key(&self) -> Snowflake {
        self.id
    }
}

impl Sticker {
    /// The sticker image, or the Lottie json file for Lottie stickers.
    pub fn url(&self, cdn: &Cdn) -> String {
        cdn.sticker(self.id, self.format)
    }

    /// Whether the sticker belongs to a guild.
    pub fn is_guild_sticker(&self) -> bool {
        self.kind == Some(StickerType::Guild) || self.guild_id.is_some()
    }
}
