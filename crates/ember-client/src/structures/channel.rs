use ember_core::{CoreError, CoreResult, Entity, Snowflake, Timestamped, payload};
use serde_json::Value;

use super::{UserRegistry, register_user};

/// Channel type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Text,
    Dm,
    Voice,
}

impl ChannelKind {
    /// Maps the wire `type` code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Text),
            1 => Some(Self::Dm),
            2 => Some(Self::Voice),
            _ => None,
        }
    }

    /// The wire `type` code.
    pub fn code(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::Dm => 1,
            Self::Voice => 2,
        }
    }

    fn of(data: &Value) -> CoreResult<Self> {
        payload::field(data, "type")
            .and_then(Value::as_u64)
            .and_then(Self::from_code)
            .ok_or(CoreError::malformed("Channel", "type"))
    }
}

/// A guild text channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChannel {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: i64,
    pub nsfw: bool,
    pub parent_id: Option<Snowflake>,
    pub last_message_id: Option<Snowflake>,
}

impl TextChannel {
    fn new(id: Snowflake) -> Self {
        Self {
            id,
            guild_id: None,
            name: None,
            topic: None,
            position: 0,
            nsfw: false,
            parent_id: None,
            last_message_id: None,
        }
    }

    fn patch(&mut self, data: &Value) {
        payload::patch(&mut self.guild_id, data, "guild_id");
        payload::patch(&mut self.name, data, "name");
        payload::patch(&mut self.topic, data, "topic");
        payload::patch(&mut self.position, data, "position");
        payload::patch(&mut self.nsfw, data, "nsfw");
        payload::patch(&mut self.parent_id, data, "parent_id");
        payload::patch(&mut self.last_message_id, data, "last_message_id");
    }
}

/// A direct message channel with one recipient.
#[derive(Debug, Clone, PartialEq)]
pub struct DmChannel {
    pub id: Snowflake,
    pub recipient_id: Option<Snowflake>,
    pub last_message_id: Option<Snowflake>,
}

impl DmChannel {
    fn patch(&mut self, data: &Value, users: &UserRegistry) {
        if let Some(first) = payload::field(data, "recipients")
            .and_then(Value::as_array)
            .and_then(|recipients| recipients.first())
        {
            self.recipient_id = register_user(users, first);
        }
        payload::patch(&mut self.last_message_id, data, "last_message_id");
    }
}

/// A guild voice channel.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceChannel {
    pub id: Snowflake,
    pub guild_id: Option<Snowflake>,
    pub name: Option<String>,
    pub position: i64,
    pub bitrate: Option<u32>,
    /// `0` for unlimited.
    pub user_limit: u32,
    /// `None` picks the region automatically.
    pub rtc_region: Option<String>,
    pub parent_id: Option<Snowflake>,
}

impl VoiceChannel {
    fn new(id: Snowflake) -> Self {
        Self {
            id,
            guild_id: None,
            name: None,
            position: 0,
            bitrate: None,
            user_limit: 0,
            rtc_region: None,
            parent_id: None,
        }
    }

    fn patch(&mut self, data: &Value) {
        payload::patch(&mut self.guild_id, data, "guild_id");
        payload::patch(&mut self.name, data, "name");
        payload::patch(&mut self.position, data, "position");
        payload::patch(&mut self.bitrate, data, "bitrate");
        payload::patch(&mut self.user_limit, data, "user_limit");
        payload::patch(&mut self.rtc_region, data, "rtc_region");
        payload::patch(&mut self.parent_id, data, "parent_id");
    }
}

/// Any channel the client caches.
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    Text(TextChannel),
    Dm(DmChannel),
    Voice(VoiceChannel),
}

impl Entity for Channel {
    type Context = UserRegistry;
    const KIND: &'static str = "Channel";

    fn construct(data: &Value, users: &UserRegistry) -> CoreResult<Self> {
        let id = Self::key(data)?;
        let mut channel = match ChannelKind::of(data)? {
            ChannelKind::Text => Self::Text(TextChannel::new(id)),
            ChannelKind::Dm => Self::Dm(DmChannel {
                id,
                recipient_id: None,
                last_message_id: None,
            }),
            ChannelKind::Voice => Self::Voice(VoiceChannel::new(id)),
        };
        channel.patch(data, users);
        Ok(channel)
    }

    /// The variant is fixed at construction; `type` is never re-read.
    fn patch(&mut self, data: &Value, users: &UserRegistry) {
        match self {
            Self::Text(c) => c.patch(data),
            Self::Dm(c) => c.patch(data, users),
            Self::Voice(c) => c.patch(data),
        }
    }

    fn id(&self) -> Snowflake {
        match self {
            Self::Text(c) => c.id,
            Self::Dm(c) => c.id,
            Self::Voice(c) => c.id,
        }
    }
}

impl Timestamped for Channel {
    fn timestamp_key(&self) -> Snowflake {
        self.id()
    }
}

impl Channel {
    /// Reads the channel type a payload describes.
    pub fn kind_of(data: &Value) -> CoreResult<ChannelKind> {
        ChannelKind::of(data)
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::Text(_) => ChannelKind::Text,
            Self::Dm(_) => ChannelKind::Dm,
            Self::Voice(_) => ChannelKind::Voice,
        }
    }

    /// The owning guild, `None` for direct messages.
    pub fn guild_id(&self) -> Option<Snowflake> {
        match self {
            Self::Text(c) => c.guild_id,
            Self::Dm(_) => None,
            Self::Voice(c) => c.guild_id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Text(c) => c.name.as_deref(),
            Self::Dm(_) => None,
            Self::Voice(c) => c.name.as_deref(),
        }
    }

    /// Whether the channel holds messages.
    pub fn is_text_based(&self) -> bool {
        matches!(self, Self::Text(_) | Self::Dm(_))
    }

    /// `<#id>`, or the recipient mention for direct messages.
    pub fn mention(&self) -> String {
        match self {
            Self::Dm(DmChannel {
                recipient_id: Some(user),
                ..
            }) => format!("<@{user}>"),
            _ => format!("<#{}>", self.id()),
        }
    }

    pub fn as_voice(&self) -> Option<&VoiceChannel> {
        match self {
            Self::Voice(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_dm(&self) -> Option<&DmChannel> {
        match self {
            Self::Dm(c) => Some(c),
            _ => None,
        }
    }
}
