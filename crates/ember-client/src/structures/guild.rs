use ember_core::{CoreResult, Entity, Snowflake, Timestamped, payload};
use serde_json::Value;

use crate::cdn::{Cdn, ImageOptions};

/// A guild.
///
/// Channels, roles, members and stickers are owned by the guild's manager
/// scope, not by this value.
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: Option<String>,
    pub icon: Option<String>,
    pub owner_id: Option<Snowflake>,
    /// `false` during an outage.
    pub available: bool,
}

impl Entity for Guild {
    type Context = ();
    const KIND: &'static str = "Guild";

    fn construct(data: &Value, ctx: &()) -> CoreResult<Self> {
        let mut guild = Self {
            id: Self::key(data)?,
            name: None,
            icon: None,
            owner_id: None,
            available: true,
        };
        guild.patch(data, ctx);
        Ok(guild)
    }

    fn patch(&mut self, data: &Value, _ctx: &()) {
        payload::patch(&mut self.name, data, "name");
        payload::patch(&mut self.icon, data, "icon");
        payload::patch(&mut self.owner_id, data, "owner_id");
        payload::patch_with(&mut self.available, data, "unavailable", |raw| {
            raw.as_bool().map(|unavailable| !unavailable)
        });
    }

    fn id(&self) -> Snowflake {
        self.id
    }
}

impl Timestamped for Guild {
    fn timestamp_key(&self) -> Snowflake {
        self.id
    }
}

impl Guild {
    /// The guild icon, if any.
    pub fn icon_url(&self, cdn: &Cdn, options: ImageOptions) -> Option<String> {
        self.icon.as_deref().map(|hash| cdn.icon(self.id, hash, options))
    }

    /// Whether `user_id` owns the guild.
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == Some(user_id)
    }
}
