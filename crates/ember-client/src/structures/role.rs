use std::cmp::Ordering;

use ember_core::{CoreResult, Entity, Snowflake, Timestamped, payload};
use serde_json::Value;

/// A guild role.
///
/// The `@everyone` role shares its key with the guild.
#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: Snowflake,
    pub guild_id: Snowflake,
    pub name: String,
    /// RGB color, `0` for none.
    pub color: u32,
    pub hoist: bool,
    pub position: i64,
    /// Raw permission bits.
    pub permissions: u64,
    pub managed: bool,
    pub mentionable: bool,
}

fn permission_bits(raw: &Value) -> Option<u64> {
    match raw {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

impl Entity for Role {
    /// The owning guild.
    type Context = Snowflake;
    const KIND: &'static str = "Role";

    fn construct(data: &Value, guild_id: &Snowflake) -> CoreResult<Self> {
        let mut role = Self {
            id: Self::key(data)?,
            guild_id: *guild_id,
            name: String::new(),
            color: 0,
            hoist: false,
            position: 0,
            permissions: 0,
            managed: false,
            mentionable: false,
        };
        role.patch(data, guild_id);
        Ok(role)
    }

    fn patch(&mut self, data: &Value, _guild_id: &Snowflake) {
        payload::patch(&mut self.name, data, "name");
        payload::patch(&mut self.color, data, "color");
        payload::patch(&mut self.hoist, data, "hoist");
        payload::patch(&mut self.position, data, "position");
        payload::patch_with(&mut self.permissions, data, "permissions", permission_bits);
        payload::patch(&mut self.managed, data, "managed");
        payload::patch(&mut self.mentionable, data, "mentionable");
    }

    fn id(&self) -> Snowflake {
        self.id
    }
}

impl Timestamped for Role {
    fn timestamp_key(&self) -> Snowflake {
        self.id
    }
}

impl Role {
    /// Whether this is the guild's `@everyone` role.
    pub fn is_everyone(&self) -> bool {
        self.id == self.guild_id
    }

    /// `#rrggbb`.
    pub fn hex_color(&self) -> String {
        format!("#{:06x}", self.color)
    }

    /// `<@&id>`, or `@everyone`.
    pub fn mention(&self) -> String {
        if self.is_everyone() {
            "@everyone".to_string()
        } else {
            format!("<@&{}>", self.id)
        }
    }

    /// Orders roles by position in the hierarchy.
    ///
    /// Equal positions are broken by age: the older role ranks higher.
    pub fn compare_position_to(&self, other: &Role) -> Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| other.id.cmp(&self.id))
    }
}
