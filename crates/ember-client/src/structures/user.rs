use ember_core::{CoreResult, Entity, Snowflake, Timestamped, payload};
use serde_json::Value;

use crate::cdn::{Cdn, ImageOptions};

/// A user account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Snowflake,
    pub username: Option<String>,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
}

impl Entity for User {
    type Context = ();
    const KIND: &'static str = "User";

    fn construct(data: &Value, ctx: &()) -> CoreResult<Self> {
        let mut user = Self {
            id: Self::key(data)?,
            username: None,
            discriminator: None,
            avatar: None,
            bot: false,
        };
        user.patch(data, ctx);
        Ok(user)
    }

    fn patch(&mut self, data: &Value, _ctx: &()) {
        payload::patch(&mut self.username, data, "username");
        payload::patch(&mut self.discriminator, data, "discriminator");
        payload::patch(&mut self.avatar, data, "avatar");
        payload::patch(&mut self.bot, data, "bot");
    }

    fn id(&self) -> Snowflake {
        self.id
    }
}

impl Timestamped for User {
    fn timestamp_key(&self) -> Snowflake {
        self.id
    }
}

impl User {
    /// `username#discriminator`, once both are known.
    pub fn tag(&self) -> Option<String> {
        match (&self.username, &self.discriminator) {
            (Some(name), Some(disc)) => Some(format!("{name}#{disc}")),
            _ => None,
        }
    }

    /// `<@id>`.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// The uploaded avatar, if any.
    pub fn avatar_url(&self, cdn: &Cdn, options: ImageOptions) -> Option<String> {
        self.avatar
            .as_deref()
            .map(|hash| cdn.avatar(self.id, hash, options))
    }

    /// The avatar every user without an upload gets.
    pub fn default_avatar_url(&self, cdn: &Cdn) -> String {
        let discriminator = self
            .discriminator
            .as_deref()
            .and_then(|d| d.parse().ok())
            .unwrap_or(0);
        cdn.default_avatar(discriminator)
    }

    /// The uploaded avatar, falling back to the default one.
    pub fn display_avatar_url(&self, cdn: &Cdn, options: ImageOptions) -> String {
        self.avatar_url(cdn, options)
            .unwrap_or_else(|| self.default_avatar_url(cdn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn derived_properties() {
        let cdn = Cdn::new("https://cdn");
        let mut user = User::construct(
            &json!({ "id": "3", "username": "ember", "discriminator": "0007" }),
            &(),
        )
        .unwrap();

        assert_eq!(user.tag().as_deref(), Some("ember#0007"));
        assert_eq!(user.mention(), "<@3>");
        assert!(!user.bot);
        assert_eq!(
            user.display_avatar_url(&cdn, ImageOptions::default()),
            "https://cdn/embed/avatars/2.png"
        );

        user.patch(&json!({ "avatar": "hash" }), &());
        assert_eq!(
            user.display_avatar_url(&cdn, ImageOptions::default()),
            "https://cdn/avatars/3/hash.webp"
        );
        assert_eq!(user.username.as_deref(), Some("ember"));
    }
}
