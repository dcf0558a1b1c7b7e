use ember_core::{CoreResult, Entity, Snowflake, Timestamped, payload};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::{Sticker, UserRegistry};
use crate::cdn::{Cdn, ImageOptions};

/// A pack of standard stickers.
///
/// Packs are not cached; the stickers they contain are owned by the pack.
#[derive(Debug, Clone, PartialEq)]
pub struct StickerPack {
    pub id: Snowflake,
    /// Stickers in pack order.
    pub stickers: IndexMap<Snowflake, Sticker>,
    pub name: Option<String>,
    pub sku_id: Option<Snowflake>,
    pub cover_sticker_id: Option<Snowflake>,
    pub description: Option<String>,
    pub banner_id: Option<Snowflake>,
}

impl Entity for StickerPack {
    type Context = UserRegistry;
    const KIND: &'static str = "StickerPack";

    fn construct(data: &Value, users: &UserRegistry) -> CoreResult<Self> {
        let mut pack = Self {
            id: Self::key(data)?,
            stickers: IndexMap::new(),
            name: None,
            sku_id: None,
            cover_sticker_id: None,
            description: None,
            banner_id: None,
        };
        pack.patch(data, users);
        Ok(pack)
    }

    fn patch(&mut self, data: &Value, users: &UserRegistry) {
        if let Some(items) = payload::field(data, "stickers").and_then(Value::as_array) {
            self.stickers = items
                .iter()
                .filter_map(|item| match Sticker::construct(item, users) {
                    Ok(sticker) => Some((sticker.id, sticker)),
                    Err(err) => {
                        debug!(pack = %self.id, error = %err, "Skipping malformed pack sticker");
                        None
                    }
                })
                .collect();
        }
        payload::patch(&mut self.name, data, "name");
        payload::patch(&mut self.sku_id, data, "sku_id");
        payload::patch(&mut self.cover_sticker_id, data, "cover_sticker_id");
        payload::patch(&mut self.description, data, "description");
        payload::patch(&mut self.banner_id, data, "banner_asset_id");
    }

    fn id(&self) -> Snowflake {
        self.id
    }
}

impl Timestamped for StickerPack {
    fn timestamp_key(&self) -> Snowflake {
        self.id
    }
}

impl StickerPack {
    /// The sticker shown as the pack's icon.
    pub fn cover_sticker(&self) -> Option<&Sticker> {
        self.cover_sticker_id.and_then(|id| self.stickers.get(&id))
    }

    /// The pack banner.
    pub fn banner_url(&self, cdn: &Cdn, options: ImageOptions) -> Option<String> {
        self.banner_id
            .map(|banner| cdn.sticker_pack_banner(banner, options))
    }
}
