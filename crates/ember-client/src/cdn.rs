//! CDN asset URLs.

use std::fmt;
use std::sync::Arc;

use ember_core::Snowflake;

use crate::structures::StickerFormat;

/// Application id under which sticker pack banners are stored.
const STICKER_PACK_APPLICATION: u64 = 710_982_414_301_790_216;

/// Image file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    #[default]
    Webp,
    Png,
    Jpg,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// File extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Options for image URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOptions {
    /// Requested format. Defaults to webp.
    pub format: Option<ImageFormat>,
    /// Requested size in pixels, sent as the `size` query parameter.
    pub size: Option<u16>,
    /// Use gif for animated hashes (`a_` prefix), regardless of `format`.
    pub dynamic: bool,
}

impl ImageOptions {
    fn resolve(self, hash: &str) -> (ImageFormat, Option<u16>) {
        let format = if self.dynamic && hash.starts_with("a_") {
            ImageFormat::Gif
        } else {
            self.format.unwrap_or_default()
        };
        (format, self.size)
    }
}

/// Builds asset URLs below the configured CDN root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cdn {
    root: Arc<str>,
}

impl Cdn {
    /// Creates a builder for the given root, e.g. `https://cdn.discordapp.com`.
    pub fn new(root: &str) -> Self {
        Self {
            root: Arc::from(root.trim_end_matches('/')),
        }
    }

    /// The CDN root.
    pub fn root(&self) -> &str {
        &self.root
    }

    fn image(&self, path: &str, hash: &str, options: ImageOptions) -> String {
        let (format, size) = options.resolve(hash);
        match size {
            Some(size) => format!("{}/{path}/{hash}.{format}?size={size}", self.root),
            None => format!("{}/{path}/{hash}.{format}", self.root),
        }
    }

    /// A user's avatar.
    pub fn avatar(&self, user_id: Snowflake, hash: &str, options: ImageOptions) -> String {
        self.image(&format!("avatars/{user_id}"), hash, options)
    }

    /// The default avatar for a discriminator.
    pub fn default_avatar(&self, discriminator: u16) -> String {
        format!("{}/embed/avatars/{}.png", self.root, discriminator % 5)
    }

    /// A member's per-guild avatar.
    pub fn guild_member_avatar(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        hash: &str,
        options: ImageOptions,
    ) -> String {
        self.image(
            &format!("guilds/{guild_id}/users/{user_id}/avatars"),
            hash,
            options,
        )
    }

    /// A guild's icon.
    pub fn icon(&self, guild_id: Snowflake, hash: &str, options: ImageOptions) -> String {
        self.image(&format!("icons/{guild_id}"), hash, options)
    }

    /// A sticker image. Lottie stickers link to their json file.
    pub fn sticker(&self, sticker_id: Snowflake, format: Option<StickerFormat>) -> String {
        let extension = match format {
            Some(StickerFormat::Lottie) => "json",
            _ => "png",
        };
        format!("{}/stickers/{sticker_id}.{extension}", self.root)
    }

    /// A sticker pack banner.
    pub fn sticker_pack_banner(&self, banner_id: Snowflake, options: ImageOptions) -> String {
        self.image(
            &format!("app-assets/{STICKER_PACK_APPLICATION}/store"),
            &banner_id.to_string(),
            ImageOptions {
                dynamic: false,
                ..options
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdn() -> Cdn {
        Cdn::new("https://cdn.example.com/")
    }

    #[test]
    fn avatar_urls() {
        let id = Snowflake::new(1);
        assert_eq!(
            cdn().avatar(id, "abc", ImageOptions::default()),
            "https://cdn.example.com/avatars/1/abc.webp"
        );
        assert_eq!(
            cdn().avatar(
                id,
                "a_abc",
                ImageOptions {
                    format: Some(ImageFormat::Png),
                    size: Some(128),
                    dynamic: true,
                }
            ),
            "https://cdn.example.com/avatars/1/a_abc.gif?size=128"
        );
        assert_eq!(
            cdn().default_avatar(1234),
            "https://cdn.example.com/embed/avatars/4.png"
        );
    }

    #[test]
    fn sticker_urls() {
        let id = Snowflake::new(9);
        assert_eq!(
            cdn().sticker(id, Some(StickerFormat::Lottie)),
            "https://cdn.example.com/stickers/9.json"
        );
        assert_eq!(
            cdn().sticker(id, Some(StickerFormat::Apng)),
            "https://cdn.example.com/stickers/9.png"
        );
        assert_eq!(
            cdn().sticker_pack_banner(Snowflake::new(5), ImageOptions::default()),
            "https://cdn.example.com/app-assets/710982414301790216/store/5.webp"
        );
    }
}
