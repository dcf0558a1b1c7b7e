//! # Ember Client
//!
//! Entities, managers and gateway actions of the Ember chat SDK, built on
//! the cache engine of [`ember_core`].
//!
//! - [`structures`]: users, guilds, channels, messages, members, roles,
//!   stickers and sticker packs
//! - [`managers`]: per-entity caches plus their remote operations
//! - [`Client`]: wires the managers together and applies gateway frames
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ember_client::{Client, ClientOptions, GatewayDispatch};
//!
//! let client = Client::new(ClientOptions::default(), Arc::new(rest));
//! let mut events = client.subscribe();
//!
//! client.dispatch(&GatewayDispatch::new("GUILD_CREATE", payload));
//! while let Ok(event) = events.try_recv() {
//!     println!("{}", event.event_name());
//! }
//! ```

mod actions;
pub mod cdn;
mod client;
pub mod config;
pub mod events;
pub mod managers;
pub mod services;
pub mod structures;

#[cfg(test)]
mod testing;

pub use cdn::{Cdn, ImageFormat, ImageOptions};
pub use client::Client;
pub use config::ClientOptions;
pub use events::{ClientEvent, GatewayDispatch};
pub use managers::FetchOptions;
pub use services::Services;
pub use structures::{
    Channel, ChannelKind, Guild, GuildMember, Message, Role, Sticker, StickerPack, User,
};
