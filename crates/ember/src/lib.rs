//! # Ember
//!
//! A cache-first client SDK for chat platforms.
//!
//! ## Overview
//!
//! Ember keeps a local, keyed cache of users, guilds, channels, messages,
//! members, roles and stickers. Gateway frames patch cached entities in
//! place; REST edits return patched clones and leave the cache to the
//! gateway echo.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────┐     ┌──────────────────────────────┐
//! │   Gateway    │────▶│ Runtime  │────▶│ Client (actions → managers)  │──▶ ClientEvent
//! │ (your code)  │mpsc │  loop    │     │   users · channels · guilds  │    subscribers
//! └──────────────┘     └──────────┘     └──────────────┬───────────────┘
//!                                                      │ RestClient
//!                                                      ▼
//!                                              ember-transport (HTTP)
//! ```
//!
//! - **ember-core**: snowflakes, the cache, entity managers, patch actions
//! - **ember-client**: entities, managers and gateway actions
//! - **ember-transport**: the reqwest REST transport
//! - **ember-runtime**: configuration, logging and the dispatch loop
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ember::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = EmberRuntime::new()?;
//!     let (frames, receiver) = tokio::sync::mpsc::channel(1024);
//!     tokio::spawn(my_gateway(frames));
//!     runtime.run(receiver).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `http-client` (default): reqwest transport
//! - `toml-config` (default), `yaml-config`: configuration file formats
//! - `json-log`: JSON log output

pub use ember_client as client;
pub use ember_core as core;
pub use ember_runtime as runtime;
pub use ember_transport as transport;

/// Commonly used types.
///
/// ```rust,ignore
/// use ember::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use ember_runtime::{EmberConfig, EmberRuntime};

    // Client and its notifications
    pub use ember_client::{Client, ClientEvent, ClientOptions, FetchOptions, GatewayDispatch};

    // Entities
    pub use ember_client::{
        Channel, ChannelKind, Guild, GuildMember, Message, Role, Sticker, StickerPack, User,
    };

    // Edit payloads
    pub use ember_client::managers::{
        BanOptions, ChannelEditData, GuildMemberEditData, GuildStickerEditData, MessageEditData,
        Timeout,
    };

    // Core building blocks
    pub use ember_core::{
        Cached, CoreError, CoreResult, Entity, FileAttachment, Resolvable, RestClient, Snowflake,
    };
}
