//! # Ember Transport
//!
//! Concrete implementations of the [`RestClient`](ember_core::RestClient)
//! boundary defined in `ember-core`.
//!
//! ## Features
//!
//! - `http-client` (default): [`HttpRestClient`], built on `reqwest`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  ember-client       │  (managers issue requests)
//! ├─────────────────────┤
//! │  ember-core         │  (RestClient trait)
//! ├─────────────────────┤
//! │  ember-transport    │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (HTTP)     │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use ember_transport::{HttpRestClient, HttpRestConfig};
//!
//! let rest = HttpRestClient::new(HttpRestConfig {
//!     api_root: "https://discord.com/api/v9".into(),
//!     token: Some(token),
//!     timeout: Duration::from_secs(15),
//! })?;
//! let me = rest.request(Method::Get, "/users/@me", RequestOptions::new()).await?;
//! ```

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "http-client")]
pub use http::{HttpRestClient, HttpRestConfig};
