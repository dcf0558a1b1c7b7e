//! # Ember Core
//!
//! The entity cache and reconciliation engine of the Ember chat SDK.
//!
//! ## Architecture Layers
//!
//! ### Foundation Layer
//!
//! - **Identifiers**: time-ordered [`Snowflake`] keys
//! - **Payload access**: partial-merge helpers in [`payload`]
//! - **Entity contract**: construct / patch / clone / equals ([`Entity`]) and
//!   shared live handles ([`Cached`])
//!
//! ### Store Layer
//!
//! - **Cache**: ordered key → handle map ([`Cache`])
//! - **Manager**: payload → cached entity ([`EntityManager`])
//!
//! ### Action Layer
//!
//! Create / update / delete reconciliation of inbound payloads ([`action`]).
//!
//! ### Integration Layer
//!
//! - **REST boundary**: [`RestClient`]
//! - **Listener registry**: [`Emitter`]
//!
//! ## Data flow
//!
//! ```text
//! ┌─────────┐     ┌────────┐     ┌───────────────┐     ┌──────────────┐
//! │ payload │────▶│ action │────▶│ EntityManager │────▶│ Entity.patch │
//! └─────────┘     └────────┘     └───────────────┘     └──────────────┘
//!                     │
//!                     └────────▶ Emitter (snapshots)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use ember_core::{EntityManager, Snowflake};
//! use serde_json::json;
//!
//! let users = EntityManager::<User>::new(());
//! let a = users.add(&json!({ "id": "1", "username": "a" }))?;
//! let b = users.add(&json!({ "id": "1", "username": "b" }))?;
//! assert!(a.ptr_eq(&b));
//! ```

pub mod action;
pub mod error;
pub mod foundation;
pub mod integration;
pub mod store;

pub use foundation::{Cached, EPOCH, Entity, Payload, Resolvable, Snowflake, Timestamped, payload};

pub use error::{ApiError, ApiResult, CoreError, CoreResult};

pub use store::{Cache, EntityManager};

pub use action::{Created, Updated};

pub use integration::{
    DisabledRestClient, Emitter, FileAttachment, MAX_EMITTER_CAPACITY, Method, RequestOptions,
    RestClient,
};

/// Prelude for common imports.
pub mod prelude {
    pub use super::error::{CoreError, CoreResult};
    pub use super::foundation::*;
    pub use super::integration::{Method, RequestOptions, RestClient};
    pub use super::store::EntityManager;
}
