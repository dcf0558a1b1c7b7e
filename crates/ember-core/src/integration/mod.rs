//! Integration layer - interfaces to the outside world.
//!
//! - REST transport boundary ([`RestClient`])
//! - Listener registry for notifications ([`Emitter`])

pub mod events;
pub mod rest;

pub use events::{Emitter, MAX_EMITTER_CAPACITY};
pub use rest::{DisabledRestClient, FileAttachment, Method, RequestOptions, RestClient};
