//! Foundation layer - identifiers, payload access and the entity contract.

pub mod entity;
pub mod payload;
pub mod snowflake;

pub use entity::{Cached, Entity, Resolvable, Timestamped};
pub use payload::Payload;
pub use snowflake::{EPOCH, Snowflake};
