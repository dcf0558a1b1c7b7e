//! HTTP transport.

mod client;
pub use client::{HttpRestClient, HttpRestConfig};
