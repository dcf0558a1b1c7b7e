//! Ember Runtime - configuration, logging and the gateway dispatch loop.
//!
//! This crate provides:
//! - Layered configuration (`EmberConfig`, `ConfigLoader`)
//! - Logging setup (`LoggingBuilder`, `init_from_config`)
//! - The dispatch loop (`EmberRuntime`) that applies gateway frames to a client
//!
//! ```rust,ignore
//! use ember_runtime::EmberRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Loads ember.toml, EMBER_* variables, sets up logging and HTTP
//!     let runtime = EmberRuntime::new()?;
//!     let mut events = runtime.subscribe();
//!
//!     let (frames, receiver) = tokio::sync::mpsc::channel(1024);
//!     tokio::spawn(my_gateway(frames));
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             tracing::info!(event = event.event_name(), "cache changed");
//!         }
//!     });
//!
//!     // Run until Ctrl+C
//!     runtime.run(receiver).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `http-client` (default): build the reqwest transport from configuration
//! - `toml-config` (default) / `yaml-config`: configuration file formats
//! - `json-log`: JSON log lines

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, EmberConfig, LoggingConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents, init_from_config};
pub use runtime::{EmberRuntime, RuntimeBuilder, RuntimeStats, StopReason};

pub use tracing;
pub use tracing_subscriber;

/// Logging macros for applications built on the runtime.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
