//! The dispatch loop.
//!
//! The runtime owns one [`Client`] and feeds it gateway frames from an
//! `mpsc` channel. Frames are applied one at a time in arrival order; the
//! loop ends when the channel closes or a shutdown signal arrives.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use ember_runtime::EmberRuntime;
//!
//! let runtime = EmberRuntime::builder()
//!     .config_file("config/ember.toml")
//!     .profile("production")
//!     .build()?;
//!
//! let (frames, receiver) = tokio::sync::mpsc::channel(1024);
//! tokio::spawn(gateway_connection(frames));
//! runtime.run(receiver).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use ember_client::{Client, ClientEvent, GatewayDispatch};
use ember_core::RestClient;
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug_span, error, info, warn};

use crate::config::{ConfigLoader, EmberConfig};
use crate::error::RuntimeResult;
use crate::logging;

/// Reported when the dispatch loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeStats {
    /// Frames applied to the cache.
    pub dispatched: u64,
    pub stop_reason: StopReason,
}

/// Why the dispatch loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Every sender was dropped.
    ChannelClosed,
    /// A signal or the caller's shutdown future fired.
    Shutdown,
}

/// Runs a [`Client`] against a stream of gateway frames.
pub struct EmberRuntime {
    config: EmberConfig,
    client: Client,
}

impl EmberRuntime {
    /// Loads configuration from the current directory and the user config
    /// directory, then builds the runtime.
    #[cfg(feature = "http-client")]
    pub fn new() -> RuntimeResult<Self> {
        let config = ConfigLoader::new().load()?;
        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime backed by the HTTP transport.
    ///
    /// Initializes logging first, so transport setup is already logged.
    #[cfg(feature = "http-client")]
    pub fn from_config(config: &EmberConfig) -> RuntimeResult<Self> {
        use ember_transport::{HttpRestClient, HttpRestConfig};

        logging::init_from_config(&config.logging);
        let rest = HttpRestClient::new(HttpRestConfig {
            api_root: config.client.api_root(),
            token: config.client.token.clone(),
            timeout: config.client.request_timeout(),
        })?;
        Ok(Self::assemble(config, Arc::new(rest)))
    }

    /// Creates a runtime over a caller-supplied transport.
    pub fn with_rest(config: &EmberConfig, rest: Arc<dyn RestClient>) -> Self {
        logging::init_from_config(&config.logging);
        Self::assemble(config, rest)
    }

    /// Expects logging to be initialized already.
    fn assemble(config: &EmberConfig, rest: Arc<dyn RestClient>) -> Self {
        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            api_root = %config.client.api_root(),
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            client: Client::new(config.client.clone(), rest),
        }
    }

    pub fn config(&self) -> &EmberConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Subscribes to the client's notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.client.subscribe()
    }

    /// Runs until the channel closes or Ctrl+C / SIGTERM is received.
    pub async fn run(
        &self,
        frames: mpsc::Receiver<GatewayDispatch>,
    ) -> RuntimeResult<RuntimeStats> {
        info!("Ember runtime is now running. Press Ctrl+C to stop.");
        self.run_until(frames, wait_for_shutdown()).await
    }

    /// Runs until the channel closes or `shutdown` resolves.
    ///
    /// Frames still queued when `shutdown` resolves are not applied.
    pub async fn run_until<F>(
        &self,
        mut frames: mpsc::Receiver<GatewayDispatch>,
        shutdown: F,
    ) -> RuntimeResult<RuntimeStats>
    where
        F: Future<Output = ()>,
    {
        let mut dispatched = 0u64;
        tokio::pin!(shutdown);

        let reason = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break StopReason::Shutdown,
                frame = frames.recv() => {
                    let Some(frame) = frame else {
                        break StopReason::ChannelClosed;
                    };
                    let span = debug_span!("dispatch", event = %frame.t);
                    let _enter = span.enter();
                    self.client.dispatch(&frame);
                    dispatched += 1;
                }
            }
        };

        info!(?reason, dispatched, "Runtime stopped");
        Ok(RuntimeStats {
            dispatched,
            stop_reason: reason,
        })
    }
}

/// Waits for Ctrl+C or SIGTERM.
///
/// If no signal can be registered this never resolves, leaving the channel
/// as the only way to stop.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => Some(sigterm),
            Err(e) => {
                warn!(error = %e, "Failed to register SIGTERM handler");
                None
            }
        };
        let terminate = async {
            match sigterm.as_mut() {
                Some(sigterm) => {
                    sigterm.recv().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            result = signal::ctrl_c() => match result {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => {
                    error!(error = %e, "Failed to listen for Ctrl+C");
                    std::future::pending::<()>().await;
                }
            },
            _ = terminate => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Builder for creating an `EmberRuntime` with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    rest: Option<Arc<dyn RestClient>>,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            rest: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path. Without any, the current directory and the user
    /// config directory are searched.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: EmberConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `rest` instead of the built-in HTTP transport.
    pub fn rest(mut self, rest: Arc<dyn RestClient>) -> Self {
        self.rest = Some(rest);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> RuntimeResult<EmberRuntime> {
        let config = self.config_loader.load()?;
        match self.rest {
            Some(rest) => Ok(EmberRuntime::with_rest(&config, rest)),
            #[cfg(feature = "http-client")]
            None => EmberRuntime::from_config(&config),
            #[cfg(not(feature = "http-client"))]
            None => Err(crate::error::RuntimeError::NoTransport),
        }
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EmberRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmberRuntime")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::{DisabledRestClient, Snowflake};
    use serde_json::json;
    use std::time::Duration;

    fn runtime() -> EmberRuntime {
        EmberRuntime::with_rest(&EmberConfig::default(), Arc::new(DisabledRestClient))
    }

    fn frame(t: &str, d: serde_json::Value) -> GatewayDispatch {
        GatewayDispatch::new(t, d)
    }

    #[tokio::test]
    async fn applies_frames_in_order_until_closed() {
        let runtime = runtime();
        let mut events = runtime.subscribe();
        let (tx, rx) = mpsc::channel(8);

        tx.send(frame("GUILD_CREATE", json!({ "id": "1", "name": "home" })))
            .await
            .unwrap();
        tx.send(frame(
            "CHANNEL_CREATE",
            json!({ "id": "10", "type": 0, "guild_id": "1" }),
        ))
        .await
        .unwrap();
        tx.send(frame("CHANNEL_DELETE", json!({ "id": "10", "guild_id": "1" })))
            .await
            .unwrap();
        drop(tx);

        let stats = runtime
            .run_until(rx, std::future::pending())
            .await
            .unwrap();

        assert_eq!(stats.dispatched, 3);
        assert_eq!(stats.stop_reason, StopReason::ChannelClosed);
        let names: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .map(|event| event.event_name())
            .collect();
        assert_eq!(names, vec!["guild_create", "channel_create", "channel_delete"]);
        assert!(runtime.client().guilds().cache().contains(Snowflake::new(1)));
        assert!(!runtime.client().channels().cache().contains(Snowflake::new(10)));
    }

    #[tokio::test]
    async fn shutdown_future_stops_the_loop() {
        let runtime = runtime();
        let (tx, rx) = mpsc::channel::<GatewayDispatch>(1);

        let stats = runtime
            .run_until(rx, tokio::time::sleep(Duration::from_millis(10)))
            .await
            .unwrap();

        assert_eq!(stats.dispatched, 0);
        assert_eq!(stats.stop_reason, StopReason::Shutdown);
        drop(tx);
    }

    #[test]
    fn builder_uses_a_supplied_transport() {
        let runtime = EmberRuntime::builder()
            .search_path(std::env::temp_dir().join("ember-runtime-builder"))
            .without_env()
            .merge(EmberConfig {
                client: ember_client::ClientOptions {
                    message_cache_max_size: Some(5),
                    ..Default::default()
                },
                ..Default::default()
            })
            .rest(Arc::new(DisabledRestClient))
            .build()
            .unwrap();

        assert_eq!(runtime.config().client.message_cache_max_size, Some(5));
        assert_eq!(runtime.client().options().message_cache_max_size, Some(5));
    }
}
