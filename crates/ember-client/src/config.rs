//! Client options.
//!
//! Loaded as the `client` section of the runtime configuration file.
//!
//! # Example Configuration
//!
//! ```yaml
//! client:
//!   token: ${EMBER_TOKEN}
//!   api_version: 9
//!   request_timeout_ms: 15000
//!   # Keep at most 200 messages per channel
//!   message_cache_max_size: 200
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Options shared by every manager of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// REST API root, without the version segment.
    pub api_url: String,

    /// REST API version.
    pub api_version: u8,

    /// CDN root used for asset URLs.
    pub cdn_url: String,

    /// Bot token sent with every request.
    pub token: Option<String>,

    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Buffered notifications per subscriber.
    pub event_capacity: usize,

    /// Maximum cached messages per channel (unbounded when unset).
    pub message_cache_max_size: Option<usize>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: "https://discord.com/api".to_string(),
            api_version: 9,
            cdn_url: "https://cdn.discordapp.com".to_string(),
            token: None,
            request_timeout_ms: 15_000,
            event_capacity: 256,
            message_cache_max_size: None,
        }
    }
}

impl ClientOptions {
    /// Versioned API root, e.g. `https://discord.com/api/v9`.
    pub fn api_root(&self) -> String {
        format!("{}/v{}", self.api_url.trim_end_matches('/'), self.api_version)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ClientOptions::default();
        assert_eq!(options.api_root(), "https://discord.com/api/v9");
        assert_eq!(options.request_timeout(), Duration::from_secs(15));
        assert_eq!(options.message_cache_max_size, None);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = r#"
token: abc
api_version: 10
message_cache_max_size: 50
"#;
        let options: ClientOptions = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(options.token.as_deref(), Some("abc"));
        assert_eq!(options.api_root(), "https://discord.com/api/v10");
        assert_eq!(options.message_cache_max_size, Some(50));
        assert_eq!(options.cdn_url, "https://cdn.discordapp.com");
        assert_eq!(options.event_capacity, 256);
    }
}
