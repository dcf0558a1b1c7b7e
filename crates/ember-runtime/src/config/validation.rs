//! Configuration validation utilities.

use ember_client::ClientOptions;
use ember_core::MAX_EMITTER_CAPACITY;

use super::error::{ConfigError, ConfigResult};
use super::schema::{EmberConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &EmberConfig) -> ConfigResult<()> {
    validate_client_options(&config.client)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_client_options(options: &ClientOptions) -> ConfigResult<()> {
    validate_url(&options.api_url)?;
    validate_url(&options.cdn_url)?;

    if options.api_version == 0 {
        return Err(ConfigError::validation("API version must be greater than 0"));
    }

    if options.request_timeout_ms == 0 {
        return Err(ConfigError::validation("Request timeout must be greater than 0"));
    }

    if options.event_capacity == 0 || options.event_capacity > MAX_EMITTER_CAPACITY {
        return Err(ConfigError::validation(format!(
            "Event capacity must be between 1 and {MAX_EMITTER_CAPACITY}"
        )));
    }

    if options.token.as_deref().is_some_and(|token| token.trim().is_empty()) {
        return Err(ConfigError::validation("Token must not be blank"));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == Some(0) {
        return Err(ConfigError::validation("max_files must be greater than 0"));
    }

    if let Some(module) = logging
        .filters
        .keys()
        .find(|module| module.is_empty() || module.contains(char::is_whitespace))
    {
        return Err(ConfigError::validation(format!(
            "Invalid log filter target: {module:?}"
        )));
    }

    Ok(())
}

/// Validates an HTTP(S) URL.
fn validate_url(url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::missing_field("url"));
    }

    let valid_schemes = ["http://", "https://"];
    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&EmberConfig::default()).is_ok());
    }

    #[test]
    fn rejects_non_http_urls() {
        let mut config = EmberConfig::default();
        config.client.cdn_url = "ftp://cdn.example.com".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));

        config.client.cdn_url = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_bounds() {
        let mut config = EmberConfig::default();
        config.client.event_capacity = 0;
        assert!(validate_config(&config).is_err());

        let mut config = EmberConfig::default();
        config.client.event_capacity = MAX_EMITTER_CAPACITY + 1;
        assert!(validate_config(&config).is_err());
        config.client.event_capacity = MAX_EMITTER_CAPACITY;
        assert!(validate_config(&config).is_ok());

        let mut config = EmberConfig::default();
        config.client.request_timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = EmberConfig::default();
        config.client.api_version = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_message_cache_is_allowed() {
        let mut config = EmberConfig::default();
        config.client.message_cache_max_size = Some(0);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn file_output_needs_a_path() {
        let mut config = EmberConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "logging.file_path"
        ));

        config.logging.file_path = Some(PathBuf::from("ember.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_blank_token_and_filter_targets() {
        let mut config = EmberConfig::default();
        config.client.token = Some("  ".to_string());
        assert!(validate_config(&config).is_err());

        let mut config = EmberConfig::default();
        config
            .logging
            .filters
            .insert("ember client".to_string(), Default::default());
        assert!(validate_config(&config).is_err());
    }
}
