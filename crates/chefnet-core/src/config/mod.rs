//! Client configuration.
//!
//! A `ClientConfig` is built once (from the environment, CLI flags, or code)
//! and handed to [`crate::Context`]. Nothing in the crate reads configuration
//! from global state.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Default freshness window for cached resources.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub const ENV_API_URL: &str = "CHEFNET_API_URL";
pub const ENV_API_TOKEN: &str = "CHEFNET_API_TOKEN";
pub const ENV_OFFLINE: &str = "CHEFNET_OFFLINE";
pub const ENV_CACHE_TTL_SECS: &str = "CHEFNET_CACHE_TTL_SECS";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "CHEFNET_HTTP_TIMEOUT_SECS";

/// Runtime configuration for the data layer.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash
    pub api_base_url: Option<String>,
    /// Bearer token attached to backend requests
    pub auth_token: Option<String>,
    /// When false every component runs in local-only mode
    pub use_backend: bool,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            auth_token: None,
            use_backend: true,
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("use_backend", &self.use_backend)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Local-only configuration; remote calls are never attempted.
    pub fn offline() -> Self {
        Self {
            use_backend: false,
            ..Self::default()
        }
    }

    /// Set and validate the backend base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Result<Self> {
        self.api_base_url = Some(normalize_base_url(url.into())?);
        Ok(self)
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = normalize_text_option(token);
        self
    }

    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Whether the backend is enabled and has an address.
    pub const fn remote_configured(&self) -> bool {
        self.use_backend && self.api_base_url.is_some()
    }

    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = normalize_text_option(lookup(ENV_API_URL)) {
            config.api_base_url = Some(normalize_base_url(url)?);
        }
        config.auth_token = normalize_text_option(lookup(ENV_API_TOKEN));

        if let Some(value) = normalize_text_option(lookup(ENV_OFFLINE)) {
            config.use_backend = !parse_flag(&value);
        }
        if let Some(secs) = parse_secs(lookup(ENV_CACHE_TTL_SECS), ENV_CACHE_TTL_SECS)? {
            config.cache_ttl = secs;
        }
        if let Some(secs) = parse_secs(lookup(ENV_HTTP_TIMEOUT_SECS), ENV_HTTP_TIMEOUT_SECS)? {
            config.request_timeout = secs;
        }

        Ok(config)
    }
}

/// Validate a backend base URL and strip its trailing slash.
pub fn normalize_base_url(raw: String) -> Result<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("API base URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_secs(value: Option<String>, name: &str) -> Result<Option<Duration>> {
    let Some(value) = normalize_text_option(value) else {
        return Ok(None);
    };
    value
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| Error::Config(format!("{name} must be a whole number of seconds")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_uses_five_minute_ttl() {
        let config = ClientConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_millis(300_000));
        assert!(config.use_backend);
        assert!(!config.remote_configured());
    }

    #[test]
    fn from_lookup_reads_all_values() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, " https://api.chefnet.app/ "),
            (ENV_API_TOKEN, "secret"),
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_HTTP_TIMEOUT_SECS, "3"),
        ]))
        .unwrap();

        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://api.chefnet.app")
        );
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(config.remote_configured());
    }

    #[test]
    fn offline_flag_disables_backend() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://api.chefnet.app"),
            (ENV_OFFLINE, "yes"),
        ]))
        .unwrap();
        assert!(!config.remote_configured());
    }

    #[test]
    fn rejects_url_without_scheme() {
        let error =
            ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "api.chefnet.app")])).unwrap_err();
        assert!(error.to_string().contains("http:// or https://"));
    }

    #[test]
    fn rejects_non_numeric_ttl() {
        let error =
            ClientConfig::from_lookup(lookup(&[(ENV_CACHE_TTL_SECS, "soon")])).unwrap_err();
        assert!(error.to_string().contains(ENV_CACHE_TTL_SECS));
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig::default().with_auth_token(Some("secret".to_string()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
