//! Static client configuration.
//!
//! A [`ClientConfig`] is fixed once it is handed to a
//! [`RequestExecutor`](crate::executor::RequestExecutor); every call reads it
//! and none mutates it.
//!
//! # Environment Variables
//!
//! [`ClientConfig::from_env`] reads:
//!
//! - `QIWI_API_URL` - base URL (default: [`EDGE_API_URL`])
//! - `QIWI_API_TOKEN` - bearer token installed as default headers
//! - `QIWI_TIMEOUT_MS` - request timeout in milliseconds (default: `10000`)
//! - `QIWI_PROXY` - proxy URL for the HTTP transport

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::decode::APPLICATION_JSON;

/// Base URL of the wallet ("edge") API.
pub const EDGE_API_URL: &str = "https://edge.qiwi.com";

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header mapping used for default and per-call headers.
pub type Headers = BTreeMap<String, String>;

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape.
    #[error("invalid value for {name}: {source}")]
    InvalidNumber {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Configuration shared by every call made through one client.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use qiwi::config::ClientConfig;
///
/// let config = ClientConfig::new("https://edge.qiwi.com")
///     .bearer("token")
///     .with_timeout(Duration::from_secs(5))
///     .with_accepted_status_codes([200, 201]);
/// assert!(config.accepts(201));
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL relative paths are resolved against.
    #[serde(default)]
    pub base_url: String,

    /// Headers sent with every call. Per-call headers win on collision.
    #[serde(default)]
    pub headers: Headers,

    /// Deadline for a single call, serialized as milliseconds.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(rename = "timeoutMs", default = "default_timeout")]
    pub timeout: Duration,

    /// Status codes treated as success.
    #[serde(default = "default_accepted_status_codes")]
    pub accepted_status_codes: BTreeSet<u16>,

    /// Optional proxy URL for the transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

const fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_accepted_status_codes() -> BTreeSet<u16> {
    BTreeSet::from([200])
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            headers: Headers::new(),
            timeout: DEFAULT_TIMEOUT,
            accepted_status_codes: default_accepted_status_codes(),
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Creates a config with the given base URL and default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Creates a config for the wallet API at [`EDGE_API_URL`].
    #[must_use]
    pub fn edge() -> Self {
        Self::new(EDGE_API_URL)
    }

    /// Loads configuration from `QIWI_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `QIWI_TIMEOUT_MS` is not an integer.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = lookup("QIWI_API_URL").map_or_else(Self::edge, Self::new);
        if let Some(token) = lookup("QIWI_API_TOKEN") {
            config = config.bearer(&token);
        }
        if let Some(raw) = lookup("QIWI_TIMEOUT_MS") {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidNumber {
                    name: "QIWI_TIMEOUT_MS",
                    source,
                })?;
            config.timeout = Duration::from_millis(millis);
        }
        config.proxy = lookup("QIWI_PROXY").filter(|proxy| !proxy.is_empty());
        Ok(config)
    }

    /// Adds or replaces a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Installs the static headers the wallet API expects for a bearer token:
    /// `Accept` and `Content-Type` set to JSON plus `Authorization`.
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        self.with_header("Accept", APPLICATION_JSON)
            .with_header("Content-Type", APPLICATION_JSON)
            .with_header("Authorization", format!("Bearer {token}"))
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the set of accepted status codes.
    #[must_use]
    pub fn with_accepted_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.accepted_status_codes = codes.into_iter().collect();
        self
    }

    /// Routes calls through the given proxy URL.
    #[must_use]
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Returns `true` if `status` counts as success.
    #[must_use]
    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_status_codes.contains(&status)
    }
}
