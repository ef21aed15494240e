//! Error types for building the HTTP client.

use qiwi::config::ConfigError;

/// Errors that can occur while constructing an [`HttpApi`](crate::HttpApi).
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The configured proxy URL was rejected.
    #[error("invalid proxy {proxy:?}: {source}")]
    InvalidProxy {
        /// The proxy URL as configured.
        proxy: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The reqwest client could not be built.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Configuration could not be loaded from the environment.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
