//! Ready-to-use wallet API client over `reqwest`.

use qiwi::{ClientConfig, RequestExecutor};

use crate::error::HttpError;
use crate::transport::ReqwestTransport;

/// A [`RequestExecutor`] that sends requests with `reqwest`.
pub type HttpApi = RequestExecutor<ReqwestTransport>;

/// Builds an [`HttpApi`] for `config`.
///
/// # Errors
///
/// Returns [`HttpError`] if the proxy URL is invalid or the client cannot be
/// built.
pub fn build_client(config: ClientConfig) -> Result<HttpApi, HttpError> {
    let transport = ReqwestTransport::new(&config)?;
    Ok(RequestExecutor::new(config, transport))
}

/// Builds an [`HttpApi`] from `QIWI_*` environment variables.
///
/// See [`ClientConfig::from_env`] for the variables read.
///
/// # Errors
///
/// Returns [`HttpError`] if the environment holds invalid values or the
/// client cannot be built.
pub fn from_env() -> Result<HttpApi, HttpError> {
    build_client(ClientConfig::from_env()?)
}
