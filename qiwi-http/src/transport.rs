//! [`qiwi::Transport`] implementation backed by [`reqwest`].
//!
//! The transport only moves bytes: it sends the method, headers and body it
//! is given and returns status, headers and the full body. It sets no
//! client-level timeout because the executor owns the call deadline;
//! dropping the in-flight future aborts the request.

use qiwi::error::TransportError;
use qiwi::transport::{BoxFuture, Transport, TransportRequest, TransportResponse};
use qiwi::ClientConfig;
use reqwest::{Client, Proxy};

use crate::error::HttpError;

/// Sends wallet API requests with a shared [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a transport for `config`, routing through its proxy if set.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::InvalidProxy`] if the proxy URL is rejected, or
    /// [`HttpError::ClientBuild`] if the client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, HttpError> {
        let mut builder = Client::builder();
        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy.as_str()).map_err(|source| HttpError::InvalidProxy {
                proxy: proxy.clone(),
                source,
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build().map_err(HttpError::ClientBuild)?;
        Ok(Self { client })
    }

    /// Wraps a pre-configured reqwest client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns the underlying reqwest client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        let TransportRequest {
            url,
            method,
            headers,
            body,
        } = request;
        Box::pin(async move {
            let mut req = self.client.request(method.into(), url.as_str()).headers(headers);
            if let Some(body) = body {
                req = req.body(body);
            }
            let response = req.send().await?;

            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            #[cfg(feature = "telemetry")]
            tracing::debug!(%method, %url, status, bytes = body.len(), "qiwi.transport.response");

            Ok::<_, TransportError>(TransportResponse {
                status,
                headers,
                body,
            })
        })
    }
}
