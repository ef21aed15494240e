//! The outbound seam between the executor and an HTTP implementation.
//!
//! A [`Transport`] issues exactly one request and reports the raw status,
//! headers and body. It never interprets the response. Cancellation is
//! cooperative: the executor drops the returned future when its deadline
//! elapses, and implementations must abort the in-flight request on drop.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;

use crate::error::TransportError;
use crate::method::Method;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A fully resolved request handed to a [`Transport`].
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Absolute request URL.
    pub url: String,
    /// Request method.
    pub method: Method,
    /// Merged default and per-call headers.
    pub headers: HeaderMap,
    /// Optional raw body.
    pub body: Option<String>,
}

/// The raw outcome of a request.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    /// Numeric status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Full response body.
    pub body: Bytes,
}

impl TransportResponse {
    /// Returns the media type of the `Content-Type` header, if present.
    ///
    /// Parameters after `;` are dropped before the value is read as UTF-8,
    /// so opaque bytes in a parameter do not hide the media type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        let raw = self.headers.get(CONTENT_TYPE)?.as_bytes();
        let essence = raw.split(|&b| b == b';').next().unwrap_or(raw);
        std::str::from_utf8(essence).ok().map(str::trim)
    }
}

/// Issues HTTP requests on behalf of a
/// [`RequestExecutor`](crate::executor::RequestExecutor).
pub trait Transport: Send + Sync {
    /// Sends `request` and resolves with the raw response.
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        (**self).send(request)
    }
}
