//! The request executor: one HTTP call in, one decoded value or typed error out.
//!
//! [`RequestExecutor::request`] resolves the URL, merges headers, sends the
//! request through a [`Transport`] under a deadline, checks the status
//! against the accepted set and decodes the body by content-type. Each call
//! is independent; the executor holds only immutable configuration and can
//! be cloned and shared across tasks freely.
//!
//! The deadline is a [`tokio::time::timeout`] scoped to the call, so calls
//! must run inside a Tokio runtime with the time driver enabled.

use std::fmt::Display;
use std::sync::Arc;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;

use crate::config::{ClientConfig, Headers};
use crate::decode::{Decoded, decode_body};
use crate::endpoint;
use crate::error::{ApiError, StatusError};
use crate::method::Method;
use crate::transport::{Transport, TransportRequest};

#[cfg(feature = "telemetry")]
use tracing::{Span, instrument};

/// Executes API calls against a configured base URL.
///
/// # Example
///
/// ```rust,no_run
/// use qiwi::{Headers, RequestExecutor, Transport};
///
/// async fn profile<T: Transport>(
///     api: &RequestExecutor<T>,
/// ) -> Result<serde_json::Value, qiwi::ApiError> {
///     api.get_json("/person-profile/v1/profile/current", &Headers::new())
///         .await
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequestExecutor<T> {
    config: Arc<ClientConfig>,
    transport: T,
}

impl<T> RequestExecutor<T> {
    /// Creates an executor that sends requests through `transport`.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Returns the configuration shared by every call.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolves `url` against the configured base URL.
    #[must_use]
    pub fn resolve_url(&self, url: &str) -> String {
        endpoint::resolve(&self.config.base_url, url)
    }

    /// Merges the default headers with `headers`; per-call values win.
    ///
    /// Header names compare case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidHeader`] if a name or value is not valid HTTP.
    pub fn merge_headers(&self, headers: &Headers) -> Result<HeaderMap, ApiError> {
        let mut merged = HeaderMap::with_capacity(self.config.headers.len() + headers.len());
        for (name, value) in self.config.headers.iter().chain(headers) {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid_header(name, e))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid_header(name, e))?;
            merged.insert(header_name, header_value);
        }
        Ok(merged)
    }
}

fn invalid_header(name: &str, reason: impl Display) -> ApiError {
    ApiError::InvalidHeader {
        name: name.to_owned(),
        reason: reason.to_string(),
    }
}

impl<T: Transport> RequestExecutor<T> {
    /// Performs one call and decodes its response.
    ///
    /// HEAD calls resolve with [`Decoded::Empty`] once the status check passes.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Status`] if the status is not accepted (body kept verbatim)
    /// - [`ApiError::Decoding`] if a JSON or form body is malformed
    /// - [`ApiError::Timeout`] if the configured deadline elapses first
    /// - [`ApiError::Transport`] if the transport fails
    /// - [`ApiError::InvalidHeader`] if a header cannot be encoded
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "qiwi.request",
            skip_all,
            fields(
                method = %method,
                url = %url,
                otel.status_code = tracing::field::Empty,
                error.message = tracing::field::Empty,
            )
        )
    )]
    pub async fn request(
        &self,
        url: &str,
        method: Method,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Decoded, ApiError> {
        let result = self.execute(url, method, headers, body).await;
        record_result_on_span(&result);
        result
    }

    async fn execute(
        &self,
        url: &str,
        method: Method,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Decoded, ApiError> {
        let request = TransportRequest {
            url: self.resolve_url(url),
            method,
            headers: self.merge_headers(headers)?,
            body,
        };

        let timeout = self.config.timeout;
        let response = tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|_| ApiError::Timeout(timeout))?
            .map_err(ApiError::Transport)?;

        if !self.config.accepts(response.status) {
            let body = String::from_utf8_lossy(&response.body).into_owned();
            return Err(StatusError::new(response.status, body).into());
        }
        if method.is_head() {
            return Ok(Decoded::Empty);
        }

        Ok(decode_body(response.content_type(), response.body.clone())?)
    }

    /// Sends a `GET` request.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`].
    pub async fn get(&self, url: &str, headers: &Headers) -> Result<Decoded, ApiError> {
        self.request(url, Method::Get, headers, None).await
    }

    /// Sends a `HEAD` request.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`].
    pub async fn head(&self, url: &str, headers: &Headers) -> Result<Decoded, ApiError> {
        self.request(url, Method::Head, headers, None).await
    }

    /// Sends a `POST` request.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`].
    pub async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Decoded, ApiError> {
        self.request(url, Method::Post, headers, body).await
    }

    /// Sends a `PUT` request.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`].
    pub async fn put(
        &self,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Decoded, ApiError> {
        self.request(url, Method::Put, headers, body).await
    }

    /// Sends a `PATCH` request.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`].
    pub async fn patch(
        &self,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Decoded, ApiError> {
        self.request(url, Method::Patch, headers, body).await
    }

    /// Sends a `DELETE` request.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`].
    pub async fn delete(
        &self,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<Decoded, ApiError> {
        self.request(url, Method::Delete, headers, body).await
    }

    /// Sends a `GET` request and deserializes the JSON response into `R`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::request`]; a non-JSON body or a shape mismatch
    /// is an [`ApiError::Decoding`].
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        headers: &Headers,
    ) -> Result<R, ApiError> {
        Ok(self.get(url, headers).await?.json()?)
    }

    /// Sends a `POST` request and deserializes the JSON response into `R`.
    ///
    /// # Errors
    ///
    /// See [`RequestExecutor::get_json`].
    pub async fn post_json<R: DeserializeOwned>(
        &self,
        url: &str,
        headers: &Headers,
        body: Option<String>,
    ) -> Result<R, ApiError> {
        Ok(self.post(url, headers, body).await?.json()?)
    }
}

/// Records the outcome of a call on the current span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "QIWI API request failed");
        }
    }
}

/// Noop if telemetry feature is off.
#[cfg(not(feature = "telemetry"))]
fn record_result_on_span<R, E: Display>(_result: &Result<R, E>) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::APPLICATION_JSON;
    use crate::error::TransportError;
    use crate::transport::{BoxFuture, TransportResponse};
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use serde::Deserialize;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers every request with a fixed response and remembers what it saw.
    #[derive(Debug, Default)]
    struct StubTransport {
        response: TransportResponse,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl StubTransport {
        fn new(status: u16, content_type: Option<&'static str>, body: &'static str) -> Self {
            let mut headers = HeaderMap::new();
            if let Some(content_type) = content_type {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            Self {
                response: TransportResponse {
                    status,
                    headers,
                    body: Bytes::from_static(body.as_bytes()),
                },
                seen: Mutex::default(),
            }
        }

        fn last(&self) -> TransportRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Transport for StubTransport {
        fn send(
            &self,
            request: TransportRequest,
        ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
            self.seen.lock().unwrap().push(request);
            let response = self.response.clone();
            Box::pin(async move { Ok(response) })
        }
    }

    /// Never answers; flags when its in-flight future is dropped.
    #[derive(Debug, Default)]
    struct HangingTransport {
        started: AtomicUsize,
        dropped: Arc<AtomicBool>,
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    impl Transport for HangingTransport {
        fn send(
            &self,
            _request: TransportRequest,
        ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let flag = DropFlag(Arc::clone(&self.dropped));
            Box::pin(async move {
                let _flag = flag;
                std::future::pending::<()>().await;
                Ok(TransportResponse::default())
            })
        }
    }

    /// Answers after a delay.
    struct SlowTransport(Duration);

    impl Transport for SlowTransport {
        fn send(
            &self,
            _request: TransportRequest,
        ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
            let delay = self.0;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(TransportResponse {
                    status: 200,
                    headers: HeaderMap::new(),
                    body: Bytes::from_static(b"late"),
                })
            })
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send(
            &self,
            _request: TransportRequest,
        ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
            Box::pin(async {
                let err: TransportError = Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                ));
                Err(err)
            })
        }
    }

    fn executor<T>(transport: T) -> RequestExecutor<T> {
        RequestExecutor::new(ClientConfig::new("https://edge.qiwi.com/"), transport)
    }

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[tokio::test]
    async fn test_relative_url_and_body_are_forwarded() {
        let api = executor(StubTransport::new(200, Some("text/plain"), "ok"));
        let decoded = api
            .post("/sinap/api/v2/terms/99/payments", &Headers::new(), Some("{}".to_owned()))
            .await
            .unwrap();
        assert_eq!(decoded, Decoded::Text("ok".to_owned()));

        let sent = api.transport().last();
        assert_eq!(sent.url, "https://edge.qiwi.com/sinap/api/v2/terms/99/payments");
        assert_eq!(sent.method, Method::Post);
        assert_eq!(sent.body.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_absolute_url_is_not_rebased() {
        let api = executor(StubTransport::new(200, None, ""));
        api.get("https://api.qiwi.com/partner/bill/v1/bills/1", &Headers::new())
            .await
            .unwrap();
        assert_eq!(api.transport().last().url, "https://api.qiwi.com/partner/bill/v1/bills/1");
    }

    #[tokio::test]
    async fn test_call_headers_override_defaults() {
        let config = ClientConfig::new("https://edge.qiwi.com")
            .bearer("default-token")
            .with_header("X-Request-Source", "sdk");
        let api = RequestExecutor::new(config, StubTransport::new(200, None, ""));

        api.get(
            "person-profile/v1/profile/current",
            &headers(&[("authorization", "Bearer call-token"), ("X-Trace", "1")]),
        )
        .await
        .unwrap();

        let sent = api.transport().last().headers;
        assert_eq!(sent.get_all("Authorization").iter().count(), 1);
        assert_eq!(sent["authorization"], "Bearer call-token");
        assert_eq!(sent["x-request-source"], "sdk");
        assert_eq!(sent["x-trace"], "1");
        assert_eq!(sent["accept"], APPLICATION_JSON);
    }

    #[tokio::test]
    async fn test_invalid_header_is_rejected_before_sending() {
        let api = executor(StubTransport::new(200, None, ""));
        let err = api
            .get("x", &headers(&[("X-Bad", "line\nbreak")]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidHeader { ref name, .. } if name == "X-Bad"));
        assert_eq!(api.transport().calls(), 0);
    }

    #[tokio::test]
    async fn test_status_error_keeps_raw_body() {
        let api = executor(StubTransport::new(404, Some(APPLICATION_JSON), "Not Found"));
        let err = api.get("missing", &Headers::new()).await.unwrap_err();
        match err {
            ApiError::Status(StatusError { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Not Found");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_with_accepted_status_is_decoding_error() {
        let api = executor(StubTransport::new(200, Some(APPLICATION_JSON), r#"{"a":"#));
        let err = api.get("x", &Headers::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Decoding(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_text_type_with_opaque_parameter_decodes_as_text() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_bytes(b"text/plain; name=\"caf\xe9\"").unwrap(),
        );
        let api = executor(StubTransport {
            response: TransportResponse {
                status: 200,
                headers,
                body: Bytes::from_static(b"hello"),
            },
            seen: Mutex::default(),
        });
        let decoded = api.get("x", &Headers::new()).await.unwrap();
        assert_eq!(decoded.text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_head_skips_decoding() {
        let api = executor(StubTransport::new(200, Some(APPLICATION_JSON), "{broken"));
        let decoded = api.head("x", &Headers::new()).await.unwrap();
        assert!(decoded.is_empty());
        assert_eq!(api.transport().last().method, Method::Head);
    }

    #[tokio::test]
    async fn test_head_still_checks_status() {
        let api = executor(StubTransport::new(503, None, "maintenance"));
        let err = api.head("x", &Headers::new()).await.unwrap_err();
        assert_eq!(err.code(), Some(503));
    }

    #[tokio::test]
    async fn test_custom_accepted_status_codes() {
        let config =
            ClientConfig::new("https://edge.qiwi.com").with_accepted_status_codes([200, 201]);
        let transport = StubTransport::new(201, Some(APPLICATION_JSON), "{\"id\":1}");
        let api = RequestExecutor::new(config, transport);
        let decoded = api.put("x", &Headers::new(), None).await.unwrap();
        assert_eq!(decoded, Decoded::Json(serde_json::json!({ "id": 1 })));

        let api = executor(StubTransport::new(201, Some(APPLICATION_JSON), "{\"id\":1}"));
        assert_eq!(api.put("x", &Headers::new(), None).await.unwrap_err().code(), Some(201));
    }

    #[tokio::test]
    async fn test_verb_wrappers_fix_the_method() {
        let api = executor(StubTransport::new(200, None, ""));
        api.patch("x", &Headers::new(), None).await.unwrap();
        assert_eq!(api.transport().last().method, Method::Patch);
        api.delete("x", &Headers::new(), Some("b".to_owned())).await.unwrap();
        let sent = api.transport().last();
        assert_eq!(sent.method, Method::Delete);
        assert_eq!(sent.body.as_deref(), Some("b"));
        api.get("x", &Headers::new()).await.unwrap();
        assert_eq!(api.transport().last().body, None);
    }

    #[tokio::test]
    async fn test_get_json_deserializes_shape() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Profile {
            contract_id: u64,
        }

        let api = executor(StubTransport::new(
            200,
            Some("application/json;charset=UTF-8"),
            r#"{"contractId":79123456789}"#,
        ));
        let profile: Profile = api.get_json("profile", &Headers::new()).await.unwrap();
        assert_eq!(profile.contract_id, 79_123_456_789);

        let err = api
            .post_json::<Vec<String>>("profile", &Headers::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decoding(_)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let api = executor(FailingTransport);
        let err = api.get("x", &Headers::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels_in_flight_request() {
        let config =
            ClientConfig::new("https://edge.qiwi.com").with_timeout(Duration::from_millis(10_000));
        let api = RequestExecutor::new(config, HangingTransport::default());

        let err = api.get("x", &Headers::new()).await.unwrap_err();
        match err {
            ApiError::Timeout(after) => assert_eq!(after, Duration::from_millis(10_000)),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert_eq!(api.transport().started.load(Ordering::SeqCst), 1);
        assert!(api.transport().dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_response_before_deadline_wins() {
        let config =
            ClientConfig::new("https://edge.qiwi.com").with_timeout(Duration::from_millis(100));
        let api = RequestExecutor::new(config, SlowTransport(Duration::from_millis(99)));
        let decoded = api.get("x", &Headers::new()).await.unwrap();
        assert_eq!(decoded.as_bytes(), Some(&b"late"[..]));
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_config() {
        let api = executor(Arc::new(StubTransport::new(200, Some("text/plain"), "pong")));
        let other = api.clone();
        let headers = Headers::new();
        let (a, b) = tokio::join!(api.get("a", &headers), other.get("b", &headers));
        assert_eq!(a.unwrap().text(), Some("pong"));
        assert_eq!(b.unwrap().text(), Some("pong"));
        assert_eq!(api.transport().calls(), 2);
    }
}
