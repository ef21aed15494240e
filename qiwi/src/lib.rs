#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core request execution for the QIWI wallet REST API.
//!
//! Every wallet endpoint (profile, identification, payment history, limits,
//! cards, P2P keys) is a thin caller of [`RequestExecutor`]: it supplies a
//! relative path, a method and an optional body, and interprets the
//! [`Decoded`] value it gets back. This crate owns that shared path and is
//! independent of any particular HTTP client; see the `qiwi-http` crate for
//! the `reqwest` transport.
//!
//! # Modules
//!
//! - [`config`] - Static client configuration ([`ClientConfig`])
//! - [`decode`] - Content-type driven response decoding
//! - [`endpoint`] - Absolute URL resolution
//! - [`error`] - Status, decoding, timeout and transport errors
//! - [`executor`] - The [`RequestExecutor`] and its verb wrappers
//! - [`method`] - Supported HTTP methods
//! - [`transport`] - The [`Transport`] seam
//!
//! # Feature Flags
//!
//! - `telemetry` - Wraps each call in a `tracing` span and records its outcome

pub mod config;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod method;
pub mod transport;

pub use config::{ClientConfig, Headers};
pub use decode::Decoded;
pub use error::{ApiError, DecodingError, StatusError};
pub use executor::RequestExecutor;
pub use method::Method;
pub use transport::{Transport, TransportRequest, TransportResponse};
