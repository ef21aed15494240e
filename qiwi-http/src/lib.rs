#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `reqwest` transport for the QIWI wallet API client.
//!
//! Plugs a [`reqwest::Client`] into [`qiwi::RequestExecutor`] and wires the
//! optional proxy from [`qiwi::ClientConfig`].
//!
//! # Modules
//!
//! - [`client`] - [`HttpApi`] alias and constructors
//! - [`error`] - Client construction errors
//! - [`transport`] - [`ReqwestTransport`], the [`qiwi::Transport`] implementation
//!
//! # Example
//!
//! ```no_run
//! use qiwi::{ClientConfig, Headers};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let api = qiwi_http::build_client(ClientConfig::edge().bearer("token"))?;
//! let _profile = api
//!     .get("/person-profile/v1/profile/current", &Headers::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod transport;

pub use client::{HttpApi, build_client, from_env};
pub use error::HttpError;
pub use transport::ReqwestTransport;
