//! Storefront client for an OAuth2-secured payment REST API.
//!
//! This crate is the API-facing core of a merchant storefront: a small,
//! reusable REST client that accumulates a request through a fluent
//! interface, executes it asynchronously, and translates the outcome into
//! either a typed result or a sanitized, user-presentable error. Page
//! rendering, routing and the OAuth2 token flows live outside this crate;
//! they obtain a bearer token externally and hand it to the client.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use storefront_client::{ApiClient, Method};
//!
//! #[derive(Deserialize)]
//! struct PaymentStatus {
//!     reference: String,
//!     status: String,
//! }
//!
//! # async fn example() -> storefront_client::Result<()> {
//! let mut client = ApiClient::new("https://api.example.com/v1")?;
//! client.set_bearer_token("token-from-external-oauth-flow");
//!
//! // One logical call: init, accumulate, execute.
//! let status: PaymentStatus = client
//!     .init("payments/pp-123/status", "poll payment for complete page")
//!     .execute()
//!     .await?;
//!
//! // The same instance is reused for the next call; init wipes all
//! // per-call state, the bearer token stays.
//! let created: PaymentStatus = client
//!     .init("payments", "create anticipated payment")
//!     .set_method(Method::Post)
//!     .add_param("merchant", 21)
//!     .add_param("amount", "99.95")
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Error surface
//!
//! Every failure reaches the caller as a [`UserError`]: a human-readable
//! message plus an [`ErrorKind`], and nothing else. Status codes, reason
//! phrases and raw response bodies are routed to the injected
//! [`DiagnosticSink`] instead, so developer detail is never one `to_string`
//! away from an end user's screen. See [`error`] for the taxonomy and
//! [`diagnostics`] for the event model.
//!
//! # Module organization
//!
//! - [`client`]: the [`ApiClient`] itself — fluent accumulation, bearer
//!   token handling, asynchronous execution, error translation.
//! - [`request`]: per-call accumulator and pure request building.
//! - [`response`]: raw response capture and the service's error body shape.
//! - [`diagnostics`]: correlation contexts, events, and sink
//!   implementations.
//! - [`config`]: typed storefront settings with per-field defaults.
//! - [`error`]: the sanitized error surface.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod request;
pub mod response;

pub use client::ApiClient;
pub use config::{OAuthConfig, StorefrontConfig};
pub use diagnostics::{ApiEvent, CallContext, DiagnosticSink, NullSink, TracingSink};
pub use error::{ErrorKind, Result, UserError};
pub use request::{BuiltRequest, Method, RequestBody, RequestDetails};
pub use response::{ErrorResponse, ResponseDetails};
