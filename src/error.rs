//! Error types for the storefront API client.
//!
//! The client deliberately exposes a single, sanitized error surface:
//! [`UserError`]. Whatever goes wrong during a call — a connection failure, a
//! non-success status from the payment service, a body that does not match
//! the expected shape — the caller receives only a human-readable message
//! plus a coarse [`ErrorKind`] for programmatic classification. Status codes,
//! reason phrases and raw response bodies never appear on this surface; they
//! are delivered to the configured [`DiagnosticSink`](crate::DiagnosticSink)
//! instead, where developers can inspect them without any risk of the detail
//! leaking into end-user-facing UI.
//!
//! # Examples
//!
//! ```
//! use storefront_client::{ErrorKind, UserError};
//!
//! let err = UserError::new(ErrorKind::Api, "Not found");
//! assert_eq!(err.to_string(), "Not found");
//! assert_eq!(err.kind(), ErrorKind::Api);
//! ```

use thiserror::Error;

/// Result type alias for client operations.
///
/// All fallible functions in this crate return this type. Errors carry only
/// sanitized, user-presentable messages; see the module docs for where the
/// underlying detail goes.
pub type Result<T> = std::result::Result<T, UserError>;

/// Coarse classification of a failed call.
///
/// The kind tells calling code *what category* of failure occurred without
/// exposing internal detail. It is the only structured information a
/// [`UserError`] carries beyond its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The network round-trip failed before any response was obtained.
    ///
    /// Connection refused, DNS failure, TLS failure, timeout. The client
    /// performs no retries; callers that want retry behavior impose it
    /// around [`execute`](crate::ApiClient::execute).
    Transport,
    /// The payment service answered with a non-success status.
    ///
    /// The message is the service's own human-readable error message when
    /// the error body was structured, or a generic fallback when it was not.
    Api,
    /// A success response's body did not match the expected result shape.
    Deserialization,
    /// A request payload could not be serialized to JSON.
    Serialization,
    /// The client was used out of order.
    ///
    /// Calling [`execute`](crate::ApiClient::execute) without a preceding
    /// [`init`](crate::ApiClient::init) fails fast with this kind rather
    /// than silently reusing stale call state.
    State,
}

/// Sanitized, caller-visible error for a failed logical call.
///
/// `Display` prints the message and nothing else, so the error can be shown
/// to an end user as-is. There is no source chain: wrapping the underlying
/// transport or parse error would re-expose exactly the detail this type
/// exists to withhold.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct UserError {
    kind: ErrorKind,
    message: String,
}

impl UserError {
    /// Creates an error of the given kind with a user-presentable message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the user-presentable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
