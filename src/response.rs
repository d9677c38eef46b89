//! Raw response capture and the remote error body shape.

use serde::Deserialize;

/// Write-once record of a response, kept for diagnostics.
///
/// Captures the numeric status, the canonical reason phrase and the full
/// body text exactly as received. This is what the diagnostic sink sees; it
/// never feeds back into control flow beyond status classification.
#[derive(Debug, Clone)]
pub struct ResponseDetails {
    /// Numeric HTTP status code.
    pub status: u16,
    /// Canonical reason phrase, e.g. `Not Found`. Empty when unknown.
    pub reason: String,
    /// Raw response body text.
    pub body: String,
}

impl ResponseDetails {
    /// Whether the status is in the 2xx success range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Combined status line, e.g. `404 Not Found`, for logs.
    #[must_use]
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            self.status.to_string()
        } else {
            format!("{} {}", self.status, self.reason)
        }
    }
}

/// Error body returned by the payment service on a non-success status.
///
/// The service reports failures as `{"Message": "..."}`; the lowercase
/// spelling is accepted as well. Anything that does not deserialize into
/// this shape is treated as unstructured and replaced by a generic message
/// on the user-facing surface.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message from the service.
    #[serde(rename = "Message", alias = "message")]
    pub message: String,
}
