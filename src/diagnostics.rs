//! Developer-facing diagnostics for API calls.
//!
//! Every logical call gets a fresh [`CallContext`] (correlation id plus an
//! optional free-text description) and emits up to two [`ApiEvent`]s through
//! the injected [`DiagnosticSink`]: `RequestSent` when the built request is
//! handed to the transport, then either `ResponseReceived` or `Error`. The
//! sink is observation only — it never influences control flow, and the full
//! unsanitized detail (status, reason, raw body) is delivered here rather
//! than on the caller-visible error surface.
//!
//! The default sink forwards to [`tracing`]; tests typically inject a
//! recording sink and assert on the captured events.

use uuid::Uuid;

use crate::request::BuiltRequest;
use crate::response::ResponseDetails;

/// Correlation context for one logical call.
///
/// Created by [`init`](crate::ApiClient::init) and attached to every event
/// that call emits, so a request and its response or error can be matched up
/// in interleaved logs.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Unique id for this logical call.
    pub correlation_id: Uuid,
    /// Optional caller-supplied description, purely for readability.
    pub description: String,
}

impl CallContext {
    pub(crate) fn new(description: &str) -> Self {
        Self { correlation_id: Uuid::new_v4(), description: description.to_owned() }
    }
}

/// A diagnostic event emitted at a fixed point in a call's lifecycle.
#[derive(Debug, Clone)]
pub enum ApiEvent {
    /// The request was built and is about to be sent.
    RequestSent {
        /// Correlation context of the emitting call.
        context: CallContext,
        /// The fully built request, body included.
        request: BuiltRequest,
    },
    /// A success response was received and read in full.
    ResponseReceived {
        /// Correlation context of the emitting call.
        context: CallContext,
        /// Raw status and body as received.
        response: ResponseDetails,
    },
    /// The call failed: transport failure, non-success status, or a body
    /// that did not parse as the expected shape.
    Error {
        /// Correlation context of the emitting call.
        context: CallContext,
        /// HTTP status, when a response was obtained at all.
        status: Option<u16>,
        /// Reason phrase, when a response was obtained at all.
        reason: Option<String>,
        /// Unsanitized detail: raw body text or underlying error message.
        detail: String,
    },
}

/// Observer for API call diagnostics.
///
/// Implementations must be cheap and must not fail; the client calls
/// [`record`](Self::record) inline on the request path.
pub trait DiagnosticSink: Send + Sync {
    /// Records one event. Must not block or panic.
    fn record(&self, event: &ApiEvent);
}

/// Default sink that forwards events to [`tracing`].
///
/// Request and response events log at debug level, errors at warn, all under
/// the `storefront_client::api` target with the correlation id attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, event: &ApiEvent) {
        match event {
            ApiEvent::RequestSent { context, request } => {
                tracing::debug!(
                    target: "storefront_client::api",
                    correlation_id = %context.correlation_id,
                    description = %context.description,
                    method = %request.method,
                    url = %request.url,
                    "API request sent"
                );
            }
            ApiEvent::ResponseReceived { context, response } => {
                tracing::debug!(
                    target: "storefront_client::api",
                    correlation_id = %context.correlation_id,
                    status = %response.status_line(),
                    body = %response.body,
                    "API response received"
                );
            }
            ApiEvent::Error { context, status, reason, detail } => {
                tracing::warn!(
                    target: "storefront_client::api",
                    correlation_id = %context.correlation_id,
                    status = ?status,
                    reason = ?reason,
                    detail = %detail,
                    "API call failed"
                );
            }
        }
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _event: &ApiEvent) {}
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ApiEvent>>,
    }

    impl DiagnosticSink for RecordingSink {
        fn record(&self, event: &ApiEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_contexts_are_unique_per_call() {
        let a = CallContext::new("first");
        let b = CallContext::new("second");
        assert_ne!(a.correlation_id, b.correlation_id);
        assert_eq!(a.description, "first");
    }

    #[test]
    fn test_recording_sink_captures_detail() {
        let sink = Arc::new(RecordingSink::default());
        let context = CallContext::new("");

        sink.record(&ApiEvent::Error {
            context,
            status: Some(500),
            reason: Some("Internal Server Error".to_owned()),
            detail: "internal failure".to_owned(),
        });

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let ApiEvent::Error { status, detail, .. } = &events[0] else {
            panic!("expected an error event");
        };
        assert_eq!(*status, Some(500));
        assert_eq!(detail, "internal failure");
    }

    #[test]
    fn test_null_sink_is_silent() {
        let context = CallContext::new("ignored");
        NullSink.record(&ApiEvent::Error {
            context,
            status: None,
            reason: None,
            detail: "dropped".to_owned(),
        });
    }
}
