//! The API client: fluent request accumulation and asynchronous execution.
//!
//! [`ApiClient`] connects a storefront to the payment provider's REST API.
//! One instance is created per external service and reused for many logical
//! calls; each call is an [`init`](ApiClient::init) →
//! setters → [`execute`](ApiClient::execute) sequence. `init` wipes all
//! accumulated per-call state, so nothing leaks between successive calls on
//! the same instance.
//!
//! # Concurrency
//!
//! The accumulating methods and `execute` take `&mut self`: one logical call
//! at a time per instance, enforced at compile time. For parallel calls,
//! create one `ApiClient` per call site — they can share a single pooled
//! [`reqwest::Client`] via [`ApiClient::with_transport`], so connection reuse
//! is not lost.
//!
//! # Example
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use storefront_client::{ApiClient, Method};
//!
//! #[derive(Deserialize)]
//! struct Product {
//!     code: String,
//!     price: f64,
//! }
//!
//! # async fn example() -> storefront_client::Result<()> {
//! let mut client = ApiClient::new("https://api.example.com/v1")?;
//! client.set_bearer_token("access-token-from-oauth");
//!
//! let products: Vec<Product> = client
//!     .init("merchants/products", "load catalog for browse page")
//!     .add_param("merchant", 21)
//!     .execute()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::diagnostics::{ApiEvent, CallContext, DiagnosticSink, TracingSink};
use crate::error::{ErrorKind, Result, UserError};
use crate::request::{BuiltRequest, Method, RequestBody, RequestDetails};
use crate::response::{ErrorResponse, ResponseDetails};

/// Message shown to users when the service fails without a structured body.
const FALLBACK_API_MESSAGE: &str = "The payment service returned an unexpected error.";
/// Message shown to users when the network round-trip itself fails.
const TRANSPORT_MESSAGE: &str = "The payment service could not be reached.";
/// Message shown to users when a success body does not match the expected shape.
const DESERIALIZATION_MESSAGE: &str = "The payment service returned an unexpected response.";

/// Builds the shared transport client used for all calls.
///
/// Advertises JSON and HAL+JSON, pools connections, and applies fixed
/// timeouts. The client itself exposes no per-call timeout knobs; callers
/// that need one impose it on the `execute` future.
fn build_transport() -> reqwest::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, application/hal+json"));

    reqwest::Client::builder()
        .default_headers(headers)
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Client for one OAuth2-secured REST API.
///
/// Owns exactly one [`RequestDetails`] accumulator and a per-call
/// correlation context; see the [module docs](self) for the call protocol
/// and concurrency rules.
pub struct ApiClient {
    transport: reqwest::Client,
    request: RequestDetails,
    call: Option<CallContext>,
    bearer_token: Option<String>,
    sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("request", &self.request)
            .field("call", &self.call)
            .field("has_bearer_token", &self.bearer_token.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// Builds a dedicated pooled transport; diagnostics go to the default
    /// [`TracingSink`].
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::Transport`] if the underlying
    /// HTTP client cannot be constructed.
    pub fn new(base_url: &str) -> Result<Self> {
        let transport = build_transport()
            .map_err(|_| UserError::new(ErrorKind::Transport, TRANSPORT_MESSAGE))?;
        Ok(Self::with_transport(base_url, transport))
    }

    /// Creates a client over an existing transport.
    ///
    /// Use this to share one pooled [`reqwest::Client`] across several
    /// `ApiClient` instances (the supported way to issue parallel calls).
    #[must_use]
    pub fn with_transport(base_url: &str, transport: reqwest::Client) -> Self {
        Self {
            transport,
            request: RequestDetails::new(base_url),
            call: None,
            bearer_token: None,
            sink: Arc::new(TracingSink),
        }
    }

    /// Replaces the diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Starts a new logical call against `relative_url`.
    ///
    /// Clears every parameter, body and verb accumulated for the previous
    /// call and opens a fresh correlation context. Must precede each
    /// [`execute`](Self::execute). The `description` is free text carried
    /// only into diagnostics.
    pub fn init(&mut self, relative_url: &str, description: &str) -> &mut Self {
        self.request.clear();
        self.request.set_relative_url(relative_url);
        self.call = Some(CallContext::new(description));
        self
    }

    /// Appends or overwrites a named parameter for the upcoming call.
    ///
    /// Parameters become the query string on GET and a form-encoded body
    /// otherwise. Last write wins per key.
    pub fn add_param(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.request.set_param(key, value);
        self
    }

    /// Serializes `body` to JSON and uses it as the request body.
    ///
    /// Overrides form-parameter encoding for this call; meant for payloads
    /// too large or too structured to fit into discrete parameters.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::Serialization`] if `body`
    /// cannot be represented as JSON.
    pub fn set_content<T: Serialize>(&mut self, body: &T) -> Result<&mut Self> {
        let json = serde_json::to_string(body).map_err(|_| {
            UserError::new(ErrorKind::Serialization, "The request could not be prepared.")
        })?;
        self.request.set_content(json);
        Ok(self)
    }

    /// Sets the HTTP verb for the upcoming call.
    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.request.set_method(method);
        self
    }

    /// Attaches an OAuth2 bearer token to all subsequent requests.
    ///
    /// Instance-level, not per-call: the token survives `init` and applies
    /// until replaced.
    pub fn set_bearer_token(&mut self, token: &str) {
        self.bearer_token = Some(token.to_owned());
    }

    /// Builds the request for the current call without sending it.
    ///
    /// Pure; useful for inspecting exactly what [`execute`](Self::execute)
    /// would put on the wire.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::State`] if the accumulated URL
    /// does not form a valid absolute URL.
    pub fn build_request(&self) -> Result<BuiltRequest> {
        self.request.build()
    }

    /// Executes the current call and deserializes the response as `T`.
    ///
    /// Consumes the call context opened by [`init`](Self::init): a second
    /// `execute` without a fresh `init` fails fast. The request is built
    /// purely, announced to the diagnostic sink, sent, and the full response
    /// body is read as text before interpretation. No retries are attempted;
    /// every call is at-most-once from this client's perspective.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::State`] — no preceding `init`, or an unbuildable URL.
    /// - [`ErrorKind::Transport`] — the round-trip failed before a response
    ///   was obtained.
    /// - [`ErrorKind::Api`] — the service answered with a non-success
    ///   status; the message is the service's own when structured, generic
    ///   otherwise.
    /// - [`ErrorKind::Deserialization`] — a success body did not match `T`.
    ///
    /// All variants carry only sanitized messages; raw detail goes to the
    /// diagnostic sink.
    #[instrument(skip(self), fields(url, method))]
    pub async fn execute<T: DeserializeOwned>(&mut self) -> Result<T> {
        let context = self.call.take().ok_or_else(|| {
            UserError::new(ErrorKind::State, "No API call is in progress; call init first.")
        })?;

        let built = self.request.build()?;
        tracing::Span::current().record("url", built.url.as_str());
        tracing::Span::current().record("method", built.method.as_str());

        self.sink
            .record(&ApiEvent::RequestSent { context: context.clone(), request: built.clone() });

        let mut pending = match built.method {
            Method::Get => self.transport.get(built.url.clone()),
            Method::Post => self.transport.post(built.url.clone()),
            Method::Put => self.transport.put(built.url.clone()),
            Method::Delete => self.transport.delete(built.url.clone()),
        };

        if let Some(token) = &self.bearer_token {
            pending = pending.bearer_auth(token);
        }

        pending = match built.body {
            RequestBody::Empty => pending,
            RequestBody::Json(text) => {
                pending.header(CONTENT_TYPE, "application/json").body(text)
            }
            RequestBody::Form(encoded) => pending
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(encoded),
        };

        let response = match pending.send().await {
            Ok(response) => response,
            Err(e) => {
                self.sink.record(&ApiEvent::Error {
                    context,
                    status: None,
                    reason: None,
                    detail: e.to_string(),
                });
                return Err(UserError::new(ErrorKind::Transport, TRANSPORT_MESSAGE));
            }
        };

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_owned();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.sink.record(&ApiEvent::Error {
                    context,
                    status: Some(status.as_u16()),
                    reason: Some(reason),
                    detail: e.to_string(),
                });
                return Err(UserError::new(ErrorKind::Transport, TRANSPORT_MESSAGE));
            }
        };

        let details = ResponseDetails { status: status.as_u16(), reason, body };
        interpret_response(self.sink.as_ref(), &context, details)
    }
}

/// Translates a fully read response into a typed result or a sanitized error.
///
/// Success (2xx): announce the response, then deserialize the body as `T`.
/// Failure: try to parse the body as the service's structured
/// [`ErrorResponse`]; its message becomes the user-facing one, while the raw
/// body — structured or not — always reaches the sink.
fn interpret_response<T: DeserializeOwned>(
    sink: &dyn DiagnosticSink,
    context: &CallContext,
    details: ResponseDetails,
) -> Result<T> {
    if details.is_success() {
        sink.record(&ApiEvent::ResponseReceived {
            context: context.clone(),
            response: details.clone(),
        });

        return serde_json::from_str(&details.body).map_err(|e| {
            sink.record(&ApiEvent::Error {
                context: context.clone(),
                status: Some(details.status),
                reason: Some(details.reason.clone()),
                detail: e.to_string(),
            });
            UserError::new(ErrorKind::Deserialization, DESERIALIZATION_MESSAGE)
        });
    }

    let message = match serde_json::from_str::<ErrorResponse>(&details.body) {
        Ok(parsed) => parsed.message,
        Err(_) => FALLBACK_API_MESSAGE.to_owned(),
    };

    sink.record(&ApiEvent::Error {
        context: context.clone(),
        status: Some(details.status),
        reason: Some(details.reason.clone()),
        detail: details.body,
    });

    Err(UserError::new(ErrorKind::Api, message))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ApiEvent>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<ApiEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn record(&self, event: &ApiEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn response(status: u16, reason: &str, body: &str) -> ResponseDetails {
        ResponseDetails { status, reason: reason.to_owned(), body: body.to_owned() }
    }

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Payment {
        reference: String,
        amount: f64,
    }

    #[test]
    fn test_success_body_is_parsed() {
        let sink = RecordingSink::default();
        let context = CallContext::new("get payment");

        let body = r#"{"reference":"pp-123","amount":42.5}"#;
        let parsed: Payment =
            interpret_response(&sink, &context, response(200, "OK", body)).unwrap();

        assert_eq!(parsed, Payment { reference: "pp-123".to_owned(), amount: 42.5 });

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ApiEvent::ResponseReceived { .. }));
    }

    #[test]
    fn test_structured_error_message_is_surfaced() {
        let sink = RecordingSink::default();
        let context = CallContext::new("");

        let err = interpret_response::<Payment>(
            &sink,
            &context,
            response(404, "Not Found", r#"{"Message":"Not found"}"#),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.to_string(), "Not found");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        let ApiEvent::Error { status, reason, .. } = &events[0] else {
            panic!("expected an error event");
        };
        assert_eq!(*status, Some(404));
        assert_eq!(reason.as_deref(), Some("Not Found"));
    }

    #[test]
    fn test_unstructured_error_gets_generic_message() {
        let sink = RecordingSink::default();
        let context = CallContext::new("");

        let err = interpret_response::<Payment>(
            &sink,
            &context,
            response(500, "Internal Server Error", "internal failure"),
        )
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Api);
        // The raw body never reaches the user-facing message...
        assert_eq!(err.to_string(), FALLBACK_API_MESSAGE);

        // ...but the sink still receives it verbatim.
        let events = sink.events();
        let ApiEvent::Error { detail, .. } = &events[0] else {
            panic!("expected an error event");
        };
        assert_eq!(detail, "internal failure");
    }

    #[test]
    fn test_success_with_mismatched_body_is_a_deserialization_error() {
        let sink = RecordingSink::default();
        let context = CallContext::new("");

        let err = interpret_response::<Payment>(&sink, &context, response(200, "OK", "not json"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Deserialization);
        assert_eq!(err.to_string(), DESERIALIZATION_MESSAGE);

        // Response received first, then the parse failure.
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ApiEvent::ResponseReceived { .. }));
        assert!(matches!(events[1], ApiEvent::Error { .. }));
    }

    #[tokio::test]
    async fn test_execute_without_init_fails_fast() {
        let mut client = ApiClient::new("https://api.example.com").unwrap();
        let err = client.execute::<Payment>().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[tokio::test]
    async fn test_execute_consumes_the_call_context() {
        // Nothing listens on this port; the first execute fails at the
        // transport and must still consume the init context.
        let mut client = ApiClient::new("http://127.0.0.1:9").unwrap();
        client.init("payments", "");

        let first = client.execute::<Payment>().await.unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Transport);
        assert_eq!(first.to_string(), TRANSPORT_MESSAGE);

        let second = client.execute::<Payment>().await.unwrap_err();
        assert_eq!(second.kind(), ErrorKind::State);
    }

    #[test]
    fn test_init_clears_previous_call_state() {
        let mut client = ApiClient::with_transport(
            "https://api.example.com/v1",
            reqwest::Client::new(),
        );

        client
            .init("merchants/products", "first call")
            .set_method(Method::Post)
            .add_param("merchant", 1)
            .add_param("page", 3);

        client.init("payments/pp-123/status", "second call");
        let built = client.build_request().unwrap();

        assert_eq!(built.method, Method::Get);
        assert_eq!(built.url.as_str(), "https://api.example.com/v1/payments/pp-123/status");
        assert_eq!(built.body, RequestBody::Empty);
    }

    #[test]
    fn test_fluent_chain_builds_expected_request() {
        let mut client =
            ApiClient::with_transport("https://api.example.com/v1", reqwest::Client::new());

        client
            .init("payments", "create anticipated payment")
            .set_method(Method::Post)
            .add_param("merchant", 21)
            .add_param("amount", "99.95");

        let built = client.build_request().unwrap();
        assert_eq!(built.method, Method::Post);
        assert_eq!(built.url.query(), None);
        assert_eq!(built.body, RequestBody::Form("merchant=21&amount=99.95".to_owned()));
    }

    #[test]
    fn test_set_content_wins_over_params() {
        let mut client =
            ApiClient::with_transport("https://api.example.com/v1", reqwest::Client::new());

        #[derive(Serialize)]
        struct Order {
            merchant: i64,
            total: f64,
        }

        client
            .init("payments", "")
            .set_method(Method::Post)
            .add_param("ignored", true)
            .set_content(&Order { merchant: 21, total: 120.0 })
            .unwrap();

        let built = client.build_request().unwrap();
        let RequestBody::Json(json) = &built.body else {
            panic!("expected a JSON body");
        };
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["merchant"], 21);
        assert_eq!(value["total"], 120.0);
    }

    #[test]
    fn test_set_content_rejects_unserializable_payloads() {
        let mut client =
            ApiClient::with_transport("https://api.example.com/v1", reqwest::Client::new());
        client.init("payments", "");

        // Maps with non-string keys have no JSON representation.
        let bad: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into();
        let err = client.set_content(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Serialization);
    }

    #[test]
    fn test_debug_does_not_print_the_token() {
        let mut client =
            ApiClient::with_transport("https://api.example.com", reqwest::Client::new());
        client.set_bearer_token("super-secret");
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("has_bearer_token: true"));
    }
}
