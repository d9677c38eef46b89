//! Request accumulation and pure request building.
//!
//! [`RequestDetails`] is the mutable accumulator behind the client's fluent
//! surface: one instance per [`ApiClient`](crate::ApiClient), cleared at the
//! start of every logical call, mutated by the chainable setters, and finally
//! consumed by [`RequestDetails::build`]. Building is a pure function of the
//! accumulated state — no I/O, no transport types — so request construction
//! can be inspected and tested without performing a network round-trip.
//!
//! # Body selection
//!
//! - A pre-serialized JSON body, when set, always wins over discrete
//!   parameters for body construction.
//! - Otherwise GET requests carry parameters as the query string with no
//!   body, and POST/PUT/DELETE requests carry them as a form-encoded body
//!   with no query string.

use url::Url;
use url::form_urlencoded;

use crate::error::{ErrorKind, Result, UserError};

/// HTTP verb for an API call.
///
/// Closed set: the payment API is plain REST and uses nothing beyond these
/// four. Defaults to GET.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// Read a resource; parameters travel in the query string.
    #[default]
    Get,
    /// Create a resource; parameters travel form-encoded in the body.
    Post,
    /// Replace a resource.
    Put,
    /// Remove a resource.
    Delete,
}

impl Method {
    /// Returns the verb as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a built request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// No body (GET without serialized content, or no parameters at all).
    Empty,
    /// Pre-serialized JSON text, sent as `application/json`.
    Json(String),
    /// Form-encoded parameters, sent as `application/x-www-form-urlencoded`.
    Form(String),
}

impl RequestBody {
    /// Content-Type header value for this body, if it has one.
    #[must_use]
    pub const fn content_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty => None,
            Self::Json(_) => Some("application/json"),
            Self::Form(_) => Some("application/x-www-form-urlencoded"),
        }
    }
}

/// A fully built request, ready to hand to the transport.
///
/// Produced by [`RequestDetails::build`]; contains everything the wire call
/// needs except instance-level concerns (bearer token, Accept headers),
/// which belong to the transport client.
#[derive(Debug, Clone)]
pub struct BuiltRequest {
    /// HTTP verb.
    pub method: Method,
    /// Absolute URL, query string included for GET calls.
    pub url: Url,
    /// Request body.
    pub body: RequestBody,
}

/// Per-call mutable accumulator for one logical API call.
///
/// Owned exclusively by the client; not safe to share across overlapping
/// logical calls, which the `&mut self` setters make unrepresentable anyway.
#[derive(Debug, Clone)]
pub struct RequestDetails {
    base_url: String,
    relative_url: String,
    method: Method,
    params: Vec<(String, String)>,
    serialized_content: Option<String>,
}

impl RequestDetails {
    /// Creates an accumulator rooted at the given base URL.
    ///
    /// A trailing slash on the base URL is normalized away so that joining
    /// with relative endpoints is unambiguous.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            relative_url: String::new(),
            method: Method::default(),
            params: Vec::new(),
            serialized_content: None,
        }
    }

    /// Drops all per-call state, keeping only the base URL.
    ///
    /// Runs at the start of every logical call so that no parameter, body or
    /// verb from a previous call leaks into the next one.
    pub fn clear(&mut self) {
        self.relative_url.clear();
        self.method = Method::default();
        self.params.clear();
        self.serialized_content = None;
    }

    /// Sets the endpoint relative to the base URL, e.g. `merchants/products`.
    pub fn set_relative_url(&mut self, relative_url: &str) {
        self.relative_url = relative_url.trim_start_matches('/').to_owned();
    }

    /// Sets the HTTP verb.
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Returns the currently selected verb.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Appends or overwrites a named parameter.
    ///
    /// Last write wins per key; first-insertion order is preserved so the
    /// built query/form is deterministic.
    pub fn set_param(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        if let Some(existing) = self.params.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value;
        } else {
            self.params.push((key.to_owned(), value));
        }
    }

    /// Stores a pre-serialized JSON body.
    ///
    /// When set, the body is this text regardless of any parameters added;
    /// parameters still contribute to the query string on GET calls.
    pub fn set_content(&mut self, json: String) {
        self.serialized_content = Some(json);
    }

    /// Returns the accumulated parameters, in insertion order.
    #[must_use]
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Builds the request from the accumulated state.
    ///
    /// Pure: performs no I/O and leaves the accumulator untouched, so it can
    /// be called repeatedly for inspection.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`ErrorKind::State`] if the combined base and
    /// relative URL do not parse as an absolute URL.
    pub fn build(&self) -> Result<BuiltRequest> {
        let joined = if self.relative_url.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, self.relative_url)
        };

        let mut url = Url::parse(&joined)
            .map_err(|_| UserError::new(ErrorKind::State, "the API call is not correctly configured"))?;

        if self.method == Method::Get && !self.params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        let body = if let Some(content) = &self.serialized_content {
            RequestBody::Json(content.clone())
        } else if self.method != Method::Get && !self.params.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            RequestBody::Form(encoded)
        } else {
            RequestBody::Empty
        };

        Ok(BuiltRequest { method: self.method, url, body })
    }
}
