//! Call-time arguments and the request they resolve to.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::DeckTutorError;
use crate::types::HttpMethod;

/// Arguments for one catalog operation call.
///
/// ```rust
/// use decktutor_sdk::rest::CallArgs;
///
/// let args = CallArgs::new()
///     .url_entry("code", 123)
///     .param("lang", "en")
///     .page(0)
///     .page_size(50);
/// assert_eq!(args.url_entry["code"], "123");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Values for the URL template placeholders
    pub url_entry: BTreeMap<String, String>,
    /// Extra query parameters; these win over pagination parameters
    pub params: Vec<(String, String)>,
    /// JSON body
    pub body: Option<serde_json::Value>,
    /// Extra headers, merged over the generated ones
    pub headers: HeaderMap,
    /// Zero-based page number
    pub page: Option<u32>,
    /// Page size; the endpoint default applies when absent
    pub page_size: Option<u32>,
}

impl CallArgs {
    /// Empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a URL template value.
    pub fn url_entry(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.url_entry.insert(name.into(), value.to_string());
        self
    }

    /// Add a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Set the JSON body.
    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` as the JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, DeckTutorError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Request a page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Set the page size.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// A resolved call, ready to be signed and sent.
///
/// Signing happens per attempt, so the pending call only carries the caller's
/// extra headers.
#[derive(Debug, Clone)]
pub struct PendingCall {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL
    pub url: String,
    /// JSON-encoded body
    pub body: Option<String>,
    /// Query parameters
    pub params: Vec<(String, String)>,
    /// Extra headers
    pub headers: HeaderMap,
}

impl PendingCall {
    /// A call with no body, parameters or extra headers.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            params: Vec::new(),
            headers: HeaderMap::new(),
        }
    }

    /// Set the JSON body.
    pub fn with_body(mut self, body: &serde_json::Value) -> Result<Self, DeckTutorError> {
        self.body = Some(serde_json::to_string(body)?);
        Ok(self)
    }

    /// Set the query parameters.
    pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// Set the extra headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}
