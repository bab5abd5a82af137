//! HTTP transport used to reach the DeckTutor REST API.
//!
//! The transport only moves bytes and never interprets a status code. Status
//! classification happens in [`http_call`]. Redirects are never followed, so a
//! 3xx reaches the caller as [`DeckTutorError::Redirection`]. Network failures
//! are retried only when [`ReqwestTransportBuilder::max_retries`] is set, and a
//! request that produced any response is never resent.

use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::redirect;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    Retryable, RetryableStrategy, RetryTransientMiddleware, default_on_request_failure,
    policies::ExponentialBackoff,
};
use reqwest_tracing::TracingMiddleware;
use tracing::info;

use crate::error::DeckTutorError;
use crate::types::HttpMethod;

/// A fully built outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL, without query string
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// JSON-encoded body
    pub body: Option<String>,
    /// Query parameters, in send order
    pub params: Vec<(String, String)>,
}

impl HttpRequest {
    /// Create a request with no headers, body or parameters.
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            params: Vec::new(),
        }
    }

    /// Replace the headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Replace the query parameters.
    pub fn params(mut self, params: Vec<(String, String)>) -> Self {
        self.params = params;
        self
    }

    /// The URL with the query string appended.
    pub fn full_url(&self) -> Result<String, DeckTutorError> {
        if self.params.is_empty() {
            return Ok(self.url.clone());
        }
        let query = serde_urlencoded::to_string(&self.params)
            .map_err(|e| DeckTutorError::InvalidResponse(e.to_string()))?;
        Ok(format!("{}?{}", self.url, query))
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Classify the status and decode the body.
    ///
    /// 2xx bodies decode to JSON, an empty body decodes to `{}`. Every other
    /// status becomes its typed [`DeckTutorError`].
    pub fn into_json(self) -> Result<serde_json::Value, DeckTutorError> {
        if let Some(error) = DeckTutorError::from_status(self.status, self.body.clone()) {
            return Err(error);
        }
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str(&self.body).map_err(|e| {
            DeckTutorError::InvalidResponse(format!(
                "Failed to parse response: {}. Body: {}",
                e, self.body
            ))
        })
    }
}

/// Performs HTTP exchanges.
///
/// Implement this trait to route requests through a custom client or to
/// script responses in tests.
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response.
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, DeckTutorError>>;
}

/// Send a request through `transport`, log it, and classify the response.
pub async fn http_call(
    transport: &dyn Transport,
    request: HttpRequest,
) -> Result<serde_json::Value, DeckTutorError> {
    let method = request.method;
    let url = request.url.clone();
    info!("Request[{}]: {}", method, url);
    let start = Instant::now();

    let response = transport.send(request).await?;

    info!(
        "Response[{}]: {} {}, Duration: {:?}",
        response.status,
        method,
        url,
        start.elapsed()
    );
    response.into_json()
}

/// [`Transport`] backed by `reqwest` with tracing middleware.
#[derive(Clone)]
pub struct ReqwestTransport {
    http_client: ClientWithMiddleware,
}

impl ReqwestTransport {
    /// Create a transport with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a new transport builder.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, DeckTutorError>> {
        Box::pin(async move {
            let url = request.full_url()?;
            let mut builder = self
                .http_client
                .request(request.method.into(), &url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(HttpResponse { status, body })
        })
    }
}

/// Builder for [`ReqwestTransport`].
pub struct ReqwestTransportBuilder {
    timeout: Option<Duration>,
    max_retries: u32,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            timeout: None,
            max_retries: 0,
        }
    }

    /// Set a per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retry connection failures and timeouts up to `retries` times.
    ///
    /// Disabled by default. Any HTTP response, including 5xx and 429, is
    /// returned as is and never resent.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the transport.
    pub fn build(self) -> ReqwestTransport {
        let mut reqwest_builder = reqwest::Client::builder().redirect(redirect::Policy::none());
        if let Some(timeout) = self.timeout {
            reqwest_builder = reqwest_builder.timeout(timeout);
        }
        let reqwest_client = reqwest_builder.build().unwrap_or_else(|_| {
            reqwest::Client::builder()
                .redirect(redirect::Policy::none())
                .build()
                .unwrap_or_default()
        });

        let mut builder = ClientBuilder::new(reqwest_client).with(TracingMiddleware::default());
        if self.max_retries > 0 {
            let retry_policy =
                ExponentialBackoff::builder().build_with_max_retries(self.max_retries);
            builder = builder.with(RetryTransientMiddleware::new_with_policy_and_strategy(
                retry_policy,
                NetworkFailuresOnly,
            ));
        }

        ReqwestTransport {
            http_client: builder.build(),
        }
    }
}

/// Retries requests that never produced a response. Completed exchanges of
/// any status go back to the caller untouched.
struct NetworkFailuresOnly;

impl RetryableStrategy for NetworkFailuresOnly {
    fn handle(
        &self,
        res: &Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}
