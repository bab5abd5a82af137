//! Error types for the DeckTutor client library.

use thiserror::Error;

/// Status code and raw body of a failed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    /// The HTTP status code returned by the server
    pub status: u16,
    /// The undecoded response body
    pub body: String,
}

impl HttpError {
    /// Create a new HTTP error from a status and body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    ///
    /// Bodies that are not valid JSON are returned as a JSON string so the
    /// content is never lost.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|_| serde_json::Value::String(self.body.clone()))
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.body.is_empty() {
            write!(f, "HTTP {}", self.status)
        } else {
            write!(f, "HTTP {}: {}", self.status, self.body)
        }
    }
}

/// The main error type for all DeckTutor client operations.
#[derive(Error, Debug)]
pub enum DeckTutorError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// A header value could not be encoded
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    /// A header name could not be encoded
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),

    /// Credentials or client configuration were never supplied
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// The endpoint catalog has no operation at the requested path
    #[error("No sdk configuration found in the endpoint catalog: {0}")]
    ConfigurationMissing(String),

    /// A URL template references a parameter that was not supplied
    #[error("Missing URL parameter: {0}")]
    MissingUrlParameter(String),

    /// 301, 302, 303 or 307
    #[error("Redirection: {0}")]
    Redirection(HttpError),

    /// 400
    #[error("Bad request: {0}")]
    BadRequest(HttpError),

    /// 401
    #[error("Unauthorized access: {0}")]
    UnauthorizedAccess(HttpError),

    /// 403
    #[error("Forbidden access: {0}")]
    ForbiddenAccess(HttpError),

    /// 404
    #[error("Resource not found: {0}")]
    ResourceNotFound(HttpError),

    /// 405
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(HttpError),

    /// 409
    #[error("Resource conflict: {0}")]
    ResourceConflict(HttpError),

    /// 410
    #[error("Resource gone: {0}")]
    ResourceGone(HttpError),

    /// 422
    #[error("Resource invalid: {0}")]
    ResourceInvalid(HttpError),

    /// Any other 4xx
    #[error("Client error: {0}")]
    ClientError(HttpError),

    /// Any 5xx
    #[error("Server error: {0}")]
    ServerError(HttpError),

    /// A status code outside every known class
    #[error("Unknown response code: {0}")]
    UnknownResponse(HttpError),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl DeckTutorError {
    /// Classify a non-success status into its typed error.
    ///
    /// Returns `None` for 2xx statuses.
    pub fn from_status(status: u16, body: impl Into<String>) -> Option<Self> {
        let error = HttpError::new(status, body);
        let classified = match status {
            200..=299 => return None,
            301 | 302 | 303 | 307 => Self::Redirection(error),
            400 => Self::BadRequest(error),
            401 => Self::UnauthorizedAccess(error),
            403 => Self::ForbiddenAccess(error),
            404 => Self::ResourceNotFound(error),
            405 => Self::MethodNotAllowed(error),
            409 => Self::ResourceConflict(error),
            410 => Self::ResourceGone(error),
            422 => Self::ResourceInvalid(error),
            402..=499 => Self::ClientError(error),
            500..=599 => Self::ServerError(error),
            _ => Self::UnknownResponse(error),
        };
        Some(classified)
    }

    /// The HTTP payload, if this error came from a server response.
    pub fn http_error(&self) -> Option<&HttpError> {
        match self {
            Self::Redirection(e)
            | Self::BadRequest(e)
            | Self::UnauthorizedAccess(e)
            | Self::ForbiddenAccess(e)
            | Self::ResourceNotFound(e)
            | Self::MethodNotAllowed(e)
            | Self::ResourceConflict(e)
            | Self::ResourceGone(e)
            | Self::ResourceInvalid(e)
            | Self::ClientError(e)
            | Self::ServerError(e)
            | Self::UnknownResponse(e) => Some(e),
            _ => None,
        }
    }

    /// The HTTP status, if this error came from a server response.
    pub fn status(&self) -> Option<u16> {
        self.http_error().map(|e| e.status)
    }

    /// The raw response body, if this error came from a server response.
    pub fn body(&self) -> Option<&str> {
        self.http_error().map(|e| e.body.as_str())
    }

    /// Check if this is a 401.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::UnauthorizedAccess(_))
    }
}
