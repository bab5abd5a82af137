//! Token caching and renewal.
//!
//! A [`TokenManager`] owns at most one [`Token`]. The token is either absent or
//! fully populated; renewal happens under the same lock readers take, so a
//! caller never observes a half-replaced token.

use std::sync::Arc;

use reqwest::header::HeaderValue;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{
    CredentialsProvider, IncreasingSequence, PASSWORD_ENV_VAR, SequenceProvider, Token,
    USERNAME_ENV_VAR,
};
use crate::error::DeckTutorError;
use crate::rest::request::{base_headers, default_user_agent};
use crate::rest::transport::{HttpRequest, Transport, http_call};
use crate::types::HttpMethod;

/// Caches the auth token for one client instance and hands out sequence
/// numbers for signing.
pub struct TokenManager {
    transport: Arc<dyn Transport>,
    login_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    sequence: Arc<dyn SequenceProvider>,
    user_agent: HeaderValue,
    token: Mutex<Option<Arc<Token>>>,
}

impl TokenManager {
    /// Create a manager that logs in by POSTing to `login_url`.
    pub fn new(transport: Arc<dyn Transport>, login_url: impl Into<String>) -> Self {
        Self {
            transport,
            login_url: login_url.into(),
            credentials: None,
            sequence: Arc::new(IncreasingSequence::new()),
            user_agent: HeaderValue::from_str(&default_user_agent())
                .unwrap_or_else(|_| HeaderValue::from_static("decktutor-sdk")),
            token: Mutex::new(None),
        }
    }

    /// Set the credentials used for login.
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom sequence provider.
    pub fn with_sequence_provider(mut self, sequence: Arc<dyn SequenceProvider>) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the user agent sent with the login request.
    pub fn with_user_agent(mut self, user_agent: HeaderValue) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// The URL login requests are sent to.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Whether credentials were supplied.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Return a valid token, logging in if none is cached or it has expired.
    ///
    /// Repeated calls return the same `Arc` while the cached token is valid.
    pub async fn get_token(&self) -> Result<Arc<Token>, DeckTutorError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                debug!("Reusing cached auth token");
                return Ok(Arc::clone(token));
            }
            if token.expires_at().is_none() {
                warn!(
                    expiration = %token.auth_token_expiration,
                    "Unparseable token expiration, renewing"
                );
            } else {
                debug!(expiration = %token.auth_token_expiration, "Auth token expired");
            }
            *cached = None;
        }

        let token = Arc::new(self.login().await?);
        *cached = Some(Arc::clone(&token));
        Ok(token)
    }

    /// The cached token, if any, without renewing it.
    pub async fn cached_token(&self) -> Option<Arc<Token>> {
        self.token.lock().await.clone()
    }

    /// Whether a token is cached.
    pub async fn has_token(&self) -> bool {
        self.token.lock().await.is_some()
    }

    /// Seed the cache with a previously obtained token.
    pub async fn set_token(&self, token: Token) {
        *self.token.lock().await = Some(Arc::new(token));
    }

    /// Drop the cached token so the next [`get_token`](Self::get_token) logs in.
    pub async fn invalidate(&self) {
        if self.token.lock().await.take().is_some() {
            debug!("Auth token invalidated");
        }
    }

    /// Drop the cached token only if it is still `used`.
    ///
    /// Returns `false` when another caller already replaced it, leaving the
    /// newer token in place.
    pub async fn invalidate_if(&self, used: &Arc<Token>) -> bool {
        let mut cached = self.token.lock().await;
        match cached.as_ref() {
            Some(token) if Arc::ptr_eq(token, used) => {
                *cached = None;
                debug!("Auth token invalidated");
                true
            }
            _ => false,
        }
    }

    /// Advance the signing sequence.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.next_sequence()
    }

    /// Exchange the credentials for a new token.
    ///
    /// The decoded response body becomes the token as-is.
    pub async fn login(&self) -> Result<Token, DeckTutorError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| {
                DeckTutorError::MissingConfiguration(format!(
                    "username and password are required for authenticated calls; \
                     set {USERNAME_ENV_VAR} and {PASSWORD_ENV_VAR}"
                ))
            })?
            .get_credentials();

        let body = serde_json::to_string(&credentials.login_body())?;
        let request = HttpRequest::new(HttpMethod::Post, &self.login_url)
            .headers(base_headers(&self.user_agent))
            .body(body);

        let response = http_call(self.transport.as_ref(), request).await?;
        let token: Token = serde_json::from_value(response).map_err(|e| {
            DeckTutorError::InvalidResponse(format!("Login response is not a token: {e}"))
        })?;

        info!(expiration = %token.auth_token_expiration, "Obtained auth token");
        Ok(token)
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("login_url", &self.login_url)
            .field("has_credentials", &self.credentials.is_some())
            .finish_non_exhaustive()
    }
}
