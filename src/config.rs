//! Client configuration.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialsProvider, EnvCredentials, StaticCredentials};
use crate::catalog::endpoints::base_url;
use crate::error::DeckTutorError;
use crate::types::Mode;

/// Environment variable selecting the deployment mode.
pub const MODE_ENV_VAR: &str = "DECKTUTOR_MODE";

/// Settings an [`ApiFactory`](crate::rest::ApiFactory) builds its instances from.
#[derive(Clone)]
pub struct ClientConfig {
    credentials: Arc<dyn CredentialsProvider>,
    mode: Mode,
    endpoint: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    max_retries: u32,
}

impl ClientConfig {
    /// Configuration for a username and password, in sandbox mode.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::from_credentials(Arc::new(StaticCredentials::new(username, password)))
    }

    /// Configuration around any credentials provider.
    pub fn from_credentials(credentials: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            credentials,
            mode: Mode::default(),
            endpoint: None,
            user_agent: None,
            timeout: None,
            max_retries: 0,
        }
    }

    /// Read credentials and mode from the environment.
    ///
    /// Credentials come from `DECKTUTOR_USERNAME` and `DECKTUTOR_PASSWORD`;
    /// `DECKTUTOR_MODE` is optional and defaults to sandbox.
    pub fn from_env() -> Result<Self, DeckTutorError> {
        let credentials = EnvCredentials::from_env()?;
        let mode = match std::env::var(MODE_ENV_VAR) {
            Ok(value) => value.parse()?,
            Err(_) => Mode::default(),
        };
        Ok(Self::from_credentials(Arc::new(credentials)).with_mode(mode))
    }

    /// Select live or sandbox.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Override the root URL; this wins over the mode.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the HTTP timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Retry connection failures and timeouts up to `retries` times.
    ///
    /// Requests that got any HTTP response are never resent.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Credentials used for login.
    pub fn credentials(&self) -> &Arc<dyn CredentialsProvider> {
        &self.credentials
    }

    /// Selected environment.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The root URL: the override if set, otherwise the mode's URL.
    pub fn resolved_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| base_url(self.mode))
    }

    /// User agent override, if any.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Per-request timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Network failure retries; `0` disables them.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Check that the root URL parses.
    pub fn validate(&self) -> Result<(), DeckTutorError> {
        url::Url::parse(self.resolved_endpoint())?;
        Ok(())
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("mode", &self.mode)
            .field("endpoint", &self.resolved_endpoint())
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::endpoints::API_SANDBOX_ROOT;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("user", "password");
        assert_eq!(config.mode(), Mode::Sandbox);
        assert_eq!(config.resolved_endpoint(), API_SANDBOX_ROOT);
        assert_eq!(config.max_retries(), 0);
        assert_eq!(config.credentials().get_credentials().username, "user");
        config.validate().unwrap();
    }

    #[test]
    fn test_endpoint_override() {
        let config = ClientConfig::new("user", "password")
            .with_mode(Mode::Live)
            .with_endpoint("https://custom-endpoint.decktutor.com");
        assert_eq!(
            config.resolved_endpoint(),
            "https://custom-endpoint.decktutor.com"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let config = ClientConfig::new("user", "password").with_endpoint("not a url");
        assert!(matches!(config.validate(), Err(DeckTutorError::Url(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = ClientConfig::new("user", "hunter2");
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
