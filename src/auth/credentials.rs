//! Credential management for DeckTutor account login.

use secrecy::{ExposeSecret, SecretString};

use crate::error::DeckTutorError;

/// Environment variable holding the account username.
pub const USERNAME_ENV_VAR: &str = "DECKTUTOR_USERNAME";
/// Environment variable holding the account password.
pub const PASSWORD_ENV_VAR: &str = "DECKTUTOR_PASSWORD";

/// Account credentials exchanged for an auth token at login.
#[derive(Clone)]
pub struct Credentials {
    /// The account login name
    pub username: String,
    password: SecretString,
}

impl Credentials {
    /// Create new credentials from a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Get the password for the login exchange.
    ///
    /// This method exposes the secret - use carefully.
    pub fn expose_password(&self) -> &str {
        self.password.expose_secret()
    }

    /// The JSON body posted to `account/login`.
    pub(crate) fn login_body(&self) -> serde_json::Value {
        serde_json::json!({
            "login": self.username,
            "password": self.expose_password(),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Trait for providing account credentials.
///
/// Implement this trait to customize how credentials are retrieved,
/// for example from a secrets manager.
pub trait CredentialsProvider: Send + Sync {
    /// Get the credentials.
    fn get_credentials(&self) -> &Credentials;
}

/// Static credentials provider that holds credentials directly.
#[derive(Clone)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Create a new static credentials provider.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(username, password),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials provider that reads from environment variables.
///
/// By default, reads from `DECKTUTOR_USERNAME` and `DECKTUTOR_PASSWORD`.
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Create credentials from the default environment variables.
    pub fn from_env() -> Result<Self, DeckTutorError> {
        Self::from_env_vars(USERNAME_ENV_VAR, PASSWORD_ENV_VAR)
    }

    /// Create credentials from custom environment variable names.
    ///
    /// Fails with [`DeckTutorError::MissingConfiguration`] naming both
    /// variables if either is unset.
    pub fn from_env_vars(username_var: &str, password_var: &str) -> Result<Self, DeckTutorError> {
        let (Ok(username), Ok(password)) =
            (std::env::var(username_var), std::env::var(password_var))
        else {
            return Err(DeckTutorError::MissingConfiguration(format!(
                "set {username_var} and {password_var} to supply account credentials"
            )));
        };

        Ok(Self {
            credentials: Credentials::new(username, password),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
