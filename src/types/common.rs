//! Common domain types for the DeckTutor API.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DeckTutorError;

/// HTTP method an endpoint is reached with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// The method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Dispatch strategy declared by a catalog endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ResolverKind {
    /// Unauthenticated dispatch
    #[default]
    Default,
    /// Token-signed dispatch
    Auth,
}

impl std::fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverKind::Default => write!(f, "default"),
            ResolverKind::Auth => write!(f, "auth"),
        }
    }
}

impl FromStr for ResolverKind {
    type Err = DeckTutorError;

    /// Accepts `auth` / `default` as well as the legacy dotted class names
    /// (`decktutorsdk.resolvers.AuthResolver`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.rsplit('.').next().unwrap_or(s);
        match name.to_ascii_lowercase().as_str() {
            "auth" | "authresolver" => Ok(ResolverKind::Auth),
            "default" | "defaultresolver" => Ok(ResolverKind::Default),
            _ => Err(DeckTutorError::ConfigurationMissing(format!(
                "unknown resolver kind '{s}'"
            ))),
        }
    }
}

impl Serialize for ResolverKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResolverKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Which DeckTutor deployment a client talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Production
    Live,
    /// Sandbox
    #[default]
    Sandbox,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Sandbox => write!(f, "sandbox"),
        }
    }
}

impl FromStr for Mode {
    type Err = DeckTutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "sandbox" => Ok(Mode::Sandbox),
            other => Err(DeckTutorError::MissingConfiguration(format!(
                "mode must be 'live' or 'sandbox', got '{other}'"
            ))),
        }
    }
}
