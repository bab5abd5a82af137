//! The auth token issued by `account/login`.

use serde::{Deserialize, Serialize};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Credential bundle returned by a successful login.
///
/// The login response is adopted verbatim: the three auth fields are required,
/// anything else the server sends (the `user` profile, for example) is kept in
/// [`Token::extra`].
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Value sent in the `x-dt-auth-token` header
    pub auth_token: String,
    /// Secret mixed into every request signature
    pub auth_token_secret: String,
    /// ISO-8601 expiry timestamp, offset included
    pub auth_token_expiration: String,
    /// Remaining fields of the login response
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Token {
    /// Create a token with no extra fields.
    pub fn new(
        auth_token: impl Into<String>,
        auth_token_secret: impl Into<String>,
        auth_token_expiration: impl Into<String>,
    ) -> Self {
        Self {
            auth_token: auth_token.into(),
            auth_token_secret: auth_token_secret.into(),
            auth_token_expiration: auth_token_expiration.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Parse the expiration timestamp.
    ///
    /// Timestamps carrying an offset are honoured; timestamps without one are
    /// read as UTC. Returns `None` when the value cannot be parsed.
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.auth_token_expiration)
    }

    /// Whether the token has expired at `now`.
    ///
    /// An unparseable expiration counts as expired.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        match self.expires_at() {
            Some(expiration) => now > expiration,
            None => true,
        }
    }

    /// Whether the token has expired now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("auth_token", &self.auth_token)
            .field("auth_token_secret", &"[REDACTED]")
            .field("auth_token_expiration", &self.auth_token_expiration)
            .finish_non_exhaustive()
    }
}

fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }
    if let Ok(parsed) = OffsetDateTime::parse(value, &Iso8601::DEFAULT) {
        return Some(parsed);
    }
    if let Ok(parsed) = PrimitiveDateTime::parse(value, &Iso8601::DEFAULT) {
        return Some(parsed.assume_utc());
    }
    // `2014-12-31 11:09:45[.123456]`
    let spaced = format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
    );
    PrimitiveDateTime::parse(value, &spaced)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}
