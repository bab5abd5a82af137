//! Header signing and pagination for outgoing requests.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::auth::{Token, TokenManager, sign_sequence};
use crate::error::DeckTutorError;

/// Header carrying the auth token.
pub const AUTH_TOKEN_HEADER: &str = "x-dt-auth-token";
/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-dt-signature";
/// Header carrying the sequence number the signature was computed over.
pub const SEQUENCE_HEADER: &str = "x-dt-sequence";

/// Page size used when neither the caller nor the endpoint specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// The `User-Agent` sent when none is configured.
pub fn default_user_agent() -> String {
    format!("decktutor-sdk/{}", env!("CARGO_PKG_VERSION"))
}

/// Headers sent on every request, authenticated or not.
pub fn base_headers(user_agent: &HeaderValue) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, user_agent.clone());
    headers
}

/// Builds request headers, signing them with the current token when asked.
#[derive(Clone)]
pub struct RequestSigner {
    tokens: Arc<TokenManager>,
    user_agent: HeaderValue,
}

impl RequestSigner {
    /// Create a signer drawing tokens and sequence numbers from `tokens`.
    pub fn new(tokens: Arc<TokenManager>, user_agent: HeaderValue) -> Self {
        Self { tokens, user_agent }
    }

    /// The token manager backing this signer.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Build the header set for one request.
    ///
    /// Authenticated headers obtain a token (logging in if needed) and consume
    /// exactly one sequence number. The token they were signed with is returned
    /// alongside them.
    pub async fn build_headers(
        &self,
        authenticated: bool,
    ) -> Result<(HeaderMap, Option<Arc<Token>>), DeckTutorError> {
        let mut headers = base_headers(&self.user_agent);
        if !authenticated {
            return Ok((headers, None));
        }

        let token = self.tokens.get_token().await?;
        let sequence = self.tokens.next_sequence();
        let signature = sign_sequence(sequence, &token.auth_token_secret);

        headers.insert(
            HeaderName::from_static(AUTH_TOKEN_HEADER),
            HeaderValue::from_str(&token.auth_token)?,
        );
        headers.insert(
            HeaderName::from_static(SIGNATURE_HEADER),
            HeaderValue::from_str(&signature)?,
        );
        headers.insert(HeaderName::from_static(SEQUENCE_HEADER), HeaderValue::from(sequence));
        Ok((headers, Some(token)))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Translate a zero-based page into `offset` / `limit` query parameters.
///
/// `limit` is the inclusive index of the last item, not a count:
/// page 0 of size 100 is `offset=0&limit=99`. No page means no parameters.
/// A page size of zero falls back to `default_page_size`.
pub fn pagination_params(
    page: Option<u32>,
    page_size: Option<u32>,
    default_page_size: u32,
) -> Vec<(String, String)> {
    let Some(page) = page else {
        return Vec::new();
    };
    let size = match page_size {
        Some(size) if size > 0 => u64::from(size),
        _ => u64::from(default_page_size.max(1)),
    };
    let offset = u64::from(page) * size;
    let limit = offset + size - 1;
    vec![
        ("offset".to_string(), offset.to_string()),
        ("limit".to_string(), limit.to_string()),
    ]
}

/// Merge explicit query parameters over computed ones.
///
/// Keys present in both keep their computed position but take the explicit
/// value.
pub fn merge_params(
    computed: Vec<(String, String)>,
    explicit: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged = computed;
    for (key, value) in explicit {
        match merged.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => merged.push((key.clone(), value.clone())),
        }
    }
    merged
}
