//! A configured DeckTutor API instance.

use std::sync::Arc;

use reqwest::header::HeaderValue;
use tracing::{debug, warn};

use crate::auth::{CredentialsProvider, SequenceProvider, TokenManager};
use crate::catalog::EndpointDescriptor;
use crate::catalog::endpoints::{account, base_url};
use crate::error::DeckTutorError;
use crate::rest::call::{CallArgs, PendingCall};
use crate::rest::request::{
    DEFAULT_PAGE_SIZE, RequestSigner, default_user_agent, merge_params, pagination_params,
};
use crate::rest::transport::{HttpRequest, ReqwestTransport, Transport, http_call};
use crate::types::Mode;

/// One client instance bound to an endpoint, an authentication mode and its
/// own token cache.
///
/// # Example
///
/// ```rust,no_run
/// use decktutor_sdk::auth::StaticCredentials;
/// use decktutor_sdk::catalog::Catalog;
/// use decktutor_sdk::rest::{Api, CallArgs};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = Api::builder()
///         .credentials(Arc::new(StaticCredentials::new("user", "password")))
///         .authenticate(true)
///         .build();
///
///     let catalog = Catalog::default();
///     let info = catalog.descriptor("insertions.info")?;
///     let insertion = api.resolve(info, CallArgs::new().url_entry("code", 123)).await?;
///     println!("{insertion}");
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Api {
    endpoint: String,
    authenticate: bool,
    transport: Arc<dyn Transport>,
    signer: RequestSigner,
}

impl Api {
    /// Create a new API builder.
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    /// The API root URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The URL login requests go to.
    pub fn token_endpoint(&self) -> &str {
        self.signer.tokens().login_url()
    }

    /// Whether requests from this instance are signed.
    pub fn is_authenticated(&self) -> bool {
        self.authenticate
    }

    /// The token cache of this instance.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        self.signer.tokens()
    }

    /// Join a path onto the endpoint with exactly one `/` between them.
    pub fn join_url(&self, path: &str) -> String {
        join_url(&self.endpoint, path)
    }

    /// Resolve a catalog operation and send it.
    pub async fn resolve(
        &self,
        descriptor: &EndpointDescriptor,
        args: CallArgs,
    ) -> Result<serde_json::Value, DeckTutorError> {
        let call = self.pending_call(descriptor, args)?;
        self.request(&call).await
    }

    /// Build the request for a catalog operation without sending it.
    ///
    /// Substitutes the URL template, computes pagination and merges the
    /// explicit query parameters over it.
    pub fn pending_call(
        &self,
        descriptor: &EndpointDescriptor,
        args: CallArgs,
    ) -> Result<PendingCall, DeckTutorError> {
        let path = descriptor.render_url(&args.url_entry)?;
        let pagination = pagination_params(
            args.page,
            args.page_size,
            descriptor.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        );

        let mut call = PendingCall::new(descriptor.method, self.join_url(&path))
            .with_params(merge_params(pagination, &args.params))
            .with_headers(args.headers);
        if let Some(body) = &args.body {
            call = call.with_body(body)?;
        }
        Ok(call)
    }

    /// Send a call, handling authentication failures and bad requests.
    ///
    /// A 401 on a signed call drops the token it was signed with, unless a
    /// concurrent call already replaced it, and re-sends the call once; a
    /// second 401 is returned to the caller. A 400 is
    /// not an error here: it resolves to `{"error": <decoded body>}` so
    /// validation messages reach the caller as data. Failures while obtaining
    /// the token itself are returned unchanged.
    pub async fn request(&self, call: &PendingCall) -> Result<serde_json::Value, DeckTutorError> {
        let mut retried = false;
        loop {
            let (mut headers, signed_with) = self.signer.build_headers(self.authenticate).await?;
            headers.extend(call.headers.clone());

            let request = HttpRequest {
                method: call.method,
                url: call.url.clone(),
                headers,
                body: call.body.clone(),
                params: call.params.clone(),
            };

            match self.http_call(request).await {
                Ok(value) => return Ok(value),
                Err(DeckTutorError::BadRequest(error)) => {
                    debug!(status = error.status, url = %call.url, "Bad request returned as data");
                    return Ok(serde_json::json!({ "error": error.json() }));
                }
                Err(err) if err.is_unauthorized() && !retried => {
                    let Some(used) = signed_with.filter(|_| self.tokens().has_credentials())
                    else {
                        return Err(err);
                    };
                    warn!(url = %call.url, "Unauthorized, renewing token and retrying once");
                    if !self.tokens().invalidate_if(&used).await {
                        debug!("Auth token already renewed by another call");
                    }
                    retried = true;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send a request and classify the response, without retry or softening.
    pub async fn http_call(
        &self,
        request: HttpRequest,
    ) -> Result<serde_json::Value, DeckTutorError> {
        http_call(self.transport.as_ref(), request).await
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("endpoint", &self.endpoint)
            .field("authenticate", &self.authenticate)
            .field("tokens", self.signer.tokens())
            .finish()
    }
}

/// Join `path` onto `base` with exactly one `/` between them.
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Builder for [`Api`].
pub struct ApiBuilder {
    mode: Mode,
    endpoint: Option<String>,
    login_path: String,
    authenticate: bool,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    transport: Option<Arc<dyn Transport>>,
    sequence_provider: Option<Arc<dyn SequenceProvider>>,
    user_agent: Option<String>,
}

impl ApiBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            mode: Mode::default(),
            endpoint: None,
            login_path: account::LOGIN.to_string(),
            authenticate: false,
            credentials: None,
            transport: None,
            sequence_provider: None,
            user_agent: None,
        }
    }

    /// Select the live or sandbox root URL.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the root URL explicitly; this wins over [`mode`](Self::mode).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the path of the login operation.
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    /// Sign every request from this instance.
    pub fn authenticate(mut self, authenticate: bool) -> Self {
        self.authenticate = authenticate;
        self
    }

    /// Set the credentials provider used for login.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set a custom sequence provider.
    pub fn sequence_provider(mut self, provider: Arc<dyn SequenceProvider>) -> Self {
        self.sequence_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the instance.
    pub fn build(self) -> Api {
        let endpoint = self
            .endpoint
            .unwrap_or_else(|| base_url(self.mode).to_string());
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));

        let user_agent = self.user_agent.unwrap_or_else(default_user_agent);
        let user_agent = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("decktutor-sdk"));

        let mut tokens = TokenManager::new(transport.clone(), join_url(&endpoint, &self.login_path))
            .with_user_agent(user_agent.clone());
        if let Some(credentials) = self.credentials {
            tokens = tokens.with_credentials(credentials);
        }
        if let Some(provider) = self.sequence_provider {
            tokens = tokens.with_sequence_provider(provider);
        }

        Api {
            endpoint,
            authenticate: self.authenticate,
            transport,
            signer: RequestSigner::new(Arc::new(tokens), user_agent),
        }
    }
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IncreasingSequence, StaticCredentials, Token, sign_sequence};
    use crate::catalog::endpoints::{API_ROOT, API_SANDBOX_ROOT};
    use crate::rest::request::{AUTH_TOKEN_HEADER, SEQUENCE_HEADER, SIGNATURE_HEADER};
    use crate::rest::testing::ScriptedTransport;
    use crate::rest::transport::HttpResponse;
    use crate::types::{HttpMethod, ResolverKind};
    use futures_util::future::BoxFuture;
    use reqwest::header::HeaderName;
    use std::sync::{Mutex, OnceLock};

    const FUTURE: &str = "2999-12-31T11:09:45+00:00";

    fn login_response() -> HttpResponse {
        HttpResponse::new(
            200,
            serde_json::json!({
                "auth_token": "test_auth_token",
                "auth_token_secret": "test_auth_token_secret",
                "auth_token_expiration": FUTURE,
            })
            .to_string(),
        )
    }

    fn is_login(request: &HttpRequest) -> bool {
        request.url.ends_with("/account/login")
    }

    fn build_api(transport: &Arc<ScriptedTransport>, authenticate: bool) -> Api {
        Api::builder()
            .endpoint("http://host/v2")
            .credentials(Arc::new(StaticCredentials::new("test", "password")))
            .authenticate(authenticate)
            .transport(transport.clone())
            .sequence_provider(Arc::new(IncreasingSequence::starting_at(0)))
            .build()
    }

    fn info() -> EndpointDescriptor {
        EndpointDescriptor::new("/insertions/{code}/", HttpMethod::Get)
            .with_resolver(ResolverKind::Auth)
    }

    #[test]
    fn test_endpoint_selection() {
        let live = Api::builder().mode(Mode::Live).build();
        assert_eq!(live.endpoint(), API_ROOT);
        assert_eq!(live.token_endpoint(), format!("{API_ROOT}/account/login"));

        let sandbox = Api::builder().mode(Mode::Sandbox).build();
        assert_eq!(sandbox.endpoint(), API_SANDBOX_ROOT);

        let custom = Api::builder()
            .mode(Mode::Live)
            .endpoint("https://custom-endpoint.decktutor.com")
            .build();
        assert_eq!(custom.endpoint(), "https://custom-endpoint.decktutor.com");
        assert_eq!(
            custom.token_endpoint(),
            "https://custom-endpoint.decktutor.com/account/login"
        );
    }

    #[test]
    fn test_authenticate_defaults_off() {
        assert!(!Api::builder().build().is_authenticated());
        assert!(Api::builder().authenticate(true).build().is_authenticated());
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h/v2/", "/x"), "http://h/v2/x");
        assert_eq!(join_url("http://h/v2", "x"), "http://h/v2/x");
        assert_eq!(join_url("http://h/v2", ""), "http://h/v2");
    }

    #[test]
    fn test_pending_call_substitutes_and_paginates() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let api = build_api(&transport, true);

        let call = api
            .pending_call(
                &info(),
                CallArgs::new()
                    .url_entry("code", 123)
                    .param("limit", "5")
                    .param("lang", "it")
                    .page(0),
            )
            .unwrap();

        assert_eq!(call.url, "http://host/v2/insertions/123/");
        assert_eq!(call.method, HttpMethod::Get);
        assert_eq!(
            call.params,
            vec![
                ("offset".to_string(), "0".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("lang".to_string(), "it".to_string()),
            ]
        );
        assert!(call.body.is_none());
    }

    #[test]
    fn test_pending_call_uses_descriptor_page_size() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let api = build_api(&transport, false);
        let descriptor = info().with_default_page_size(20);

        let call = api
            .pending_call(&descriptor, CallArgs::new().url_entry("code", 1).page(2))
            .unwrap();
        assert_eq!(
            call.params,
            vec![
                ("offset".to_string(), "40".to_string()),
                ("limit".to_string(), "59".to_string()),
            ]
        );
    }

    #[test]
    fn test_pending_call_missing_parameter() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let api = build_api(&transport, true);

        let err = api.pending_call(&info(), CallArgs::new()).unwrap_err();
        assert!(matches!(err, DeckTutorError::MissingUrlParameter(ref name) if name == "code"));
    }

    #[tokio::test]
    async fn test_signed_headers() {
        let transport = Arc::new(ScriptedTransport::with_handler(|request| {
            if is_login(request) {
                login_response()
            } else {
                HttpResponse::new(200, r#"{"code":"123"}"#)
            }
        }));
        let api = build_api(&transport, true);

        let value = api
            .resolve(&info(), CallArgs::new().url_entry("code", 123))
            .await
            .unwrap();
        assert_eq!(value["code"], "123");

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        let sent = &requests[1];
        assert_eq!(sent.headers[AUTH_TOKEN_HEADER], "test_auth_token");
        assert_eq!(sent.headers[SEQUENCE_HEADER], "1");
        assert_eq!(
            sent.headers[SIGNATURE_HEADER],
            sign_sequence(1, "test_auth_token_secret").as_str()
        );
        assert_eq!(sent.headers["accept"], "application/json");
    }

    #[tokio::test]
    async fn test_sequence_monotonic_across_calls() {
        let transport = Arc::new(ScriptedTransport::with_handler(|request| {
            if is_login(request) {
                login_response()
            } else {
                HttpResponse::new(200, "{}")
            }
        }));
        let api = build_api(&transport, true);

        for _ in 0..5 {
            api.resolve(&info(), CallArgs::new().url_entry("code", 1))
                .await
                .unwrap();
        }

        let sequences: Vec<u64> = transport
            .requests()
            .iter()
            .filter(|r| !is_login(r))
            .map(|r| r.headers[SEQUENCE_HEADER].to_str().unwrap().parse().unwrap())
            .collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(transport.requests().iter().filter(|r| is_login(r)).count(), 1);
    }

    #[tokio::test]
    async fn test_unauthenticated_instance_never_logs_in() {
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse::new(200, "{}")]));
        let api = build_api(&transport, false);

        api.resolve(&info(), CallArgs::new().url_entry("code", 1))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].headers.contains_key(AUTH_TOKEN_HEADER));
        assert!(api.tokens().cached_token().await.is_none());
    }

    #[tokio::test]
    async fn test_retry_once_on_unauthorized() {
        let transport = Arc::new(ScriptedTransport::with_handler(|request| {
            if is_login(request) {
                login_response()
            } else {
                HttpResponse::new(401, r#"{"message":"expired"}"#)
            }
        }));
        let api = build_api(&transport, true);

        let err = api
            .resolve(&info(), CallArgs::new().url_entry("code", 1))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        let requests = transport.requests();
        let signed = requests.iter().filter(|r| !is_login(r)).count();
        let logins = requests.iter().filter(|r| is_login(r)).count();
        assert_eq!(signed, 2);
        assert_eq!(logins, 2);
    }

    #[tokio::test]
    async fn test_retry_succeeds_with_new_token() {
        let calls = std::sync::atomic::AtomicUsize::new(0);
        let transport = Arc::new(ScriptedTransport::with_handler(move |request| {
            if is_login(request) {
                return login_response();
            }
            if calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
                HttpResponse::new(401, "")
            } else {
                HttpResponse::new(200, r#"{"ok":true}"#)
            }
        }));
        let api = build_api(&transport, true);

        let value = api
            .resolve(&info(), CallArgs::new().url_entry("code", 1))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    /// Rejects the `stale` token and, while doing so, lets another caller
    /// install a renewed one.
    struct RenewedElsewhere {
        tokens: OnceLock<Arc<TokenManager>>,
        sent: Mutex<Vec<String>>,
    }

    impl Transport for RenewedElsewhere {
        fn send(
            &self,
            request: HttpRequest,
        ) -> BoxFuture<'_, Result<HttpResponse, DeckTutorError>> {
            let token = request
                .headers
                .get(AUTH_TOKEN_HEADER)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string();
            self.sent.lock().unwrap().push(request.url.clone());
            Box::pin(async move {
                match token.as_str() {
                    "stale" => {
                        let renewed = Token::new("renewed", "renewed_secret", FUTURE);
                        self.tokens.get().unwrap().set_token(renewed).await;
                        Ok(HttpResponse::new(401, ""))
                    }
                    "renewed" => Ok(HttpResponse::new(200, r#"{"ok":true}"#)),
                    _ => Ok(login_response()),
                }
            })
        }
    }

    #[tokio::test]
    async fn test_unauthorized_keeps_token_renewed_concurrently() {
        let transport = Arc::new(RenewedElsewhere {
            tokens: OnceLock::new(),
            sent: Mutex::new(Vec::new()),
        });
        let api = Api::builder()
            .endpoint("http://host/v2")
            .credentials(Arc::new(StaticCredentials::new("test", "password")))
            .authenticate(true)
            .transport(transport.clone())
            .build();
        transport.tokens.set(api.tokens().clone()).unwrap();
        api.tokens()
            .set_token(Token::new("stale", "stale_secret", FUTURE))
            .await;

        let value = api
            .resolve(&info(), CallArgs::new().url_entry("code", 1))
            .await
            .unwrap();

        assert_eq!(value["ok"], true);
        let sent = transport.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(!sent.iter().any(|url| url.ends_with("/account/login")));
        assert_eq!(api.tokens().cached_token().await.unwrap().auth_token, "renewed");
    }

    #[tokio::test]
    async fn test_unauthenticated_401_not_retried() {
        let transport = Arc::new(ScriptedTransport::with_handler(|_| HttpResponse::new(401, "")));
        let api = build_api(&transport, false);

        let err = api
            .resolve(&info(), CallArgs::new().url_entry("code", 1))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_request_softened() {
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse::new(
            400,
            r#"{"message":"bad"}"#,
        )]));
        let api = build_api(&transport, false);

        let value = api
            .request(&PendingCall::new(HttpMethod::Post, "http://host/v2/create/order"))
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!({"error": {"message": "bad"}}));
    }

    #[tokio::test]
    async fn test_other_errors_propagate() {
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse::new(404, "missing")]));
        let api = build_api(&transport, false);

        let err = api
            .request(&PendingCall::new(HttpMethod::Get, "http://host/v2/payments/payment"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeckTutorError::ResourceNotFound(_)));
        assert_eq!(err.body(), Some("missing"));
    }

    #[tokio::test]
    async fn test_caller_headers_override() {
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse::new(200, "{}")]));
        let api = build_api(&transport, false);

        let call = PendingCall::new(HttpMethod::Get, "http://host/v2/x").with_headers({
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert(
                HeaderName::from_static("accept"),
                HeaderValue::from_static("text/plain"),
            );
            headers.insert(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_static("abc"),
            );
            headers
        });
        api.request(&call).await.unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.headers["accept"], "text/plain");
        assert_eq!(sent.headers["x-trace"], "abc");
        assert_eq!(sent.headers["content-type"], "application/json");
    }

    #[tokio::test]
    async fn test_seeded_token_skips_login() {
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse::new(200, "{}")]));
        let api = build_api(&transport, true);
        api.tokens()
            .set_token(Token::new("seeded", "secret", FUTURE))
            .await;

        api.resolve(&info(), CallArgs::new().url_entry("code", 9))
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].headers[AUTH_TOKEN_HEADER], "seeded");
    }
}
