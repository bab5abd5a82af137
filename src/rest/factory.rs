//! Configured, lazily built API instances.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::ClientConfig;
use crate::error::DeckTutorError;
use crate::rest::api::Api;
use crate::rest::transport::{ReqwestTransport, Transport};

/// Holds the client configuration and the two shared API instances built
/// from it: one unauthenticated, one signing every request.
///
/// Instances are created on first use and reused afterwards, so the signed
/// instance keeps one token cache for the whole process. Reconfiguring drops
/// both instances.
///
/// ```rust
/// use decktutor_sdk::config::ClientConfig;
/// use decktutor_sdk::rest::ApiFactory;
///
/// let factory = ApiFactory::new();
/// assert!(factory.auth_api().is_err());
///
/// factory.configure(ClientConfig::new("user", "password")).unwrap();
/// let api = factory.auth_api().unwrap();
/// assert!(api.is_authenticated());
/// ```
pub struct ApiFactory {
    catalog: Arc<Catalog>,
    transport: Option<Arc<dyn Transport>>,
    state: Mutex<FactoryState>,
}

#[derive(Default)]
struct FactoryState {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn Transport>>,
    default_api: Option<Arc<Api>>,
    auth_api: Option<Arc<Api>>,
}

impl ApiFactory {
    /// An unconfigured factory using the built-in catalog.
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(Catalog::default()),
            transport: None,
            state: Mutex::new(FactoryState::default()),
        }
    }

    /// Use a custom endpoint catalog.
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Send every request through `transport` instead of an HTTP client built
    /// from the configuration.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// The endpoint catalog.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Store the configuration, discarding any instance built from a previous
    /// one.
    pub fn configure(&self, config: ClientConfig) -> Result<(), DeckTutorError> {
        config.validate()?;
        info!(
            mode = %config.mode(),
            endpoint = config.resolved_endpoint(),
            "Configuring DeckTutor client"
        );

        let mut state = self.lock();
        *state = FactoryState {
            config: Some(config),
            ..FactoryState::default()
        };
        Ok(())
    }

    /// Configure from `DECKTUTOR_USERNAME`, `DECKTUTOR_PASSWORD` and
    /// `DECKTUTOR_MODE`.
    pub fn configure_from_env(&self) -> Result<(), DeckTutorError> {
        self.configure(ClientConfig::from_env()?)
    }

    /// Whether [`configure`](Self::configure) has been called.
    pub fn is_configured(&self) -> bool {
        self.lock().config.is_some()
    }

    /// The unauthenticated instance.
    pub fn default_api(&self) -> Result<Arc<Api>, DeckTutorError> {
        self.api(false)
    }

    /// The signing instance.
    pub fn auth_api(&self) -> Result<Arc<Api>, DeckTutorError> {
        self.api(true)
    }

    /// The shared instance for `authenticate`, built on first use.
    pub fn api(&self, authenticate: bool) -> Result<Arc<Api>, DeckTutorError> {
        let mut state = self.lock();
        let cached = if authenticate {
            &state.auth_api
        } else {
            &state.default_api
        };
        if let Some(api) = cached {
            return Ok(api.clone());
        }

        let config = state.config.clone().ok_or_else(|| {
            DeckTutorError::MissingConfiguration(
                "call configure() with username and password first".to_string(),
            )
        })?;
        let transport = match state.transport.clone() {
            Some(transport) => transport,
            None => {
                let transport = self.build_transport(&config);
                state.transport = Some(transport.clone());
                transport
            }
        };

        let api = Arc::new(self.build_api(&config, transport, authenticate)?);
        debug!(authenticate, endpoint = api.endpoint(), "Created API instance");
        if authenticate {
            state.auth_api = Some(api.clone());
        } else {
            state.default_api = Some(api.clone());
        }
        Ok(api)
    }

    fn build_transport(&self, config: &ClientConfig) -> Arc<dyn Transport> {
        if let Some(transport) = &self.transport {
            return transport.clone();
        }
        let mut builder = ReqwestTransport::builder().max_retries(config.max_retries());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Arc::new(builder.build())
    }

    fn build_api(
        &self,
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        authenticate: bool,
    ) -> Result<Api, DeckTutorError> {
        let login = self.catalog.login_descriptor()?;
        let mut builder = Api::builder()
            .mode(config.mode())
            .endpoint(config.resolved_endpoint())
            .login_path(login.url_template.clone())
            .credentials(config.credentials().clone())
            .authenticate(authenticate)
            .transport(transport);
        if let Some(user_agent) = config.user_agent() {
            builder = builder.user_agent(user_agent);
        }
        Ok(builder.build())
    }

    fn lock(&self) -> MutexGuard<'_, FactoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ApiFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApiFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ApiFactory")
            .field("config", &state.config)
            .field("default_api", &state.default_api.is_some())
            .field("auth_api", &state.auth_api.is_some())
            .finish_non_exhaustive()
    }
}
