//! Resolver strategies that turn a catalog operation into an HTTP call.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::catalog::EndpointDescriptor;
use crate::error::DeckTutorError;
use crate::rest::call::CallArgs;
use crate::rest::factory::ApiFactory;
use crate::types::ResolverKind;

/// Executes one catalog operation.
///
/// Implement this trait to intercept or reroute calls, for example to record
/// them in tests.
pub trait Resolver: Send + Sync {
    /// Render `descriptor` with `args`, send it and return the decoded body.
    fn resolve<'a>(
        &'a self,
        descriptor: &'a EndpointDescriptor,
        args: CallArgs,
    ) -> BoxFuture<'a, Result<serde_json::Value, DeckTutorError>>;
}

/// Sends calls through the factory's unauthenticated instance.
#[derive(Debug, Clone)]
pub struct DefaultResolver {
    factory: Arc<ApiFactory>,
}

impl DefaultResolver {
    /// Resolve through `factory`'s default instance.
    pub fn new(factory: Arc<ApiFactory>) -> Self {
        Self { factory }
    }
}

impl Resolver for DefaultResolver {
    fn resolve<'a>(
        &'a self,
        descriptor: &'a EndpointDescriptor,
        args: CallArgs,
    ) -> BoxFuture<'a, Result<serde_json::Value, DeckTutorError>> {
        Box::pin(async move {
            let api = self.factory.default_api()?;
            api.resolve(descriptor, args).await
        })
    }
}

/// Sends calls through the factory's signing instance.
#[derive(Debug, Clone)]
pub struct AuthResolver {
    factory: Arc<ApiFactory>,
}

impl AuthResolver {
    /// Resolve through `factory`'s authenticated instance.
    pub fn new(factory: Arc<ApiFactory>) -> Self {
        Self { factory }
    }
}

impl Resolver for AuthResolver {
    fn resolve<'a>(
        &'a self,
        descriptor: &'a EndpointDescriptor,
        args: CallArgs,
    ) -> BoxFuture<'a, Result<serde_json::Value, DeckTutorError>> {
        Box::pin(async move {
            let api = self.factory.auth_api()?;
            api.resolve(descriptor, args).await
        })
    }
}

/// Maps each [`ResolverKind`] to the strategy that handles it.
#[derive(Clone)]
pub struct ResolverRegistry {
    default: Arc<dyn Resolver>,
    auth: Arc<dyn Resolver>,
}

impl ResolverRegistry {
    /// The built-in strategies, both drawing instances from `factory`.
    pub fn new(factory: Arc<ApiFactory>) -> Self {
        Self {
            default: Arc::new(DefaultResolver::new(factory.clone())),
            auth: Arc::new(AuthResolver::new(factory)),
        }
    }

    /// Replace the strategy for `kind`.
    pub fn with(mut self, kind: ResolverKind, resolver: Arc<dyn Resolver>) -> Self {
        match kind {
            ResolverKind::Default => self.default = resolver,
            ResolverKind::Auth => self.auth = resolver,
        }
        self
    }

    /// The strategy for `kind`.
    pub fn get(&self, kind: ResolverKind) -> &Arc<dyn Resolver> {
        match kind {
            ResolverKind::Default => &self.default,
            ResolverKind::Auth => &self.auth,
        }
    }
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry").finish_non_exhaustive()
    }
}
