//! Dynamic dispatch of catalog operations by path.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::{Catalog, CatalogNode, EndpointDescriptor};
use crate::error::DeckTutorError;
use crate::rest::{ApiFactory, CallArgs, ResolverRegistry};

/// Entry point for calling any catalog operation by its dotted path.
///
/// Navigation walks the catalog one segment at a time; an operation is called
/// through the resolver its descriptor names.
///
/// # Example
///
/// ```rust,no_run
/// use decktutor_sdk::config::ClientConfig;
/// use decktutor_sdk::dispatcher::DeckTutor;
/// use decktutor_sdk::rest::{ApiFactory, CallArgs};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let factory = Arc::new(ApiFactory::new());
///     factory.configure(ClientConfig::new("user", "password"))?;
///
///     let client = DeckTutor::new(factory);
///     let insertion = client
///         .get("insertions")?
///         .get("info")?
///         .call(CallArgs::new().url_entry("code", 123))
///         .await?;
///     println!("{insertion}");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DeckTutor {
    catalog: Arc<Catalog>,
    resolvers: ResolverRegistry,
}

impl DeckTutor {
    /// Dispatch through the built-in resolvers over `factory`'s catalog.
    pub fn new(factory: Arc<ApiFactory>) -> Self {
        Self {
            catalog: factory.catalog().clone(),
            resolvers: ResolverRegistry::new(factory),
        }
    }

    /// Dispatch over `catalog` with custom resolvers.
    pub fn with_resolvers(catalog: Arc<Catalog>, resolvers: ResolverRegistry) -> Self {
        Self { catalog, resolvers }
    }

    /// The catalog calls are looked up in.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The catalog root.
    pub fn root(&self) -> Node<'_> {
        Node {
            client: self,
            node: self.catalog.root(),
            path: String::new(),
        }
    }

    /// The top-level group named `segment`.
    pub fn get(&self, segment: &str) -> Result<Node<'_>, DeckTutorError> {
        self.root().get(segment)
    }

    /// The node at a dotted path such as `insertions.info`.
    pub fn operation(&self, path: &str) -> Result<Node<'_>, DeckTutorError> {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self.root(), |node, segment| node.get(segment))
    }

    /// Call the operation at a dotted path.
    pub async fn call(
        &self,
        path: &str,
        args: CallArgs,
    ) -> Result<serde_json::Value, DeckTutorError> {
        self.operation(path)?.call(args).await
    }
}

/// A position in the catalog, reached from a [`DeckTutor`].
#[derive(Debug, Clone)]
pub struct Node<'a> {
    client: &'a DeckTutor,
    node: &'a CatalogNode,
    path: String,
}

impl<'a> Node<'a> {
    /// Step into the child named `segment`.
    pub fn get(&self, segment: &str) -> Result<Node<'a>, DeckTutorError> {
        let path = if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{segment}", self.path)
        };
        let node = self.node.child(segment).ok_or_else(|| {
            DeckTutorError::ConfigurationMissing(format!("no entry for this call: {path}"))
        })?;
        Ok(Node {
            client: self.client,
            node,
            path,
        })
    }

    /// Dotted path from the root; empty at the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The operation at this node, if it is one.
    pub fn descriptor(&self) -> Option<&'a EndpointDescriptor> {
        self.node.descriptor()
    }

    /// Whether this node can be called.
    pub fn is_operation(&self) -> bool {
        self.descriptor().is_some()
    }

    /// Call the operation at this node.
    ///
    /// Fails with [`DeckTutorError::ConfigurationMissing`] if this node is a
    /// group.
    pub async fn call(&self, args: CallArgs) -> Result<serde_json::Value, DeckTutorError> {
        let descriptor = self.descriptor().ok_or_else(|| {
            DeckTutorError::ConfigurationMissing(format!(
                "cannot perform '{}': url missing",
                self.path
            ))
        })?;
        debug!(
            operation = %self.path,
            resolver = %descriptor.resolver,
            method = %descriptor.method,
            "Dispatching"
        );
        self.client
            .resolvers
            .get(descriptor.resolver)
            .resolve(descriptor, args)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::rest::Resolver;
    use crate::rest::testing::ScriptedTransport;
    use crate::rest::transport::HttpResponse;
    use crate::types::{HttpMethod, ResolverKind};
    use futures_util::future::BoxFuture;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(EndpointDescriptor, CallArgs)>>,
    }

    impl Resolver for Recorder {
        fn resolve<'a>(
            &'a self,
            descriptor: &'a EndpointDescriptor,
            args: CallArgs,
        ) -> BoxFuture<'a, Result<serde_json::Value, DeckTutorError>> {
            self.calls.lock().unwrap().push((descriptor.clone(), args));
            Box::pin(async { Ok(serde_json::json!({"recorded": true})) })
        }
    }

    fn recording_client() -> (DeckTutor, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let registry = ResolverRegistry::new(Arc::new(ApiFactory::new()))
            .with(ResolverKind::Default, recorder.clone())
            .with(ResolverKind::Auth, recorder.clone());
        (
            DeckTutor::with_resolvers(Arc::new(Catalog::default()), registry),
            recorder,
        )
    }

    #[test]
    fn test_navigation_paths() {
        let (client, _) = recording_client();
        let info = client.get("insertions").unwrap().get("info").unwrap();
        assert_eq!(info.path(), "insertions.info");
        assert!(info.is_operation());

        let group = client.get("insertions").unwrap();
        assert!(!group.is_operation());
        assert!(client.root().path().is_empty());
    }

    #[test]
    fn test_unknown_path() {
        let (client, _) = recording_client();
        let err = client.operation("insertions.bogus").unwrap_err();
        match err {
            DeckTutorError::ConfigurationMissing(message) => {
                assert!(message.contains("insertions.bogus"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.get("nope").is_err());
        assert!(client.operation("account.login.deeper").is_err());
    }

    #[tokio::test]
    async fn test_call_passes_exact_descriptor() {
        let (client, recorder) = recording_client();
        let value = client
            .call("insertions.info", CallArgs::new().url_entry("code", 123))
            .await
            .unwrap();
        assert_eq!(value["recorded"], true);

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (descriptor, args) = &calls[0];
        assert_eq!(descriptor, client.catalog().descriptor("insertions.info").unwrap());
        assert_eq!(args.url_entry["code"], "123");
    }

    #[tokio::test]
    async fn test_calling_group_fails() {
        let (client, recorder) = recording_client();
        let err = client
            .get("search")
            .unwrap()
            .call(CallArgs::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DeckTutorError::ConfigurationMissing(_)));
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_uses_default_resolver() {
        let token = serde_json::json!({
            "auth_token": "t",
            "auth_token_secret": "s",
            "auth_token_expiration": "2999-01-01T00:00:00Z",
        });
        let transport = Arc::new(ScriptedTransport::new(vec![HttpResponse::new(
            200,
            token.to_string(),
        )]));
        let factory = ApiFactory::new().with_transport(transport.clone());
        factory
            .configure(ClientConfig::new("user", "password").with_endpoint("http://host/v2"))
            .unwrap();
        let client = DeckTutor::new(Arc::new(factory));

        let value = client
            .call(
                "account.login",
                CallArgs::new().body(serde_json::json!({"login": "user", "password": "password"})),
            )
            .await
            .unwrap();
        assert_eq!(value["auth_token"], "t");

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].url, "http://host/v2/account/login");
        assert!(!requests[0].headers.contains_key("x-dt-auth-token"));
    }
}
