//! REST client for the DeckTutor API.
//!
//! [`ApiFactory`] owns the configuration and the two shared [`Api`]
//! instances; [`Resolver`] strategies pick the instance a catalog operation
//! runs on.

mod api;
mod call;
mod factory;
pub mod request;
mod resolver;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{Api, ApiBuilder, join_url};
pub use call::{CallArgs, PendingCall};
pub use factory::ApiFactory;
pub use resolver::{AuthResolver, DefaultResolver, Resolver, ResolverRegistry};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
