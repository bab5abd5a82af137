//! DeckTutor REST API endpoint constants and the built-in catalog table.

use crate::catalog::{Catalog, EndpointDescriptor};
use crate::types::HttpMethod::{self, Delete, Get, Post, Put};
use crate::types::ResolverKind::{self, Auth};
use crate::types::Mode;

/// Base URL for the live DeckTutor API.
pub const API_ROOT: &str = "http://dev.decktutor.com/ws-2.0/app/v2";

/// Base URL for the sandbox DeckTutor API.
pub const API_SANDBOX_ROOT: &str = "http://dev.decktutor.com/ws-2.0/app/v2";

/// Catalog path of the login operation.
pub const LOGIN_OPERATION: &str = "account.login";

/// Base URL for a deployment mode.
pub fn base_url(mode: Mode) -> &'static str {
    match mode {
        Mode::Live => API_ROOT,
        Mode::Sandbox => API_SANDBOX_ROOT,
    }
}

/// Account endpoints.
pub mod account {
    /// Create a logged in user session.
    pub const LOGIN: &str = "/account/login";
}

/// Insertion (listing) endpoints.
pub mod insertions {
    /// Create a new insertion in a given category.
    pub const CREATE: &str = "/insertions/create/{game}/{category}";
    /// Basic information about an insertion; also used for deletion.
    pub const INFO: &str = "/insertions/{code}/";
    /// All the information for an insertion.
    pub const PAGE: &str = "/insertions/{code}/page";
    /// Publish an unpublished insertion.
    pub const PUBLISH: &str = "/insertions/{code}/publish";
    /// Update one field of an existing insertion.
    pub const UPDATE_FIELD: &str = "/insertions/{code}/field/{name}";
    /// Public messages related to an insertion.
    pub const PUBLIC_MESSAGES: &str = "/insertions/{code}/publicMessages";
    /// Purchase an insertion.
    pub const PURCHASE: &str = "/insertions/{code}/purchase";
    /// Details of previous purchases.
    pub const PURCHASES: &str = "/insertions/purchases/";
}

/// Seller dashboard endpoints.
pub mod mytutor {
    /// Set the seller message of the day.
    pub const SET_SELLER_MOTD: &str = "/mytutor/setSellerMotd";
    /// Payment methods.
    pub const PAYMENT_METHODS: &str = "/mytutor/paymentMethods/{payment_id}";
}

/// Search endpoints.
pub mod search {
    /// Card names matching a text query.
    pub const CARD_NAME: &str = "/search/card/name";
    /// Categories of an expansion set.
    pub const LIST_CATEGORIES: &str = "/search/set/{game}/{code}/categories";
    /// Filters of a category, with possible values.
    pub const LIST_FILTERS: &str = "/search/category/{code}/filters";
    /// Card versions related to a card name or set.
    pub const CARD_VERSION: &str = "/search/card/version";
    /// Products in a category.
    pub const PRODUCT_LIST: &str = "/search/products/{code}";
    /// Main search endpoint.
    pub const SERP: &str = "/search/serp";
    /// Search through one's own insertions.
    pub const SELF_SERP: &str = "/search/self/serp";
    /// Insertion code type-ahead.
    pub const CODE: &str = "/search/insertion/code";
}

/// Resource groups the API reserves without exposing operations yet.
const EMPTY_GROUPS: &[&str] = &["cdb", "handlings", "sys", "users"];

#[rustfmt::skip]
const ENDPOINTS: &[(&str, &str, HttpMethod, ResolverKind, &str)] = &[
    ("account.login", account::LOGIN, Post, ResolverKind::Default, "Create a logged in user session to authenticate future requests"),

    ("insertions.create", insertions::CREATE, Post, Auth, "Create a new insertion in a given category"),
    ("insertions.info", insertions::INFO, Get, Auth, "Retrieve basic information about an insertion"),
    ("insertions.page", insertions::PAGE, Get, Auth, "Retrieve all the information for an insertion"),
    ("insertions.publish", insertions::PUBLISH, Post, Auth, "Publish an unpublished insertion"),
    ("insertions.publish_list", insertions::PUBLISH, Post, Auth, "Publishes any number of insertions from the selling list"),
    ("insertions.update", insertions::UPDATE_FIELD, Put, Auth, "Update one field of an existing insertion"),
    ("insertions.delete", insertions::INFO, Delete, Auth, "Delete an existing insertion"),
    ("insertions.messages", insertions::PUBLIC_MESSAGES, Get, Auth, "Retrieve the list of public messages related to an insertion"),
    ("insertions.create_message", insertions::PUBLIC_MESSAGES, Post, Auth, "Post a public question or answer to an insertion"),
    ("insertions.purchase", insertions::PURCHASE, Post, Auth, "Purchase an insertion"),
    ("insertions.purchase_info", insertions::PURCHASES, Get, Auth, "Retrieve the details of a previous purchase"),

    ("mytutor.set_seller_motd", mytutor::SET_SELLER_MOTD, Get, Auth, "Set the seller message of the day"),
    ("mytutor.payment_methods", mytutor::PAYMENT_METHODS, Get, Auth, "Retrieve a payment method"),

    ("search.card_name", search::CARD_NAME, Get, Auth, "Find card official names matching a text query"),
    ("search.list_categories", search::LIST_CATEGORIES, Get, Auth, "List available categories for a particular expansion set"),
    ("search.list_filters", search::LIST_FILTERS, Get, Auth, "List all possible filters for a category including possible values"),
    ("search.card_version", search::CARD_VERSION, Get, Auth, "Find card versions related to a specific card name or set"),
    ("search.product_list", search::PRODUCT_LIST, Get, Auth, "Find products in a specific category"),
    ("search.serp", search::SERP, Post, Auth, "Main search endpoint"),
    ("search.self_serp", search::SELF_SERP, Post, Auth, "Search through the insertions database for own insertions"),
    ("search.code", search::CODE, Get, Auth, "Web service to autocomplete type-ahead"),
];

/// Build the catalog of every endpoint this crate knows about.
pub(crate) fn default_catalog() -> Catalog {
    let mut catalog = Catalog::empty();
    for group in EMPTY_GROUPS {
        catalog.insert_branch(group);
    }
    for (path, url, method, resolver, description) in ENDPOINTS {
        catalog.insert(
            path,
            EndpointDescriptor::new(*url, *method)
                .with_resolver(*resolver)
                .with_description(*description),
        );
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_login() {
        let catalog = default_catalog();
        let login = catalog.login_descriptor().unwrap();
        assert_eq!(login.url_template, account::LOGIN);
        assert_eq!(login.method, HttpMethod::Post);
        assert_eq!(login.resolver, ResolverKind::Default);
    }

    #[test]
    fn test_default_catalog_has_every_endpoint() {
        let catalog = default_catalog();
        assert_eq!(catalog.operations().len(), ENDPOINTS.len());
        for (path, url, method, resolver, _) in ENDPOINTS {
            let descriptor = catalog.descriptor(path).unwrap();
            assert_eq!(descriptor.url_template, *url);
            assert_eq!(descriptor.method, *method);
            assert_eq!(descriptor.resolver, *resolver);
        }
    }

    #[test]
    fn test_empty_groups_are_branches() {
        let catalog = default_catalog();
        for group in EMPTY_GROUPS {
            let node = catalog.node(group).unwrap();
            assert!(node.descriptor().is_none());
        }
    }

    #[test]
    fn test_base_url_by_mode() {
        assert_eq!(base_url(Mode::Live), API_ROOT);
        assert_eq!(base_url(Mode::Sandbox), API_SANDBOX_ROOT);
    }
}
