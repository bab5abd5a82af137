//! The endpoint catalog.
//!
//! A [`Catalog`] is a read-only tree mapping dotted operation paths such as
//! `insertions.info` to an [`EndpointDescriptor`]. Inner nodes are
//! [`CatalogNode::Branch`]es, operations are [`CatalogNode::Leaf`]s.
//!
//! Catalogs are normally built once at startup, either from the built-in table
//! ([`Catalog::default`]) or from JSON using the API map's key names:
//!
//! ```rust
//! use decktutor_sdk::catalog::Catalog;
//!
//! let catalog = Catalog::from_json_str(r#"{
//!     "insertions": {
//!         "info": {
//!             "url": "/insertions/{code}/",
//!             "method": "GET",
//!             "resolver": "auth"
//!         }
//!     }
//! }"#).unwrap();
//!
//! let info = catalog.descriptor("insertions.info").unwrap();
//! assert_eq!(info.url_template, "/insertions/{code}/");
//! ```

pub mod endpoints;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DeckTutorError;
use crate::types::{HttpMethod, ResolverKind};

/// One catalog operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Path template relative to the API root, with `{name}` placeholders
    #[serde(rename = "url")]
    pub url_template: String,
    /// HTTP method
    #[serde(alias = "methods")]
    pub method: HttpMethod,
    /// Dispatch strategy; unauthenticated when absent
    #[serde(default)]
    pub resolver: ResolverKind,
    /// Page size used when a paginated call does not give one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_page_size: Option<u32>,
    /// Human-readable summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EndpointDescriptor {
    /// Create an unauthenticated descriptor.
    pub fn new(url_template: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url_template: url_template.into(),
            method,
            resolver: ResolverKind::Default,
            default_page_size: None,
            description: None,
        }
    }

    /// Set the resolver kind.
    pub fn with_resolver(mut self, resolver: ResolverKind) -> Self {
        self.resolver = resolver;
        self
    }

    /// Set the default page size.
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = Some(size);
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Names of the `{placeholders}` in the template, in order.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut rest = self.url_template.as_str();
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            names.push(&after[..end]);
            rest = &after[end + 1..];
        }
        names
    }

    /// Substitute every `{name}` in the template from `url_params`.
    ///
    /// Fails with [`DeckTutorError::MissingUrlParameter`] naming the first
    /// placeholder that has no value. Values are inserted as given.
    pub fn render_url(
        &self,
        url_params: &BTreeMap<String, String>,
    ) -> Result<String, DeckTutorError> {
        let mut rendered = String::with_capacity(self.url_template.len());
        let mut rest = self.url_template.as_str();

        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            let Some(end) = after.find('}') else {
                break;
            };
            let name = &after[..end];
            let value = url_params
                .get(name)
                .ok_or_else(|| DeckTutorError::MissingUrlParameter(name.to_string()))?;
            rendered.push_str(&rest[..start]);
            rendered.push_str(value);
            rest = &after[end + 1..];
        }
        rendered.push_str(rest);
        Ok(rendered)
    }
}

/// A node of the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogNode {
    /// An operation
    Leaf(EndpointDescriptor),
    /// A group of nodes keyed by path segment
    Branch(BTreeMap<String, CatalogNode>),
}

impl CatalogNode {
    /// The child at `segment`, if this is a branch that has one.
    pub fn child(&self, segment: &str) -> Option<&CatalogNode> {
        match self {
            CatalogNode::Branch(children) => children.get(segment),
            CatalogNode::Leaf(_) => None,
        }
    }

    /// The descriptor, if this is a leaf.
    pub fn descriptor(&self) -> Option<&EndpointDescriptor> {
        match self {
            CatalogNode::Leaf(descriptor) => Some(descriptor),
            CatalogNode::Branch(_) => None,
        }
    }

    fn collect<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a EndpointDescriptor)>) {
        match self {
            CatalogNode::Leaf(descriptor) => out.push((prefix.to_string(), descriptor)),
            CatalogNode::Branch(children) => {
                for (name, child) in children {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    child.collect(&path, out);
                }
            }
        }
    }
}

/// The full endpoint tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    root: CatalogNode,
}

impl Catalog {
    /// A catalog with no endpoints.
    pub fn empty() -> Self {
        Self {
            root: CatalogNode::Branch(BTreeMap::new()),
        }
    }

    /// Build a catalog from its top-level groups.
    pub fn new(groups: BTreeMap<String, CatalogNode>) -> Self {
        Self {
            root: CatalogNode::Branch(groups),
        }
    }

    /// Parse a catalog from a JSON object of groups.
    pub fn from_json_str(json: &str) -> Result<Self, DeckTutorError> {
        let groups: BTreeMap<String, CatalogNode> = serde_json::from_str(json)?;
        Ok(Self::new(groups))
    }

    /// The root branch.
    pub fn root(&self) -> &CatalogNode {
        &self.root
    }

    /// Walk the tree one segment at a time.
    ///
    /// Fails with [`DeckTutorError::ConfigurationMissing`] at the first segment
    /// that does not exist.
    pub fn lookup<'s, I>(&self, segments: I) -> Result<&CatalogNode, DeckTutorError>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut node = &self.root;
        let mut walked = Vec::new();
        for segment in segments {
            walked.push(segment);
            node = node.child(segment).ok_or_else(|| {
                DeckTutorError::ConfigurationMissing(format!(
                    "no entry for this call: {}",
                    walked.join(".")
                ))
            })?;
        }
        Ok(node)
    }

    /// Look up a node by dotted path.
    pub fn node(&self, path: &str) -> Result<&CatalogNode, DeckTutorError> {
        self.lookup(path.split('.').filter(|s| !s.is_empty()))
    }

    /// Look up an operation by dotted path.
    pub fn descriptor(&self, path: &str) -> Result<&EndpointDescriptor, DeckTutorError> {
        self.node(path)?.descriptor().ok_or_else(|| {
            DeckTutorError::ConfigurationMissing(format!(
                "'{path}' is a group, not an operation: url missing"
            ))
        })
    }

    /// The `account.login` operation.
    pub fn login_descriptor(&self) -> Result<&EndpointDescriptor, DeckTutorError> {
        self.descriptor(endpoints::LOGIN_OPERATION)
    }

    /// Every operation with its dotted path, in path order.
    pub fn operations(&self) -> Vec<(String, &EndpointDescriptor)> {
        let mut out = Vec::new();
        self.root.collect("", &mut out);
        out
    }

    /// Insert an empty group at `path`, creating parents as needed.
    pub fn insert_branch(&mut self, path: &str) {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if let CatalogNode::Branch(children) = &mut self.root {
            insert_at(children, &segments, None);
        }
    }

    /// Insert or replace the operation at `path`, creating parents as needed.
    ///
    /// A leaf standing where a parent group is needed is replaced by the group.
    pub fn insert(&mut self, path: &str, descriptor: EndpointDescriptor) {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        if let CatalogNode::Branch(children) = &mut self.root {
            insert_at(children, &segments, Some(descriptor));
        }
    }
}

fn insert_at(
    children: &mut BTreeMap<String, CatalogNode>,
    segments: &[&str],
    leaf: Option<EndpointDescriptor>,
) {
    match segments {
        [] => {}
        [last] => match leaf {
            Some(descriptor) => {
                children.insert(last.to_string(), CatalogNode::Leaf(descriptor));
            }
            None => {
                children
                    .entry(last.to_string())
                    .or_insert_with(|| CatalogNode::Branch(BTreeMap::new()));
            }
        },
        [first, rest @ ..] => {
            let child = children
                .entry(first.to_string())
                .or_insert_with(|| CatalogNode::Branch(BTreeMap::new()));
            if let CatalogNode::Leaf(_) = child {
                *child = CatalogNode::Branch(BTreeMap::new());
            }
            if let CatalogNode::Branch(grandchildren) = child {
                insert_at(grandchildren, rest, leaf);
            }
        }
    }
}

impl Default for Catalog {
    /// The built-in DeckTutor catalog.
    fn default() -> Self {
        endpoints::default_catalog()
    }
}
