//! # DeckTutor SDK
//!
//! An async Rust client for the DeckTutor marketplace REST API.
//!
//! ## Features
//!
//! - Every API operation described by a navigable endpoint catalog
//! - Session tokens cached per client and renewed on expiry
//! - MD5 request signing with a monotonically increasing sequence
//! - A single automatic retry when the server rejects a token
//! - Offset/limit pagination from page numbers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use decktutor_sdk::config::ClientConfig;
//! use decktutor_sdk::dispatcher::DeckTutor;
//! use decktutor_sdk::rest::{ApiFactory, CallArgs};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let factory = Arc::new(ApiFactory::new());
//!     factory.configure(ClientConfig::new("user", "password"))?;
//!
//!     let client = DeckTutor::new(factory);
//!     let cards = client
//!         .call("search.card_name", CallArgs::new().param("name", "Black Lotus").page(0))
//!         .await?;
//!     println!("{cards}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod rest;
pub mod types;

// Re-export commonly used types at crate root
pub use config::ClientConfig;
pub use dispatcher::DeckTutor;
pub use error::DeckTutorError;
pub use types::common::{HttpMethod, Mode, ResolverKind};

/// Result type alias using DeckTutorError
pub type Result<T> = std::result::Result<T, DeckTutorError>;
