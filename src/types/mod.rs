//! Common types used across the DeckTutor client library.

pub mod common;

pub use common::*;
