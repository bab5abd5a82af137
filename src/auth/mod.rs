//! Authentication for the DeckTutor API.
//!
//! This module provides:
//! - Credential management with secure password storage
//! - Sequence numbers for replay protection
//! - MD5 request signatures
//! - The cached, self-renewing session token

mod credentials;
mod manager;
mod sequence;
mod signature;
mod token;

pub use credentials::{
    Credentials, CredentialsProvider, EnvCredentials, PASSWORD_ENV_VAR, StaticCredentials,
    USERNAME_ENV_VAR,
};
pub use manager::TokenManager;
pub use sequence::{IncreasingSequence, SequenceProvider};
pub use signature::sign_sequence;
pub use token::Token;
