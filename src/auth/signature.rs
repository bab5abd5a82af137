//! Request signature generation for DeckTutor authentication.
//!
//! Authenticated requests carry a signature computed as:
//! ```text
//! hex(MD5(format!("{sequence:02}:{auth_token_secret}")))
//! ```
//!
//! The digest is part of the wire format the server verifies; it is not a
//! security boundary on its own.

use md5::{Digest, Md5};

/// Sign a sequence number with the token secret.
///
/// # Example
///
/// ```rust
/// use decktutor_sdk::auth::sign_sequence;
///
/// let signature = sign_sequence(7, "secret");
/// assert_eq!(signature, "4f3a5b5010567342a8c13e9894b87de5");
/// ```
pub fn sign_sequence(sequence: u64, auth_token_secret: &str) -> String {
    let message = format!("{sequence:02}:{auth_token_secret}");
    hex::encode(Md5::digest(message.as_bytes()))
}
