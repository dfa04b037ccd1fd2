//! Authentication token keys and `Authorization` header parsing
//!
//! Clients send `Authorization: Token <key>`. The scheme keyword is matched
//! case-insensitively.

use rand::Rng;
use thiserror::Error;

use super::to_hex;

/// Length of a token key in hex characters
pub const TOKEN_KEY_LENGTH: usize = 40;

/// Header scheme keyword
pub const TOKEN_KEYWORD: &str = "Token";

/// Problems with an `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenHeaderError {
    /// Header uses another scheme (e.g. `Bearer`); treated as no credentials
    #[error("Authentication credentials were not provided.")]
    OtherScheme,

    #[error("Invalid token header. No credentials provided.")]
    MissingKey,

    #[error("Invalid token header. Token string should not contain spaces.")]
    ContainsSpaces,
}

/// Generate a random 40-character hex token key
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; TOKEN_KEY_LENGTH / 2];
    rand::thread_rng().fill(&mut bytes);
    to_hex(&bytes)
}

/// Extract the key from an `Authorization` header value
pub fn parse_authorization_header(value: &str) -> Result<&str, TokenHeaderError> {
    let mut parts = value.split_whitespace();

    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Err(TokenHeaderError::OtherScheme),
    }

    let key = parts.next().ok_or(TokenHeaderError::MissingKey)?;
    if parts.next().is_some() {
        return Err(TokenHeaderError::ContainsSpaces);
    }

    Ok(key)
}
