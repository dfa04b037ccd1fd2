//! Account primitives shared by the HTTP service and the CLI
//!
//! Contains ONLY pure functions: password hashing, token generation,
//! `Authorization` header parsing and email normalization. No database or
//! HTTP framework dependencies.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordHash};
pub use token::{generate_token_key, parse_authorization_header, TokenHeaderError, TOKEN_KEY_LENGTH};

/// Minimum accepted password length for new or changed passwords
pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Normalize an email address by lowercasing its domain part
///
/// The local part is case-sensitive and left untouched.
///
/// ```
/// use recipe_common::auth::normalize_email;
///
/// assert_eq!(normalize_email("Test2@Example.com"), "Test2@example.com");
/// assert_eq!(normalize_email("TEST3@EXAMPLE.COM"), "TEST3@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Lowercase hex encoding
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
