//! Salted, iterated SHA-256 password hashing
//!
//! Stored form: `password_hash = "sha256$<iterations>$<hex digest>"` with the
//! salt (32 hex chars) kept in a separate column. An empty hash marks an
//! unusable password that never verifies.

use rand::Rng;
use sha2::{Digest, Sha256};

use super::to_hex;

/// Iteration count for newly hashed passwords
pub const PASSWORD_ITERATIONS: u32 = 10_000;

const ALGORITHM: &str = "sha256";

/// Hash and salt ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

/// Hash `password` with a fresh random salt
pub fn hash_password(password: &str) -> PasswordHash {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill(&mut salt_bytes);
    let salt = to_hex(&salt_bytes);

    let digest = derive(password, &salt, PASSWORD_ITERATIONS);
    PasswordHash {
        hash: format!("{}${}${}", ALGORITHM, PASSWORD_ITERATIONS, digest),
        salt,
    }
}

/// Check `password` against a stored hash and salt
pub fn verify_password(password: &str, stored_hash: &str, salt: &str) -> bool {
    let mut parts = stored_hash.splitn(3, '$');
    let (Some(algorithm), Some(iterations), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };

    constant_time_eq(derive(password, salt, iterations).as_bytes(), expected.as_bytes())
}

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        hasher.update(password.as_bytes());
        digest = hasher.finalize();
    }

    format!("{:x}", digest)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
