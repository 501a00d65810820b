//! Small primitives shared by the token code: constant-time comparison and
//! the one-way digest refresh tokens are stored under.

use sha2::{Digest, Sha256};

/// Compares two byte slices without short-circuiting on the first mismatch.
/// Length is not treated as secret.
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[inline]
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    constant_time_eq(a.as_bytes(), b.as_bytes())
}

/// SHA-256 of a refresh token, lowercase hex. Only the digest reaches the database.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
