/// Password Hashing and Verification
///
/// bcrypt with a configurable work factor. Every call to `hash` embeds a
/// fresh random salt, so hashing the same password twice never yields the
/// same string. Both operations are CPU-bound; async callers go
/// through `AuthService`, which moves them onto the blocking pool.

use bcrypt::{hash, verify};

/// Errors raised while hashing or checking a password
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password does not match")]
    InvalidCredential,
    #[error("stored password hash is malformed")]
    CorruptHash,
    #[error("password hashing failed: {0}")]
    HashingFailure(String),
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// # Arguments
    /// * `cost` - bcrypt cost, i.e. log2 of the number of key-expansion rounds
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password
    ///
    /// # Errors
    /// Returns `HashingFailure` if bcrypt cannot produce a hash (for example
    /// when the OS random source is unavailable). Not retried.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash(password, self.cost).map_err(|e| PasswordError::HashingFailure(e.to_string()))
    }

    /// Verify a password against a stored bcrypt hash
    ///
    /// # Errors
    /// - `InvalidCredential` if the password does not match
    /// - `CorruptHash` if `hash` is not a well-formed bcrypt record
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), PasswordError> {
        match verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordError::InvalidCredential),
            Err(e) => {
                tracing::error!(error = %e, "Stored password hash could not be parsed");
                Err(PasswordError::CorruptHash)
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
