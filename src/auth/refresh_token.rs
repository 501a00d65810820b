/// Refresh Token Management
///
/// Refresh tokens are opaque 256-bit random strings, persisted so they can
/// be revoked. Every check reads the store directly; nothing about a token's
/// state is cached in process, so a completed revoke is seen by the next
/// resolve on any worker.

use std::sync::Arc;

use chrono::Duration;
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::auth::clock::Clock;
use crate::storage::{RefreshTokenRecord, RefreshTokenRepository, StoreError};

/// Bytes of OS randomness behind each token (hex-encoded to 64 chars).
const TOKEN_BYTES: usize = 32;

/// Default lifetime of a refresh token.
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenError {
    #[error("refresh token is not known")]
    UnknownToken,
    #[error("refresh token has been revoked")]
    Revoked,
    #[error("refresh token has expired")]
    Expired,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct RefreshTokenManager {
    repo: Arc<dyn RefreshTokenRepository>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl RefreshTokenManager {
    /// # Arguments
    /// * `repo` - Authoritative refresh token store
    /// * `clock` - Time source for creation, expiry and revocation
    /// * `ttl` - Lifetime of newly created tokens
    pub fn new(repo: Arc<dyn RefreshTokenRepository>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { repo, clock, ttl }
    }

    /// Generate a fresh token string
    ///
    /// Collisions are not re-checked here; the store's uniqueness
    /// constraint rejects a duplicate insert.
    pub fn mint() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Mint and persist a refresh token for an account
    ///
    /// The record is only returned once the insert has succeeded.
    ///
    /// # Errors
    /// Returns `Store` if the insert fails
    pub async fn create(&self, account_id: Uuid) -> Result<RefreshTokenRecord, RefreshTokenError> {
        let now = self.clock.now();
        let record = RefreshTokenRecord {
            token: Self::mint(),
            account_id,
            created_at: now,
            expires_at: now + self.ttl,
            revoked_at: None,
        };

        self.repo.insert(&record).await?;
        tracing::debug!(account_id = %account_id, expires_at = %record.expires_at, "Refresh token created");

        Ok(record)
    }

    /// Resolve a refresh token to the account it belongs to
    ///
    /// # Errors
    /// - `UnknownToken` if no record exists
    /// - `Revoked` if the token was revoked, whether or not it has also expired
    /// - `Expired` once the clock reaches `expires_at`
    pub async fn resolve(&self, token: &str) -> Result<Uuid, RefreshTokenError> {
        let record = self
            .repo
            .find_by_token(token)
            .await?
            .ok_or(RefreshTokenError::UnknownToken)?;

        if record.revoked_at.is_some() {
            return Err(RefreshTokenError::Revoked);
        }

        if self.clock.now() >= record.expires_at {
            return Err(RefreshTokenError::Expired);
        }

        Ok(record.account_id)
    }

    /// Revoke a refresh token
    ///
    /// Revoking an already revoked token succeeds and keeps the original
    /// revocation time.
    ///
    /// # Errors
    /// Returns `UnknownToken` if no record exists
    pub async fn revoke(&self, token: &str) -> Result<(), RefreshTokenError> {
        match self.repo.mark_revoked(token, self.clock.now()).await {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound) => Err(RefreshTokenError::UnknownToken),
            Err(e) => Err(e.into()),
        }
    }
}
