//! Persistence collaborators.
//!
//! Every store is an `async-trait` object so the HTTP layer and the auth
//! core run unchanged against Postgres (`PgStore`) or memory (`MemoryStore`).

mod memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate entry: {0}")]
    UniqueViolation(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::UniqueViolation(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut => StoreError::Unavailable("connection pool timed out".to_string()),
            sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
            sqlx::Error::Io(e) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// A registered account. `password_hash` is a bcrypt record and is never
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chirp {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

/// Persisted refresh token.
///
/// `revoked_at` only ever moves from `None` to `Some`; records are kept
/// after revocation and expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub account_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Read side of the account store used by authentication.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `UniqueViolation` if the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<Account, StoreError>;
    /// Returns `None` if no account has this id.
    async fn update_credentials(
        &self,
        id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, StoreError>;
    /// Fails with `NotFound` if no account has this id.
    async fn upgrade_to_chirpy_red(&self, id: Uuid) -> Result<(), StoreError>;
    /// Removes every account together with its chirps and refresh tokens.
    async fn delete_all(&self) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait ChirpRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, body: &str) -> Result<Chirp, StoreError>;
    async fn list(&self, author: Option<Uuid>, order: SortOrder) -> Result<Vec<Chirp>, StoreError>;
    async fn get(&self, id: Uuid) -> Result<Option<Chirp>, StoreError>;
    /// Fails with `NotFound` if the chirp does not exist.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Authoritative store for refresh tokens. Each call is atomic on its own.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Fails with `UniqueViolation` if the token already exists.
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;
    /// Sets `revoked_at` if it is unset and leaves an existing value alone.
    /// Fails with `NotFound` if the token does not exist.
    async fn mark_revoked(&self, token: &str, revoked_at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// The set of stores the application runs on.
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountDirectory>,
    pub users: Arc<dyn UserRepository>,
    pub chirps: Arc<dyn ChirpRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AccountDirectory + UserRepository + ChirpRepository + RefreshTokenRepository + 'static,
    {
        Self {
            accounts: store.clone(),
            users: store.clone(),
            chirps: store.clone(),
            refresh_tokens: store,
        }
    }
}
