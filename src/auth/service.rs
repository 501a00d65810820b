/// Authentication Facade
///
/// The only entry point route handlers use for credentials. It composes the
/// password hasher, header extraction, the access token codec and the
/// refresh token manager, and collapses their detailed failures into the
/// small `AuthError` set the HTTP layer maps to status codes. The detailed
/// reason is logged here, never returned to the client.

use std::sync::Arc;

use actix_web::http::header::HeaderMap;
use chrono::Duration;
use uuid::Uuid;

use crate::auth::clock::Clock;
use crate::auth::crypto::constant_time_str_eq;
use crate::auth::header::{extract_api_key, extract_bearer};
use crate::auth::jwt::{clamp_ttl, AccessTokenCodec};
use crate::auth::password::{PasswordError, PasswordHasher};
use crate::auth::refresh_token::{RefreshTokenError, RefreshTokenManager};
use crate::configuration::{AuthSettings, SecretString};
use crate::storage::{Account, AccountDirectory, RefreshTokenRepository, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("incorrect email or password")]
    InvalidCredential,
    #[error("unauthorized")]
    Unauthorized,
    #[error("refresh token is not known")]
    UnknownToken,
    #[error("password hashing failed: {0}")]
    HashingFailure(String),
    #[error("stored password hash is malformed")]
    CorruptHash,
    #[error("access token could not be signed: {0}")]
    Signing(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::InvalidCredential => AuthError::InvalidCredential,
            PasswordError::CorruptHash => AuthError::CorruptHash,
            PasswordError::HashingFailure(msg) => AuthError::HashingFailure(msg),
        }
    }
}

/// Everything a successful login hands back to the client.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct AuthService {
    hasher: PasswordHasher,
    codec: AccessTokenCodec,
    refresh_tokens: RefreshTokenManager,
    accounts: Arc<dyn AccountDirectory>,
    jwt_secret: SecretString,
    polka_key: SecretString,
    access_ttl: Duration,
    /// Hash at the configured cost, checked when the email is unknown so
    /// both login failures spend the same bcrypt time.
    dummy_hash: Option<String>,
}

const DUMMY_PASSWORD: &str = "chirpy-login-placeholder";

impl AuthService {
    /// # Arguments
    /// * `settings` - Validated auth settings (secrets, bcrypt cost, lifetimes)
    /// * `accounts` - Account lookup used by login
    /// * `refresh_repo` - Authoritative refresh token store
    /// * `clock` - Time source shared by both token kinds
    pub fn new(
        settings: &AuthSettings,
        accounts: Arc<dyn AccountDirectory>,
        refresh_repo: Arc<dyn RefreshTokenRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let hasher = PasswordHasher::new(settings.bcrypt_cost);
        let dummy_hash = match hasher.hash(DUMMY_PASSWORD) {
            Ok(hash) => Some(hash),
            Err(e) => {
                tracing::warn!(error = %e, "Could not prepare placeholder hash for unknown-email logins");
                None
            }
        };

        Self {
            hasher,
            codec: AccessTokenCodec::new(clock.clone()),
            refresh_tokens: RefreshTokenManager::new(
                refresh_repo,
                clock,
                Duration::days(settings.refresh_token_ttl_days),
            ),
            accounts,
            jwt_secret: settings.jwt_secret.clone(),
            polka_key: settings.polka_key.clone(),
            access_ttl: Duration::seconds(settings.access_token_ttl_seconds),
            dummy_hash,
        }
    }

    /// Hash a new password on the blocking pool
    ///
    /// # Errors
    /// Returns `HashingFailure` if bcrypt fails or the blocking task is lost
    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = self.hasher;
        let password = password.to_string();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?
            .map_err(AuthError::from)
    }

    /// Log an account in and open a session
    ///
    /// `requested_ttl` is the client-supplied access token lifetime in
    /// seconds and goes through `clamp_ttl`.
    ///
    /// # Errors
    /// - `InvalidCredential` for an unknown email or a wrong password alike
    /// - `CorruptHash` / `HashingFailure` for server-side hashing problems
    /// - `Store` if the account lookup or the refresh token insert fails
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl: Option<i64>,
    ) -> Result<Session, AuthError> {
        let account = match self.accounts.find_by_email(email).await? {
            Some(account) => account,
            None => {
                tracing::warn!("Login attempt for unknown email");
                self.verify_placeholder(password).await;
                return Err(AuthError::InvalidCredential);
            }
        };

        let hasher = self.hasher;
        let password = password.to_string();
        let stored_hash = account.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AuthError::HashingFailure(e.to_string()))?;

        if let Err(e) = verified {
            tracing::warn!(account_id = %account.id, reason = %e, "Login rejected");
            return Err(e.into());
        }

        let access_token = self
            .codec
            .issue(account.id, self.jwt_secret.expose().as_bytes(), clamp_ttl(requested_ttl))
            .map_err(|e| AuthError::Signing(e.to_string()))?;

        let refresh = self.refresh_tokens.create(account.id).await.map_err(|e| match e {
            RefreshTokenError::Store(store) => AuthError::Store(store),
            other => AuthError::Store(StoreError::Query(other.to_string())),
        })?;

        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(Session {
            account,
            access_token,
            refresh_token: refresh.token,
        })
    }

    /// Burn one bcrypt verification against the placeholder hash. The
    /// outcome is discarded.
    async fn verify_placeholder(&self, password: &str) {
        let dummy = match self.dummy_hash.clone() {
            Some(dummy) => dummy,
            None => return,
        };
        let hasher = self.hasher;
        let password = password.to_string();

        if let Err(e) = tokio::task::spawn_blocking(move || hasher.verify(&password, &dummy)).await {
            tracing::warn!(error = %e, "Placeholder verification task failed");
        }
    }

    /// Resolve the bearer access token of a request to its account id
    ///
    /// # Errors
    /// Returns `Unauthorized` for any header or token failure
    pub fn authenticate_bearer(&self, headers: &HeaderMap) -> Result<Uuid, AuthError> {
        let token = extract_bearer(headers).map_err(|e| {
            tracing::warn!(reason = %e, "Bearer credential rejected");
            AuthError::Unauthorized
        })?;

        self.codec
            .validate(token, self.jwt_secret.expose().as_bytes())
            .map_err(|e| {
                tracing::warn!(reason = %e, "Access token rejected");
                AuthError::Unauthorized
            })
    }

    /// Exchange the bearer refresh token of a request for a new access token
    ///
    /// The refresh token itself is left as is and stays usable.
    ///
    /// # Errors
    /// - `Unauthorized` if the header is missing or the token is unknown,
    ///   revoked or expired
    /// - `Store` if the store cannot be reached
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let token = extract_bearer(headers).map_err(|e| {
            tracing::warn!(reason = %e, "Refresh credential rejected");
            AuthError::Unauthorized
        })?;

        let account_id = match self.refresh_tokens.resolve(token).await {
            Ok(account_id) => account_id,
            Err(RefreshTokenError::Store(e)) => return Err(AuthError::Store(e)),
            Err(e) => {
                tracing::warn!(reason = %e, "Refresh token rejected");
                return Err(AuthError::Unauthorized);
            }
        };

        self.codec
            .issue(account_id, self.jwt_secret.expose().as_bytes(), self.access_ttl)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Revoke the bearer refresh token of a request
    ///
    /// # Errors
    /// - `Unauthorized` if the header carries no usable credential
    /// - `UnknownToken` if the token was never issued
    /// - `Store` if the store cannot be reached
    pub async fn revoke_session(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let token = extract_bearer(headers).map_err(|e| {
            tracing::warn!(reason = %e, "Revoke credential rejected");
            AuthError::Unauthorized
        })?;

        match self.refresh_tokens.revoke(token).await {
            Ok(()) => Ok(()),
            Err(RefreshTokenError::Store(e)) => Err(AuthError::Store(e)),
            Err(e) => {
                tracing::warn!(reason = %e, "Revoke of unknown refresh token");
                Err(AuthError::UnknownToken)
            }
        }
    }

    /// Check the payment provider's `ApiKey` credential
    ///
    /// # Errors
    /// Returns `Unauthorized` if the key is absent or does not match
    pub fn authenticate_webhook(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let key = extract_api_key(headers).map_err(|e| {
            tracing::warn!(reason = %e, "Webhook credential rejected");
            AuthError::Unauthorized
        })?;

        if !constant_time_str_eq(key, self.polka_key.expose()) {
            tracing::warn!("Webhook API key mismatch");
            return Err(AuthError::Unauthorized);
        }

        Ok(())
    }
}
