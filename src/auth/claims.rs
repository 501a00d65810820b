/// JWT Claims structure
///
/// Payload of an access token. Decoding goes through serde into this typed
/// record, so a token missing any field is rejected before its values are
/// looked at.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer marker carried by every access token.
pub const ACCESS_TOKEN_ISSUER: &str = "chirpy-access";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer, always `ACCESS_TOKEN_ISSUER` for tokens minted here
    pub iss: String,
    /// Subject (account id as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// # Arguments
    /// * `account_id` - Account the token is bound to
    /// * `issued_at` - Current time from the injected clock
    /// * `ttl` - Lifetime; may be negative, which yields an already expired token
    pub fn new(account_id: Uuid, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        let iat = issued_at.timestamp();
        Self {
            iss: ACCESS_TOKEN_ISSUER.to_string(),
            sub: account_id.to_string(),
            iat,
            exp: iat + ttl.num_seconds(),
        }
    }

    pub fn has_expected_issuer(&self) -> bool {
        self.iss == ACCESS_TOKEN_ISSUER
    }

    /// Expired once `now` is strictly past `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }

    pub fn account_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}
