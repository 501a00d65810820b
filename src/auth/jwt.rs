/// Access Token Generation and Validation
///
/// Access tokens are HS256 JWTs (`header.payload.signature`, base64url).
/// They are stateless: nothing is stored and nothing can revoke one before
/// `exp`, which is why their lifetime is capped at one hour.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::clock::Clock;

/// Upper bound (and default) for an access token lifetime.
pub const MAX_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;

/// Reasons an access token is refused
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is not a well-formed JWT")]
    Malformed,
    #[error("token signature does not match")]
    SignatureInvalid,
    #[error("token was not issued as an access token")]
    WrongIssuer,
    #[error("token has expired")]
    Expired,
    #[error("token subject is not an account id")]
    MalformedSubject,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Lifetime to use for a TTL that came from an untrusted caller.
///
/// Values in `(0, 3600]` seconds are kept; anything else, including no
/// value at all, falls back to one hour.
pub fn clamp_ttl(requested_seconds: Option<i64>) -> Duration {
    match requested_seconds {
        Some(seconds) if seconds > 0 && seconds <= MAX_ACCESS_TOKEN_TTL_SECONDS => {
            Duration::seconds(seconds)
        }
        _ => Duration::seconds(MAX_ACCESS_TOKEN_TTL_SECONDS),
    }
}

#[derive(Clone)]
pub struct AccessTokenCodec {
    clock: Arc<dyn Clock>,
}

impl AccessTokenCodec {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Issue a signed access token for an account
    ///
    /// `ttl` is used as given; callers holding an untrusted value pass it
    /// through `clamp_ttl` first.
    ///
    /// # Errors
    /// Returns `Encoding` if the claims cannot be serialized or signed
    pub fn issue(&self, account_id: Uuid, secret: &[u8], ttl: Duration) -> Result<String, TokenError> {
        let claims = Claims::new(account_id, self.clock.now(), ttl);

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Validate an access token and return the account it is bound to
    ///
    /// Checks run in a fixed order: signature, issuer, expiry, subject.
    pub fn validate(&self, token: &str, secret: &[u8]) -> Result<Uuid, TokenError> {
        let claims = self.decode_verified(token, secret)?;

        if !claims.has_expected_issuer() {
            return Err(TokenError::WrongIssuer);
        }

        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        claims.account_id().ok_or(TokenError::MalformedSubject)
    }

    /// Verifies the MAC and decodes the typed claims. Time-based and issuer
    /// checks are left to `validate` so they use the injected clock and
    /// report distinct errors.
    fn decode_verified(&self, token: &str, secret: &[u8]) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                _ => TokenError::Malformed,
            })
    }
}
