/// Authentication module
///
/// Password hashing, credential extraction from headers, stateless access
/// tokens, persisted refresh tokens, and the `AuthService` facade that ties
/// them together.

pub mod clock;
pub mod crypto;
pub mod header;
mod claims;
mod jwt;
mod password;
mod refresh_token;
mod service;

pub use claims::{Claims, ACCESS_TOKEN_ISSUER};
pub use clock::{Clock, ManualClock, SystemClock};
pub use crypto::hash_token;
pub use header::{extract_api_key, extract_bearer, HeaderError};
pub use jwt::{clamp_ttl, AccessTokenCodec, TokenError, MAX_ACCESS_TOKEN_TTL_SECONDS};
pub use password::{PasswordError, PasswordHasher};
pub use refresh_token::{RefreshTokenError, RefreshTokenManager, DEFAULT_REFRESH_TOKEN_TTL_DAYS};
pub use service::{AuthError, AuthService, Session};
