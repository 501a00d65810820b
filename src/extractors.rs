//! Request extractors for authenticated routes.

use std::future::{ready, Ready};

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::error::AppError;

/// Account id of the caller, taken from a valid `Bearer` access token.
///
/// Handlers that take this argument reject unauthenticated requests with
/// 401 before their body runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub Uuid);

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AuthService>>() {
            Some(auth) => auth
                .authenticate_bearer(req.headers())
                .map(AuthenticatedUser)
                .map_err(AppError::from),
            None => Err(AppError::Internal("AuthService is not registered".to_string())),
        };

        ready(result)
    }
}
