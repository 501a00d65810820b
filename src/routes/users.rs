/// Account Routes
///
/// Registration and credential updates. Passwords are validated, hashed by
/// the `AuthService` on the blocking pool, and only the hash is stored.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthService;
use crate::error::AppError;
use crate::extractors::AuthenticatedUser;
use crate::storage::{Account, Repositories};
use crate::validators::{is_valid_email, is_valid_password};

#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account. The password hash never leaves the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            created_at: account.created_at,
            updated_at: account.updated_at,
            email: account.email,
            is_chirpy_red: account.is_chirpy_red,
        }
    }
}

/// POST /api/users
///
/// # Errors
/// - 400: invalid email or empty password
/// - 409: email already registered
pub async fn create_user(
    form: web::Json<CredentialsRequest>,
    repos: web::Data<Repositories>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let password_hash = auth.hash_password(&form.password).await?;
    let account = repos.users.create(&email, &password_hash).await?;

    tracing::info!(user_id = %account.id, "User registered");

    Ok(HttpResponse::Created().json(UserResponse::from(account)))
}

/// PUT /api/users
///
/// Replaces the caller's email and password.
///
/// # Errors
/// - 401: missing or invalid access token
/// - 404: the account behind the token no longer exists
pub async fn update_user(
    user: AuthenticatedUser,
    form: web::Json<CredentialsRequest>,
    repos: web::Data<Repositories>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    is_valid_password(&form.password)?;

    let password_hash = auth.hash_password(&form.password).await?;
    let account = repos
        .users
        .update_credentials(user.id(), &email, &password_hash)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

    tracing::info!(user_id = %account.id, "User credentials updated");

    Ok(HttpResponse::Ok().json(UserResponse::from(account)))
}
