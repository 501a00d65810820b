/// Chirp Routes
///
/// Creating, listing, reading and deleting chirps, plus the stateless
/// `validate_chirp` helper. Bodies are validated and run through the
/// profanity filter before they are stored.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::AuthenticatedUser;
use crate::profanity;
use crate::storage::{Repositories, SortOrder};
use crate::validators::is_valid_chirp;

#[derive(Deserialize)]
pub struct ChirpRequest {
    pub body: String,
}

#[derive(Serialize)]
pub struct CleanedChirp {
    pub cleaned_body: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortParam {
    Asc,
    Desc,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub author_id: Option<Uuid>,
    pub sort: Option<SortParam>,
}

impl From<SortParam> for SortOrder {
    fn from(sort: SortParam) -> Self {
        match sort {
            SortParam::Asc => SortOrder::Ascending,
            SortParam::Desc => SortOrder::Descending,
        }
    }
}

/// Validates a body and returns it with banned words masked.
fn clean_body(body: &str) -> Result<String, AppError> {
    is_valid_chirp(body)?;
    Ok(profanity::clean(body))
}

/// POST /api/chirps
///
/// # Errors
/// - 400: empty body or longer than 140 characters
/// - 401: missing or invalid access token
pub async fn create_chirp(
    user: AuthenticatedUser,
    form: web::Json<ChirpRequest>,
    repos: web::Data<Repositories>,
) -> Result<HttpResponse, AppError> {
    let body = clean_body(&form.body)?;
    let chirp = repos.chirps.create(user.id(), &body).await?;

    tracing::info!(chirp_id = %chirp.id, user_id = %user.id(), "Chirp created");

    Ok(HttpResponse::Created().json(chirp))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
///
/// Ordered by creation time, oldest first unless `sort=desc`.
pub async fn list_chirps(
    query: web::Query<ListQuery>,
    repos: web::Data<Repositories>,
) -> Result<HttpResponse, AppError> {
    let order = query.sort.map(SortOrder::from).unwrap_or_default();
    let chirps = repos.chirps.list(query.author_id, order).await?;

    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{id}
pub async fn get_chirp(
    path: web::Path<Uuid>,
    repos: web::Data<Repositories>,
) -> Result<HttpResponse, AppError> {
    let chirp = repos
        .chirps
        .get(path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("Chirp".to_string()))?;

    Ok(HttpResponse::Ok().json(chirp))
}

/// DELETE /api/chirps/{id}
///
/// # Errors
/// - 401: missing or invalid access token
/// - 403: the caller is not the author
/// - 404: no such chirp
pub async fn delete_chirp(
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    repos: web::Data<Repositories>,
) -> Result<HttpResponse, AppError> {
    let chirp_id = path.into_inner();
    let chirp = repos
        .chirps
        .get(chirp_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chirp".to_string()))?;

    if chirp.user_id != user.id() {
        return Err(AppError::Forbidden("only the author can delete a chirp".to_string()));
    }

    repos.chirps.delete(chirp_id).await?;
    tracing::info!(chirp_id = %chirp_id, user_id = %user.id(), "Chirp deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/validate_chirp
pub async fn validate_chirp(form: web::Json<ChirpRequest>) -> Result<HttpResponse, AppError> {
    let cleaned_body = clean_body(&form.body)?;
    Ok(HttpResponse::Ok().json(CleanedChirp { cleaned_body }))
}
