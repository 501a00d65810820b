use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::configuration::Platform;
use crate::error::AppError;
use crate::middleware::FileserverHits;
use crate::storage::Repositories;

#[derive(Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub deleted_users: u64,
}

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<FileserverHits>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(format!(
            r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
            hits.count()
        ))
}

/// POST /admin/reset
///
/// Deletes every account (chirps and refresh tokens go with them) and
/// zeroes the hit counter. Only allowed on the `dev` platform.
///
/// # Errors
/// - 403: not running on the `dev` platform
pub async fn reset(
    platform: web::Data<Platform>,
    hits: web::Data<FileserverHits>,
    repos: web::Data<Repositories>,
) -> Result<HttpResponse, AppError> {
    if *platform.get_ref() != Platform::Dev {
        return Err(AppError::Forbidden("reset is only allowed in dev".to_string()));
    }

    let deleted_users = repos.users.delete_all().await?;
    hits.reset();

    tracing::warn!(deleted_users, "Application state reset");

    Ok(HttpResponse::Ok().json(ResetResponse {
        message: "successfully deleted all users".to_string(),
        deleted_users,
    }))
}
