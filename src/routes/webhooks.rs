use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthService;
use crate::error::{AppError, ValidationError};
use crate::storage::{Repositories, StoreError};

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize)]
pub struct WebhookData {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct PolkaWebhook {
    pub event: String,
    pub data: WebhookData,
}

/// POST /api/polka/webhooks
///
/// Payment provider callback, authenticated with `Authorization: ApiKey <key>`.
/// Only `user.upgraded` has an effect; any other event is acknowledged with
/// 204 and ignored. The key is checked before the body is parsed, so an
/// unauthenticated caller never learns anything about the payload format.
///
/// # Errors
/// - 401: missing or wrong API key
/// - 400: body is not a webhook payload
/// - 404: the upgraded user does not exist
pub async fn polka_webhook(
    req: HttpRequest,
    body: web::Bytes,
    auth: web::Data<AuthService>,
    repos: web::Data<Repositories>,
) -> Result<HttpResponse, AppError> {
    auth.authenticate_webhook(req.headers())?;

    let payload: PolkaWebhook = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "Malformed webhook payload");
        ValidationError::InvalidFormat("webhook payload")
    })?;

    if payload.event != USER_UPGRADED {
        tracing::debug!(event = %payload.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    match repos.users.upgrade_to_chirpy_red(payload.data.user_id).await {
        Ok(()) => {
            tracing::info!(user_id = %payload.data.user_id, "User upgraded to Chirpy Red");
            Ok(HttpResponse::NoContent().finish())
        }
        Err(StoreError::NotFound) => Err(AppError::NotFound("User".to_string())),
        Err(e) => Err(e.into()),
    }
}
