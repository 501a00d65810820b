use actix_files as fs;
use actix_web::dev::Server;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AuthService, SystemClock};
use crate::configuration::Settings;
use crate::error::{AppError, ValidationError};
use crate::logger::RequestLogger;
use crate::middleware::FileserverHits;
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login, metrics,
    polka_webhook, refresh, reset, revoke, update_user, validate_chirp,
};
use crate::storage::Repositories;

/// Builds the HTTP server on an already bound listener.
///
/// Storage is passed in so the same wiring runs on Postgres in production
/// and on `MemoryStore` in the integration tests.
pub fn run(
    listener: TcpListener,
    repos: Repositories,
    settings: &Settings,
) -> Result<Server, std::io::Error> {
    let auth = web::Data::new(AuthService::new(
        &settings.auth,
        repos.accounts.clone(),
        repos.refresh_tokens.clone(),
        Arc::new(SystemClock),
    ));
    let repos = web::Data::new(repos);
    let platform = web::Data::new(settings.application.platform);
    let hits = FileserverHits::new();
    let hits_data = web::Data::new(hits.clone());
    let static_dir = settings.application.static_dir.clone();

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(auth.clone())
            .app_data(repos.clone())
            .app_data(platform.clone())
            .app_data(hits_data.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(query_error_handler))

            .service(
                web::scope("/api")
                    .route("/healthz", web::get().to(health_check))
                    .route("/users", web::post().to(create_user))
                    .route("/users", web::put().to(update_user))
                    .route("/login", web::post().to(login))
                    .route("/refresh", web::post().to(refresh))
                    .route("/revoke", web::post().to(revoke))
                    .route("/chirps", web::post().to(create_chirp))
                    .route("/chirps", web::get().to(list_chirps))
                    .route("/chirps/{chirp_id}", web::get().to(get_chirp))
                    .route("/chirps/{chirp_id}", web::delete().to(delete_chirp))
                    .route("/validate_chirp", web::post().to(validate_chirp))
                    .route("/polka/webhooks", web::post().to(polka_webhook)),
            )
            .service(
                web::scope("/admin")
                    .route("/metrics", web::get().to(metrics))
                    .route("/reset", web::post().to(reset)),
            )
            // Static files, counted for /admin/metrics
            .service(
                web::scope("/app")
                    .wrap(hits.clone())
                    .service(fs::Files::new("/", static_dir.clone()).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}

/// Body extraction failures get the same JSON error body as handler errors.
fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected request body");
    AppError::from(ValidationError::InvalidFormat("request body")).into()
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected query string");
    AppError::from(ValidationError::InvalidFormat("query string")).into()
}
