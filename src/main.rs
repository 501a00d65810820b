use std::net::TcpListener;

use chirpy::configuration::get_configuration;
use chirpy::error::AppError;
use chirpy::startup::run;
use chirpy::storage::{Repositories, StoreError};
use chirpy::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        tracing::error!("Failed to read configuration: {}", e);
        AppError::from(e)
    })?;

    configuration.validate().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        AppError::from(e)
    })?;
    tracing::info!(platform = ?configuration.application.platform, "Configuration loaded successfully");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            AppError::Store(StoreError::from(e))
        })?;

    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        AppError::Internal(format!("migration failed: {}", e))
    })?;
    tracing::info!("Database ready");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, Repositories::postgres(pool), &configuration)?;
    server.await?;
    Ok(())
}
