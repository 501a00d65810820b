//! `PgStore` against a real Postgres.
//!
//! Each test creates its own database from `configuration.yaml` (or the
//! `APP_DATABASE__*` variables) and runs the migrations. When no server is
//! reachable the test prints a note and returns.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

use chirpy::auth::{hash_token, ManualClock, RefreshTokenError, RefreshTokenManager};
use chirpy::configuration::{get_configuration, DatabaseSettings};
use chirpy::storage::{ChirpRepository, PgStore, SortOrder, StoreError, UserRepository};

pub async fn configure_database(config: &DatabaseSettings) -> Option<PgPool> {
    let mut connection = match PgConnection::connect(&config.connection_string_without_db()).await {
        Ok(connection) => connection,
        Err(e) => {
            eprintln!("skipping Postgres test, server not reachable: {}", e);
            return None;
        }
    };
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    let connection_pool = PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database.");
    Some(connection_pool)
}

async fn test_pool() -> Option<PgPool> {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();
    configure_database(&configuration.database).await
}

/// Postgres keeps microseconds, so tests that compare timestamps start
/// the clock on a whole second.
fn whole_second_now() -> DateTime<Utc> {
    Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap()
}

async fn token_updated_at(pool: &PgPool, token: &str) -> DateTime<Utc> {
    let (updated_at,): (DateTime<Utc>,) =
        sqlx::query_as("SELECT updated_at FROM refresh_tokens WHERE token_hash = $1")
            .bind(hash_token(token))
            .fetch_one(pool)
            .await
            .unwrap();
    updated_at
}

#[tokio::test]
async fn refresh_token_lifecycle_on_postgres() {
    let Some(pool) = test_pool().await else { return };
    let store = Arc::new(PgStore::new(pool.clone()));
    let clock = Arc::new(ManualClock::new(whole_second_now()));
    let manager = RefreshTokenManager::new(store.clone(), clock.clone(), Duration::days(60));

    let account = UserRepository::create(store.as_ref(), "walt@breakingbad.com", "$2b$04$hash")
        .await
        .unwrap();
    let record = manager.create(account.id).await.unwrap();

    assert_eq!(manager.resolve(&record.token).await.unwrap(), account.id);

    manager.revoke(&record.token).await.unwrap();
    assert!(matches!(manager.resolve(&record.token).await, Err(RefreshTokenError::Revoked)));

    assert!(matches!(
        manager.resolve(&RefreshTokenManager::mint()).await,
        Err(RefreshTokenError::UnknownToken)
    ));
    assert!(matches!(
        manager.revoke(&RefreshTokenManager::mint()).await,
        Err(RefreshTokenError::UnknownToken)
    ));
}

#[tokio::test]
async fn refresh_token_expires_at_boundary_on_postgres() {
    let Some(pool) = test_pool().await else { return };
    let store = Arc::new(PgStore::new(pool));
    let clock = Arc::new(ManualClock::new(whole_second_now()));
    let manager = RefreshTokenManager::new(store.clone(), clock.clone(), Duration::days(60));

    let account = UserRepository::create(store.as_ref(), "a@example.com", "$2b$04$hash")
        .await
        .unwrap();
    let record = manager.create(account.id).await.unwrap();

    clock.set(record.expires_at - Duration::seconds(1));
    assert!(manager.resolve(&record.token).await.is_ok());

    clock.set(record.expires_at);
    assert!(matches!(manager.resolve(&record.token).await, Err(RefreshTokenError::Expired)));
}

#[tokio::test]
async fn repeated_revoke_keeps_first_revocation() {
    let Some(pool) = test_pool().await else { return };
    let store = Arc::new(PgStore::new(pool.clone()));
    let clock = Arc::new(ManualClock::new(whole_second_now()));
    let manager = RefreshTokenManager::new(store.clone(), clock.clone(), Duration::days(60));

    let account = UserRepository::create(store.as_ref(), "a@example.com", "$2b$04$hash")
        .await
        .unwrap();
    let record = manager.create(account.id).await.unwrap();

    clock.advance(Duration::minutes(5));
    manager.revoke(&record.token).await.unwrap();
    let first_update = token_updated_at(&pool, &record.token).await;
    let first_revocation = store_revoked_at(&pool, &record.token).await;

    clock.advance(Duration::minutes(5));
    manager.revoke(&record.token).await.unwrap();

    assert_eq!(token_updated_at(&pool, &record.token).await, first_update);
    assert_eq!(store_revoked_at(&pool, &record.token).await, first_revocation);
    assert_eq!(first_revocation, Some(record.created_at + Duration::minutes(5)));
}

async fn store_revoked_at(pool: &PgPool, token: &str) -> Option<DateTime<Utc>> {
    let (revoked_at,): (Option<DateTime<Utc>>,) =
        sqlx::query_as("SELECT revoked_at FROM refresh_tokens WHERE token_hash = $1")
            .bind(hash_token(token))
            .fetch_one(pool)
            .await
            .unwrap();
    revoked_at
}

#[tokio::test]
async fn refresh_tokens_are_stored_as_digests() {
    let Some(pool) = test_pool().await else { return };
    let store = Arc::new(PgStore::new(pool.clone()));
    let clock = Arc::new(ManualClock::new(whole_second_now()));
    let manager = RefreshTokenManager::new(store.clone(), clock, Duration::days(60));

    let account = UserRepository::create(store.as_ref(), "a@example.com", "$2b$04$hash")
        .await
        .unwrap();
    let record = manager.create(account.id).await.unwrap();

    let stored: Vec<(String,)> = sqlx::query_as("SELECT token_hash FROM refresh_tokens")
        .fetch_all(&pool)
        .await
        .unwrap();

    assert_eq!(stored.len(), 1);
    assert_ne!(stored[0].0, record.token);
    assert_eq!(stored[0].0, hash_token(&record.token));
}

#[tokio::test]
async fn duplicate_email_is_a_unique_violation() {
    let Some(pool) = test_pool().await else { return };
    let store = PgStore::new(pool);

    UserRepository::create(&store, "walt@breakingbad.com", "$2b$04$hash")
        .await
        .unwrap();
    let duplicate = UserRepository::create(&store, "walt@breakingbad.com", "$2b$04$other").await;

    assert!(matches!(duplicate, Err(StoreError::UniqueViolation(_))));
}

#[tokio::test]
async fn chirps_filter_by_author_and_sort() {
    let Some(pool) = test_pool().await else { return };
    let store = PgStore::new(pool);

    let walt = UserRepository::create(&store, "walt@breakingbad.com", "$2b$04$hash")
        .await
        .unwrap();
    let jesse = UserRepository::create(&store, "jesse@breakingbad.com", "$2b$04$hash")
        .await
        .unwrap();

    let first = ChirpRepository::create(&store, walt.id, "first").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = ChirpRepository::create(&store, jesse.id, "second").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let third = ChirpRepository::create(&store, walt.id, "third").await.unwrap();

    let all = store.list(None, SortOrder::Ascending).await.unwrap();
    let ids: Vec<Uuid> = all.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);

    let walts = store.list(Some(walt.id), SortOrder::Descending).await.unwrap();
    let ids: Vec<Uuid> = walts.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![third.id, first.id]);

    assert!(store.list(Some(Uuid::new_v4()), SortOrder::Ascending).await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_rows_report_not_found() {
    let Some(pool) = test_pool().await else { return };
    let store = PgStore::new(pool);

    assert!(matches!(ChirpRepository::delete(&store, Uuid::new_v4()).await, Err(StoreError::NotFound)));
    assert!(matches!(store.upgrade_to_chirpy_red(Uuid::new_v4()).await, Err(StoreError::NotFound)));
    assert!(store.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_all_cascades_to_chirps_and_tokens() {
    let Some(pool) = test_pool().await else { return };
    let store = Arc::new(PgStore::new(pool.clone()));
    let clock = Arc::new(ManualClock::new(whole_second_now()));
    let manager = RefreshTokenManager::new(store.clone(), clock, Duration::days(60));

    let account = UserRepository::create(store.as_ref(), "a@example.com", "$2b$04$hash")
        .await
        .unwrap();
    ChirpRepository::create(store.as_ref(), account.id, "hello").await.unwrap();
    let record = manager.create(account.id).await.unwrap();

    assert_eq!(store.delete_all().await.unwrap(), 1);

    assert!(store.list(None, SortOrder::Ascending).await.unwrap().is_empty());
    assert!(matches!(manager.resolve(&record.token).await, Err(RefreshTokenError::UnknownToken)));
}
