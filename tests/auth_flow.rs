//! End-to-end session lifecycle through `AuthService`, with an in-memory
//! store and a clock the test controls.

use std::sync::Arc;

use actix_web::http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use chirpy::auth::{AuthError, AuthService, ManualClock};
use chirpy::configuration::{AuthSettings, SecretString};
use chirpy::storage::{MemoryStore, UserRepository};
use chrono::{Duration, Utc};

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

fn setup() -> (AuthService, Arc<MemoryStore>, Arc<ManualClock>) {
    let settings = AuthSettings {
        jwt_secret: SecretString::new("flow-test-secret-that-is-long-enough"),
        polka_key: SecretString::new("polka"),
        bcrypt_cost: 4,
        access_token_ttl_seconds: 3600,
        refresh_token_ttl_days: 60,
    };
    let store = Arc::new(MemoryStore::default());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service = AuthService::new(&settings, store.clone(), store.clone(), clock.clone());
    (service, store, clock)
}

async fn register(service: &AuthService, store: &MemoryStore) -> uuid::Uuid {
    let hash = service.hash_password("04234").await.unwrap();
    UserRepository::create(store, "lane@example.com", &hash)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn login_refresh_revoke_lifecycle() {
    let (service, store, _) = setup();
    let account_id = register(&service, &store).await;

    let session = service.login("lane@example.com", "04234", None).await.unwrap();
    let refresh_headers = bearer(&session.refresh_token);

    let new_access = service.refresh(&refresh_headers).await.unwrap();
    assert_eq!(service.authenticate_bearer(&bearer(&new_access)).unwrap(), account_id);

    service.revoke_session(&refresh_headers).await.unwrap();

    assert!(matches!(
        service.refresh(&refresh_headers).await,
        Err(AuthError::Unauthorized)
    ));
    // access tokens are stateless and survive the revoke until they expire
    assert_eq!(service.authenticate_bearer(&bearer(&new_access)).unwrap(), account_id);
}

#[tokio::test]
async fn refresh_does_not_rotate() {
    let (service, store, _) = setup();
    register(&service, &store).await;

    let session = service.login("lane@example.com", "04234", None).await.unwrap();
    let headers = bearer(&session.refresh_token);

    for _ in 0..3 {
        assert!(service.refresh(&headers).await.is_ok());
    }
}

#[tokio::test]
async fn refresh_token_expires_after_sixty_days() {
    let (service, store, clock) = setup();
    register(&service, &store).await;

    let session = service.login("lane@example.com", "04234", None).await.unwrap();
    let headers = bearer(&session.refresh_token);

    clock.advance(Duration::days(60) - Duration::seconds(1));
    assert!(service.refresh(&headers).await.is_ok());

    clock.advance(Duration::seconds(1));
    assert!(matches!(
        service.refresh(&headers).await,
        Err(AuthError::Unauthorized)
    ));
}

#[tokio::test]
async fn refreshed_access_token_lives_one_hour() {
    let (service, store, clock) = setup();
    register(&service, &store).await;

    let session = service.login("lane@example.com", "04234", Some(30)).await.unwrap();
    let access = bearer(&session.access_token);
    let refreshed = service.refresh(&bearer(&session.refresh_token)).await.unwrap();

    clock.advance(Duration::seconds(31));
    // requested 30s lifetime applies to the login token only
    assert!(service.authenticate_bearer(&access).is_err());
    assert!(service.authenticate_bearer(&bearer(&refreshed)).is_ok());

    clock.advance(Duration::seconds(3600));
    assert!(service.authenticate_bearer(&bearer(&refreshed)).is_err());
}

#[tokio::test]
async fn sessions_are_independent() {
    let (service, store, _) = setup();
    register(&service, &store).await;

    let first = service.login("lane@example.com", "04234", None).await.unwrap();
    let second = service.login("lane@example.com", "04234", None).await.unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    service.revoke_session(&bearer(&first.refresh_token)).await.unwrap();

    assert!(service.refresh(&bearer(&first.refresh_token)).await.is_err());
    assert!(service.refresh(&bearer(&second.refresh_token)).await.is_ok());
}
