//! Integration tests for the service and admin endpoints

mod common;

use chirpy::configuration::Platform;
use common::{spawn_app, spawn_app_on};

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/api/healthz"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn static_files_are_served_and_counted() {
    let app = spawn_app();

    for _ in 0..2 {
        let response = app
            .client
            .get(app.url("/app/"))
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success());
        assert!(response.text().await.unwrap().contains("Welcome to Chirpy"));
    }

    let metrics = app
        .client
        .get(app.url("/admin/metrics"))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(metrics.status().is_success());
    assert!(metrics
        .text()
        .await
        .unwrap()
        .contains("Chirpy has been visited 2 times!"));
}

#[tokio::test]
async fn api_requests_are_not_counted() {
    let app = spawn_app();

    app.client
        .get(app.url("/api/healthz"))
        .send()
        .await
        .expect("Failed to execute request");

    let metrics = app
        .client
        .get(app.url("/admin/metrics"))
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .unwrap();

    assert!(metrics.contains("visited 0 times"));
}

#[tokio::test]
async fn reset_deletes_users_and_hits_in_dev() {
    let app = spawn_app();
    app.signed_in_user("walt@breakingbad.com", "pw-123456").await;
    app.client.get(app.url("/app/")).send().await.unwrap();

    let response = app
        .client
        .post(app.url("/admin/reset"))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    // the account is gone, so the email can be registered again
    let again = app.create_user("walt@breakingbad.com", "pw-123456").await;
    assert_eq!(again.status().as_u16(), 201);

    let metrics = app
        .client
        .get(app.url("/admin/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("visited 0 times"));
}

#[tokio::test]
async fn reset_is_forbidden_outside_dev() {
    let app = spawn_app_on(Platform::Production);

    let response = app
        .client
        .post(app.url("/admin/reset"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 403);
}
