#![allow(dead_code)]

use std::net::TcpListener;

use chirpy::configuration::{
    ApplicationSettings, AuthSettings, DatabaseSettings, Platform, SecretString, Settings,
};
use chirpy::startup::run;
use chirpy::storage::Repositories;
use serde_json::{json, Value};

pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

pub fn test_settings(platform: Platform) -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: SecretString::new("password"),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "chirpy_test".to_string(),
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            platform,
            static_dir: "./public".to_string(),
        },
        auth: AuthSettings {
            jwt_secret: SecretString::new("integration-test-secret-at-least-32-bytes"),
            polka_key: SecretString::new(POLKA_KEY),
            // lowest cost bcrypt accepts
            bcrypt_cost: 4,
            access_token_ttl_seconds: 3600,
            refresh_token_ttl_days: 60,
        },
    }
}

/// Starts the server on a random port, backed by an in-memory store.
pub fn spawn_app_on(platform: Platform) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = run(listener, Repositories::in_memory(), &test_settings(platform))
        .expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_on(Platform::Dev)
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Registers an account and logs it in. Returns the login response body.
    pub async fn signed_in_user(&self, email: &str, password: &str) -> Value {
        assert_eq!(self.create_user(email, password).await.status().as_u16(), 201);
        let response = self.login(email, password).await;
        assert_eq!(response.status().as_u16(), 200);
        response.json().await.expect("Failed to parse login response")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
