use std::fmt;

use crate::error::ConfigError;

pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

/// Deployment flavour. Destructive admin endpoints only run on `Dev`.
#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Dev,
    #[default]
    Production,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username,
            self.password.expose(),
            self.host,
            self.port,
            self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username,
            self.password.expose(),
            self.host,
            self.port
        )
    }
}

/// Authentication settings, loaded once at startup and handed to `AuthService::new`.
#[derive(serde::Deserialize, Clone, Debug)]
pub struct AuthSettings {
    /// HS256 signing secret for access tokens
    pub jwt_secret: SecretString,
    /// Shared key the payment provider sends as `Authorization: ApiKey <key>`
    pub polka_key: SecretString,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_access_token_ttl")]
    pub access_token_ttl_seconds: i64,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

impl AuthSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.expose().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if self.polka_key.expose().is_empty() {
            return Err(ConfigError::MissingRequired("auth.polka_key".to_string()));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        if self.access_token_ttl_seconds <= 0
            || self.access_token_ttl_seconds > crate::auth::MAX_ACCESS_TOKEN_TTL_SECONDS
        {
            return Err(ConfigError::InvalidValue(format!(
                "auth.access_token_ttl_seconds must be in (0, {}]",
                crate::auth::MAX_ACCESS_TOKEN_TTL_SECONDS
            )));
        }
        if self.refresh_token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_ttl_days must be positive".to_string(),
            ));
        }
        if self.jwt_secret.expose().len() < 32 {
            tracing::warn!("auth.jwt_secret is shorter than 32 bytes");
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate()
    }
}

/// String wrapper that keeps secrets out of `Debug` output and logs.
#[derive(serde::Deserialize, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_static_dir() -> String {
    "./public".to_string()
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_access_token_ttl() -> i64 {
    crate::auth::MAX_ACCESS_TOKEN_TTL_SECONDS
}

fn default_refresh_token_ttl_days() -> i64 {
    crate::auth::DEFAULT_REFRESH_TOKEN_TTL_DAYS
}

/// Reads `configuration.{yaml,toml,json}` from the working directory, then
/// overlays `APP_*` environment variables (`APP_AUTH__JWT_SECRET=...`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
