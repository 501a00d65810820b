pub mod auth;
pub mod configuration;
pub mod error;
pub mod extractors;
pub mod logger;
pub mod middleware;
pub mod profanity;
pub mod routes;
pub mod startup;
pub mod storage;
pub mod telemetry;
pub mod validators;
