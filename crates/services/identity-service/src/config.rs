//! Identity service configuration.

use std::env;

use common::{AppError, AppResult, BrokerConfig, DatabaseConfig, JwtConfig, ServiceConfig};
use domain::DEFAULT_JWT_EXPIRATION_HOURS;

use crate::events::DeliveryPolicy;

/// Default target of password recovery links
pub const DEFAULT_RECOVERY_BASE_URL: &str = "http://localhost:8080/user/password";

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct IdentityServiceConfig {
    pub server: ServiceConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub broker: BrokerConfig,
    /// What a failed event publish does to the triggering operation
    pub delivery_policy: DeliveryPolicy,
    /// Base URL of password recovery links; the user id is appended
    pub recovery_base_url: String,
}

impl IdentityServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Fails when `JWT_SECRET` is missing or too short, or when a numeric or
    /// enumerated variable cannot be parsed.
    pub fn from_env() -> AppResult<Self> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::configuration("JWT_SECRET must be set"))?;
        let jwt_expiration_hours =
            parse_var("JWT_EXPIRATION_HOURS")?.unwrap_or(DEFAULT_JWT_EXPIRATION_HOURS);

        let broker_defaults = BrokerConfig::default();
        let database_defaults = DatabaseConfig::default();
        let server_defaults = ServiceConfig::default();

        Ok(Self {
            server: ServiceConfig {
                service_name: server_defaults.service_name,
                host: env::var("IDENTITY_SERVICE_HOST").unwrap_or(server_defaults.host),
                port: parse_var("IDENTITY_SERVICE_PORT")?.unwrap_or(server_defaults.port),
            },
            database: DatabaseConfig {
                url: database_url().unwrap_or(database_defaults.url),
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or(database_defaults.max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or(database_defaults.min_connections),
            },
            jwt: JwtConfig::new(jwt_secret, jwt_expiration_hours)?,
            broker: BrokerConfig {
                url: env::var("RABBITMQ_URL")
                    .ok()
                    .filter(|url| !url.is_empty())
                    .unwrap_or(broker_defaults.url),
                exchange: env::var("EVENTS_EXCHANGE").unwrap_or(broker_defaults.exchange),
                connect_attempts: parse_var("BROKER_CONNECT_ATTEMPTS")?
                    .unwrap_or(broker_defaults.connect_attempts),
                retry_delay_seconds: parse_var("BROKER_RETRY_DELAY_SECONDS")?
                    .unwrap_or(broker_defaults.retry_delay_seconds),
            },
            delivery_policy: parse_var("EVENT_DELIVERY")?.unwrap_or_default(),
            recovery_base_url: env::var("RECOVERY_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_RECOVERY_BASE_URL.to_string()),
        })
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// `DATABASE_URL`, or a Postgres URL assembled from the `DB_*` variables.
fn database_url() -> Option<String> {
    if let Ok(url) = env::var("DATABASE_URL") {
        return Some(url);
    }

    let host = env::var("DB_HOST").ok()?;
    let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
    let user = env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("DB_PASSWORD").unwrap_or_default();
    let name = env::var("DB_NAME").unwrap_or_else(|_| "users".to_string());

    Some(format!(
        "postgres://{}:{}@{}:{}/{}",
        user, password, host, port, name
    ))
}

/// Parse an optional variable; present but malformed is an error.
fn parse_var<T>(key: &str) -> AppResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| AppError::configuration(format!("{} is invalid: {}", key, e))),
        _ => Ok(None),
    }
}
