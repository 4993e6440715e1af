//! Identity Service Library
//!
//! User registration, authentication and directory reads over HTTP, with
//! identity events published to RabbitMQ.

pub mod config;
pub mod events;
pub mod http;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use common::{AppError, AppResult};

use crate::config::IdentityServiceConfig;
use crate::events::{connect_with_retry, AmqpPublisher, EventPublisher, RetryPolicy};
use crate::http::{create_router, AppState};
use crate::infra::Database;
use crate::repository::UserStore;
use crate::service::{IdentityManager, TokenService};

/// Run the HTTP server, overriding the configured bind address.
pub async fn run_server(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = IdentityServiceConfig::from_env()?;
    config.server.host = host.to_string();
    config.server.port = port;

    run_server_with_config(config).await
}

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = IdentityServiceConfig::from_env()?;
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Connect to the broker, retrying per the configured policy.
async fn connect_publisher(config: &IdentityServiceConfig) -> AppResult<Arc<AmqpPublisher>> {
    let policy = RetryPolicy::from(&config.broker);
    let publisher = connect_with_retry(&policy, "rabbitmq", || {
        AmqpPublisher::connect(&config.broker.url, &config.broker.exchange)
    })
    .await?;

    Ok(Arc::new(publisher))
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    config: IdentityServiceConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        delivery_policy = %config.delivery_policy,
        exchange = %config.broker.exchange,
        "Starting {}",
        config.server.service_name
    );

    // The broker must be up before any traffic is served
    let publisher = connect_publisher(&config).await?;

    let db = Database::connect(&config.database)
        .await
        .map_err(|e| AppError::FatalStartup(format!("database unavailable: {}", e)))?;

    let user_repo = Arc::new(UserStore::new(db.get_connection()));
    let identity_service = Arc::new(IdentityManager::new(
        user_repo,
        publisher.clone(),
        TokenService::new(&config.jwt),
        config.delivery_policy,
        config.recovery_base_url.clone(),
    ));

    let app = create_router(AppState::new(identity_service));

    let addr: SocketAddr = config.server_addr().parse()?;
    info!("Identity service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down");
    if let Err(e) = publisher.close().await {
        tracing::warn!(error = %e, "Failed to close broker connection");
    }
    db.close().await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
