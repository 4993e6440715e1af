//! RabbitMQ event publisher.
//!
//! Events go to a durable topic exchange with the action name as routing
//! key. Publishes share one channel and are serialized by a mutex; publisher
//! confirms are not awaited.

use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tokio::sync::Mutex;

use common::{AppError, AppResult};
use domain::DomainEvent;

use super::publisher::EventPublisher;

const CONTENT_TYPE_JSON: &str = "application/json";
const DELIVERY_MODE_TRANSIENT: u8 = 1;
const REPLY_SUCCESS: u16 = 200;

struct Session {
    connection: Connection,
    channel: Channel,
}

/// AMQP publisher holding one connection and one channel.
pub struct AmqpPublisher {
    exchange: String,
    session: Mutex<Option<Session>>,
}

impl AmqpPublisher {
    /// Open a connection and channel and declare the exchange.
    pub async fn connect(url: &str, exchange: &str) -> AppResult<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| AppError::publish(format!("failed to connect to broker: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| AppError::publish(format!("failed to open channel: {}", e)))?;

        channel
            .exchange_declare(
                exchange,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    auto_delete: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(|e| AppError::publish(format!("failed to declare exchange: {}", e)))?;

        tracing::info!(exchange = %exchange, "Broker channel ready");

        Ok(Self {
            exchange: exchange.to_string(),
            session: Mutex::new(Some(Session {
                connection,
                channel,
            })),
        })
    }
}

#[async_trait]
impl EventPublisher for AmqpPublisher {
    async fn publish(&self, event: &DomainEvent) -> AppResult<()> {
        let body = serde_json::to_vec(event)
            .map_err(|e| AppError::internal(format!("failed to encode event: {}", e)))?;

        let session = self.session.lock().await;
        let session = session
            .as_ref()
            .ok_or_else(|| AppError::publish("publisher is closed"))?;

        session
            .channel
            .basic_publish(
                &self.exchange,
                event.routing_key(),
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_content_type(CONTENT_TYPE_JSON.into())
                    .with_delivery_mode(DELIVERY_MODE_TRANSIENT),
            )
            .await
            .map_err(|e| AppError::publish(e.to_string()))?;

        tracing::debug!(
            exchange = %self.exchange,
            routing_key = %event.routing_key(),
            user_id = event.user.id,
            "Event published"
        );
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let Some(session) = self.session.lock().await.take() else {
            return Ok(());
        };

        session
            .channel
            .close(REPLY_SUCCESS, "shutting down")
            .await
            .map_err(|e| AppError::publish(format!("failed to close channel: {}", e)))?;
        session
            .connection
            .close(REPLY_SUCCESS, "shutting down")
            .await
            .map_err(|e| AppError::publish(format!("failed to close connection: {}", e)))?;

        tracing::info!("Broker connection closed");
        Ok(())
    }
}
