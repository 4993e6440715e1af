//! Event publisher contract and delivery policy.

use std::str::FromStr;

use async_trait::async_trait;

use common::{AppError, AppResult};
use domain::DomainEvent;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Sink for identity events. Implementations must be safe to call from many
/// tasks at once.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish one event under its action's routing key
    async fn publish(&self, event: &DomainEvent) -> AppResult<()>;

    /// Release the underlying connection. Later publishes fail.
    async fn close(&self) -> AppResult<()>;
}

/// What a failed publish does to the operation that triggered it.
///
/// The state change is already committed when the event is published, so
/// neither policy rolls it back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeliveryPolicy {
    /// The operation reports the publish failure to its caller
    #[default]
    Strict,
    /// The failure is logged and counted, the operation succeeds
    BestEffort,
}

impl FromStr for DeliveryPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "strict" => Ok(DeliveryPolicy::Strict),
            "best_effort" => Ok(DeliveryPolicy::BestEffort),
            other => Err(AppError::configuration(format!(
                "unknown event delivery policy '{}', expected 'strict' or 'best_effort'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryPolicy::Strict => f.write_str("strict"),
            DeliveryPolicy::BestEffort => f.write_str("best_effort"),
        }
    }
}
