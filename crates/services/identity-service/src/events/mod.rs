//! Identity event publication.

mod amqp;
mod bootstrap;
mod publisher;

pub use amqp::AmqpPublisher;
pub use bootstrap::{connect_with_retry, RetryPolicy};
#[cfg(any(test, feature = "test-utils"))]
pub use publisher::MockEventPublisher;
pub use publisher::{DeliveryPolicy, EventPublisher};
