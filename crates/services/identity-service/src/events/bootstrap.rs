//! Startup retry for external dependencies.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use common::{AppError, AppResult, BrokerConfig};

/// Fixed-delay retry schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl From<&BrokerConfig> for RetryPolicy {
    fn from(config: &BrokerConfig) -> Self {
        Self::new(
            config.connect_attempts,
            Duration::from_secs(config.retry_delay_seconds),
        )
    }
}

/// Run `connect` until it succeeds or the policy's attempts run out.
///
/// Exhaustion is `FatalStartup`; the caller is expected to stop the process
/// rather than serve traffic without the dependency.
pub async fn connect_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    target: &str,
    mut connect: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match connect().await {
            Ok(value) => {
                tracing::info!(dependency = %target, attempt, "Connected");
                return Ok(value);
            }
            Err(e) => {
                tracing::warn!(
                    dependency = %target,
                    attempt,
                    max_attempts,
                    error = %e,
                    "Connection attempt failed"
                );
                last_error = e.to_string();
            }
        }

        if attempt < max_attempts {
            sleep(policy.delay).await;
        }
    }

    tracing::error!(dependency = %target, max_attempts, "Giving up after retries");
    Err(AppError::FatalStartup(format!(
        "could not connect to {} after {} attempts: {}",
        target, max_attempts, last_error
    )))
}
