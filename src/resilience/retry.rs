//! Exponential backoff for operations that fail transiently.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::domain::errors::DomainError;

#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    fn next_delay(&self, delay: Duration) -> Duration {
        let next = Duration::from_millis((delay.as_millis() as f64 * self.multiplier) as u64);
        next.min(self.max_delay)
    }
}

pub trait IsTransient {
    fn is_transient(&self) -> bool;

    /// Whether the failure should count against a circuit breaker.
    fn trips_circuit(&self) -> bool {
        self.is_transient()
    }
}

impl IsTransient for DomainError {
    fn is_transient(&self) -> bool {
        DomainError::is_transient(self)
    }

    fn trips_circuit(&self) -> bool {
        self.is_collaborator_failure()
    }
}

/// Runs `operation` until it succeeds, fails permanently, or runs out of
/// attempts. The last error is returned unchanged.
pub async fn retry_on_transient<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + IsTransient,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    log::info!("Operation succeeded on attempt {}", attempt);
                }
                return Ok(value);
            }
            Err(err) if !err.is_transient() => return Err(err),
            Err(err) if attempt >= config.max_attempts.max(1) => {
                log::error!("Operation failed after {} attempts: {}", attempt, err);
                return Err(err);
            }
            Err(err) => {
                log::warn!(
                    "Attempt {} failed, retrying in {}ms: {}",
                    attempt,
                    delay.as_millis(),
                    err
                );
                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}
