//! Circuit breaker guarding calls to the cart's collaborators.
//!
//! Closed: calls pass through. Open: calls are rejected until `reset_timeout`
//! has elapsed since the last failure. HalfOpen: one trial call at a time
//! passes through; `success_threshold` successful trials close the circuit and
//! one failed trial reopens it. Only failures for which
//! [`IsTransient::trips_circuit`] holds count against the circuit.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::retry::IsTransient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures before the circuit opens.
    pub failure_threshold: u32,
    pub reset_timeout: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 4,
            reset_timeout: Duration::from_secs(2),
            success_threshold: 1,
        }
    }
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
    /// Start of the trial call currently allowed through while half-open.
    trial_started: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    state: Arc<Mutex<BreakerState>>,
    config: CircuitBreakerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    Open,
    #[error(transparent)]
    Failed(E),
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure: None,
                trial_started: None,
            })),
            config,
        }
    }

    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
        E: IsTransient,
    {
        if !self.admit().await {
            return Err(CircuitBreakerError::Open);
        }

        match operation.await {
            Ok(value) => {
                self.record_success().await;
                Ok(value)
            }
            Err(err) => {
                if err.trips_circuit() {
                    self.record_failure().await;
                } else {
                    // The collaborator answered; the request itself failed.
                    self.record_success().await;
                }
                Err(CircuitBreakerError::Failed(err))
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.state.lock().await.state
    }

    async fn admit(&self) -> bool {
        let mut guard = self.state.lock().await;
        match guard.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                // A trial that never reported back (cancelled) frees its slot
                // after `reset_timeout`.
                let slot_free = guard
                    .trial_started
                    .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);
                if slot_free {
                    guard.trial_started = Some(Instant::now());
                }
                slot_free
            }
            CircuitState::Open => {
                let cooled_down = guard
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.config.reset_timeout);
                if cooled_down {
                    log::info!("Circuit breaker half-open, letting a trial call through");
                    guard.state = CircuitState::HalfOpen;
                    guard.success_count = 0;
                    guard.trial_started = Some(Instant::now());
                }
                cooled_down
            }
        }
    }

    async fn record_success(&self) {
        let mut guard = self.state.lock().await;
        match guard.state {
            CircuitState::HalfOpen => {
                guard.success_count += 1;
                guard.trial_started = None;
                if guard.success_count >= self.config.success_threshold {
                    log::info!("Circuit breaker closed");
                    guard.state = CircuitState::Closed;
                    guard.failure_count = 0;
                    guard.success_count = 0;
                    guard.last_failure = None;
                }
            }
            CircuitState::Closed => guard.failure_count = 0,
            CircuitState::Open => {}
        }
    }

    async fn record_failure(&self) {
        let mut guard = self.state.lock().await;
        guard.failure_count += 1;
        guard.last_failure = Some(Instant::now());

        match guard.state {
            CircuitState::Closed if guard.failure_count >= self.config.failure_threshold => {
                log::warn!(
                    "Circuit breaker opened after {} consecutive failures",
                    guard.failure_count
                );
                guard.state = CircuitState::Open;
            }
            CircuitState::HalfOpen => {
                log::warn!("Trial call failed, circuit breaker reopened");
                guard.state = CircuitState::Open;
                guard.success_count = 0;
                guard.trial_started = None;
            }
            _ => {}
        }
    }
}
