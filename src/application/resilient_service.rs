use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bigdecimal::BigDecimal;
use tokio::sync::Semaphore;

use crate::domain::cart::{CartPage, CartRecord};
use crate::domain::errors::DomainError;
use crate::resilience::{
    retry_on_transient, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, RetryConfig,
};

use super::CartService;

#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub breaker: CircuitBreakerConfig,
    /// Upper bound for a single attempt.
    pub attempt_timeout: Duration,
    /// Operations allowed in flight at once; further calls are rejected.
    pub max_concurrent: usize,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            breaker: CircuitBreakerConfig::default(),
            attempt_timeout: Duration::from_secs(50),
            max_concurrent: 100,
        }
    }
}

/// Applies bulkhead, circuit breaker, retry and timeout policy around every
/// [`CartService`] operation.
///
/// Only transient failures (collaborator unavailable, concurrent modification)
/// are retried; each retry re-runs the full read-modify-write.
#[derive(Clone)]
pub struct ResilientCartService {
    inner: CartService,
    config: ResilienceConfig,
    breaker: CircuitBreaker,
    bulkhead: Arc<Semaphore>,
}

impl ResilientCartService {
    pub fn new(inner: CartService, config: ResilienceConfig) -> Self {
        Self {
            breaker: CircuitBreaker::new(config.breaker.clone()),
            bulkhead: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            inner,
            config,
        }
    }

    pub async fn get_cart(&self, user_id: &str, page: usize) -> Result<CartPage, DomainError> {
        self.guarded("get_cart", || self.inner.get_cart(user_id, page))
            .await
    }

    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: &str,
    ) -> Result<CartRecord, DomainError> {
        self.guarded("add_item", || {
            self.inner.add_item(user_id, product_id, quantity)
        })
        .await
    }

    pub async fn remove_item(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<BigDecimal, DomainError> {
        self.guarded("remove_item", || self.inner.remove_item(user_id, product_id))
            .await
    }

    pub async fn clear_cart(&self, user_id: &str) -> Result<(), DomainError> {
        self.guarded("clear_cart", || self.inner.clear_cart(user_id))
            .await
    }

    async fn guarded<F, Fut, T>(&self, operation: &'static str, mut call: F) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let _permit = self.bulkhead.try_acquire().map_err(|_| {
            log::warn!("Rejecting {}: too many cart operations in flight", operation);
            DomainError::Unavailable(format!("{} rejected, service busy", operation))
        })?;

        retry_on_transient(&self.config.retry, |attempt| {
            let attempt_future = call();
            async move {
                log::debug!("{} attempt {}", operation, attempt);
                let timed = async {
                    tokio::time::timeout(self.config.attempt_timeout, attempt_future)
                        .await
                        .unwrap_or_else(|_| {
                            Err(DomainError::Unavailable(format!(
                                "{} timed out after {:?}",
                                operation, self.config.attempt_timeout
                            )))
                        })
                };
                self.breaker.call(timed).await.map_err(|err| match err {
                    CircuitBreakerError::Open => {
                        DomainError::Unavailable(format!("{} rejected, circuit open", operation))
                    }
                    CircuitBreakerError::Failed(err) => err,
                })
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::domain::ports::{CartRepository, PriceLookup};
    use crate::infrastructure::memory_repo::InMemoryCartRepository;
    use crate::resilience::CircuitState;

    /// Fails the first `failures` lookups, then prices everything at 10.
    struct FlakyPrices {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PriceLookup for FlakyPrices {
        async fn unit_price(&self, _product_id: &str) -> Result<BigDecimal, DomainError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(DomainError::Unavailable("catalog returned 503".into()))
            } else {
                Ok(BigDecimal::from(10))
            }
        }
    }

    fn config(max_attempts: u32, failure_threshold: u32) -> ResilienceConfig {
        ResilienceConfig {
            retry: RetryConfig {
                max_attempts,
                initial_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(5),
                multiplier: 2.0,
            },
            breaker: CircuitBreakerConfig {
                failure_threshold,
                reset_timeout: Duration::from_secs(60),
                success_threshold: 1,
            },
            attempt_timeout: Duration::from_secs(5),
            max_concurrent: 10,
        }
    }

    fn resilient(failures: u32, config: ResilienceConfig) -> (ResilientCartService, Arc<FlakyPrices>) {
        let prices = Arc::new(FlakyPrices {
            failures,
            calls: AtomicU32::new(0),
        });
        let inner = CartService::new(Arc::new(InMemoryCartRepository::new()), prices.clone(), 1);
        (ResilientCartService::new(inner, config), prices)
    }

    #[tokio::test]
    async fn transient_pricing_failures_are_retried() {
        let (svc, prices) = resilient(2, config(3, 10));

        let cart = svc.add_item("u1", "P1", "2").await.unwrap();

        assert_eq!(cart.total_price, BigDecimal::from_str("20").unwrap());
        assert_eq!(prices.calls.load(Ordering::SeqCst), 3);
    }

    /// Lets another writer update the cart right before each of the first
    /// `races` saves, which then lose the version check.
    struct RacingRepo {
        inner: InMemoryCartRepository,
        races: AtomicU32,
    }

    impl RacingRepo {
        fn new(races: u32) -> Self {
            Self {
                inner: InMemoryCartRepository::new(),
                races: AtomicU32::new(races),
            }
        }
    }

    #[async_trait]
    impl CartRepository for RacingRepo {
        async fn find(&self, user_id: &str) -> Result<Option<CartRecord>, DomainError> {
            self.inner.find(user_id).await
        }

        async fn save(&self, cart: &CartRecord) -> Result<CartRecord, DomainError> {
            let lost = self
                .races
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !lost {
                return self.inner.save(cart).await;
            }

            let mut other = self
                .inner
                .find(&cart.user_id)
                .await?
                .unwrap_or_else(|| CartRecord::empty(cart.user_id.clone()));
            other.items.upsert("P9", 5);
            other.total_price = &other.total_price + BigDecimal::from(50);
            self.inner.save(&other).await?;

            self.inner.save(cart).await
        }

        async fn delete(&self, user_id: &str) -> Result<bool, DomainError> {
            self.inner.delete(user_id).await
        }
    }

    fn over(repo: Arc<RacingRepo>, config: ResilienceConfig) -> ResilientCartService {
        let prices = Arc::new(FlakyPrices {
            failures: 0,
            calls: AtomicU32::new(0),
        });
        ResilientCartService::new(CartService::new(repo, prices, 1), config)
    }

    #[tokio::test]
    async fn lost_version_race_reruns_the_whole_update() {
        let repo = Arc::new(RacingRepo::new(1));
        let svc = over(repo.clone(), config(3, 10));

        let cart = svc.add_item("u1", "P1", "2").await.unwrap();

        let ids: Vec<&str> = cart.items.iter().map(|item| item.product_id.as_str()).collect();
        assert_eq!(ids, ["P9", "P1"]);
        assert_eq!(cart.total_price, BigDecimal::from(70));

        let stored = repo.inner.find("u1").await.unwrap().unwrap();
        assert_eq!(stored, cart);
    }

    #[tokio::test]
    async fn conflicts_on_one_cart_leave_the_circuit_closed() {
        let repo = Arc::new(RacingRepo::new(u32::MAX));
        let svc = over(repo, config(3, 4));

        for _ in 0..3 {
            let err = svc.add_item("hot", "P1", "1").await.unwrap_err();
            assert!(matches!(err, DomainError::Conflict(_)));
        }

        assert_eq!(svc.breaker.state().await, CircuitState::Closed);
        assert!(svc.get_cart("alice", 1).await.is_ok());
    }

    #[tokio::test]
    async fn validation_errors_are_not_retried() {
        let (svc, prices) = resilient(0, config(3, 10));

        let err = svc.add_item("u1", "P1", "lots").await.unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
        assert_eq!(prices.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_calls() {
        let (svc, prices) = resilient(u32::MAX, config(1, 2));

        for _ in 0..2 {
            assert!(svc.add_item("u1", "P1", "1").await.is_err());
        }
        assert_eq!(svc.breaker.state().await, CircuitState::Open);

        let err = svc.add_item("u1", "P1", "1").await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(msg) if msg.contains("circuit open")));
        assert_eq!(prices.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn full_bulkhead_rejects_immediately() {
        let mut cfg = config(1, 10);
        cfg.max_concurrent = 1;
        let (svc, _) = resilient(0, cfg);
        let _held = svc.bulkhead.clone().try_acquire_owned().unwrap();

        let err = svc.clear_cart("u1").await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(msg) if msg.contains("busy")));
    }

    #[tokio::test]
    async fn slow_attempts_time_out() {
        struct SlowRepo;

        #[async_trait]
        impl CartRepository for SlowRepo {
            async fn find(&self, _: &str) -> Result<Option<CartRecord>, DomainError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(None)
            }
            async fn save(&self, cart: &CartRecord) -> Result<CartRecord, DomainError> {
                Ok(cart.clone())
            }
            async fn delete(&self, _: &str) -> Result<bool, DomainError> {
                Ok(false)
            }
        }

        let mut cfg = config(1, 10);
        cfg.attempt_timeout = Duration::from_millis(20);
        let prices = Arc::new(FlakyPrices {
            failures: 0,
            calls: AtomicU32::new(0),
        });
        let svc = ResilientCartService::new(CartService::new(Arc::new(SlowRepo), prices, 1), cfg);

        let err = svc.get_cart("u1", 1).await.unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(msg) if msg.contains("timed out")));
    }
}
