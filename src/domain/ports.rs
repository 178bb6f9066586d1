use async_trait::async_trait;
use bigdecimal::BigDecimal;

use super::cart::CartRecord;
use super::errors::DomainError;

/// One record per user, keyed by user id.
#[async_trait]
pub trait CartRepository: Send + Sync + 'static {
    async fn find(&self, user_id: &str) -> Result<Option<CartRecord>, DomainError>;

    /// Writes order list and total price of `cart` in a single conditional
    /// write and returns the stored record with its new version.
    ///
    /// Fails with [`DomainError::Conflict`] when the stored version no longer
    /// matches `cart.version` (or a record appeared for a never-stored cart).
    async fn save(&self, cart: &CartRecord) -> Result<CartRecord, DomainError>;

    /// Returns `true` if a record was removed.
    async fn delete(&self, user_id: &str) -> Result<bool, DomainError>;
}

/// Resolves a product id to its current unit price.
#[async_trait]
pub trait PriceLookup: Send + Sync + 'static {
    async fn unit_price(&self, product_id: &str) -> Result<BigDecimal, DomainError>;
}
