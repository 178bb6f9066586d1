use std::collections::HashMap;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use tokio::sync::RwLock;

use crate::domain::cart::CartRecord;
use crate::domain::errors::DomainError;
use crate::domain::order_list::OrderList;
use crate::domain::ports::CartRepository;

#[derive(Debug, Clone)]
struct StoredCart {
    order_list: String,
    total_price: BigDecimal,
    version: i64,
}

/// Process-local cart store with the same encoding and version checks as the
/// Postgres repository. Used for tests and local runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryCartRepository {
    carts: RwLock<HashMap<String, StoredCart>>,
}

impl InMemoryCartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `order_list` verbatim, bypassing the encoder.
    pub async fn put_raw(&self, user_id: &str, order_list: &str, total_price: BigDecimal) {
        let mut carts = self.carts.write().await;
        let version = carts.get(user_id).map_or(0, |c| c.version) + 1;
        carts.insert(
            user_id.to_owned(),
            StoredCart {
                order_list: order_list.to_owned(),
                total_price,
                version,
            },
        );
    }
}

#[async_trait]
impl CartRepository for InMemoryCartRepository {
    async fn find(&self, user_id: &str) -> Result<Option<CartRecord>, DomainError> {
        let carts = self.carts.read().await;
        let Some(stored) = carts.get(user_id) else {
            return Ok(None);
        };

        let items = stored.order_list.parse::<OrderList>()?;
        Ok(Some(CartRecord {
            user_id: user_id.to_owned(),
            items,
            total_price: stored.total_price.clone(),
            version: stored.version,
        }))
    }

    async fn save(&self, cart: &CartRecord) -> Result<CartRecord, DomainError> {
        let mut carts = self.carts.write().await;
        let current = carts.get(&cart.user_id).map_or(0, |c| c.version);
        if current != cart.version {
            return Err(DomainError::Conflict(cart.user_id.clone()));
        }

        let version = cart.version + 1;
        carts.insert(
            cart.user_id.clone(),
            StoredCart {
                order_list: cart.items.to_string(),
                total_price: cart.total_price.clone(),
                version,
            },
        );
        Ok(CartRecord {
            version,
            ..cart.clone()
        })
    }

    async fn delete(&self, user_id: &str) -> Result<bool, DomainError> {
        Ok(self.carts.write().await.remove(user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn versions_advance_on_every_save() {
        let repo = InMemoryCartRepository::new();
        let mut cart = CartRecord::empty("u1");
        cart.items.upsert("P1", 1);

        let first = repo.save(&cart).await.unwrap();
        let second = repo.save(&first).await.unwrap();

        assert_eq!((first.version, second.version), (1, 2));
        assert!(matches!(repo.save(&cart).await, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn raw_lists_are_decoded_on_read() {
        let repo = InMemoryCartRepository::new();
        repo.put_raw("u1", "P1:2;", BigDecimal::from(20)).await;

        let cart = repo.find("u1").await.unwrap().unwrap();
        assert_eq!(cart.items.to_string(), "P1:2");
        assert_eq!(cart.version, 1);
    }
}
