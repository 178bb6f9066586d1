use std::sync::Arc;

use bigdecimal::{BigDecimal, Zero};

use crate::domain::cart::{check_page, CartPage, CartRecord};
use crate::domain::errors::DomainError;
use crate::domain::order_list::{parse_quantity, validate_product_id};
use crate::domain::ports::{CartRepository, PriceLookup};

use super::pricing;

/// Reads and mutates per-user carts.
///
/// Every mutation is a read-modify-write of one record guarded by the
/// record's version; a concurrent writer surfaces as [`DomainError::Conflict`].
#[derive(Clone)]
pub struct CartService {
    repo: Arc<dyn CartRepository>,
    pricing: Arc<dyn PriceLookup>,
    pricing_concurrency: usize,
}

impl CartService {
    pub fn new(
        repo: Arc<dyn CartRepository>,
        pricing: Arc<dyn PriceLookup>,
        pricing_concurrency: usize,
    ) -> Self {
        Self {
            repo,
            pricing,
            pricing_concurrency: pricing_concurrency.max(1),
        }
    }

    /// Returns page `page` (1-based) of the user's cart. A user without a cart
    /// gets an empty page.
    pub async fn get_cart(&self, user_id: &str, page: usize) -> Result<CartPage, DomainError> {
        check_page(page)?;

        let Some(cart) = self.repo.find(user_id).await? else {
            log::info!("No cart stored for user {}", user_id);
            return Ok(CartPage::empty());
        };
        if cart.items.is_empty() {
            log::info!("Cart of user {} is empty", user_id);
            return Ok(CartPage::empty());
        }

        CartPage::of(&cart, page)
    }

    /// Sets the quantity of `product_id` in the user's cart, creating the cart
    /// on first use, and recomputes the total at current catalog prices.
    ///
    /// Order list and total are written together once every price resolved;
    /// a failed lookup leaves the stored cart untouched.
    pub async fn add_item(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: &str,
    ) -> Result<CartRecord, DomainError> {
        validate_product_id(product_id)?;
        let quantity = parse_quantity(quantity)?;

        let mut cart = self
            .repo
            .find(user_id)
            .await?
            .unwrap_or_else(|| CartRecord::empty(user_id));

        cart.items.upsert(product_id, quantity);
        cart.total_price =
            pricing::total_price(self.pricing.as_ref(), &cart.items, self.pricing_concurrency)
                .await?;

        let saved = self.repo.save(&cart).await?;
        log::info!(
            "Set {} x {} in cart of user {}, total now {}",
            quantity,
            product_id,
            user_id,
            saved.total_price
        );
        Ok(saved)
    }

    /// Removes `product_id` from the user's cart and returns the new total.
    ///
    /// Removing a product that is not in the cart changes nothing and returns
    /// the current total.
    pub async fn remove_item(
        &self,
        user_id: &str,
        product_id: &str,
    ) -> Result<BigDecimal, DomainError> {
        validate_product_id(product_id)?;

        let Some(mut cart) = self.repo.find(user_id).await? else {
            log::info!("No cart stored for user {}, nothing to remove", user_id);
            return Ok(BigDecimal::zero());
        };

        let Some(removed_quantity) = cart.items.remove(product_id) else {
            log::info!("Product {} not in cart of user {}", product_id, user_id);
            return Ok(cart.total_price);
        };

        cart.total_price = if cart.items.is_empty() {
            BigDecimal::zero()
        } else {
            let price = self.pricing.unit_price(product_id).await?;
            let reduced = &cart.total_price - price * BigDecimal::from(removed_quantity);
            reduced.max(BigDecimal::zero())
        };

        let saved = self.repo.save(&cart).await?;
        log::info!(
            "Removed {} from cart of user {}, total now {}",
            product_id,
            user_id,
            saved.total_price
        );
        Ok(saved.total_price)
    }

    /// Deletes the user's cart. Clearing a cart that does not exist succeeds.
    pub async fn clear_cart(&self, user_id: &str) -> Result<(), DomainError> {
        if self.repo.delete(user_id).await? {
            log::info!("Deleted cart of user {}", user_id);
        } else {
            log::info!("No cart to delete for user {}", user_id);
        }
        Ok(())
    }
}
