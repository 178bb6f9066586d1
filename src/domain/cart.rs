use bigdecimal::{BigDecimal, Zero};

use super::errors::DomainError;
use super::order_list::{LineItem, OrderList};

/// Number of line items returned per page when reading a cart.
pub const PAGE_SIZE: usize = 3;

/// One user's cart as held in the key-value store.
///
/// `total_price` caches the sum of `unit price * quantity` over `items`, as of
/// the last write. `version` is zero for a record that has never been stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CartRecord {
    pub user_id: String,
    pub items: OrderList,
    pub total_price: BigDecimal,
    pub version: i64,
}

impl CartRecord {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            items: OrderList::new(),
            total_price: BigDecimal::zero(),
            version: 0,
        }
    }

    pub fn is_stored(&self) -> bool {
        self.version > 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartPage {
    pub products: Vec<LineItem>,
    pub total_pages: usize,
    pub total_price: BigDecimal,
}

impl CartPage {
    pub fn empty() -> Self {
        Self {
            products: Vec::new(),
            total_pages: 0,
            total_price: BigDecimal::zero(),
        }
    }

    /// Slices page `page` (1-based) of the cart's line items.
    ///
    /// Pages past the end yield an empty product list.
    pub fn of(cart: &CartRecord, page: usize) -> Result<Self, DomainError> {
        check_page(page)?;

        let items = cart.items.as_slice();
        let start = (page - 1).saturating_mul(PAGE_SIZE).min(items.len());
        let end = start.saturating_add(PAGE_SIZE).min(items.len());

        Ok(Self {
            products: items.get(start..end).unwrap_or_default().to_vec(),
            total_pages: items.len().div_ceil(PAGE_SIZE),
            total_price: cart.total_price.clone(),
        })
    }
}

/// Pages are numbered from 1.
pub fn check_page(page: usize) -> Result<(), DomainError> {
    if page < 1 {
        return Err(DomainError::InvalidInput(format!(
            "page must be at least 1, got {}",
            page
        )));
    }
    Ok(())
}
