//! Codec for the persisted order list.
//!
//! A cart's contents are stored as `productId:quantity` entries joined by
//! `;`, e.g. `P1:2;P7:1`. The empty cart is stored as the empty string. Older
//! records may carry a single trailing `;` (or be exactly `;`), which decodes
//! to the same list.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::errors::DomainError;

const ENTRY_SEPARATOR: char = ';';
const FIELD_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub product_id: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Ordered line items of one cart. Product ids are unique within the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderList(Vec<LineItem>);

impl OrderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[LineItem] {
        &self.0
    }

    /// Sets the quantity of `product_id`, appending a new entry when the
    /// product is not in the list yet.
    pub fn upsert(&mut self, product_id: &str, quantity: u32) {
        match self.0.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => item.quantity = quantity,
            None => self.0.push(LineItem::new(product_id, quantity)),
        }
    }

    /// Removes `product_id` and returns the quantity it had, if present.
    pub fn remove(&mut self, product_id: &str) -> Option<u32> {
        let index = self.0.iter().position(|item| item.product_id == product_id)?;
        Some(self.0.remove(index).quantity)
    }
}

impl From<Vec<LineItem>> for OrderList {
    fn from(items: Vec<LineItem>) -> Self {
        Self(items)
    }
}

impl<'a> IntoIterator for &'a OrderList {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for OrderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", ENTRY_SEPARATOR)?;
            }
            write!(f, "{}{}{}", item.product_id, FIELD_SEPARATOR, item.quantity)?;
        }
        Ok(())
    }
}

impl FromStr for OrderList {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_suffix(ENTRY_SEPARATOR).unwrap_or(s);
        if body.is_empty() {
            return Ok(Self::new());
        }

        let items = body
            .split(ENTRY_SEPARATOR)
            .map(|segment| {
                let (product_id, quantity) = segment
                    .split_once(FIELD_SEPARATOR)
                    .ok_or_else(|| corrupted(s, segment))?;
                if product_id.is_empty() || quantity.contains(FIELD_SEPARATOR) {
                    return Err(corrupted(s, segment));
                }
                let quantity = quantity.parse::<u32>().map_err(|_| corrupted(s, segment))?;
                Ok(LineItem::new(product_id, quantity))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut seen = HashSet::with_capacity(items.len());
        if let Some(dup) = items.iter().find(|item| !seen.insert(item.product_id.as_str())) {
            return Err(DomainError::Corrupted(format!(
                "product '{}' listed twice in order list '{}'",
                dup.product_id, s
            )));
        }
        Ok(Self(items))
    }
}

fn corrupted(list: &str, segment: &str) -> DomainError {
    DomainError::Corrupted(format!(
        "malformed entry '{}' in order list '{}'",
        segment, list
    ))
}

/// Checks that a product id can be stored in the order list.
pub fn validate_product_id(product_id: &str) -> Result<(), DomainError> {
    if product_id.trim().is_empty() {
        return Err(DomainError::InvalidInput("productId must not be empty".into()));
    }
    if product_id.contains([ENTRY_SEPARATOR, FIELD_SEPARATOR]) {
        return Err(DomainError::InvalidInput(format!(
            "productId '{}' must not contain '{}' or '{}'",
            product_id, ENTRY_SEPARATOR, FIELD_SEPARATOR
        )));
    }
    Ok(())
}

/// Parses the textual quantity of a cart request.
pub fn parse_quantity(quantity: &str) -> Result<u32, DomainError> {
    quantity.trim().parse::<u32>().map_err(|_| {
        DomainError::InvalidInput(format!(
            "quantity '{}' is not a non-negative integer",
            quantity
        ))
    })
}
