use bigdecimal::{BigDecimal, Zero};
use futures::stream::{self, StreamExt, TryStreamExt};

use crate::domain::errors::DomainError;
use crate::domain::order_list::OrderList;
use crate::domain::ports::PriceLookup;

/// Looks up the unit price of every product id, at most `concurrency` at a
/// time. Prices come back in the order of `product_ids`; the first failing
/// lookup (in that order) fails the whole batch.
pub async fn resolve_prices<'a, I>(
    lookup: &dyn PriceLookup,
    product_ids: I,
    concurrency: usize,
) -> Result<Vec<BigDecimal>, DomainError>
where
    I: IntoIterator<Item = &'a str>,
{
    stream::iter(product_ids)
        .map(|product_id| lookup.unit_price(product_id))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

/// Sums `unit price * quantity` over the order list at current catalog prices.
pub async fn total_price(
    lookup: &dyn PriceLookup,
    items: &OrderList,
    concurrency: usize,
) -> Result<BigDecimal, DomainError> {
    let prices = resolve_prices(
        lookup,
        items.iter().map(|item| item.product_id.as_str()),
        concurrency,
    )
    .await?;

    Ok(items
        .iter()
        .zip(prices)
        .fold(BigDecimal::zero(), |total, (item, price)| {
            total + price * BigDecimal::from(item.quantity)
        }))
}
