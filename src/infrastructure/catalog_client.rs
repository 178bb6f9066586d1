use std::time::Duration;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::domain::errors::DomainError;
use crate::domain::ports::PriceLookup;

impl From<reqwest::Error> for DomainError {
    fn from(e: reqwest::Error) -> Self {
        DomainError::Unavailable(format!("catalog: {}", e))
    }
}

/// Subset of the catalog's product document needed for pricing.
#[derive(Debug, Deserialize)]
struct CatalogProduct {
    price: BigDecimal,
}

/// Prices products through the catalog service's `GET /products/{productId}`.
#[derive(Debug, Clone)]
pub struct HttpPriceLookup {
    client: Client,
    base_url: Url,
}

impl HttpPriceLookup {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn product_url(&self, product_id: &str) -> Result<Url, DomainError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DomainError::Unavailable(format!("catalog URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .push("products")
            .push(product_id);
        Ok(url)
    }
}

#[async_trait]
impl PriceLookup for HttpPriceLookup {
    async fn unit_price(&self, product_id: &str) -> Result<BigDecimal, DomainError> {
        let url = self.product_url(product_id)?;
        log::debug!("Fetching price of {} from {}", product_id, url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            log::error!("Catalog answered {} for product {}", status, product_id);
            return Err(DomainError::Unavailable(format!(
                "catalog returned {} for product {}",
                status, product_id
            )));
        }

        let product: CatalogProduct = response.json().await?;
        Ok(product.price)
    }
}
