use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::db::{create_pool, DbPool};
use crate::domain::cart::CartRecord;
use crate::domain::errors::DomainError;
use crate::domain::order_list::OrderList;
use crate::domain::ports::CartRepository;
use crate::schema::carts;

use super::models::{CartRow, NewCartRow};

// ── Error conversions (infrastructure concern only) ──────────────────────────

impl From<diesel::result::Error> for DomainError {
    fn from(e: diesel::result::Error) -> Self {
        DomainError::Unavailable(format!("cart store: {}", e))
    }
}

impl From<r2d2::Error> for DomainError {
    fn from(e: r2d2::Error) -> Self {
        DomainError::Unavailable(format!("cart store pool: {}", e))
    }
}

impl TryFrom<CartRow> for CartRecord {
    type Error = DomainError;

    fn try_from(row: CartRow) -> Result<Self, Self::Error> {
        let items = row.order_list.parse::<OrderList>().map_err(|e| {
            log::error!("Stored cart of user {} is unreadable: {}", row.user_id, e);
            e
        })?;
        Ok(CartRecord {
            user_id: row.user_id,
            items,
            total_price: row.total_price,
            version: row.version,
        })
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

/// Connection settings of the cart table's database.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: String,
    pub pool_size: u32,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The URL carries credentials.
        f.debug_struct("StoreConfig")
            .field("pool_size", &self.pool_size)
            .finish_non_exhaustive()
    }
}

/// Cart records in the Postgres `carts` table, one row per user.
///
/// Built once from a [`StoreConfig`]; a changed configuration yields a new
/// repository through [`DieselCartRepository::reconfigure`].
#[derive(Clone)]
pub struct DieselCartRepository {
    pool: DbPool,
    config: StoreConfig,
}

impl DieselCartRepository {
    pub fn connect(config: &StoreConfig) -> Result<Self, DomainError> {
        let pool = create_pool(&config.database_url, config.pool_size)?;
        Ok(Self {
            pool,
            config: config.clone(),
        })
    }

    /// Returns a repository for `config`, sharing this one's pool when the
    /// configuration is unchanged.
    pub fn reconfigure(&self, config: &StoreConfig) -> Result<Self, DomainError> {
        if *config == self.config {
            return Ok(self.clone());
        }
        log::info!("Cart store configuration changed, opening a new pool");
        Self::connect(config)
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Runs blocking diesel work off the async executor.
    async fn run<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, DomainError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            work(&mut *conn)
        })
        .await
        .map_err(|e| DomainError::Unavailable(format!("cart store task: {}", e)))?
    }
}

#[async_trait]
impl CartRepository for DieselCartRepository {
    async fn find(&self, user_id: &str) -> Result<Option<CartRecord>, DomainError> {
        let key = user_id.to_owned();
        let row = self
            .run(move |conn| {
                carts::table
                    .filter(carts::user_id.eq(&key))
                    .select(CartRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(DomainError::from)
            })
            .await?;

        row.map(CartRecord::try_from).transpose()
    }

    async fn save(&self, cart: &CartRecord) -> Result<CartRecord, DomainError> {
        let user_id = cart.user_id.clone();
        let order_list = cart.items.to_string();
        let total_price = cart.total_price.clone();
        let expected = cart.version;

        let affected = self
            .run(move |conn| {
                let written = if expected == 0 {
                    diesel::insert_into(carts::table)
                        .values(&NewCartRow {
                            user_id: &user_id,
                            order_list,
                            total_price: &total_price,
                            version: 1,
                        })
                        .on_conflict_do_nothing()
                        .execute(conn)
                } else {
                    diesel::update(
                        carts::table
                            .filter(carts::user_id.eq(&user_id))
                            .filter(carts::version.eq(expected)),
                    )
                    .set((
                        carts::order_list.eq(order_list),
                        carts::total_price.eq(&total_price),
                        carts::version.eq(expected + 1),
                        carts::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                };
                written.map_err(DomainError::from)
            })
            .await?;

        if affected == 0 {
            log::warn!(
                "Cart of user {} changed since version {}, write rejected",
                cart.user_id,
                expected
            );
            return Err(DomainError::Conflict(cart.user_id.clone()));
        }

        Ok(CartRecord {
            version: expected + 1,
            ..cart.clone()
        })
    }

    async fn delete(&self, user_id: &str) -> Result<bool, DomainError> {
        let key = user_id.to_owned();
        let deleted = self
            .run(move |conn| {
                diesel::delete(carts::table.filter(carts::user_id.eq(&key)))
                    .execute(conn)
                    .map_err(DomainError::from)
            })
            .await?;
        Ok(deleted > 0)
    }
}
