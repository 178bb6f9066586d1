use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::carts;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = carts)]
#[diesel(primary_key(user_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CartRow {
    pub user_id: String,
    pub order_list: String,
    pub total_price: BigDecimal,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = carts)]
pub struct NewCartRow<'a> {
    pub user_id: &'a str,
    pub order_list: String,
    pub total_price: &'a BigDecimal,
    pub version: i64,
}
