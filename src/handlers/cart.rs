use actix_web::{web, HttpResponse};
use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::application::ResilientCartService;
use crate::auth::AuthenticatedUser;
use crate::domain::cart::{CartPage, CartRecord};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    pub product_id: String,
    /// Non-negative integer as text, e.g. "2"
    pub quantity: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GetCartParams {
    /// Page number (1-based). Defaults to 1.
    pub page: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartProductResponse {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartPageResponse {
    pub products: Vec<CartProductResponse>,
    pub total_pages: usize,
    pub total_price: f64,
}

/// Stored shape of a cart record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CartRecordResponse {
    pub user_id: String,
    pub order_list: String,
    pub total_price: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveItemResponse {
    #[serde(rename = "TotalPrice")]
    pub total_price: f64,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

fn as_number(price: &BigDecimal) -> f64 {
    price.to_f64().unwrap_or_default()
}

impl From<CartPage> for CartPageResponse {
    fn from(page: CartPage) -> Self {
        Self {
            total_price: as_number(&page.total_price),
            total_pages: page.total_pages,
            products: page
                .products
                .into_iter()
                .map(|item| CartProductResponse {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
        }
    }
}

impl From<CartRecord> for CartRecordResponse {
    fn from(cart: CartRecord) -> Self {
        Self {
            order_list: cart.items.to_string(),
            total_price: as_number(&cart.total_price),
            user_id: cart.user_id,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Returns one page (three line items) of the caller's cart together with the
/// page count and the cart's total price. A caller without a cart gets an
/// empty page.
#[utoipa::path(
    get,
    path = "/cart",
    params(GetCartParams),
    responses(
        (status = 200, description = "Successfully fetched cart", body = CartPageResponse),
        (status = 400, description = "Invalid page"),
        (status = 401, description = "Unauthorized, invalid token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn get_cart(
    user: AuthenticatedUser,
    service: web::Data<ResilientCartService>,
    query: web::Query<GetCartParams>,
) -> Result<HttpResponse, AppError> {
    log::info!("Fetching cart of user {}", user.user_id);
    let page = usize::try_from(query.page.unwrap_or(1)).unwrap_or(0);

    let page = service
        .get_cart(&user.user_id, page)
        .await
        .map_err(AppError::from_domain("fetch cart"))?;

    Ok(HttpResponse::Ok().json(CartPageResponse::from(page)))
}

/// POST /cart/add
///
/// Sets the quantity of one product in the caller's cart (replacing any
/// earlier quantity) and returns the stored cart with its recomputed total.
#[utoipa::path(
    post,
    path = "/cart/add",
    request_body = CartItemRequest,
    responses(
        (status = 200, description = "Product successfully added to the cart", body = CartRecordResponse),
        (status = 400, description = "Invalid product id or quantity"),
        (status = 401, description = "Unauthorized, invalid token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    user: AuthenticatedUser,
    service: web::Data<ResilientCartService>,
    body: web::Json<CartItemRequest>,
) -> Result<HttpResponse, AppError> {
    let item = body.into_inner();
    log::info!(
        "Adding product {} to cart of user {}",
        item.product_id,
        user.user_id
    );

    let cart = service
        .add_item(&user.user_id, &item.product_id, &item.quantity)
        .await
        .map_err(AppError::from_domain("add product to cart"))?;

    Ok(HttpResponse::Ok().json(CartRecordResponse::from(cart)))
}

/// DELETE /cart/{productId}
#[utoipa::path(
    delete,
    path = "/cart/{productId}",
    params(
        ("productId" = String, Path, description = "Product to remove"),
    ),
    responses(
        (status = 200, description = "Product successfully deleted from the cart", body = RemoveItemResponse),
        (status = 401, description = "Unauthorized, invalid token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn delete_from_cart(
    user: AuthenticatedUser,
    service: web::Data<ResilientCartService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    log::info!(
        "Removing product {} from cart of user {}",
        product_id,
        user.user_id
    );

    let total = service
        .remove_item(&user.user_id, &product_id)
        .await
        .map_err(AppError::from_domain("delete from cart"))?;

    Ok(HttpResponse::Ok().json(RemoveItemResponse {
        total_price: as_number(&total),
        message: "Product deleted from cart successfully".to_string(),
    }))
}

/// DELETE /cart
#[utoipa::path(
    delete,
    path = "/cart",
    responses(
        (status = 200, description = "Cart successfully deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized, invalid token"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn delete_cart(
    user: AuthenticatedUser,
    service: web::Data<ResilientCartService>,
) -> Result<HttpResponse, AppError> {
    log::info!("Deleting cart of user {}", user.user_id);

    service
        .clear_cart(&user.user_id)
        .await
        .map_err(AppError::from_domain("delete cart"))?;

    Ok(HttpResponse::Ok().json(MessageResponse {
        message: "Cart deleted successfully".to_string(),
    }))
}
