use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::orders::{OrderList, OrderWithItems, SalesList, UpdateOrderStatusRequest},
    dto::products::ProductList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    routes::params::{InventoryQuery, SalesQuery, SellerOrderQuery},
    services::seller_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(list_inventory))
        .route("/orders", get(list_seller_orders))
        .route("/orders/{id}", get(get_seller_order))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/sales-history", get(sales_history))
}

#[utoipa::path(
    get,
    path = "/api/seller/inventory",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10, max 100"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
        ("sort_by" = Option<String>, Query, description = "name, price or stock_quantity; prefix with - for descending"),
    ),
    responses(
        (status = 200, description = "Own products", body = ApiResponse<ProductList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<InventoryQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = seller_service::list_inventory(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10, max 100"),
        ("status" = Option<String>, Query, description = "Filter by order status"),
        ("is_paid" = Option<bool>, Query, description = "Filter by payment flag"),
        ("category_id" = Option<Uuid>, Query, description = "Orders containing a product of the category"),
        ("product_id" = Option<Uuid>, Query, description = "Orders containing the product"),
        ("start_date" = Option<String>, Query, description = "YYYY-MM-DD, malformed values ignored"),
        ("end_date" = Option<String>, Query, description = "YYYY-MM-DD inclusive, malformed values ignored"),
    ),
    responses(
        (status = 200, description = "Orders containing the seller's products", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn list_seller_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SellerOrderQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = seller_service::list_seller_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail with the seller's items", body = ApiResponse<OrderWithItems>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Outside the actor's visibility"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn get_seller_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = seller_service::get_seller_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/seller/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status overwritten, no transition checks", body = ApiResponse<Order>),
        (status = 403, description = "No owned item in the order"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = seller_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/sales-history",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 10, max 100"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by product category"),
        ("product_id" = Option<Uuid>, Query, description = "Filter by product"),
        ("start_date" = Option<String>, Query, description = "YYYY-MM-DD, malformed values ignored"),
        ("end_date" = Option<String>, Query, description = "YYYY-MM-DD inclusive, malformed values ignored"),
    ),
    responses(
        (status = 200, description = "Sold line items, newest order first", body = ApiResponse<SalesList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn sales_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SalesQuery>,
) -> AppResult<Json<ApiResponse<SalesList>>> {
    let resp = seller_service::sales_history(&state, &user, query).await?;
    Ok(Json(resp))
}
