use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems},
    entity::{
        Orders, Products,
        inventory_logs::InventoryReason,
        order_items::ActiveModel as OrderItemActive,
        orders::{ActiveModel as OrderActive, Column as OrderCol, OrderStatus},
        products::{Column as ProdCol, Model as ProductModel},
    },
    error::{AppError, AppResult},
    inventory,
    middleware::auth::AuthUser,
    policy::{Action, authorize},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, date_bounds},
    scope,
    services::seller_service::{collect_orders, order_from_entity, order_item_from_entity},
    state::AppState,
};

/// Place an order. Item prices are copied from the products at order
/// time; the total is their sum. Stock is deliberately not decremented,
/// but an audit row per line records the movement.
pub async fn create_order(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    authorize(actor, Action::PlaceOrder)?;

    if payload.items.is_empty() {
        return Err(AppError::validation(
            "items",
            "Order must contain at least one item.",
        ));
    }
    let mut seen = HashSet::new();
    for item in &payload.items {
        if item.quantity < 1 {
            return Err(AppError::validation(
                "items",
                "Quantity must be at least 1.",
            ));
        }
        if !seen.insert(item.product_id) {
            return Err(AppError::validation(
                "items",
                "Order contains the same product twice.",
            ));
        }
    }

    let txn = state.orm.begin().await?;

    let ids: Vec<Uuid> = payload.items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, ProductModel> = Products::find()
        .filter(ProdCol::Id.is_in(ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut total = Decimal::ZERO;
    for item in &payload.items {
        let Some(product) = products.get(&item.product_id) else {
            return Err(AppError::NotFound);
        };
        total += product.price * Decimal::from(item.quantity);
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        customer_id: Set(actor.user_id),
        total_amount: Set(total),
        status: Set(OrderStatus::Pending),
        is_paid: Set(false),
        order_date: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(payload.items.len());
    for item in &payload.items {
        let Some(product) = products.get(&item.product_id) else {
            return Err(AppError::NotFound);
        };
        let row = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            quantity: Set(item.quantity),
            price: Set(product.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(row));
    }

    txn.commit().await?;

    for item in &payload.items {
        if let Err(err) = inventory::log_stock_change(
            &state.pool,
            item.product_id,
            -item.quantity,
            InventoryReason::Order,
        )
        .await
        {
            tracing::warn!(error = %err, "inventory log failed");
        }
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_customer_orders(
    state: &AppState,
    actor: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(actor, Action::ListCustomerOrders)?;
    let (page, per_page, offset) = query.pagination.normalize();

    let Some(mut condition) = scope::customer_orders(actor) else {
        return Ok(ApiResponse::paged(
            "Orders",
            OrderList { items: vec![] },
            page,
            per_page,
            0,
        ));
    };

    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(is_paid) = query.is_paid {
        condition = condition.add(OrderCol::IsPaid.eq(is_paid));
    }
    let (start, end) = date_bounds(query.start_date.as_deref(), query.end_date.as_deref());
    if let Some(start) = start {
        condition = condition.add(OrderCol::OrderDate.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(OrderCol::OrderDate.lt(end));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::OrderDate);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    // No narrowing here: admins and customers see every line item.
    let items = collect_orders(&state.orm, orders, None).await?;

    Ok(ApiResponse::paged(
        "Orders",
        OrderList { items },
        page,
        per_page,
        total,
    ))
}
