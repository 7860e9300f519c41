use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use crate::{
    db::OrmConn,
    dto::orders::{OrderList, OrderWithItems, SaleRecord, SalesList, UpdateOrderStatusRequest},
    dto::products::ProductList,
    entity::{
        OrderItems, Orders, Products,
        order_items::{self, Column as OrderItemCol, Model as OrderItemModel},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel, OrderStatus,
        },
        products::Column as ProdCol,
        users::Role,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    policy::{self, Action, authorize},
    response::{ApiResponse, Meta},
    routes::params::{InventorySort, InventoryQuery, SalesQuery, SellerOrderQuery, date_bounds},
    scope,
    services::product_service::product_from_entity,
    state::AppState,
};

/// Inventory view. Admins are narrowed to their own authored products,
/// the same as sellers: this surface answers "what do I sell", not
/// "what exists".
pub async fn list_inventory(
    state: &AppState,
    actor: &AuthUser,
    query: InventoryQuery,
) -> AppResult<ApiResponse<ProductList>> {
    authorize(actor, Action::SellerArea)?;
    let (page, per_page, offset) = query.pagination.normalize();

    let Some(mut condition) = scope::inventory(actor) else {
        return Ok(ApiResponse::paged(
            "Inventory",
            ProductList { items: vec![] },
            page,
            per_page,
            0,
        ));
    };
    if let Some(category_id) = query.category_id {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }

    let sort = InventorySort::parse(query.sort_by.as_deref());
    let mut finder = Products::find().filter(condition);
    finder = if sort.descending {
        finder.order_by_desc(sort.column())
    } else {
        finder.order_by_asc(sort.column())
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::paged(
        "Inventory",
        ProductList { items },
        page,
        per_page,
        total,
    ))
}

pub async fn list_seller_orders(
    state: &AppState,
    actor: &AuthUser,
    query: SellerOrderQuery,
) -> AppResult<ApiResponse<OrderList>> {
    authorize(actor, Action::SellerArea)?;
    let (page, per_page, offset) = query.pagination.normalize();

    let Some(mut condition) = scope::seller_orders(actor) else {
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
    if let Some(category_id) = query.category_id {
        condition = condition.add(OrderCol::Id.in_subquery(scope::order_ids_with_category(category_id)));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(OrderCol::Id.in_subquery(scope::order_ids_with_product(product_id)));
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

    let items = collect_orders(&state.orm, orders, item_narrowing(actor)).await?;

    Ok(ApiResponse::paged(
        "Orders",
        OrderList { items },
        page,
        per_page,
        total,
    ))
}

/// Detail lookup through the same visibility scope as the list: an id the
/// actor cannot see answers 404, not 403.
pub async fn get_seller_order(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    authorize(actor, Action::SellerArea)?;

    let condition = scope::seller_orders(actor).ok_or(AppError::NotFound)?;
    let order = Orders::find()
        .filter(condition.add(OrderCol::Id.eq(id)))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut assembled = collect_orders(&state.orm, vec![order], item_narrowing(actor)).await?;
    let data = assembled.pop().ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success("Order found", data, Some(Meta::empty())))
}

/// Narrow status mutation: admins always, sellers only when the order
/// carries at least one of their items, customers never. The order is
/// fetched first, so a missing id is 404 and a denied actor 403. Absent
/// status keeps the current value; no transition graph is enforced.
pub async fn update_order_status(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let has_own_item = match actor.role {
        Role::Seller => {
            OrderItems::find()
                .filter(OrderItemCol::OrderId.eq(order.id))
                .filter(OrderItemCol::ProductId.in_subquery(scope::product_ids_of_seller(actor.user_id)))
                .count(&state.orm)
                .await?
                > 0
        }
        _ => false,
    };
    if !policy::may_update_order_status(actor, has_own_item) {
        return Err(AppError::Forbidden);
    }

    let mut active: OrderActive = order.into();
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

/// Sold line items, newest order first. Sellers only ever see items of
/// their own products, no matter which filters are supplied.
pub async fn sales_history(
    state: &AppState,
    actor: &AuthUser,
    query: SalesQuery,
) -> AppResult<ApiResponse<SalesList>> {
    authorize(actor, Action::SellerArea)?;
    let (page, per_page, offset) = query.pagination.normalize();

    let Some(mut condition) = scope::sales_items(actor) else {
        return Ok(ApiResponse::paged(
            "Sales history",
            SalesList { items: vec![] },
            page,
            per_page,
            0,
        ));
    };

    if let Some(category_id) = query.category_id {
        condition =
            condition.add(OrderItemCol::ProductId.in_subquery(scope::product_ids_in_category(category_id)));
    }
    if let Some(product_id) = query.product_id {
        condition = condition.add(OrderItemCol::ProductId.eq(product_id));
    }
    let (start, end) = date_bounds(query.start_date.as_deref(), query.end_date.as_deref());
    if let Some(start) = start {
        condition = condition.add(OrderCol::OrderDate.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(OrderCol::OrderDate.lt(end));
    }

    let finder = OrderItems::find()
        .join(JoinType::InnerJoin, order_items::Relation::Order.def())
        .join(JoinType::InnerJoin, order_items::Relation::Product.def())
        .filter(condition)
        .order_by_desc(OrderCol::OrderDate);

    let total = finder.clone().count(&state.orm).await? as i64;

    #[derive(Debug, FromQueryResult)]
    struct SaleRow {
        id: Uuid,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
        product_name: String,
        order_status: OrderStatus,
        order_date: DateTimeWithTimeZone,
    }

    let rows = finder
        .select_only()
        .column(OrderItemCol::Id)
        .column(OrderItemCol::OrderId)
        .column(OrderItemCol::ProductId)
        .column(OrderItemCol::Quantity)
        .column(OrderItemCol::Price)
        .column_as(ProdCol::Name, "product_name")
        .column_as(OrderCol::Status, "order_status")
        .column_as(OrderCol::OrderDate, "order_date")
        .limit(per_page as u64)
        .offset(offset as u64)
        .into_model::<SaleRow>()
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| SaleRecord {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: row.quantity,
            price: row.price,
            order_status: row.order_status,
            order_date: row.order_date.with_timezone(&Utc),
        })
        .collect();

    Ok(ApiResponse::paged(
        "Sales history",
        SalesList { items },
        page,
        per_page,
        total,
    ))
}

/// Sellers get their items narrowed in serialized orders; admins see all.
fn item_narrowing(actor: &AuthUser) -> Option<Uuid> {
    (actor.role == Role::Seller).then_some(actor.user_id)
}

/// Attach items to a page of orders with one query, optionally narrowed
/// to a single seller's products.
pub(crate) async fn collect_orders(
    conn: &OrmConn,
    orders: Vec<OrderModel>,
    seller: Option<Uuid>,
) -> Result<Vec<OrderWithItems>, AppError> {
    if orders.is_empty() {
        return Ok(vec![]);
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut condition = Condition::all().add(OrderItemCol::OrderId.is_in(ids));
    if let Some(seller_id) = seller {
        condition = condition.add(OrderItemCol::ProductId.in_subquery(scope::product_ids_of_seller(seller_id)));
    }

    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in OrderItems::find().filter(condition).all(conn).await? {
        by_order
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item));
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems {
                order: order_from_entity(order),
                items,
            }
        })
        .collect())
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        customer_id: model.customer_id,
        total_amount: model.total_amount,
        status: model.status,
        is_paid: model.is_paid,
        order_date: model.order_date.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
    }
}
