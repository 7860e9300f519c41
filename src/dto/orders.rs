use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::orders::OrderStatus;
use crate::models::{Order, OrderItem};

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItemInput>,
}

/// `None` status keeps the current value, matching a partial PATCH.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    /// For seller actors this holds only the items whose product belongs
    /// to them; admins and customers see every line.
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

/// One sold line item, at order-item grain, with its order context.
#[derive(Debug, Serialize, ToSchema)]
pub struct SaleRecord {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub order_status: OrderStatus,
    pub order_date: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesList {
    pub items: Vec<SaleRecord>,
}
