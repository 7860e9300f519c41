//! Role-scoped visibility for list and detail queries.
//!
//! Each function answers "which rows may this actor see" as a
//! [`Condition`], evaluated before any user-supplied filter. `None` means
//! the role has no visibility path at all; callers answer with an empty
//! page (or a 404 on detail lookups), never a 403; denial is the job of
//! [`crate::policy`].

use sea_orm::Condition;
use sea_orm::sea_query::{Expr, Func, Query, SelectStatement};
use uuid::Uuid;

use crate::{
    entity::{
        Categories, OrderItems, Products,
        categories,
        order_items::Column as OrderItemCol,
        orders::Column as OrderCol,
        products::Column as ProdCol,
    },
    entity::users::Role,
    middleware::auth::AuthUser,
};
use sea_orm::ColumnTrait;

/// Orders visible on the customer surface.
pub fn customer_orders(actor: &AuthUser) -> Option<Condition> {
    match actor.role {
        Role::Admin => Some(Condition::all()),
        Role::Customer => Some(Condition::all().add(OrderCol::CustomerId.eq(actor.user_id))),
        Role::Seller => None,
    }
}

/// Orders visible on the seller surface: admins see everything, sellers see
/// orders containing at least one item whose product they sell.
pub fn seller_orders(actor: &AuthUser) -> Option<Condition> {
    match actor.role {
        Role::Admin => Some(Condition::all()),
        Role::Seller => Some(
            Condition::all().add(OrderCol::Id.in_subquery(order_ids_with_seller_item(actor.user_id))),
        ),
        Role::Customer => None,
    }
}

/// Order items visible in the sales history.
pub fn sales_items(actor: &AuthUser) -> Option<Condition> {
    match actor.role {
        Role::Admin => Some(Condition::all()),
        Role::Seller => Some(
            Condition::all().add(OrderItemCol::ProductId.in_subquery(product_ids_of_seller(actor.user_id))),
        ),
        Role::Customer => None,
    }
}

/// Products visible in the inventory view. Admins are narrowed to products
/// they authored themselves, exactly like sellers.
pub fn inventory(actor: &AuthUser) -> Option<Condition> {
    match actor.role {
        Role::Admin | Role::Seller => {
            Some(Condition::all().add(ProdCol::SellerId.eq(actor.user_id)))
        }
        Role::Customer => None,
    }
}

/// `SELECT id FROM products WHERE seller_id = $seller`
pub fn product_ids_of_seller(seller_id: Uuid) -> SelectStatement {
    Query::select()
        .column(ProdCol::Id)
        .from(Products)
        .and_where(Expr::col(ProdCol::SellerId).eq(seller_id))
        .to_owned()
}

/// `SELECT order_id FROM order_items JOIN products ... WHERE seller_id = $seller`
pub fn order_ids_with_seller_item(seller_id: Uuid) -> SelectStatement {
    Query::select()
        .column((OrderItems, OrderItemCol::OrderId))
        .from(OrderItems)
        .inner_join(
            Products,
            Expr::col((Products, ProdCol::Id)).equals((OrderItems, OrderItemCol::ProductId)),
        )
        .and_where(Expr::col((Products, ProdCol::SellerId)).eq(seller_id))
        .to_owned()
}

/// Order ids containing at least one item of a product in the category.
pub fn order_ids_with_category(category_id: Uuid) -> SelectStatement {
    Query::select()
        .column((OrderItems, OrderItemCol::OrderId))
        .from(OrderItems)
        .inner_join(
            Products,
            Expr::col((Products, ProdCol::Id)).equals((OrderItems, OrderItemCol::ProductId)),
        )
        .and_where(Expr::col((Products, ProdCol::CategoryId)).eq(category_id))
        .to_owned()
}

/// Order ids containing at least one item of the product.
pub fn order_ids_with_product(product_id: Uuid) -> SelectStatement {
    Query::select()
        .column((OrderItems, OrderItemCol::OrderId))
        .from(OrderItems)
        .and_where(Expr::col((OrderItems, OrderItemCol::ProductId)).eq(product_id))
        .to_owned()
}

/// `SELECT id FROM products WHERE category_id = $category`
pub fn product_ids_in_category(category_id: Uuid) -> SelectStatement {
    Query::select()
        .column((Products, ProdCol::Id))
        .from(Products)
        .and_where(Expr::col((Products, ProdCol::CategoryId)).eq(category_id))
        .to_owned()
}

/// Category ids whose name matches case-insensitively and exactly.
pub fn category_ids_named(name: &str) -> SelectStatement {
    Query::select()
        .column((Categories, categories::Column::Id))
        .from(Categories)
        .and_where(
            Expr::expr(Func::lower(Expr::col((Categories, categories::Column::Name))))
                .eq(name.to_lowercase()),
        )
        .to_owned()
}
