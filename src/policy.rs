//! Role and ownership policy.
//!
//! Request-level gates are one dispatch table over [`Action`]; object-level
//! decisions are pure functions over facts the caller already fetched. A
//! failed gate is a 403; visibility narrowing (empty pages, 404s) lives in
//! [`crate::scope`] instead.

use uuid::Uuid;

use crate::{entity::users::Role, error::AppError, middleware::auth::AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// List, inspect and update user accounts.
    ManageUsers,
    CreateCategory,
    CreateProduct,
    /// Seller-facing surface: inventory, order list/detail, sales history.
    SellerArea,
    PlaceOrder,
    WriteReview,
    ListCustomerOrders,
}

/// Entry gate, evaluated before any data access.
pub fn authorize(actor: &AuthUser, action: Action) -> Result<(), AppError> {
    let allowed = match action {
        Action::ManageUsers | Action::CreateCategory => {
            actor.is_staff && actor.role == Role::Admin
        }
        Action::CreateProduct | Action::SellerArea => {
            matches!(actor.role, Role::Admin | Role::Seller)
        }
        Action::PlaceOrder | Action::WriteReview => actor.role == Role::Customer,
        Action::ListCustomerOrders => matches!(actor.role, Role::Admin | Role::Customer),
    };
    if allowed { Ok(()) } else { Err(AppError::Forbidden) }
}

/// Admins may touch any product; sellers only their own.
pub fn owns_product(actor: &AuthUser, product_seller_id: Uuid) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Seller => product_seller_id == actor.user_id,
        Role::Customer => false,
    }
}

/// Status mutation has no customer path at all.
pub fn may_update_order_status(actor: &AuthUser, has_own_item: bool) -> bool {
    match actor.role {
        Role::Admin => true,
        Role::Seller => has_own_item,
        Role::Customer => false,
    }
}

pub fn ensure_owns_product(actor: &AuthUser, product_seller_id: Uuid) -> Result<(), AppError> {
    if owns_product(actor, product_seller_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
