use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod categories;
pub mod customer;
pub mod doc;
pub mod health;
pub mod params;
pub mod products;
pub mod seller;

// Build the API router without binding state; it is provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/admin", admin::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
        .nest("/seller", seller::router())
        .nest("/customer", customer::router())
}
