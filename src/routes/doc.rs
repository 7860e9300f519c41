use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        categories::{CategoryList, CreateCategoryRequest},
        orders::{
            CreateOrderRequest, OrderItemInput, OrderList, OrderWithItems, SaleRecord, SalesList,
            UpdateOrderStatusRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        reviews::{CreateReviewRequest, ReviewList},
        users::{SellerProfilePayload, UpdateUserRequest, UserDetail, UserList, UserListItem},
    },
    entity::{orders::OrderStatus, users::Role},
    models::{Category, Order, OrderItem, Product, Review, SellerProfile, User},
    response::{ApiResponse, Meta},
    routes::{admin, categories, customer, health, params, products, seller},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        categories::list_categories,
        categories::create_category,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::list_product_reviews,
        admin::list_users,
        admin::get_user,
        admin::update_user,
        seller::list_inventory,
        seller::list_seller_orders,
        seller::get_seller_order,
        seller::update_order_status,
        seller::sales_history,
        customer::create_order,
        customer::list_orders,
        customer::create_review,
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            User,
            SellerProfile,
            Category,
            Product,
            Order,
            OrderItem,
            Review,
            UserList,
            UserListItem,
            UserDetail,
            UpdateUserRequest,
            SellerProfilePayload,
            CategoryList,
            CreateCategoryRequest,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            OrderList,
            OrderWithItems,
            CreateOrderRequest,
            OrderItemInput,
            UpdateOrderStatusRequest,
            SalesList,
            SaleRecord,
            ReviewList,
            CreateReviewRequest,
            params::Pagination,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<UserDetail>,
            ApiResponse<SalesList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Categories", description = "Shared catalogue categories"),
        (name = "Products", description = "Public catalogue and product management"),
        (name = "Admin", description = "User administration"),
        (name = "Seller", description = "Inventory, orders and sales history"),
        (name = "Customer", description = "Order placement and reviews"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
