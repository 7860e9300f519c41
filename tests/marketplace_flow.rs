//! End-to-end service flow against a real Postgres database.
//!
//! Skipped unless `TEST_DATABASE_URL` (or `DATABASE_URL`) is set. The
//! database is truncated at the start, so point it at a throwaway instance.

use axum_marketplace_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{
        categories::CreateCategoryRequest,
        orders::{CreateOrderRequest, OrderItemInput, UpdateOrderStatusRequest},
        products::{CreateProductRequest, UpdateProductRequest},
        reviews::CreateReviewRequest,
        users::{SellerProfilePayload, UpdateUserRequest},
    },
    entity::{
        InventoryLogs,
        inventory_logs::{Column as LogCol, InventoryReason},
        orders::OrderStatus,
        users::{ActiveModel as UserActive, Role},
    },
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{
        InventoryQuery, OrderListQuery, Pagination, ProductQuery, SalesQuery, SellerOrderQuery,
    },
    services::{
        admin_service, category_service, customer_service, product_service, review_service,
        seller_service,
    },
    state::AppState,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, ConnectionTrait,
    EntityTrait, PaginatorTrait, QueryFilter, Statement,
};
use uuid::Uuid;

fn test_database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let pool = create_pool(database_url).await?;
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE inventory_logs, reviews, order_items, orders, products, categories, \
         seller_profiles, users CASCADE",
    ))
    .await?;

    Ok(AppState::new(pool, orm, "test-secret"))
}

async fn create_user(
    state: &AppState,
    username: &str,
    role: Role,
    is_staff: bool,
) -> anyhow::Result<AuthUser> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        role: Set(role),
        is_staff: Set(is_staff),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role,
        is_staff,
    })
}

fn profile_update(shop_name: &str) -> UpdateUserRequest {
    UpdateUserRequest {
        username: None,
        email: None,
        role: None,
        seller_profile: Some(SellerProfilePayload {
            shop_name: Some(shop_name.to_string()),
            contact_number: Some("+493012345678".to_string()),
            address: None,
        }),
    }
}

fn role_update(role: Role, profile: Option<SellerProfilePayload>) -> UpdateUserRequest {
    UpdateUserRequest {
        username: None,
        email: None,
        role: Some(role),
        seller_profile: profile,
    }
}

fn product_request(name: &str, price: &str, stock: i32, category_id: Uuid) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: None,
        price: price.parse().expect("decimal literal"),
        stock_quantity: stock,
        category_id,
    }
}

fn order_query() -> OrderListQuery {
    OrderListQuery {
        pagination: Pagination::default(),
        status: None,
        is_paid: None,
        start_date: None,
        end_date: None,
    }
}

fn seller_order_query() -> SellerOrderQuery {
    SellerOrderQuery {
        pagination: Pagination::default(),
        status: None,
        is_paid: None,
        category_id: None,
        product_id: None,
        start_date: None,
        end_date: None,
    }
}

fn sales_query() -> SalesQuery {
    SalesQuery {
        pagination: Pagination::default(),
        category_id: None,
        product_id: None,
        start_date: None,
        end_date: None,
    }
}

fn inventory_query(sort_by: Option<&str>) -> InventoryQuery {
    InventoryQuery {
        pagination: Pagination::default(),
        category_id: None,
        sort_by: sort_by.map(str::to_string),
    }
}

#[tokio::test]
async fn marketplace_flow() -> anyhow::Result<()> {
    let Some(database_url) = test_database_url() else {
        eprintln!("marketplace_flow skipped: set TEST_DATABASE_URL to run");
        return Ok(());
    };
    let state = setup_state(&database_url).await?;

    let admin = create_user(&state, "admin", Role::Admin, true).await?;
    let seller_one = create_user(&state, "seller_one", Role::Seller, false).await?;
    let seller_two = create_user(&state, "seller_two", Role::Seller, false).await?;
    let seller_three = create_user(&state, "seller_three", Role::Seller, false).await?;
    let customer_one = create_user(&state, "customer_one", Role::Customer, false).await?;
    let customer_two = create_user(&state, "customer_two", Role::Customer, false).await?;

    // Seller profiles, created through the admin update path.
    admin_service::update_user(&state, &admin, seller_one.user_id, profile_update("First Shop"))
        .await?;
    admin_service::update_user(&state, &admin, seller_two.user_id, profile_update("Second Shop"))
        .await?;

    // Shop names are unique across other sellers but re-usable by the owner.
    let err = admin_service::update_user(
        &state,
        &admin,
        seller_two.user_id,
        profile_update("First Shop"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
    admin_service::update_user(&state, &admin, seller_two.user_id, profile_update("Second Shop"))
        .await?;

    // Only staff admins manage users.
    let err = admin_service::list_users(&state, &seller_one, Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let users = admin_service::list_users(&state, &admin, Pagination::default())
        .await?
        .data
        .expect("user list");
    assert_eq!(users.items.len(), 6);
    let shopkeeper = users
        .items
        .iter()
        .find(|u| u.id == seller_one.user_id)
        .expect("seller listed");
    assert_eq!(shopkeeper.shop_name.as_deref(), Some("First Shop"));

    let detail = admin_service::get_user(&state, &admin, seller_one.user_id)
        .await?
        .data
        .expect("user detail");
    assert!(detail.seller_profile.is_some());

    // Categories: admin-only, names unique case-insensitively.
    let err = category_service::create_category(
        &state,
        &seller_one,
        CreateCategoryRequest {
            name: "Electronics".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let category = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "Electronics".to_string(),
        },
    )
    .await?
    .data
    .expect("category");

    let err = category_service::create_category(
        &state,
        &admin,
        CreateCategoryRequest {
            name: "electronics".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    // Products. seller_one lists a keyboard and an out-of-stock cable,
    // seller_two a mouse.
    let keyboard = product_service::create_product(
        &state,
        &seller_one,
        product_request("Keyboard", "50.00", 10, category.id),
    )
    .await?
    .data
    .expect("keyboard");
    let cable = product_service::create_product(
        &state,
        &seller_one,
        product_request("Cable", "5.00", 0, category.id),
    )
    .await?
    .data
    .expect("cable");
    let mouse = product_service::create_product(
        &state,
        &seller_two,
        product_request("Mouse", "25.00", 5, category.id),
    )
    .await?
    .data
    .expect("mouse");

    // Listing uniqueness is per seller: seller_one cannot repeat the name,
    // seller_two can use it for their own product.
    let err = product_service::create_product(
        &state,
        &seller_one,
        product_request("Keyboard", "60.00", 1, category.id),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
    product_service::create_product(
        &state,
        &seller_two,
        product_request("Keyboard", "45.00", 3, category.id),
    )
    .await?;

    let err = product_service::create_product(
        &state,
        &customer_one,
        product_request("Sticker", "1.00", 1, category.id),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Public catalogue hides out-of-stock items unless asked.
    let listed = product_service::list_products(
        &state,
        ProductQuery {
            pagination: Pagination::default(),
            category_id: None,
            category_name: Some("ELECTRONICS".to_string()),
            stock_available: None,
        },
    )
    .await?
    .data
    .expect("products");
    assert!(listed.items.iter().all(|p| p.stock_quantity > 0));
    assert!(!listed.items.iter().any(|p| p.id == cable.id));

    let listed = product_service::list_products(
        &state,
        ProductQuery {
            pagination: Pagination::default(),
            category_id: None,
            category_name: None,
            stock_available: Some(false),
        },
    )
    .await?
    .data
    .expect("products");
    assert!(listed.items.iter().any(|p| p.id == cable.id));

    // Filtering by category id: the real category matches, a random one
    // answers an empty page.
    let listed = product_service::list_products(
        &state,
        ProductQuery {
            pagination: Pagination::default(),
            category_id: Some(category.id),
            category_name: None,
            stock_available: None,
        },
    )
    .await?
    .data
    .expect("products");
    assert!(listed.items.iter().any(|p| p.id == keyboard.id));
    let listed = product_service::list_products(
        &state,
        ProductQuery {
            pagination: Pagination::default(),
            category_id: Some(Uuid::new_v4()),
            category_name: None,
            stock_available: None,
        },
    )
    .await?
    .data
    .expect("products");
    assert!(listed.items.is_empty());

    // Only the owning seller (or an admin) may edit a product.
    let err = product_service::update_product(
        &state,
        &seller_two,
        keyboard.id,
        UpdateProductRequest {
            name: None,
            description: Some("not yours".to_string()),
            price: None,
            stock_quantity: None,
            category_id: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    product_service::update_product(
        &state,
        &seller_one,
        keyboard.id,
        UpdateProductRequest {
            name: None,
            description: Some("Tenkeyless".to_string()),
            price: None,
            stock_quantity: None,
            category_id: None,
        },
    )
    .await?;

    // Order placement: customers only, validated items.
    let err = customer_service::create_order(
        &state,
        &seller_one,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                product_id: mouse.id,
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = customer_service::create_order(&state, &customer_one, CreateOrderRequest {
        items: vec![],
    })
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = customer_service::create_order(
        &state,
        &customer_one,
        CreateOrderRequest {
            items: vec![
                OrderItemInput {
                    product_id: keyboard.id,
                    quantity: 1,
                },
                OrderItemInput {
                    product_id: keyboard.id,
                    quantity: 2,
                },
            ],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let err = customer_service::create_order(
        &state,
        &customer_one,
        CreateOrderRequest {
            items: vec![OrderItemInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let placed = customer_service::create_order(
        &state,
        &customer_one,
        CreateOrderRequest {
            items: vec![
                OrderItemInput {
                    product_id: keyboard.id,
                    quantity: 2,
                },
                OrderItemInput {
                    product_id: mouse.id,
                    quantity: 1,
                },
            ],
        },
    )
    .await?
    .data
    .expect("placed order");
    assert_eq!(placed.order.total_amount, "125.00".parse::<Decimal>()?);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert!(!placed.order.is_paid);
    assert_eq!(placed.items.len(), 2);

    // Stock is not decremented by orders; the movement lands in the audit
    // trail instead.
    let keyboard_now = product_service::get_product(&state, keyboard.id)
        .await?
        .data
        .expect("keyboard");
    assert_eq!(keyboard_now.stock_quantity, 10);

    let restocks = InventoryLogs::find()
        .filter(LogCol::ProductId.eq(keyboard.id))
        .filter(LogCol::Reason.eq(InventoryReason::Restock))
        .count(&state.orm)
        .await?;
    assert_eq!(restocks, 1);
    let movements = InventoryLogs::find()
        .filter(LogCol::ProductId.eq(keyboard.id))
        .filter(LogCol::Reason.eq(InventoryReason::Order))
        .all(&state.orm)
        .await?;
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].quantity_change, -2);
    // Zero-stock creation writes no restock row.
    let cable_logs = InventoryLogs::find()
        .filter(LogCol::ProductId.eq(cable.id))
        .count(&state.orm)
        .await?;
    assert_eq!(cable_logs, 0);

    // Customer order history is scoped to the requesting customer.
    let mine = customer_service::list_customer_orders(&state, &customer_one, order_query())
        .await?
        .data
        .expect("orders");
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].items.len(), 2);

    let theirs = customer_service::list_customer_orders(&state, &customer_two, order_query())
        .await?
        .data
        .expect("orders");
    assert!(theirs.items.is_empty());

    let all = customer_service::list_customer_orders(&state, &admin, order_query())
        .await?
        .data
        .expect("orders");
    assert_eq!(all.items.len(), 1);

    // A malformed date filter degrades to "no filter", not an error.
    let lenient = customer_service::list_customer_orders(
        &state,
        &customer_one,
        OrderListQuery {
            start_date: Some("not-a-date".to_string()),
            ..order_query()
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(lenient.items.len(), 1);

    let shipped_only = customer_service::list_customer_orders(
        &state,
        &customer_one,
        OrderListQuery {
            status: Some(OrderStatus::Shipped),
            ..order_query()
        },
    )
    .await?
    .data
    .expect("orders");
    assert!(shipped_only.items.is_empty());

    // Sellers see the order but only their own lines inside it.
    let s1_orders = seller_service::list_seller_orders(&state, &seller_one, seller_order_query())
        .await?
        .data
        .expect("orders");
    assert_eq!(s1_orders.items.len(), 1);
    assert_eq!(s1_orders.items[0].items.len(), 1);
    assert_eq!(s1_orders.items[0].items[0].product_id, keyboard.id);

    let s2_orders = seller_service::list_seller_orders(&state, &seller_two, seller_order_query())
        .await?
        .data
        .expect("orders");
    assert_eq!(s2_orders.items.len(), 1);
    assert_eq!(s2_orders.items[0].items[0].product_id, mouse.id);

    let admin_orders = seller_service::list_seller_orders(&state, &admin, seller_order_query())
        .await?
        .data
        .expect("orders");
    assert_eq!(admin_orders.items[0].items.len(), 2);

    let uninvolved =
        seller_service::list_seller_orders(&state, &seller_three, seller_order_query())
            .await?
            .data
            .expect("orders");
    assert!(uninvolved.items.is_empty());

    // Date-range filters on seller orders: a window containing today keeps
    // the order, a window starting in the future drops it.
    let windowed = seller_service::list_seller_orders(
        &state,
        &seller_one,
        SellerOrderQuery {
            start_date: Some("2000-01-01".to_string()),
            end_date: Some("2999-12-31".to_string()),
            ..seller_order_query()
        },
    )
    .await?
    .data
    .expect("orders");
    assert_eq!(windowed.items.len(), 1);
    let future = seller_service::list_seller_orders(
        &state,
        &seller_one,
        SellerOrderQuery {
            start_date: Some("2999-01-01".to_string()),
            ..seller_order_query()
        },
    )
    .await?
    .data
    .expect("orders");
    assert!(future.items.is_empty());

    // Detail outside the actor's scope answers 404, never 403.
    seller_service::get_seller_order(&state, &seller_two, placed.order.id).await?;
    let err = seller_service::get_seller_order(&state, &seller_three, placed.order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Sales history stays isolated even when filtering by a foreign product.
    let sales = seller_service::sales_history(&state, &seller_one, sales_query())
        .await?
        .data
        .expect("sales");
    assert_eq!(sales.items.len(), 1);
    assert_eq!(sales.items[0].product_id, keyboard.id);
    assert_eq!(sales.items[0].quantity, 2);

    let foreign = seller_service::sales_history(
        &state,
        &seller_one,
        SalesQuery {
            product_id: Some(mouse.id),
            ..sales_query()
        },
    )
    .await?
    .data
    .expect("sales");
    assert!(foreign.items.is_empty());

    // Category filter on sales history: the real category keeps the sale,
    // an unknown one filters everything out.
    let in_category = seller_service::sales_history(
        &state,
        &seller_one,
        SalesQuery {
            category_id: Some(category.id),
            ..sales_query()
        },
    )
    .await?
    .data
    .expect("sales");
    assert_eq!(in_category.items.len(), 1);
    let no_category = seller_service::sales_history(
        &state,
        &seller_one,
        SalesQuery {
            category_id: Some(Uuid::new_v4()),
            ..sales_query()
        },
    )
    .await?
    .data
    .expect("sales");
    assert!(no_category.items.is_empty());

    // Status updates: fetched first, so missing is 404 and denied is 403.
    let err = seller_service::update_order_status(
        &state,
        &seller_one,
        Uuid::new_v4(),
        UpdateOrderStatusRequest {
            status: Some(OrderStatus::Shipped),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = seller_service::update_order_status(
        &state,
        &customer_one,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: Some(OrderStatus::Shipped),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = seller_service::update_order_status(
        &state,
        &seller_three,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: Some(OrderStatus::Shipped),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let updated = seller_service::update_order_status(
        &state,
        &seller_one,
        placed.order.id,
        UpdateOrderStatusRequest {
            status: Some(OrderStatus::Shipped),
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(updated.status, OrderStatus::Shipped);

    // Absent status keeps the current value.
    let kept = seller_service::update_order_status(
        &state,
        &admin,
        placed.order.id,
        UpdateOrderStatusRequest { status: None },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(kept.status, OrderStatus::Shipped);

    // Reviews: customers only, once per product.
    let err = review_service::create_review(
        &state,
        &seller_one,
        CreateReviewRequest {
            product_id: keyboard.id,
            rating: 5,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = review_service::create_review(
        &state,
        &customer_one,
        CreateReviewRequest {
            product_id: keyboard.id,
            rating: 6,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    review_service::create_review(
        &state,
        &customer_one,
        CreateReviewRequest {
            product_id: keyboard.id,
            rating: 5,
            comment: Some("Great keys".to_string()),
        },
    )
    .await?;
    let err = review_service::create_review(
        &state,
        &customer_one,
        CreateReviewRequest {
            product_id: keyboard.id,
            rating: 4,
            comment: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let reviews = review_service::list_product_reviews(&state, keyboard.id, Pagination::default())
        .await?
        .data
        .expect("reviews");
    assert_eq!(reviews.items.len(), 1);

    let err = review_service::list_product_reviews(&state, Uuid::new_v4(), Pagination::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Inventory is always the actor's own products, admins included.
    let s1_inventory = seller_service::list_inventory(&state, &seller_one, inventory_query(None))
        .await?
        .data
        .expect("inventory");
    assert_eq!(s1_inventory.items.len(), 2);

    let by_price_desc =
        seller_service::list_inventory(&state, &seller_one, inventory_query(Some("-price")))
            .await?
            .data
            .expect("inventory");
    assert_eq!(by_price_desc.items[0].id, keyboard.id);

    let admin_inventory = seller_service::list_inventory(&state, &admin, inventory_query(None))
        .await?
        .data
        .expect("inventory");
    assert!(admin_inventory.items.is_empty());

    let err = seller_service::list_inventory(&state, &customer_one, inventory_query(None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // Role lifecycle: a profile is forbidden off-role, required on-role,
    // and dropped in the same transaction that demotes the seller.
    let err = admin_service::update_user(
        &state,
        &admin,
        seller_two.user_id,
        role_update(
            Role::Customer,
            Some(SellerProfilePayload {
                shop_name: Some("Second Shop".to_string()),
                contact_number: None,
                address: None,
            }),
        ),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let demoted = admin_service::update_user(
        &state,
        &admin,
        seller_two.user_id,
        role_update(Role::Customer, None),
    )
    .await?
    .data
    .expect("user detail");
    assert_eq!(demoted.user.role, Role::Customer);
    assert!(demoted.seller_profile.is_none());

    let err = admin_service::update_user(
        &state,
        &admin,
        customer_two.user_id,
        role_update(Role::Seller, None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));

    let promoted = admin_service::update_user(
        &state,
        &admin,
        customer_two.user_id,
        role_update(
            Role::Seller,
            Some(SellerProfilePayload {
                shop_name: Some("Third Shop".to_string()),
                contact_number: Some("+123456789".to_string()),
                address: Some("1 Market St".to_string()),
            }),
        ),
    )
    .await?
    .data
    .expect("user detail");
    assert_eq!(promoted.user.role, Role::Seller);
    assert_eq!(
        promoted
            .seller_profile
            .as_ref()
            .map(|p| p.shop_name.as_str()),
        Some("Third Shop")
    );

    Ok(())
}
