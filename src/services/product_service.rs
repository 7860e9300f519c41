use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        Categories, Products,
        inventory_logs::InventoryReason,
        products::{ActiveModel as ProductActive, Column as ProdCol, Model as ProductModel},
    },
    error::{AppError, AppResult},
    inventory,
    middleware::auth::AuthUser,
    models::Product,
    policy::{Action, authorize, ensure_owns_product},
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    scope,
    state::AppState,
};

/// Public catalogue listing. Out-of-stock products are excluded unless
/// `stock_available=false` is passed explicitly.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, per_page, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(category_id) = query.category_id {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }
    if let Some(name) = query.category_name.as_deref().filter(|n| !n.is_empty()) {
        condition = condition.add(ProdCol::CategoryId.in_subquery(scope::category_ids_named(name)));
    }
    if query.stock_available.unwrap_or(true) {
        condition = condition.add(ProdCol::StockQuantity.gt(0));
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_asc(ProdCol::Name);

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
        "Products",
        ProductList { items },
        page,
        per_page,
        total,
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success(
        "Product found",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(actor, Action::CreateProduct)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::validation("name", "Product name cannot be empty."));
    }
    if payload.price.is_sign_negative() {
        return Err(AppError::validation("price", "Price must not be negative."));
    }
    if payload.stock_quantity < 0 {
        return Err(AppError::validation(
            "stock_quantity",
            "Stock quantity must not be negative.",
        ));
    }

    Categories::find_by_id(payload.category_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    ensure_unique_listing(state, &payload.name, payload.category_id, actor.user_id, None).await?;

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        description: Set(payload.description.unwrap_or_default()),
        price: Set(payload.price),
        stock_quantity: Set(payload.stock_quantity),
        category_id: Set(payload.category_id),
        seller_id: Set(actor.user_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if product.stock_quantity > 0 {
        if let Err(err) = inventory::log_stock_change(
            &state.pool,
            product.id,
            product.stock_quantity,
            InventoryReason::Restock,
        )
        .await
        {
            tracing::warn!(error = %err, "inventory log failed");
        }
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    authorize(actor, Action::CreateProduct)?;

    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owns_product(actor, product.seller_id)?;

    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::validation("name", "Product name cannot be empty."));
        }
    }
    if let Some(price) = payload.price {
        if price.is_sign_negative() {
            return Err(AppError::validation("price", "Price must not be negative."));
        }
    }
    if let Some(stock) = payload.stock_quantity {
        if stock < 0 {
            return Err(AppError::validation(
                "stock_quantity",
                "Stock quantity must not be negative.",
            ));
        }
    }
    if let Some(category_id) = payload.category_id {
        Categories::find_by_id(category_id)
            .one(&state.orm)
            .await?
            .ok_or(AppError::NotFound)?;
    }

    let new_name = payload.name.clone().unwrap_or_else(|| product.name.clone());
    let new_category = payload.category_id.unwrap_or(product.category_id);
    if new_name != product.name || new_category != product.category_id {
        ensure_unique_listing(state, &new_name, new_category, product.seller_id, Some(id)).await?;
    }

    let old_stock = product.stock_quantity;

    let mut active: ProductActive = product.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(stock) = payload.stock_quantity {
        active.stock_quantity = Set(stock);
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(category_id);
    }
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    let delta = product.stock_quantity - old_stock;
    if delta != 0 {
        if let Err(err) =
            inventory::log_stock_change(&state.pool, product.id, delta, InventoryReason::Manual)
                .await
        {
            tracing::warn!(error = %err, "inventory log failed");
        }
    }

    Ok(ApiResponse::success(
        "Product updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    authorize(actor, Action::CreateProduct)?;

    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owns_product(actor, product.seller_id)?;

    product.delete(&state.orm).await?;

    // A confirmation body rather than a bare 204.
    Ok(ApiResponse::success(
        "Product is deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// (name, category, seller) must stay unique; checked up front so the
/// caller gets a field-scoped message instead of a bare constraint error.
async fn ensure_unique_listing(
    state: &AppState,
    name: &str,
    category_id: Uuid,
    seller_id: Uuid,
    exclude: Option<Uuid>,
) -> Result<(), AppError> {
    let mut finder = Products::find()
        .filter(ProdCol::Name.eq(name))
        .filter(ProdCol::CategoryId.eq(category_id))
        .filter(ProdCol::SellerId.eq(seller_id));
    if let Some(id) = exclude {
        finder = finder.filter(ProdCol::Id.ne(id));
    }
    if finder.count(&state.orm).await? > 0 {
        return Err(AppError::validation(
            "name",
            "You already have a product with this name in this category.",
        ));
    }
    Ok(())
}

pub(crate) fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock_quantity: model.stock_quantity,
        category_id: model.category_id,
        seller_id: model.seller_id,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
