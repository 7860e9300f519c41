use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest},
    entity::{
        Categories,
        categories::{ActiveModel as CategoryActive, Column as CatCol, Model as CategoryModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Category,
    policy::{Action, authorize},
    response::{ApiResponse, Meta},
    routes::params::CategoryQuery,
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    query: CategoryQuery,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, per_page, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(name) = query.name.as_deref().filter(|n| !n.is_empty()) {
        condition = condition.add(
            Expr::expr(Func::lower(Expr::col((Categories, CatCol::Name))))
                .like(format!("%{}%", name.to_lowercase())),
        );
    }

    let finder = Categories::find()
        .filter(condition)
        .order_by_asc(CatCol::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(ApiResponse::paged(
        "Categories",
        CategoryList { items },
        page,
        per_page,
        total,
    ))
}

pub async fn create_category(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    authorize(actor, Action::CreateCategory)?;
    validate_category_name(&payload.name)?;

    // Uniqueness ignores case; storage keeps the name exactly as given.
    let duplicate = Categories::find()
        .filter(
            Expr::expr(Func::lower(Expr::col((Categories, CatCol::Name))))
                .eq(payload.name.to_lowercase()),
        )
        .count(&state.orm)
        .await?
        > 0;
    if duplicate {
        return Err(AppError::validation(
            "name",
            "A category with this name already exists.",
        ));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        Some(Meta::empty()),
    ))
}

pub fn validate_category_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "Category name cannot be empty."));
    }
    Ok(())
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
