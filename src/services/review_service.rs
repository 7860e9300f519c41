use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList},
    entity::{
        Products, Reviews,
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Model as ReviewModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    policy::{Action, authorize},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// One review per customer per product, checked before insert so the
/// caller gets a field-scoped message instead of a constraint error.
pub async fn create_review(
    state: &AppState,
    actor: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    authorize(actor, Action::WriteReview)?;

    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::validation(
            "rating",
            "Rating must be between 1 and 5.",
        ));
    }

    Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let already_reviewed = Reviews::find()
        .filter(ReviewCol::ProductId.eq(payload.product_id))
        .filter(ReviewCol::CustomerId.eq(actor.user_id))
        .count(&state.orm)
        .await?
        > 0;
    if already_reviewed {
        return Err(AppError::validation(
            "product_id",
            "You have already reviewed this product.",
        ));
    }

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(payload.product_id),
        customer_id: Set(actor.user_id),
        rating: Set(payload.rating),
        comment: Set(payload.comment.unwrap_or_default()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Review created",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

pub async fn list_product_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let (page, per_page, offset) = pagination.normalize();

    let finder = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .order_by_desc(ReviewCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    Ok(ApiResponse::paged(
        "Reviews",
        ReviewList { items },
        page,
        per_page,
        total,
    ))
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        customer_id: model.customer_id,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
