use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::users::{UpdateUserRequest, UserDetail, UserList, UserListItem},
    entity::{
        SellerProfiles, Users,
        seller_profiles::{
            ActiveModel as ProfileActive, Column as ProfileCol, Model as ProfileModel,
        },
        users::{ActiveModel as UserActive, Column as UserCol, Model as UserModel, Role},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{SellerProfile, User},
    policy::{Action, authorize},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    actor: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<UserList>> {
    authorize(actor, Action::ManageUsers)?;
    let (page, per_page, offset) = pagination.normalize();

    let total = Users::find().count(&state.orm).await? as i64;

    let rows = Users::find()
        .find_also_related(SellerProfiles)
        .order_by_asc(UserCol::CreatedAt)
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(user, profile)| UserListItem {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            shop_name: profile.map(|p| p.shop_name),
        })
        .collect();

    Ok(ApiResponse::paged(
        "Users",
        UserList { items },
        page,
        per_page,
        total,
    ))
}

pub async fn get_user(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<UserDetail>> {
    authorize(actor, Action::ManageUsers)?;

    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let profile = user.find_related(SellerProfiles).one(&state.orm).await?;

    let data = UserDetail {
        user: user_from_entity(user),
        seller_profile: profile.map(profile_from_entity),
    };
    Ok(ApiResponse::success("User found", data, Some(Meta::empty())))
}

/// Atomic user + seller-profile update. Every validation runs before the
/// first write, and the whole mutation shares one transaction: a role
/// change away from seller deletes the profile in the same commit that
/// persists the role.
pub async fn update_user(
    state: &AppState,
    actor: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<UserDetail>> {
    authorize(actor, Action::ManageUsers)?;

    let txn = state.orm.begin().await?;

    let user = Users::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if let Some(email) = payload.email.as_deref() {
        validate_email(email)?;
        let taken = Users::find()
            .filter(UserCol::Email.eq(email))
            .filter(UserCol::Id.ne(id))
            .count(&txn)
            .await?
            > 0;
        if taken {
            return Err(AppError::validation("email", "This email is already in use."));
        }
    }

    if let Some(username) = payload.username.as_deref() {
        if username.trim().is_empty() {
            return Err(AppError::validation("username", "Username cannot be empty."));
        }
        let taken = Users::find()
            .filter(UserCol::Username.eq(username))
            .filter(UserCol::Id.ne(id))
            .count(&txn)
            .await?
            > 0;
        if taken {
            return Err(AppError::validation(
                "username",
                "This username is already in use.",
            ));
        }
    }

    let effective = effective_role(payload.role, user.role);
    match (&payload.seller_profile, effective) {
        (None, Role::Seller) => {
            return Err(AppError::validation(
                "seller_profile",
                "Seller profile is required for seller role.",
            ));
        }
        (Some(_), role) if role != Role::Seller => {
            return Err(AppError::validation(
                "seller_profile",
                "Seller profile is only allowed for seller role.",
            ));
        }
        _ => {}
    }

    if let Some(profile) = payload.seller_profile.as_ref() {
        if let Some(shop_name) = profile.shop_name.as_deref() {
            if shop_name.trim().is_empty() {
                return Err(AppError::validation(
                    "seller_profile.shop_name",
                    "Shop name cannot be empty.",
                ));
            }
            // Unique among all profiles except this user's own.
            let taken = SellerProfiles::find()
                .filter(ProfileCol::ShopName.eq(shop_name))
                .filter(ProfileCol::UserId.ne(id))
                .count(&txn)
                .await?
                > 0;
            if taken {
                return Err(AppError::validation(
                    "seller_profile.shop_name",
                    "This shop name is already taken.",
                ));
            }
        }
        if let Some(contact) = profile.contact_number.as_deref() {
            if !contact.is_empty() {
                validate_contact_number(contact)?;
            }
        }
    }

    let mut active: UserActive = user.into();
    if let Some(username) = payload.username {
        active.username = Set(username);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(role) = payload.role {
        active.role = Set(role);
    }
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&txn).await?;

    let profile = if user.role == Role::Seller {
        let data = match payload.seller_profile {
            Some(data) => data,
            // Unreachable after validation, but a seller with no payload
            // keeps whatever profile already exists.
            None => {
                let existing = SellerProfiles::find()
                    .filter(ProfileCol::UserId.eq(user.id))
                    .one(&txn)
                    .await?;
                txn.commit().await?;
                let detail = UserDetail {
                    user: user_from_entity(user),
                    seller_profile: existing.map(profile_from_entity),
                };
                return Ok(ApiResponse::success("User updated", detail, Some(Meta::empty())));
            }
        };
        let existing = SellerProfiles::find()
            .filter(ProfileCol::UserId.eq(user.id))
            .one(&txn)
            .await?;
        let profile = match existing {
            Some(profile) => {
                let mut active: ProfileActive = profile.into();
                if let Some(shop_name) = data.shop_name {
                    active.shop_name = Set(shop_name);
                }
                if let Some(contact_number) = data.contact_number {
                    active.contact_number = Set(contact_number);
                }
                if let Some(address) = data.address {
                    active.address = Set(address);
                }
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?
            }
            None => {
                ProfileActive {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user.id),
                    shop_name: Set(data.shop_name.unwrap_or_default()),
                    contact_number: Set(data.contact_number.unwrap_or_default()),
                    address: Set(data.address.unwrap_or_default()),
                    created_at: NotSet,
                    updated_at: NotSet,
                }
                .insert(&txn)
                .await?
            }
        };
        Some(profile)
    } else {
        SellerProfiles::delete_many()
            .filter(ProfileCol::UserId.eq(user.id))
            .exec(&txn)
            .await?;
        None
    };

    txn.commit().await?;

    let data = UserDetail {
        user: user_from_entity(user),
        seller_profile: profile.map(profile_from_entity),
    };
    Ok(ApiResponse::success("User updated", data, Some(Meta::empty())))
}

/// The role the update is validated against: the requested role when the
/// payload carries one, the stored role otherwise. This is what lets one
/// request change role and profile together.
pub fn effective_role(requested: Option<Role>, current: Role) -> Role {
    requested.unwrap_or(current)
}

/// Optional `+`, then 9 to 15 digits.
pub fn validate_contact_number(raw: &str) -> Result<(), AppError> {
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    let valid = (9..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(
            "seller_profile.contact_number",
            "Enter a valid phone number.",
        ))
    }
}

pub fn validate_email(raw: &str) -> Result<(), AppError> {
    let valid = match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::validation("email", "Enter a valid email address."))
    }
}

fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        username: model.username,
        email: model.email,
        role: model.role,
        is_staff: model.is_staff,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn profile_from_entity(model: ProfileModel) -> SellerProfile {
    SellerProfile {
        shop_name: model.shop_name,
        contact_number: model.contact_number,
        address: model.address,
    }
}
