use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::users::Role;
use crate::models::{SellerProfile, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListItem {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Present only for users that currently have a seller profile.
    pub shop_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<UserListItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    pub user: User,
    pub seller_profile: Option<SellerProfile>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SellerProfilePayload {
    pub shop_name: Option<String>,
    pub contact_number: Option<String>,
    pub address: Option<String>,
}

/// Partial user update. `seller_profile` is required when the effective
/// role is seller and forbidden otherwise.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub seller_profile: Option<SellerProfilePayload>,
}
